use thiserror::Error;

use crate::config::BufferId;

#[derive(Error, Debug)]
pub enum TileFlowError {
    #[error("Argument vector length mismatch: expected {expected}, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("Declared tile count {declared} does not match {w}x{h} block shape")]
    BlockShapeMismatch { declared: u32, w: u32, h: u32 },
    #[error("Tile size {elems} elements is not a non-zero multiple of 32")]
    InvalidTileSize { elems: usize },
    #[error("Tile id {tile_id} resolves to bytes {offset}..{end} outside storage of {len} bytes")]
    TileOutOfRange {
        tile_id: u32,
        offset: usize,
        end: usize,
        len: usize,
    },
    #[error("Transfer of {len} bytes exceeds tile capacity of {tile_bytes} bytes")]
    TransferTooLong { len: usize, tile_bytes: usize },
    #[error("Accessor tile stride {stride} does not match dense tile size {tile_bytes}")]
    AccessorStrideMismatch { stride: usize, tile_bytes: usize },
    #[error("Staging slot size {slot_bytes} does not match dense tile size {tile_bytes}")]
    SlotSizeMismatch { slot_bytes: usize, tile_bytes: usize },
    #[error("Reservation of {requested} slots exceeds staging capacity of {capacity}")]
    ReservationTooLarge { requested: usize, capacity: usize },
    #[error("Reservation already active on staging buffer {id:?}")]
    ReservationActive { id: BufferId },
    #[error("No reservation active on staging buffer {id:?}")]
    NoReservation { id: BufferId },
    #[error("Publish of {published} slots does not match reservation of {reserved}")]
    PublishMismatch { published: usize, reserved: usize },
    #[error("Wait for {requested} slots does not match published group of {available}")]
    GroupSizeMismatch { requested: usize, available: usize },
    #[error("Filled group already held on staging buffer {id:?}")]
    GroupAlreadyHeld { id: BufferId },
    #[error("No filled group held on staging buffer {id:?}")]
    NoFilledGroup { id: BufferId },
    #[error("Release of {released} slots does not match drained group of {held}")]
    ReleaseMismatch { released: usize, held: usize },
    #[error("Staging buffer {id:?} counterpart disconnected")]
    Disconnected { id: BufferId },
}
