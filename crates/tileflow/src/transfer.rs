//! Backing storage and the asynchronous transfer model.
//!
//! `DramTensor` resolves tile ids to byte ranges over an owned, bounds-checked
//! buffer. `TransferQueue` models the transfer engine: a submission returns a
//! token immediately, and `complete`/`barrier` are the only points where the
//! issuing stage observes completion. Stages must not act on transferred data
//! before one of those points.

use crate::error::TileFlowError;

/// Flat tile-granular backing storage for one tensor.
///
/// Constructed once per tensor from the planner's layout: a base byte offset
/// and a fixed per-tile stride. Packed tiles occupy a prefix of their stride.
#[derive(Debug, Clone)]
pub struct DramTensor {
    data: Vec<u8>,
    base: usize,
    tile_bytes: usize,
}

impl DramTensor {
    /// Zero-filled storage for `num_tiles` tiles.
    pub fn new(num_tiles: usize, tile_bytes: usize) -> Self {
        Self {
            data: vec![0; num_tiles * tile_bytes],
            base: 0,
            tile_bytes,
        }
    }

    /// Wraps existing bytes; tile id 0 starts at `base`.
    pub fn from_bytes(data: Vec<u8>, base: usize, tile_bytes: usize) -> Self {
        Self { data, base, tile_bytes }
    }

    #[inline]
    pub fn tile_bytes(&self) -> usize {
        self.tile_bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Resolves a tile id to the byte offset of its first `len` bytes.
    fn resolve(&self, tile_id: u32, len: usize) -> Result<usize, TileFlowError> {
        if len > self.tile_bytes {
            return Err(TileFlowError::TransferTooLong {
                len,
                tile_bytes: self.tile_bytes,
            });
        }
        let offset = self.base + tile_id as usize * self.tile_bytes;
        let end = offset + len;
        if end > self.data.len() {
            return Err(TileFlowError::TileOutOfRange {
                tile_id,
                offset,
                end,
                len: self.data.len(),
            });
        }
        Ok(offset)
    }

    pub fn read_tile(&self, tile_id: u32, dst: &mut [u8]) -> Result<(), TileFlowError> {
        let offset = self.resolve(tile_id, dst.len())?;
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    /// Writes `src.len()` bytes at the tile's offset. Packed writes cover
    /// less than the full stride and leave the remainder untouched.
    pub fn write_tile(&mut self, tile_id: u32, src: &[u8]) -> Result<(), TileFlowError> {
        let offset = self.resolve(tile_id, src.len())?;
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// Handle for one submitted transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferToken(u64);

/// Submit-then-await transfer engine for one stage.
#[derive(Debug, Default)]
pub struct TransferQueue {
    issued: u64,
    retired: u64,
    bytes_moved: u64,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a read of `dst.len()` bytes from the tile into `dst`.
    pub fn read_tile(
        &mut self,
        src: &DramTensor,
        tile_id: u32,
        dst: &mut [u8],
    ) -> Result<TransferToken, TileFlowError> {
        src.read_tile(tile_id, dst)?;
        self.bytes_moved += dst.len() as u64;
        let token = TransferToken(self.issued);
        self.issued += 1;
        Ok(token)
    }

    /// Issues a write of `src.len()` bytes to the tile.
    pub fn write_tile(
        &mut self,
        dst: &mut DramTensor,
        tile_id: u32,
        src: &[u8],
    ) -> Result<TransferToken, TileFlowError> {
        dst.write_tile(tile_id, src)?;
        self.bytes_moved += src.len() as u64;
        let token = TransferToken(self.issued);
        self.issued += 1;
        Ok(token)
    }

    /// Awaits one specific transfer. Transfers retire in submission order, so
    /// completing a token also completes everything issued before it.
    pub fn complete(&mut self, token: TransferToken) {
        self.retired = self.retired.max(token.0 + 1);
    }

    /// Awaits every outstanding transfer. Returns how many retired here.
    pub fn barrier(&mut self) -> u64 {
        let retired_now = self.issued - self.retired;
        self.retired = self.issued;
        retired_now
    }

    pub fn in_flight(&self) -> u64 {
        self.issued - self.retired
    }

    pub fn bytes_moved(&self) -> u64 {
        self.bytes_moved
    }
}

#[path = "transfer.test.rs"]
mod tests;
