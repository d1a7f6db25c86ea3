use serde::{Deserialize, Serialize};

use crate::{
    codec::{MXFP4_BLOCK_BYTES, MXFP4_BLOCK_VALUES},
    error::TileFlowError,
};

/// Element count and derived byte sizes of one tile. Shared by every
/// component of a pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGeometry {
    elems: usize,
}

impl TileGeometry {
    /// A tile must decompose into whole MXFP4 blocks.
    pub fn new(elems: usize) -> Result<Self, TileFlowError> {
        if elems == 0 || elems % MXFP4_BLOCK_VALUES != 0 {
            return Err(TileFlowError::InvalidTileSize { elems });
        }
        Ok(Self { elems })
    }

    #[inline]
    pub fn elems(&self) -> usize {
        self.elems
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.elems / MXFP4_BLOCK_VALUES
    }

    #[inline]
    pub fn dense_bytes(&self) -> usize {
        self.elems * std::mem::size_of::<f32>()
    }

    /// Packed footprint of a whole tile: 5 words per 32-value block.
    #[inline]
    pub fn packed_bytes(&self) -> usize {
        self.num_blocks() * MXFP4_BLOCK_BYTES
    }
}

/// On-storage representation of a tensor's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileFormat {
    Dense,
    Mxfp4,
}

impl TileFormat {
    /// Maps the positional `is_mxfp4` kernel argument.
    #[inline]
    pub fn from_flag(flag: u32) -> Self {
        if flag != 0 { TileFormat::Mxfp4 } else { TileFormat::Dense }
    }

    #[inline]
    pub fn is_packed(&self) -> bool {
        matches!(self, TileFormat::Mxfp4)
    }
}

/// Tag distinguishing independent staging buffer instances within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u32);

pub const CB_IN0: BufferId = BufferId(0);
pub const CB_IN1: BufferId = BufferId(1);
pub const CB_OUT: BufferId = BufferId(16);

#[path = "config.test.rs"]
mod tests;
