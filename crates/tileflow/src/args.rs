//! Positional kernel-argument vectors.
//!
//! The host-side planner hands each stage an ordered list of u32 values
//! consumed by index. Position and count are a fixed contract: adding a field
//! shifts every later index on both sides.

use crate::{config::TileFormat, error::TileFlowError};

pub const READER_ARG_COUNT: usize = 23;
pub const WRITER_ARG_COUNT: usize = 14;

/// Base address, walk strides, and block shape for one reader-side operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandArgs {
    pub addr: u32,
    pub start_tile_id: u32,
    pub stride_w: u32,
    pub stride_h: u32,
    pub next_block_stride: u32,
    pub block_w: u32,
    pub block_h: u32,
    pub block_num_tiles: u32,
}

impl OperandArgs {
    fn parse(args: &[u32]) -> Result<Self, TileFlowError> {
        debug_assert_eq!(args.len(), 8);
        let operand = Self {
            addr: args[0],
            start_tile_id: args[1],
            stride_w: args[2],
            stride_h: args[3],
            next_block_stride: args[4],
            block_w: args[5],
            block_h: args[6],
            block_num_tiles: args[7],
        };
        if operand.block_num_tiles != operand.block_w.wrapping_mul(operand.block_h) {
            return Err(TileFlowError::BlockShapeMismatch {
                declared: operand.block_num_tiles,
                w: operand.block_w,
                h: operand.block_h,
            });
        }
        Ok(operand)
    }
}

/// Reader argument vector, indices 0..=22.
#[derive(Debug, Clone, Copy)]
pub struct ReaderArgs {
    pub in0: OperandArgs,
    pub in1: OperandArgs,
    pub num_blocks: u32,
    /// Batch stride for in0 (MtKt). Applied every batch.
    pub in0_batch_stride: u32,
    /// Batch stride for in1 (KtNt). Skipped when `bcast_in1` is set.
    pub in1_batch_stride: u32,
    pub batch: u32,
    pub bcast_in1: bool,
    pub in0_format: TileFormat,
    pub in1_format: TileFormat,
}

impl ReaderArgs {
    pub fn parse(args: &[u32]) -> Result<Self, TileFlowError> {
        let args: &[u32; READER_ARG_COUNT] =
            args.try_into().map_err(|_| TileFlowError::ArgumentCount {
                expected: READER_ARG_COUNT,
                actual: args.len(),
            })?;
        Ok(Self {
            in0: OperandArgs::parse(&args[0..8])?,
            in1: OperandArgs::parse(&args[8..16])?,
            num_blocks: args[16],
            in0_batch_stride: args[17],
            in1_batch_stride: args[18],
            batch: args[19],
            bcast_in1: args[20] != 0,
            in0_format: TileFormat::from_flag(args[21]),
            in1_format: TileFormat::from_flag(args[22]),
        })
    }
}

/// Writer argument vector, indices 0..=13.
#[derive(Debug, Clone, Copy)]
pub struct WriterArgs {
    pub addr: u32,
    pub start_tile_id: u32,
    pub stride_w: u32,
    pub stride_h: u32,
    pub next_subblock_stride_w: u32,
    pub next_subblock_stride_h: u32,
    pub subblock_w: u32,
    pub subblock_h: u32,
    pub subblock_tile_count: u32,
    pub num_subblocks_w: u32,
    pub num_subblocks_h: u32,
    /// Batch stride (MtNt).
    pub batch_stride: u32,
    pub batch: u32,
    pub format: TileFormat,
}

impl WriterArgs {
    pub fn parse(args: &[u32]) -> Result<Self, TileFlowError> {
        let args: &[u32; WRITER_ARG_COUNT] =
            args.try_into().map_err(|_| TileFlowError::ArgumentCount {
                expected: WRITER_ARG_COUNT,
                actual: args.len(),
            })?;
        let parsed = Self {
            addr: args[0],
            start_tile_id: args[1],
            stride_w: args[2],
            stride_h: args[3],
            next_subblock_stride_w: args[4],
            next_subblock_stride_h: args[5],
            subblock_w: args[6],
            subblock_h: args[7],
            subblock_tile_count: args[8],
            num_subblocks_w: args[9],
            num_subblocks_h: args[10],
            batch_stride: args[11],
            batch: args[12],
            format: TileFormat::from_flag(args[13]),
        };
        if parsed.subblock_tile_count != parsed.subblock_w.wrapping_mul(parsed.subblock_h) {
            return Err(TileFlowError::BlockShapeMismatch {
                declared: parsed.subblock_tile_count,
                w: parsed.subblock_w,
                h: parsed.subblock_h,
            });
        }
        Ok(parsed)
    }
}

#[path = "args.test.rs"]
mod tests;
