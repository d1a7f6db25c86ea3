//! Deterministic tile-id walks.
//!
//! Cursors hold only stride configuration and the saved start-of-axis ids;
//! they never touch storage. Tile-id arithmetic wraps at u32 like the device
//! counters it models.

use crate::args::{OperandArgs, WriterArgs};

/// Reader-side walk: batch, then block, then row, then column.
///
/// `tiles()` yields the current block row-major; `advance_block` moves the
/// saved block start by the next-block stride; `begin_batch` rewinds the
/// block start to the batch start.
#[derive(Debug, Clone)]
pub struct BlockCursor {
    stride_w: u32,
    stride_h: u32,
    next_block_stride: u32,
    batch_stride: u32,
    block_w: u32,
    block_h: u32,
    batch_start: u32,
    block_start: u32,
}

impl BlockCursor {
    pub fn new(operand: &OperandArgs, batch_stride: u32) -> Self {
        Self {
            stride_w: operand.stride_w,
            stride_h: operand.stride_h,
            next_block_stride: operand.next_block_stride,
            batch_stride,
            block_w: operand.block_w,
            block_h: operand.block_h,
            batch_start: operand.start_tile_id,
            block_start: operand.start_tile_id,
        }
    }

    #[inline]
    pub fn begin_batch(&mut self) {
        self.block_start = self.batch_start;
    }

    #[inline]
    pub fn advance_block(&mut self) {
        self.block_start = self.block_start.wrapping_add(self.next_block_stride);
    }

    #[inline]
    pub fn advance_batch(&mut self) {
        self.batch_start = self.batch_start.wrapping_add(self.batch_stride);
    }

    #[inline]
    pub fn tiles_per_block(&self) -> usize {
        (self.block_w as usize) * (self.block_h as usize)
    }

    pub fn tiles(&self) -> TileWalk {
        TileWalk::new(self.block_start, self.stride_w, self.stride_h, self.block_w, self.block_h)
    }
}

/// Writer-side walk: batch, then subblock-row, then subblock-column, then
/// row, then column within the subblock.
#[derive(Debug, Clone)]
pub struct SubblockCursor {
    stride_w: u32,
    stride_h: u32,
    next_subblock_stride_w: u32,
    next_subblock_stride_h: u32,
    batch_stride: u32,
    subblock_w: u32,
    subblock_h: u32,
    batch_start: u32,
    row_start: u32,
    subblock_start: u32,
}

impl SubblockCursor {
    pub fn new(args: &WriterArgs) -> Self {
        Self {
            stride_w: args.stride_w,
            stride_h: args.stride_h,
            next_subblock_stride_w: args.next_subblock_stride_w,
            next_subblock_stride_h: args.next_subblock_stride_h,
            batch_stride: args.batch_stride,
            subblock_w: args.subblock_w,
            subblock_h: args.subblock_h,
            batch_start: args.start_tile_id,
            row_start: args.start_tile_id,
            subblock_start: args.start_tile_id,
        }
    }

    #[inline]
    pub fn begin_batch(&mut self) {
        self.row_start = self.batch_start;
        self.subblock_start = self.batch_start;
    }

    #[inline]
    pub fn begin_row(&mut self) {
        self.subblock_start = self.row_start;
    }

    #[inline]
    pub fn advance_subblock(&mut self) {
        self.subblock_start = self.subblock_start.wrapping_add(self.next_subblock_stride_w);
    }

    #[inline]
    pub fn advance_row(&mut self) {
        self.row_start = self.row_start.wrapping_add(self.next_subblock_stride_h);
    }

    #[inline]
    pub fn advance_batch(&mut self) {
        self.batch_start = self.batch_start.wrapping_add(self.batch_stride);
    }

    #[inline]
    pub fn tiles_per_subblock(&self) -> usize {
        (self.subblock_w as usize) * (self.subblock_h as usize)
    }

    pub fn tiles(&self) -> TileWalk {
        TileWalk::new(
            self.subblock_start,
            self.stride_w,
            self.stride_h,
            self.subblock_w,
            self.subblock_h,
        )
    }
}

/// Row-major tile ids of one block or subblock: `h` rows stepped by the row
/// stride, `w` ids per row stepped by the column stride.
pub struct TileWalk {
    stride_w: u32,
    stride_h: u32,
    width: u32,
    rows_left: u32,
    row_start: u32,
    tile_id: u32,
    col: u32,
}

impl TileWalk {
    fn new(start: u32, stride_w: u32, stride_h: u32, width: u32, height: u32) -> Self {
        Self {
            stride_w,
            stride_h,
            width,
            rows_left: if width == 0 { 0 } else { height },
            row_start: start,
            tile_id: start,
            col: 0,
        }
    }
}

impl Iterator for TileWalk {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.rows_left == 0 {
            return None;
        }
        let id = self.tile_id;
        self.col += 1;
        if self.col == self.width {
            self.col = 0;
            self.rows_left -= 1;
            self.row_start = self.row_start.wrapping_add(self.stride_h);
            self.tile_id = self.row_start;
        } else {
            self.tile_id = self.tile_id.wrapping_add(self.stride_w);
        }
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows_left as usize * self.width as usize - self.col as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileWalk {}

#[path = "addressing.test.rs"]
mod tests;
