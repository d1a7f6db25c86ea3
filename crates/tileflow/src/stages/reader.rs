use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    addressing::BlockCursor,
    args::ReaderArgs,
    codec::Mxfp4Codec,
    config::{TileFormat, TileGeometry},
    error::TileFlowError,
    staging::StagingProducer,
    transfer::{DramTensor, TransferQueue},
};

/// Totals from one reader run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderReport {
    pub blocks_streamed: u64,
    pub tiles_read: u64,
    pub bytes_read: u64,
}

/// Streams input tiles from backing storage into the in0/in1 staging
/// buffers, widening MXFP4 operands to dense f32 on the way in.
pub struct StreamReader {
    geometry: TileGeometry,
    codec: Mxfp4Codec,
    args: ReaderArgs,
    in0: Arc<DramTensor>,
    in1: Arc<DramTensor>,
    cb_in0: StagingProducer,
    cb_in1: StagingProducer,
    queue: TransferQueue,
}

impl StreamReader {
    pub fn new(
        geometry: TileGeometry,
        args: ReaderArgs,
        in0: Arc<DramTensor>,
        in1: Arc<DramTensor>,
        cb_in0: StagingProducer,
        cb_in1: StagingProducer,
    ) -> Result<Self, TileFlowError> {
        let tile_bytes = geometry.dense_bytes();
        for accessor in [&in0, &in1] {
            if accessor.tile_bytes() != tile_bytes {
                return Err(TileFlowError::AccessorStrideMismatch {
                    stride: accessor.tile_bytes(),
                    tile_bytes,
                });
            }
        }
        for cb in [&cb_in0, &cb_in1] {
            if cb.slot_bytes() != tile_bytes {
                return Err(TileFlowError::SlotSizeMismatch {
                    slot_bytes: cb.slot_bytes(),
                    tile_bytes,
                });
            }
        }
        Ok(Self {
            geometry,
            codec: Mxfp4Codec::new(geometry),
            args,
            in0,
            in1,
            cb_in0,
            cb_in1,
            queue: TransferQueue::new(),
        })
    }

    /// Runs the batch/block loop to completion.
    pub fn run(mut self) -> Result<ReaderReport, TileFlowError> {
        let tile_bytes = self.geometry.dense_bytes();
        let in0_tiles = self.args.in0.block_num_tiles as usize;
        let in1_tiles = self.args.in1.block_num_tiles as usize;
        let mut cur0 = BlockCursor::new(&self.args.in0, self.args.in0_batch_stride);
        let mut cur1 = BlockCursor::new(&self.args.in1, self.args.in1_batch_stride);
        let mut report = ReaderReport::default();

        for batch in 0..self.args.batch {
            cur0.begin_batch();
            cur1.begin_batch();
            for block in 0..self.args.num_blocks {
                self.cb_in0.reserve(in0_tiles)?;
                self.cb_in1.reserve(in1_tiles)?;

                report.tiles_read += fill_group(
                    &mut self.queue,
                    &self.codec,
                    &self.in0,
                    &cur0,
                    self.args.in0_format,
                    self.cb_in0.write_region()?,
                    tile_bytes,
                )?;
                cur0.advance_block();

                report.tiles_read += fill_group(
                    &mut self.queue,
                    &self.codec,
                    &self.in1,
                    &cur1,
                    self.args.in1_format,
                    self.cb_in1.write_region()?,
                    tile_bytes,
                )?;
                cur1.advance_block();

                let retired = self.queue.barrier();
                trace!(batch, block, retired, "reader block barrier");
                debug_assert_eq!(self.queue.in_flight(), 0);

                self.cb_in0.publish(in0_tiles)?;
                self.cb_in1.publish(in1_tiles)?;
                report.blocks_streamed += 1;
            }
            cur0.advance_batch();
            if !self.args.bcast_in1 {
                cur1.advance_batch();
            }
            debug!(batch, "reader batch complete");
        }

        report.bytes_read = self.queue.bytes_moved();
        Ok(report)
    }
}

/// Issues one read per tile of the current block into consecutive slots of
/// the reserved region, widening packed tiles as each one lands.
fn fill_group(
    queue: &mut TransferQueue,
    codec: &Mxfp4Codec,
    src: &DramTensor,
    cursor: &BlockCursor,
    format: TileFormat,
    region: &mut [u8],
    tile_bytes: usize,
) -> Result<u64, TileFlowError> {
    let mut offset = 0;
    let mut tiles = 0;
    for tile_id in cursor.tiles() {
        let slot = &mut region[offset..offset + tile_bytes];
        let token = queue.read_tile(src, tile_id, slot)?;
        if format.is_packed() {
            // Decode needs this tile's bytes now; the block-wide barrier
            // comes later, so await this one transfer by itself.
            queue.complete(token);
            codec.decode_tile_in_place(slot);
        }
        offset += tile_bytes;
        tiles += 1;
    }
    Ok(tiles)
}
