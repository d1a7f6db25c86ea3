use tracing::{debug, trace, warn};

use crate::{
    addressing::SubblockCursor,
    args::WriterArgs,
    codec::Mxfp4Codec,
    config::{TileFormat, TileGeometry},
    error::TileFlowError,
    staging::StagingConsumer,
    transfer::{DramTensor, TransferQueue},
};

/// Totals from one writer run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterReport {
    pub subblocks_drained: u64,
    pub tiles_written: u64,
    pub packed_tiles: u64,
    pub bytes_written: u64,
    pub underflowed_values: u64,
}

/// Drains output tiles from the staging buffer into backing storage,
/// narrowing to MXFP4 when the destination is flagged packed.
pub struct StreamWriter {
    geometry: TileGeometry,
    codec: Mxfp4Codec,
    args: WriterArgs,
    out: DramTensor,
    cb_out: StagingConsumer,
    queue: TransferQueue,
    /// Packed encode scratch, sized by the derived per-tile packed footprint.
    scratch: Vec<u8>,
    values: Vec<f32>,
}

impl StreamWriter {
    pub fn new(
        geometry: TileGeometry,
        args: WriterArgs,
        out: DramTensor,
        cb_out: StagingConsumer,
    ) -> Result<Self, TileFlowError> {
        let tile_bytes = geometry.dense_bytes();
        if out.tile_bytes() != tile_bytes {
            return Err(TileFlowError::AccessorStrideMismatch {
                stride: out.tile_bytes(),
                tile_bytes,
            });
        }
        if cb_out.slot_bytes() != tile_bytes {
            return Err(TileFlowError::SlotSizeMismatch {
                slot_bytes: cb_out.slot_bytes(),
                tile_bytes,
            });
        }
        Ok(Self {
            geometry,
            codec: Mxfp4Codec::new(geometry),
            args,
            out,
            cb_out,
            queue: TransferQueue::new(),
            scratch: vec![0; geometry.packed_bytes()],
            values: vec![0.0; geometry.elems()],
        })
    }

    /// Runs the batch/subblock loop to completion and hands the written
    /// tensor back.
    pub fn run(mut self) -> Result<(DramTensor, WriterReport), TileFlowError> {
        let tile_bytes = self.geometry.dense_bytes();
        let group = self.args.subblock_tile_count as usize;
        let mut cursor = SubblockCursor::new(&self.args);
        let mut report = WriterReport::default();

        for batch in 0..self.args.batch {
            cursor.begin_batch();
            for sbh in 0..self.args.num_subblocks_h {
                cursor.begin_row();
                for sbw in 0..self.args.num_subblocks_w {
                    self.cb_out.wait(group)?;
                    drain_subblock(
                        &mut self.queue,
                        &self.codec,
                        &mut self.out,
                        &cursor,
                        self.args.format,
                        self.cb_out.read_region()?,
                        tile_bytes,
                        &mut self.scratch,
                        &mut self.values,
                        &mut report,
                    )?;

                    let retired = self.queue.barrier();
                    trace!(batch, sbh, sbw, retired, "writer subblock barrier");
                    debug_assert_eq!(self.queue.in_flight(), 0);

                    self.cb_out.release(group)?;
                    report.subblocks_drained += 1;
                    cursor.advance_subblock();
                }
                cursor.advance_row();
            }
            cursor.advance_batch();
            debug!(batch, "writer batch complete");
        }

        report.bytes_written = self.queue.bytes_moved();
        if report.underflowed_values > 0 {
            warn!(
                underflowed = report.underflowed_values,
                "encode zeroed values below the shared-exponent window"
            );
        }
        Ok((self.out, report))
    }
}

/// Issues one write per tile of the current subblock from consecutive slots
/// of the drained region.
#[allow(clippy::too_many_arguments)]
fn drain_subblock(
    queue: &mut TransferQueue,
    codec: &Mxfp4Codec,
    out: &mut DramTensor,
    cursor: &SubblockCursor,
    format: TileFormat,
    region: &[u8],
    tile_bytes: usize,
    scratch: &mut [u8],
    values: &mut [f32],
    report: &mut WriterReport,
) -> Result<(), TileFlowError> {
    let mut offset = 0;
    for tile_id in cursor.tiles() {
        let tile = &region[offset..offset + tile_bytes];
        if format.is_packed() {
            for (value, chunk) in values.iter_mut().zip(tile.chunks_exact(4)) {
                *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            let stats = codec.encode_tile(values, scratch);
            report.underflowed_values += u64::from(stats.underflowed);
            // Only the packed byte count goes out, not the dense stride.
            queue.write_tile(out, tile_id, scratch)?;
            report.packed_tiles += 1;
        } else {
            queue.write_tile(out, tile_id, tile)?;
        }
        report.tiles_written += 1;
        offset += tile_bytes;
    }
    Ok(())
}
