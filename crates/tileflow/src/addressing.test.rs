#![cfg(test)]

use std::collections::HashSet;

use super::*;
use crate::{args::ReaderArgs, config::TileFormat};

fn operand(start: u32, stride_w: u32, stride_h: u32, next_block: u32, w: u32, h: u32) -> OperandArgs {
    OperandArgs {
        addr: 0,
        start_tile_id: start,
        stride_w,
        stride_h,
        next_block_stride: next_block,
        block_w: w,
        block_h: h,
        block_num_tiles: w * h,
    }
}

#[test]
fn block_walk_is_row_major() {
    let cursor = BlockCursor::new(&operand(0, 1, 4, 2, 2, 2), 0);
    let ids: Vec<u32> = cursor.tiles().collect();
    assert_eq!(ids, vec![0, 1, 4, 5]);
    assert_eq!(cursor.tiles().len(), 4);
    assert_eq!(cursor.tiles_per_block(), 4);
}

#[test]
fn next_block_advances_the_saved_block_start() {
    let mut cursor = BlockCursor::new(&operand(0, 1, 4, 2, 2, 2), 0);
    cursor.advance_block();
    let ids: Vec<u32> = cursor.tiles().collect();
    assert_eq!(ids, vec![2, 3, 6, 7]);
}

#[test]
fn reader_visits_each_tile_exactly_once() {
    // 2x3 blocks over a 2x12 tile grid: 4 blocks per batch, 2 batches.
    let args = ReaderArgs {
        in0: operand(0, 1, 12, 3, 3, 2),
        in1: operand(0, 1, 12, 3, 3, 2),
        num_blocks: 4,
        in0_batch_stride: 24,
        in1_batch_stride: 24,
        batch: 2,
        bcast_in1: false,
        in0_format: TileFormat::Dense,
        in1_format: TileFormat::Dense,
    };

    let mut cursor = BlockCursor::new(&args.in0, args.in0_batch_stride);
    let mut visited = HashSet::new();
    let mut total = 0usize;
    for batch in 0..args.batch {
        cursor.begin_batch();
        for block in 0..args.num_blocks {
            for tile_id in cursor.tiles() {
                assert!(visited.insert((tile_id, batch, block)), "revisited tile {tile_id}");
                total += 1;
            }
            cursor.advance_block();
        }
        cursor.advance_batch();
    }

    assert_eq!(total, 2 * 3 * 4 * 2);
    assert_eq!(visited.len(), 48);
    // With unit column stride the walk covers tile ids 0..48 densely.
    let ids: HashSet<u32> = visited.iter().map(|&(id, _, _)| id).collect();
    assert_eq!(ids, (0..48).collect());
}

#[test]
fn broadcast_rewinds_without_advancing() {
    let mut cursor = BlockCursor::new(&operand(5, 1, 4, 2, 2, 2), 100);

    cursor.begin_batch();
    let first: Vec<u32> = cursor.tiles().collect();
    cursor.advance_block();

    // Broadcast operand: batch stride withheld, next batch replays the walk.
    cursor.begin_batch();
    let second: Vec<u32> = cursor.tiles().collect();
    assert_eq!(first, second);

    cursor.advance_batch();
    cursor.begin_batch();
    let third: Vec<u32> = cursor.tiles().collect();
    assert_eq!(third, vec![105, 106, 109, 110]);
}

#[test]
fn subblock_walk_matches_the_nested_order() {
    let args = WriterArgs {
        addr: 0,
        start_tile_id: 0,
        stride_w: 1,
        stride_h: 4,
        next_subblock_stride_w: 2,
        next_subblock_stride_h: 8,
        subblock_w: 2,
        subblock_h: 2,
        subblock_tile_count: 4,
        num_subblocks_w: 2,
        num_subblocks_h: 2,
        batch_stride: 16,
        batch: 2,
        format: TileFormat::Dense,
    };

    let mut cursor = SubblockCursor::new(&args);
    assert_eq!(cursor.tiles_per_subblock(), 4);
    let mut order = Vec::new();
    for _batch in 0..args.batch {
        cursor.begin_batch();
        for _sbh in 0..args.num_subblocks_h {
            cursor.begin_row();
            for _sbw in 0..args.num_subblocks_w {
                order.push(cursor.tiles().collect::<Vec<u32>>());
                cursor.advance_subblock();
            }
            cursor.advance_row();
        }
        cursor.advance_batch();
    }

    assert_eq!(
        order,
        vec![
            vec![0, 1, 4, 5],
            vec![2, 3, 6, 7],
            vec![8, 9, 12, 13],
            vec![10, 11, 14, 15],
            vec![16, 17, 20, 21],
            vec![18, 19, 22, 23],
            vec![24, 25, 28, 29],
            vec![26, 27, 30, 31],
        ]
    );
}

#[test]
fn empty_shapes_yield_no_tiles() {
    assert_eq!(BlockCursor::new(&operand(0, 1, 1, 1, 0, 3), 0).tiles().count(), 0);
    assert_eq!(BlockCursor::new(&operand(0, 1, 1, 1, 3, 0), 0).tiles().count(), 0);
}
