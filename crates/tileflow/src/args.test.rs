#![cfg(test)]

use super::*;

fn reader_vector() -> Vec<u32> {
    vec![
        0x1000, 7, 1, 12, 3, 3, 2, 6, // in0
        0x2000, 9, 1, 4, 8, 4, 2, 8, // in1
        4,    // num_blocks
        24,   // MtKt
        16,   // KtNt
        2,    // batch
        1,    // bcast
        1, 0, // format flags
    ]
}

#[test]
fn reader_fields_decode_positionally() {
    let args = ReaderArgs::parse(&reader_vector()).unwrap();

    assert_eq!(args.in0.addr, 0x1000);
    assert_eq!(args.in0.start_tile_id, 7);
    assert_eq!(args.in0.stride_w, 1);
    assert_eq!(args.in0.stride_h, 12);
    assert_eq!(args.in0.next_block_stride, 3);
    assert_eq!(args.in0.block_w, 3);
    assert_eq!(args.in0.block_h, 2);
    assert_eq!(args.in0.block_num_tiles, 6);

    assert_eq!(args.in1.addr, 0x2000);
    assert_eq!(args.in1.block_num_tiles, 8);

    assert_eq!(args.num_blocks, 4);
    assert_eq!(args.in0_batch_stride, 24);
    assert_eq!(args.in1_batch_stride, 16);
    assert_eq!(args.batch, 2);
    assert!(args.bcast_in1);
    assert_eq!(args.in0_format, TileFormat::Mxfp4);
    assert_eq!(args.in1_format, TileFormat::Dense);
}

#[test]
fn reader_vector_length_is_a_fixed_contract() {
    let mut vector = reader_vector();
    vector.pop();
    assert!(matches!(
        ReaderArgs::parse(&vector),
        Err(TileFlowError::ArgumentCount { expected: 23, actual: 22 })
    ));

    vector.push(0);
    vector.push(0);
    assert!(matches!(
        ReaderArgs::parse(&vector),
        Err(TileFlowError::ArgumentCount { expected: 23, actual: 24 })
    ));
}

#[test]
fn declared_tile_counts_must_match_the_block_shape() {
    let mut vector = reader_vector();
    vector[7] = 5; // in0 declares 5 tiles for a 3x2 block
    assert!(matches!(
        ReaderArgs::parse(&vector),
        Err(TileFlowError::BlockShapeMismatch { declared: 5, w: 3, h: 2 })
    ));
}

#[test]
fn writer_fields_decode_positionally() {
    let vector = vec![0x3000, 5, 1, 8, 2, 16, 2, 2, 4, 4, 2, 32, 3, 1];
    let args = WriterArgs::parse(&vector).unwrap();

    assert_eq!(args.addr, 0x3000);
    assert_eq!(args.start_tile_id, 5);
    assert_eq!(args.stride_w, 1);
    assert_eq!(args.stride_h, 8);
    assert_eq!(args.next_subblock_stride_w, 2);
    assert_eq!(args.next_subblock_stride_h, 16);
    assert_eq!(args.subblock_w, 2);
    assert_eq!(args.subblock_h, 2);
    assert_eq!(args.subblock_tile_count, 4);
    assert_eq!(args.num_subblocks_w, 4);
    assert_eq!(args.num_subblocks_h, 2);
    assert_eq!(args.batch_stride, 32);
    assert_eq!(args.batch, 3);
    assert_eq!(args.format, TileFormat::Mxfp4);

    assert!(matches!(
        WriterArgs::parse(&vector[..13]),
        Err(TileFlowError::ArgumentCount { expected: 14, actual: 13 })
    ));
}
