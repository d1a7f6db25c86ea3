#![cfg(test)]

use super::*;

#[test]
fn tile_reads_and_writes_roundtrip() {
    let mut dram = DramTensor::new(4, 8);
    dram.write_tile(2, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

    let mut tile = [0u8; 8];
    dram.read_tile(2, &mut tile).unwrap();
    assert_eq!(tile, [1, 2, 3, 4, 5, 6, 7, 8]);

    let mut untouched = [0u8; 8];
    dram.read_tile(1, &mut untouched).unwrap();
    assert_eq!(untouched, [0u8; 8]);
}

#[test]
fn partial_writes_leave_the_tail_alone() {
    let mut dram = DramTensor::from_bytes(vec![0xAB; 4 * 8], 0, 8);
    dram.write_tile(1, &[1, 2, 3]).unwrap();

    assert_eq!(&dram.data()[8..11], &[1, 2, 3]);
    assert!(dram.data()[11..16].iter().all(|&b| b == 0xAB));
}

#[test]
fn out_of_range_tiles_are_rejected() {
    let dram = DramTensor::new(4, 8);
    let mut tile = [0u8; 8];
    assert!(matches!(
        dram.read_tile(4, &mut tile),
        Err(TileFlowError::TileOutOfRange { tile_id: 4, .. })
    ));

    let mut oversized = [0u8; 9];
    assert!(matches!(
        dram.read_tile(0, &mut oversized),
        Err(TileFlowError::TransferTooLong { len: 9, tile_bytes: 8 })
    ));
}

#[test]
fn base_offset_shifts_tile_zero() {
    let mut data = vec![0u8; 3 * 4];
    data[4..8].copy_from_slice(&[9, 9, 9, 9]);
    let dram = DramTensor::from_bytes(data, 4, 4);

    let mut tile = [0u8; 4];
    dram.read_tile(0, &mut tile).unwrap();
    assert_eq!(tile, [9, 9, 9, 9]);
    // Only two full tiles fit past the base.
    assert!(dram.read_tile(2, &mut tile).is_err());
}

#[test]
fn tokens_retire_in_order() {
    let mut queue = TransferQueue::new();
    let src = DramTensor::new(4, 8);
    let mut buf = [0u8; 8];

    let first = queue.read_tile(&src, 0, &mut buf).unwrap();
    let second = queue.read_tile(&src, 1, &mut buf).unwrap();
    let third = queue.read_tile(&src, 2, &mut buf).unwrap();
    assert_eq!(queue.in_flight(), 3);

    // Completing the middle token retires it and everything before it.
    queue.complete(second);
    assert_eq!(queue.in_flight(), 1);
    queue.complete(first);
    assert_eq!(queue.in_flight(), 1);

    queue.complete(third);
    assert_eq!(queue.in_flight(), 0);
    assert_eq!(queue.barrier(), 0);
    assert_eq!(queue.bytes_moved(), 24);
}

#[test]
fn barrier_retires_everything_outstanding() {
    let mut queue = TransferQueue::new();
    let mut dst = DramTensor::new(2, 4);

    queue.write_tile(&mut dst, 0, &[1, 2, 3, 4]).unwrap();
    queue.write_tile(&mut dst, 1, &[5, 6]).unwrap();
    assert_eq!(queue.in_flight(), 2);
    assert_eq!(queue.barrier(), 2);
    assert_eq!(queue.in_flight(), 0);
    assert_eq!(queue.bytes_moved(), 6);
}
