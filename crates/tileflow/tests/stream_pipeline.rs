//! End-to-end pipeline runs: reader and writer on their own threads, a
//! passthrough compute stage between them, synchronized only through the
//! staging buffers.

use std::{sync::Arc, thread};

use tileflow::{
    CB_IN0, CB_IN1, CB_OUT, DramTensor, Mxfp4Codec, ReaderArgs, StreamReader, StreamWriter,
    TileGeometry, WriterArgs, staging_pair,
};

const TILE_ELEMS: usize = 64;
const TILE_BYTES: usize = TILE_ELEMS * 4;

/// 2 batches of 2 blocks; each in0 block is 2x2 tiles of a 2x4 tile grid,
/// each in1 block is 2x1 tiles of a 4x1 grid.
fn reader_vector(in0_packed: u32, bcast: u32) -> Vec<u32> {
    vec![
        0, 0, 1, 4, 2, 2, 2, 4, // in0
        0, 0, 1, 1, 2, 1, 2, 2, // in1
        2, // num_blocks
        8, 4, // batch strides
        2, bcast, // batch, broadcast
        in0_packed, 0, // format flags
    ]
}

/// Writer covering the same 2x4 grid as two 2x2 subblocks per batch; the
/// walk visits exactly the tile ids the reader streams, in the same order.
fn writer_vector(packed: u32) -> Vec<u32> {
    vec![0, 0, 1, 4, 2, 16, 2, 2, 4, 2, 1, 8, 2, packed]
}

/// Tile ids of pipeline round `round` (batch-major, then block/subblock).
fn group_ids(round: usize) -> [u32; 4] {
    let base = (round / 2 * 8 + round % 2 * 2) as u32;
    [base, base + 1, base + 4, base + 5]
}

fn tile_values(tile_id: u32) -> Vec<f32> {
    (0..TILE_ELEMS)
        .map(|i| (tile_id as f32 + 1.0) * (0.25 * i as f32 - 4.0))
        .collect()
}

fn to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn dense_dram(num_tiles: usize, seed: u32) -> DramTensor {
    let mut dram = DramTensor::new(num_tiles, TILE_BYTES);
    for tile_id in 0..num_tiles as u32 {
        dram.write_tile(tile_id, &to_bytes(&tile_values(tile_id ^ seed))).unwrap();
    }
    dram
}

#[test]
fn dense_pipeline_streams_every_tile_end_to_end() {
    let geometry = TileGeometry::new(TILE_ELEMS).unwrap();
    let reader_args = ReaderArgs::parse(&reader_vector(0, 0)).unwrap();
    let writer_args = WriterArgs::parse(&writer_vector(0)).unwrap();

    let in0 = Arc::new(dense_dram(16, 0));
    let in1 = Arc::new(dense_dram(8, 0x55));
    let expected = in0.data().to_vec();

    let (p0, mut c0) = staging_pair(CB_IN0, TILE_BYTES, 8);
    let (p1, mut c1) = staging_pair(CB_IN1, TILE_BYTES, 4);
    let (mut po, co) = staging_pair(CB_OUT, TILE_BYTES, 8);

    let reader = StreamReader::new(geometry, reader_args, in0, in1, p0, p1).unwrap();
    let writer = StreamWriter::new(geometry, writer_args, DramTensor::new(16, TILE_BYTES), co).unwrap();

    let reader_handle = thread::spawn(move || reader.run());
    let writer_handle = thread::spawn(move || writer.run());

    // Passthrough compute: forward each in0 block to the output, drop in1.
    for _round in 0..4 {
        c0.wait(4).unwrap();
        c1.wait(2).unwrap();
        po.reserve(4).unwrap();
        po.write_region().unwrap().copy_from_slice(c0.read_region().unwrap());
        po.publish(4).unwrap();
        c0.release(4).unwrap();
        c1.release(2).unwrap();
    }
    drop(po);

    let reader_report = reader_handle.join().unwrap().unwrap();
    let (out, writer_report) = writer_handle.join().unwrap().unwrap();

    assert_eq!(out.data(), expected.as_slice());

    assert_eq!(reader_report.blocks_streamed, 4);
    assert_eq!(reader_report.tiles_read, 4 * (4 + 2));
    assert_eq!(reader_report.bytes_read, (4 * (4 + 2) * TILE_BYTES) as u64);
    assert_eq!(writer_report.subblocks_drained, 4);
    assert_eq!(writer_report.tiles_written, 16);
    assert_eq!(writer_report.packed_tiles, 0);
    assert_eq!(writer_report.bytes_written, (16 * TILE_BYTES) as u64);
}

fn captured_in1_rounds(bcast: u32) -> Vec<Vec<u8>> {
    let geometry = TileGeometry::new(TILE_ELEMS).unwrap();
    let reader_args = ReaderArgs::parse(&reader_vector(0, bcast)).unwrap();

    let in0 = Arc::new(dense_dram(16, 0));
    let in1 = Arc::new(dense_dram(8, 0x55));

    let (p0, mut c0) = staging_pair(CB_IN0, TILE_BYTES, 8);
    let (p1, mut c1) = staging_pair(CB_IN1, TILE_BYTES, 4);

    let reader = StreamReader::new(geometry, reader_args, in0, in1, p0, p1).unwrap();
    let handle = thread::spawn(move || reader.run());

    let mut captured = Vec::new();
    for _round in 0..4 {
        c0.wait(4).unwrap();
        c1.wait(2).unwrap();
        captured.push(c1.read_region().unwrap().to_vec());
        c0.release(4).unwrap();
        c1.release(2).unwrap();
    }
    handle.join().unwrap().unwrap();
    captured
}

#[test]
fn broadcast_in1_replays_the_first_batch() {
    let replayed = captured_in1_rounds(1);
    assert_eq!(replayed[0], replayed[2]);
    assert_eq!(replayed[1], replayed[3]);

    let advanced = captured_in1_rounds(0);
    assert_ne!(advanced[0], advanced[2]);
    assert_ne!(advanced[1], advanced[3]);
}

#[test]
fn packed_inputs_are_widened_before_publish() {
    let geometry = TileGeometry::new(TILE_ELEMS).unwrap();
    let codec = Mxfp4Codec::new(geometry);
    let reader_args = ReaderArgs::parse(&reader_vector(1, 0)).unwrap();

    // in0 tiles hold packed MXFP4 data in the front of each tile stride.
    let mut in0 = DramTensor::new(16, TILE_BYTES);
    let mut widened = Vec::new();
    for tile_id in 0..16u32 {
        let mut packed = vec![0u8; geometry.packed_bytes()];
        codec.encode_tile(&tile_values(tile_id), &mut packed);
        in0.write_tile(tile_id, &packed).unwrap();

        let mut dense = vec![0.0f32; TILE_ELEMS];
        codec.decode_tile(&packed, &mut dense);
        widened.push(to_bytes(&dense));
    }

    let (p0, mut c0) = staging_pair(CB_IN0, TILE_BYTES, 8);
    let (p1, mut c1) = staging_pair(CB_IN1, TILE_BYTES, 4);
    let reader = StreamReader::new(
        geometry,
        reader_args,
        Arc::new(in0),
        Arc::new(dense_dram(8, 0)),
        p0,
        p1,
    )
    .unwrap();
    let handle = thread::spawn(move || reader.run());

    for round in 0..4 {
        c0.wait(4).unwrap();
        c1.wait(2).unwrap();
        let region = c0.read_region().unwrap();
        for (slot, tile_id) in group_ids(round).into_iter().enumerate() {
            assert_eq!(
                &region[slot * TILE_BYTES..(slot + 1) * TILE_BYTES],
                widened[tile_id as usize].as_slice(),
                "tile {tile_id} arrived in staging still packed or mangled"
            );
        }
        c0.release(4).unwrap();
        c1.release(2).unwrap();
    }
    handle.join().unwrap().unwrap();
}

#[test]
fn packed_outputs_write_exactly_the_packed_byte_count() {
    let geometry = TileGeometry::new(TILE_ELEMS).unwrap();
    let codec = Mxfp4Codec::new(geometry);
    let writer_args = WriterArgs::parse(&writer_vector(1)).unwrap();

    // Tile 0 carries a 2^16 spread to force window underflow.
    let values_for = |tile_id: u32| -> Vec<f32> {
        let mut values = tile_values(tile_id);
        if tile_id == 0 {
            values[0] = 65536.0;
            values[1] = 1.0;
        }
        values
    };

    let sentinel = DramTensor::from_bytes(vec![0xAB; 16 * TILE_BYTES], 0, TILE_BYTES);
    let (mut po, co) = staging_pair(CB_OUT, TILE_BYTES, 8);
    let writer = StreamWriter::new(geometry, writer_args, sentinel, co).unwrap();
    let handle = thread::spawn(move || writer.run());

    for round in 0..4 {
        po.reserve(4).unwrap();
        let region = po.write_region().unwrap();
        for (slot, tile_id) in group_ids(round).into_iter().enumerate() {
            region[slot * TILE_BYTES..(slot + 1) * TILE_BYTES]
                .copy_from_slice(&to_bytes(&values_for(tile_id)));
        }
        po.publish(4).unwrap();
    }
    drop(po);

    let (out, report) = handle.join().unwrap().unwrap();
    assert_eq!(report.packed_tiles, 16);
    assert_eq!(report.bytes_written, (16 * geometry.packed_bytes()) as u64);
    assert!(report.underflowed_values >= 1);

    for tile_id in 0..16u32 {
        let mut packed = vec![0u8; geometry.packed_bytes()];
        codec.encode_tile(&values_for(tile_id), &mut packed);

        let offset = tile_id as usize * TILE_BYTES;
        let tile = &out.data()[offset..offset + TILE_BYTES];
        assert_eq!(&tile[..geometry.packed_bytes()], packed.as_slice());
        assert!(
            tile[geometry.packed_bytes()..].iter().all(|&b| b == 0xAB),
            "tile {tile_id} wrote past its packed footprint"
        );
    }
}
