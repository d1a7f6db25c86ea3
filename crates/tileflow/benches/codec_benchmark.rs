use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use tileflow::{Mxfp4Codec, TileGeometry};

fn codec_benchmark(c: &mut Criterion) {
    let geometry = TileGeometry::new(1024).unwrap();
    let codec = Mxfp4Codec::new(geometry);
    let values: Vec<f32> = (0..geometry.elems()).map(|i| (i as f32).sin() * 4.0).collect();

    let mut packed = vec![0u8; geometry.packed_bytes()];
    codec.encode_tile(&values, &mut packed);

    let mut group = c.benchmark_group("mxfp4");
    group.throughput(Throughput::Bytes(geometry.dense_bytes() as u64));

    group.bench_function("encode_tile", |b| {
        let mut out = vec![0u8; geometry.packed_bytes()];
        b.iter(|| codec.encode_tile(black_box(&values), &mut out));
    });

    group.bench_function("decode_tile", |b| {
        let mut out = vec![0.0f32; geometry.elems()];
        b.iter(|| codec.decode_tile(black_box(&packed), &mut out));
    });

    group.bench_function("decode_tile_in_place", |b| {
        let mut tile = vec![0u8; geometry.dense_bytes()];
        b.iter(|| {
            tile[..packed.len()].copy_from_slice(&packed);
            codec.decode_tile_in_place(black_box(&mut tile));
        });
    });

    group.finish();
}

criterion_group!(benches, codec_benchmark);
criterion_main!(benches);
