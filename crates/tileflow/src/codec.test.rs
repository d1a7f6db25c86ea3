#![cfg(test)]

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::*;

fn geometry(elems: usize) -> TileGeometry {
    TileGeometry::new(elems).unwrap()
}

fn block_of(values: &[(usize, f32)]) -> Vec<f32> {
    let mut block = vec![0.0f32; MXFP4_BLOCK_VALUES];
    for &(i, v) in values {
        block[i] = v;
    }
    block
}

#[test]
fn zero_values_stay_zero_through_roundtrip() {
    let block = block_of(&[(1, 1.5), (7, 3.0), (30, 6.0)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    encode_block(&block, &mut words);
    let mut decoded = [0.0f32; MXFP4_BLOCK_VALUES];
    decode_block(&words, &mut decoded);

    for (i, v) in decoded.iter().enumerate() {
        if block[i] == 0.0 {
            assert_eq!(v.to_bits(), 0, "slot {i} must decode to +0.0");
        }
    }
}

#[test]
fn header_stores_block_max_exponent() {
    // exponent fields: 0.75 -> 126, 2.5 -> 128, -0.5 -> 126 (sign ignored)
    let block = block_of(&[(0, 0.75), (5, 2.5), (9, -0.5)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    encode_block(&block, &mut words);
    assert_eq!(words[0] >> 24, 128);
}

#[test]
fn power_of_two_mantissas_quantize_to_zero_below_block_max() {
    // The documented lossy contract: 1.0, 2.0, 4.0 all carry zero mantissa
    // bits, so only the shared exponent (129, from 4.0) survives encoding.
    let block = block_of(&[(1, 1.0), (2, 2.0), (4, 4.0)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    encode_block(&block, &mut words);

    assert_eq!(words[0] >> 24, 129);
    assert_eq!(&words[1..], &[0u32; 4], "all stored nibbles are zero");

    let mut decoded = [0.0f32; MXFP4_BLOCK_VALUES];
    decode_block(&words, &mut decoded);
    assert!(decoded.iter().all(|v| v.to_bits() == 0));
}

#[test]
fn shifted_mantissas_reconstruct_bit_for_bit() {
    // 1.5 (exp 127, top-4 mantissa 8), 3.0 (exp 128), 6.0 (exp 129).
    // exp_diffs against the 129 header are 2, 1, 0, so the stored nibbles
    // are 2, 4, 8 and decode re-attaches them under exponent 129.
    let block = block_of(&[(1, 1.5), (2, 3.0), (4, 6.0)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    encode_block(&block, &mut words);
    assert_eq!(words[0] >> 24, 129);

    let mut decoded = [0.0f32; MXFP4_BLOCK_VALUES];
    decode_block(&words, &mut decoded);

    let expected = |nibble: u32| f32::from_bits((129 << 23) | (nibble << 19));
    assert_eq!(decoded[1].to_bits(), expected(2).to_bits());
    assert_eq!(decoded[2].to_bits(), expected(4).to_bits());
    assert_eq!(decoded[4].to_bits(), expected(8).to_bits());
    // 6.0 sits at the block maximum with a representable mantissa: exact.
    assert_eq!(decoded[4], 6.0);
}

#[test]
fn distant_exponents_underflow_to_zero() {
    // 65536.0 has exponent field 143; 1.0 has 127. exp_diff = 16 falls
    // outside the window, so 1.0 is silently zeroed and counted.
    let block = block_of(&[(0, 65536.0), (1, 1.0)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    let underflowed = encode_block(&block, &mut words);
    assert_eq!(underflowed, 1);

    let mut decoded = [0.0f32; MXFP4_BLOCK_VALUES];
    decode_block(&words, &mut decoded);
    assert_eq!(decoded[1].to_bits(), 0);
}

#[test]
fn exp_diff_fifteen_is_inside_the_window() {
    // 49152.0 = 1.5 * 2^15: exponent 142, against 127 for 1.5.
    let block = block_of(&[(0, 49152.0), (1, 1.5)]);
    let mut words = [0u32; MXFP4_BLOCK_WORDS];
    let underflowed = encode_block(&block, &mut words);
    // nibble 8 >> 15 is zero, but that is shift loss, not window underflow.
    assert_eq!(underflowed, 0);
}

#[test]
fn encode_ignores_sign_and_decode_is_positive() {
    let positive = block_of(&[(3, 6.0), (8, 1.5)]);
    let negative = block_of(&[(3, -6.0), (8, -1.5)]);

    let mut pos_words = [0u32; MXFP4_BLOCK_WORDS];
    let mut neg_words = [0u32; MXFP4_BLOCK_WORDS];
    encode_block(&positive, &mut pos_words);
    encode_block(&negative, &mut neg_words);
    assert_eq!(pos_words, neg_words);

    let mut decoded = [0.0f32; MXFP4_BLOCK_VALUES];
    decode_block(&neg_words, &mut decoded);
    assert_eq!(decoded[3], 6.0);
    assert!(decoded.iter().all(|v| v.is_sign_positive() || *v == 0.0));
}

#[test]
fn encode_tile_clears_stale_destination_bits() {
    let geometry = geometry(64);
    let codec = Mxfp4Codec::new(geometry);
    let values: Vec<f32> = (0..64).map(|i| i as f32 * 0.25).collect();

    let mut fresh = vec![0u8; geometry.packed_bytes()];
    let mut dirty = vec![0xFFu8; geometry.packed_bytes()];
    codec.encode_tile(&values, &mut fresh);
    codec.encode_tile(&values, &mut dirty);
    assert_eq!(fresh, dirty);
}

#[test]
fn in_place_decode_matches_out_of_place() {
    let geometry = geometry(128);
    let codec = Mxfp4Codec::new(geometry);
    let mut rng = StdRng::seed_from_u64(0x7117);
    let values: Vec<f32> = (0..128).map(|_| rng.random_range(-8.0f32..8.0)).collect();

    let mut packed = vec![0u8; geometry.packed_bytes()];
    codec.encode_tile(&values, &mut packed);

    let mut expected = vec![0.0f32; geometry.elems()];
    codec.decode_tile(&packed, &mut expected);

    // Packed data arrives at the front of the dense tile footprint.
    let mut tile = vec![0u8; geometry.dense_bytes()];
    tile[..packed.len()].copy_from_slice(&packed);
    codec.decode_tile_in_place(&mut tile);

    for (i, (chunk, want)) in tile.chunks_exact(4).zip(expected.iter()).enumerate() {
        let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        assert_eq!(got.to_bits(), want.to_bits(), "element {i}");
    }
}

#[test]
fn packed_size_follows_the_derived_formula() {
    for elems in [32usize, 64, 256, 1024] {
        let geometry = geometry(elems);
        let dense = geometry.dense_bytes();
        // (T / 4 / 32) * 20 bytes, i.e. 5 words per 32-value block. Scratch
        // buffers for packed tiles must be sized by this derivation, not by
        // an approximation over the element count.
        assert_eq!(geometry.packed_bytes(), dense / 4 / 32 * 20);
        assert_eq!(geometry.packed_bytes(), elems / MXFP4_BLOCK_VALUES * MXFP4_BLOCK_BYTES);
    }
}

#[test]
fn tile_roundtrip_is_idempotent_after_first_loss() {
    // Once a tile has been through encode/decode, a second pass reproduces
    // it exactly: the surviving values are representable by construction.
    let geometry = geometry(64);
    let codec = Mxfp4Codec::new(geometry);
    let mut rng = StdRng::seed_from_u64(0xCAFE);
    let values: Vec<f32> = (0..64).map(|_| rng.random_range(-4.0f32..4.0)).collect();

    let mut packed = vec![0u8; geometry.packed_bytes()];
    codec.encode_tile(&values, &mut packed);
    let mut once = vec![0.0f32; geometry.elems()];
    codec.decode_tile(&packed, &mut once);

    let stats = codec.encode_tile(&once, &mut packed);
    let mut twice = vec![0.0f32; geometry.elems()];
    codec.decode_tile(&packed, &mut twice);

    assert_eq!(stats.underflowed, 0);
    for (a, b) in once.iter().zip(twice.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
