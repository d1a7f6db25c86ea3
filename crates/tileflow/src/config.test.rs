#![cfg(test)]

use super::*;

#[test]
fn tile_size_must_be_a_whole_number_of_blocks() {
    assert!(matches!(
        TileGeometry::new(0),
        Err(TileFlowError::InvalidTileSize { elems: 0 })
    ));
    assert!(matches!(
        TileGeometry::new(33),
        Err(TileFlowError::InvalidTileSize { elems: 33 })
    ));

    for elems in [32usize, 64, 1024] {
        let geometry = TileGeometry::new(elems).unwrap();
        assert_eq!(geometry.num_blocks(), elems / 32);
        assert_eq!(geometry.dense_bytes(), elems * 4);
    }
}

#[test]
fn geometry_byte_sizes() {
    let geometry = TileGeometry::new(64).unwrap();
    assert_eq!(geometry.elems(), 64);
    assert_eq!(geometry.num_blocks(), 2);
    assert_eq!(geometry.dense_bytes(), 256);
    assert_eq!(geometry.packed_bytes(), 40);
}

#[test]
fn format_flag_mapping() {
    assert_eq!(TileFormat::from_flag(0), TileFormat::Dense);
    assert_eq!(TileFormat::from_flag(1), TileFormat::Mxfp4);
    assert_eq!(TileFormat::from_flag(7), TileFormat::Mxfp4);
    assert!(TileFormat::Mxfp4.is_packed());
    assert!(!TileFormat::Dense.is_packed());
}
