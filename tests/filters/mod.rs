use proptest::prelude::*;

use pngedit::{
  chunk_crc, filter_scanline, pack_samples, unfilter_scanline, Chunk, ChunkData, ChunkTy,
  RawChunkIter, SampleIter, PNG_SIGNATURE,
};

proptest! {
  /// For every byte row, previous row, filter tag, and lookback distance:
  /// unfiltering what filtering produced gives the row back.
  #[test]
  fn prop_filter_round_trip(
    recon in proptest::collection::vec(any::<u8>(), 0..96),
    prev in proptest::collection::vec(any::<u8>(), 0..96),
    filter in 0_u8..=4,
    bpp in 1_usize..=8,
  ) {
    let filtered = filter_scanline(filter, &recon, &prev, bpp).unwrap();
    let back = unfilter_scanline(filter, &filtered, &prev, bpp).unwrap();
    prop_assert_eq!(back, recon.clone());

    // the virtual all-zero previous row behaves the same way
    let filtered = filter_scanline(filter, &recon, &[], bpp).unwrap();
    let back = unfilter_scanline(filter, &filtered, &[], bpp).unwrap();
    prop_assert_eq!(back, recon);
  }

  /// Packing samples and unpacking them again gives the samples back at
  /// every legal bit depth. A final partial byte unpacks to extra zero
  /// samples (PNG row padding), never to anything else.
  #[test]
  fn prop_sample_round_trip(
    raw in proptest::collection::vec(any::<u16>(), 0..64),
    depth_pick in 0_usize..5,
  ) {
    let depth = [1_u8, 2, 4, 8, 16][depth_pick];
    let mask = if depth == 16 { 0xFFFF } else { (1_u16 << depth) - 1 };
    let samples: Vec<u16> = raw.iter().map(|&s| s & mask).collect();
    let packed = pack_samples(&samples, depth);
    let back: Vec<u16> = SampleIter::new(&packed, depth).collect();
    prop_assert!(back.len() >= samples.len());
    prop_assert_eq!(&back[..samples.len()], samples.as_slice());
    prop_assert!(back[samples.len()..].iter().all(|&s| s == 0));
  }

  /// A chunk serialized with any payload parses back identical, with a
  /// CRC that checks out.
  #[test]
  fn prop_chunk_serialization_round_trip(
    payload in proptest::collection::vec(any::<u8>(), 0..128),
  ) {
    let chunk = Chunk::new(ChunkTy(*b"teST"), ChunkData::Raw(payload.clone()));
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&chunk.to_bytes());

    let raw = RawChunkIter::new(&bytes).next().unwrap();
    prop_assert_eq!(raw.ty, ChunkTy(*b"teST"));
    prop_assert_eq!(raw.data, payload.as_slice());
    prop_assert_eq!(raw.declared_crc, chunk_crc(*b"teST", &payload));
  }
}
