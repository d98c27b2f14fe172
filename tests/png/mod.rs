use pngedit::{
  Chunk, ChunkData, ChunkTy, ImageData, Pixel, Png, PngError, RawChunkIter, Scanline,
};

use crate::SIMPLE_PNG;

#[test]
fn test_round_trip_identity() {
  let png = Png::from_bytes(SIMPLE_PNG).unwrap();
  assert_eq!(png.chunk_count(), 3);
  assert_eq!(png.chunks()[0].ty, ChunkTy::IHDR);
  assert_eq!(png.chunks()[1].ty, ChunkTy::IDAT);
  assert_eq!(png.chunks()[2].ty, ChunkTy::IEND);
  // re-serializing an untouched document reproduces the bytes exactly
  assert_eq!(png.to_bytes(), SIMPLE_PNG);
}

#[test]
fn test_save_file_round_trip() {
  let png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("out.png");
  png.save_file(&path).unwrap();
  assert_eq!(std::fs::read(&path).unwrap(), SIMPLE_PNG);

  // and opening the saved file parses back to the same document
  let reread = Png::open(&path).unwrap();
  assert_eq!(reread.chunk_count(), 3);
  assert_eq!(reread.to_bytes(), SIMPLE_PNG);
}

#[test]
fn test_header_and_spans() {
  let png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let header = png.header().unwrap();
  assert_eq!((header.width, header.height), (3, 1));
  assert_eq!(header.bit_depth, 8);
  assert!(!header.is_interlaced());

  // 25-byte IHDR record right after the signature, then IDAT, then IEND
  assert_eq!(png.chunk_span(0), Some((8, 33)));
  assert_eq!(png.chunk_span(1), Some((33, 66)));
  assert_eq!(png.chunk_span(2), Some((66, 78)));
  assert_eq!(png.chunk_span(3), None);
}

#[test]
fn test_bad_signature_is_fatal() {
  assert!(matches!(Png::from_bytes(b"JFIF not a png at all"), Err(PngError::NotAPng)));
}

#[test]
fn test_lookup_out_of_range() {
  let png = Png::from_bytes(SIMPLE_PNG).unwrap();
  assert!(png.chunk_by_index(2).is_ok());
  assert!(matches!(png.chunk_by_index(3), Err(PngError::IndexOutOfRange(3))));
}

#[test]
fn test_decode_pixels() {
  let png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let mut img = png.image_data().unwrap().unwrap();
  assert!(img.decoded_completely());
  assert_eq!(img.scanlines().len(), 1);
  assert_eq!(img.scanlines()[0].filter, 0);
  assert_eq!(img.scanlines()[0].bytes, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);

  let pixels = img.pixels();
  assert_eq!(pixels.len(), 3);
  assert_eq!(pixels[0].samples(), &[255, 0, 0]);
  assert_eq!(pixels[2].samples(), &[0, 0, 255]);

  let flat = img.flat_pixels();
  assert_eq!((flat.width, flat.height), (3, 1));
  assert_eq!(flat.data, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
}

#[test]
fn test_idempotent_reencode() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let mut img = png.image_data().unwrap().unwrap();
  let original = img.scanlines().to_vec();

  png.set_image_data(&mut img).unwrap();
  let mut again = png.image_data().unwrap().unwrap();
  assert_eq!(again.scanlines(), original.as_slice());

  // and the re-saved document still parses byte-consistently
  let saved = png.to_bytes();
  let reread = Png::from_bytes(&saved).unwrap();
  assert!(reread.verify_crcs().is_ok());
  assert_eq!(reread.to_bytes(), saved);
}

#[test]
fn test_crc_mismatch_soft_then_strict() {
  let mut bytes = SIMPLE_PNG.to_vec();
  bytes[45] ^= 0xFF; // a byte inside the IDAT payload

  // tolerant parse still builds the chunk list
  let png = Png::from_bytes(&bytes).unwrap();
  assert_eq!(png.chunk_count(), 3);
  assert!(!png.chunks()[1].crc_is_valid());

  // strict check names the culprit
  match png.verify_crcs() {
    Err(PngError::CrcMismatch { index, ty, .. }) => {
      assert_eq!(index, 1);
      assert_eq!(ty, ChunkTy::IDAT);
    }
    other => panic!("expected a crc mismatch, got {other:?}"),
  }

  // saving recomputes the CRC, making the file valid again
  let fixed = Png::from_bytes(&png.to_bytes()).unwrap();
  assert!(fixed.verify_crcs().is_ok());
}

#[test]
fn test_text_chunk_insertion() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let data = ChunkData::parse(ChunkTy::tEXt, b"Comment\x00hidden in plain sight").unwrap();
  png.insert_chunk(1, Chunk::new(ChunkTy::tEXt, data)).unwrap();

  let reread = Png::from_bytes(&png.to_bytes()).unwrap();
  assert_eq!(reread.chunk_count(), 4);
  let texts: Vec<_> = reread.text_chunks().collect();
  assert_eq!(texts.len(), 1);
  match &texts[0].data {
    ChunkData::Text(text) => {
      assert_eq!(text.keyword, "Comment");
      assert_eq!(text.text, "hidden in plain sight");
    }
    other => panic!("expected text data, got {other:?}"),
  }
}

#[test]
fn test_multiple_idats_collapse_on_write() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();

  // split the single IDAT payload into two chunks
  let payload = png.chunks()[1].data.to_bytes().into_owned();
  let (front, back) = payload.split_at(7);
  *png.chunk_by_index_mut(1).unwrap() =
    Chunk::new(ChunkTy::IDAT, ChunkData::Raw(front.to_vec()));
  png.insert_chunk(2, Chunk::new(ChunkTy::IDAT, ChunkData::Raw(back.to_vec()))).unwrap();

  // both halves decode as one stream
  let split = Png::from_bytes(&png.to_bytes()).unwrap();
  assert_eq!(split.chunks_by_type(ChunkTy::IDAT).count(), 2);
  let mut img = split.image_data().unwrap().unwrap();
  assert_eq!(img.scanlines()[0].bytes, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);

  // replacing the image data collapses back to exactly one IDAT
  let mut collapsed = split.clone();
  collapsed.set_image_data(&mut img).unwrap();
  assert_eq!(collapsed.chunks_by_type(ChunkTy::IDAT).count(), 1);
  let mut back = collapsed.image_data().unwrap().unwrap();
  assert_eq!(back.scanlines()[0].bytes, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
}

#[test]
fn test_filter_retagging_survives_a_save() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let mut img = png.image_data().unwrap().unwrap();
  img.scanlines_mut()[0].set_filter(4);
  png.set_image_data(&mut img).unwrap();

  let reread = Png::from_bytes(&png.to_bytes()).unwrap();
  let mut img = reread.image_data().unwrap().unwrap();
  assert_eq!(img.scanlines()[0].filter, 4);
  assert_eq!(img.scanlines()[0].bytes, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
}

#[test]
fn test_force_interlace_and_reencode() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();

  // lay the three pixels out in Adam7 order for a 3x1 image: passes 1, 4,
  // and 6 each hold one pixel: columns 0, 2, and 1.
  let header = {
    let mut h = *png.header().unwrap();
    h.set_interlaced(true);
    h
  };
  let mut img = ImageData::from_scanlines(
    header,
    None,
    vec![
      Scanline::new(0, vec![255, 0, 0]), // (0,0) red
      Scanline::new(0, vec![0, 0, 255]), // (2,0) blue
      Scanline::new(0, vec![0, 255, 0]), // (1,0) green
    ],
  );
  png.header_mut().unwrap().set_interlaced(true);
  png.set_image_data(&mut img).unwrap();

  let reread = Png::from_bytes(&png.to_bytes()).unwrap();
  assert!(reread.header().unwrap().is_interlaced());
  let mut img = reread.image_data().unwrap().unwrap();
  assert!(img.decoded_completely());
  assert_eq!(img.scanlines().len(), 3);
  let flat = img.flat_pixels();
  assert_eq!(flat.data, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
}

#[test]
fn test_pixel_edit_end_to_end() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let mut img = png.image_data().unwrap().unwrap();
  assert!(img.put_pixel(1, 0, &Pixel::new(&[1, 2, 3])));
  png.set_image_data(&mut img).unwrap();

  let reread = Png::from_bytes(&png.to_bytes()).unwrap();
  let mut img = reread.image_data().unwrap().unwrap();
  assert_eq!(img.get_pixel(1, 0).unwrap().samples(), &[1, 2, 3]);
  assert_eq!(img.get_pixel(0, 0).unwrap().samples(), &[255, 0, 0]);
}

#[test]
fn test_no_image_data_is_not_an_error() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  png.remove_chunk(1).unwrap();
  assert!(png.image_data().unwrap().is_none());
}

#[test]
fn test_truncated_idat_is_a_hard_error() {
  let mut png = Png::from_bytes(SIMPLE_PNG).unwrap();
  let payload = png.chunks()[1].data.to_bytes().into_owned();
  *png.chunk_by_index_mut(1).unwrap() =
    Chunk::new(ChunkTy::IDAT, ChunkData::Raw(payload[..6].to_vec()));
  assert!(matches!(png.image_data(), Err(PngError::Decompression)));
}

#[test]
fn test_garbage_never_panics() {
  // raw chunk iteration over arbitrary bytes must never panic
  for _ in 0..10 {
    let bytes = crate::rand_bytes(1024);
    for _ in RawChunkIter::new(&bytes) {
      //
    }
  }
  // neither must full parsing, with or without a valid signature in front
  for _ in 0..10 {
    let mut bytes = crate::rand_bytes(256);
    let _ = Png::from_bytes(&bytes);
    let mut signed = pngedit::PNG_SIGNATURE.to_vec();
    signed.append(&mut bytes);
    let _ = Png::from_bytes(&signed);
  }
}

#[test]
fn test_trailing_bytes_after_iend_are_kept() {
  let mut bytes = SIMPLE_PNG.to_vec();
  // an entire extra chunk after IEND
  let extra = Chunk::new(ChunkTy(*b"heLo"), ChunkData::Raw(vec![1, 2, 3]));
  bytes.extend_from_slice(&extra.to_bytes());

  let png = Png::from_bytes(&bytes).unwrap();
  assert_eq!(png.chunk_count(), 4);
  assert_eq!(png.chunks()[3].ty, ChunkTy(*b"heLo"));
  assert_eq!(png.to_bytes(), bytes);
}
