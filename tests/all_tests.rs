#![allow(bad_style)]

mod filters;
mod png;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// A complete 3x1-pixel, 8-bit RGB PNG: one red, one green, one blue
/// pixel, stored uncompressed inside the zlib stream.
pub const SIMPLE_PNG: &[u8] = &[
  0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
  0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR, 13 bytes
  0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, // 3 x 1
  0x08, 0x02, 0x00, 0x00, 0x00, 0x94, 0x82, 0x83, // depth 8, RGB
  0xE3, 0x00, 0x00, 0x00, 0x15, 0x49, 0x44, 0x41, // IDAT, 21 bytes
  0x54, 0x08, 0x1D, 0x01, 0x0A, 0x00, 0xF5, 0xFF,
  0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00,
  0x00, 0xFF, 0x0E, 0xFB, 0x02, 0xFE, 0xE9, 0x32,
  0x61, 0xE5, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, // IEND
  0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];
