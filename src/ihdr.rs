//! The image header: dimensions, pixel layout, interlacing.

use tracing::warn;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  Rgb = 2,
  /// Index into a palette.
  Index = 3,
  /// Greyscale + Alpha
  Ya = 4,
  /// Red, Green, Blue, Alpha
  Rgba = 6,
}
impl ColorType {
  /// The number of samples that make up one pixel of this type.
  ///
  /// An indexed pixel is a single sample (the palette index), the lookup
  /// into RGB happens elsewhere.
  #[inline]
  #[must_use]
  pub const fn samples_per_pixel(self) -> usize {
    match self {
      Self::Y => 1,
      Self::Rgb => 3,
      Self::Index => 1,
      Self::Ya => 2,
      Self::Rgba => 4,
    }
  }

  /// The bit depths the PNG spec allows for this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Rgb => &[8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::Ya => &[8, 16],
      Self::Rgba => &[8, 16],
    }
  }
}
impl TryFrom<u8> for ColorType {
  type Error = ();
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => ColorType::Y,
      2 => ColorType::Rgb,
      3 => ColorType::Index,
      4 => ColorType::Ya,
      6 => ColorType::Rgba,
      _ => return Err(()),
    })
  }
}

/// Image header, from the 13-byte `IHDR` payload.
///
/// All fields are stored as parsed. The compression and filter methods must
/// be 0 in a conforming file and the interlace method 0 or 1, but
/// nonconforming values only get a warning here: the rest of the chunk
/// stream stays inspectable either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per sample
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: ColorType,
  /// should be 0 (deflate)
  pub compression_method: u8,
  /// should be 0 (adaptive five-filter scheme)
  pub filter_method: u8,
  /// 0 = sequential, 1 = Adam7
  pub interlace_method: u8,
}
impl Ihdr {
  /// Parses the 13-byte payload.
  ///
  /// The caller wraps the `&'static str` reason into a chunk-level parse
  /// error carrying the chunk's index and type.
  pub fn from_payload(payload: &[u8]) -> Result<Self, &'static str> {
    let ihdr = match payload {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] => {
        Self {
          width: u32::from_be_bytes([*w0, *w1, *w2, *w3]),
          height: u32::from_be_bytes([*h0, *h1, *h2, *h3]),
          bit_depth: *bit_depth,
          color_type: ColorType::try_from(*color_type).map_err(|_| "illegal color type")?,
          compression_method: *compression_method,
          filter_method: *filter_method,
          interlace_method: *interlace_method,
        }
      }
      _ => return Err("payload is not 13 bytes"),
    };
    if !ihdr.depth_is_legal() {
      warn!(
        bit_depth = ihdr.bit_depth,
        color_type = ihdr.color_type as u8,
        "bit depth not allowed for color type"
      );
    }
    if ihdr.compression_method != 0 {
      warn!(method = ihdr.compression_method, "nonzero compression method");
    }
    if ihdr.filter_method != 0 {
      warn!(method = ihdr.filter_method, "nonzero filter method");
    }
    if ihdr.interlace_method > 1 {
      warn!(method = ihdr.interlace_method, "unknown interlace method");
    }
    if ihdr.width == 0 || ihdr.height == 0 {
      warn!(width = ihdr.width, height = ihdr.height, "zero image dimension");
    }
    Ok(ihdr)
  }

  /// The 13 payload bytes, exactly as `from_payload` read them.
  #[inline]
  #[must_use]
  pub fn to_payload(&self) -> [u8; 13] {
    let [w0, w1, w2, w3] = self.width.to_be_bytes();
    let [h0, h1, h2, h3] = self.height.to_be_bytes();
    [
      w0,
      w1,
      w2,
      w3,
      h0,
      h1,
      h2,
      h3,
      self.bit_depth,
      self.color_type as u8,
      self.compression_method,
      self.filter_method,
      self.interlace_method,
    ]
  }

  /// Is the declared bit depth legal for the declared color type?
  #[inline]
  #[must_use]
  pub fn depth_is_legal(&self) -> bool {
    self.color_type.allowed_depths().contains(&self.bit_depth)
  }

  /// Samples per pixel, from the color type.
  #[inline]
  #[must_use]
  pub const fn samples_per_pixel(&self) -> usize {
    self.color_type.samples_per_pixel()
  }

  /// Bits per complete pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.samples_per_pixel()
  }

  /// Bytes per complete pixel, never less than 1.
  ///
  /// This is the lookback distance used by the Sub/Average/Paeth filters,
  /// which work on whole bytes even when pixels are packed several to a
  /// byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    let bits = self.bits_per_pixel();
    let bytes = (bits + 7) / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in one scanline of `width` pixels, excluding the filter byte.
  ///
  /// Packed sub-byte pixels can leave a partial byte at the end of a line,
  /// so this rounds up.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(&self, width: u32) -> usize {
    (self.bits_per_pixel() * (width as usize) + 7) / 8
  }

  /// Does this image use indexed color?
  #[inline]
  #[must_use]
  pub fn uses_palette(&self) -> bool {
    self.color_type == ColorType::Index
  }

  /// Is the pixel data stored with Adam7 interlacing?
  #[inline]
  #[must_use]
  pub const fn is_interlaced(&self) -> bool {
    self.interlace_method == 1
  }

  /// Force the interlace flag.
  ///
  /// Deliberately re-flagging before a re-encode makes the writer lay the
  /// stored scanlines out in the other traversal order.
  #[inline]
  pub fn set_interlaced(&mut self, interlaced: bool) {
    self.interlace_method = interlaced as u8;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_round_trip() {
    // the header of a 3x1, 8-bit RGB image
    let payload = [0, 0, 0, 3, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    let ihdr = Ihdr::from_payload(&payload).unwrap();
    assert_eq!(ihdr.width, 3);
    assert_eq!(ihdr.height, 1);
    assert_eq!(ihdr.bit_depth, 8);
    assert_eq!(ihdr.color_type, ColorType::Rgb);
    assert!(!ihdr.is_interlaced());
    assert!(ihdr.depth_is_legal());
    assert_eq!(ihdr.to_payload(), payload);
  }

  #[test]
  fn test_parse_rejects_bad_shapes() {
    assert!(Ihdr::from_payload(&[0; 12]).is_err());
    let mut payload = [0, 0, 0, 3, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    payload[9] = 5; // no such color type
    assert!(Ihdr::from_payload(&payload).is_err());
  }

  #[test]
  fn test_derived_sizes() {
    let mut ihdr = Ihdr::from_payload(&[0, 0, 0, 9, 0, 0, 0, 2, 8, 2, 0, 0, 0]).unwrap();
    assert_eq!(ihdr.samples_per_pixel(), 3);
    assert_eq!(ihdr.bytes_per_pixel(), 3);
    assert_eq!(ihdr.bytes_per_scanline(9), 27);

    // 1-bit greyscale packs 8 pixels per byte but filters still look back
    // one whole byte.
    ihdr.color_type = ColorType::Y;
    ihdr.bit_depth = 1;
    assert_eq!(ihdr.bytes_per_pixel(), 1);
    assert_eq!(ihdr.bytes_per_scanline(9), 2);

    ihdr.color_type = ColorType::Rgba;
    ihdr.bit_depth = 16;
    assert_eq!(ihdr.bytes_per_pixel(), 8);
    assert_eq!(ihdr.bytes_per_scanline(9), 72);
  }
}
