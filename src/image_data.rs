//! The decoded form of the image data stream.
//!
//! [ImageData] owns the decompressed byte stream from the document's
//! `IDAT` chunk(s) and lazily derives reconstructed scanlines from it on
//! first access. The derivation is idempotent and only re-runs if the
//! scanline cache was never built; mutating the scanlines invalidates
//! nothing else, because serialization always re-derives the filtered
//! stream from whatever the scanlines currently hold.
//!
//! Scanlines are stored *reconstructed* (post-defilter) together with the
//! filter tag each row was stored with. Re-tagging a row is therefore a
//! pure metadata edit: the pixel bytes stay put and the new filter is
//! applied at re-encode time. That's the hook used by tooling that hides
//! payloads in the filter bytes without disturbing the visible image.

use tracing::warn;

use crate::adam7;
use crate::bits::{is_sample_depth, pack_samples, unpack_pixels, SampleIter};
use crate::chunk_data::Palette;
use crate::error::PngResult;
use crate::filter::{filter_scanline, unfilter_scanline};
use crate::ihdr::{ColorType, Ihdr};
use crate::pixels::{sample_to_depth_8, Pixel, RGB8};

/// One reconstructed scanline and the filter tag it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanline {
  /// The filter tag (`0..=4` in a conforming file).
  pub filter: u8,
  /// The reconstructed (defiltered) row bytes.
  pub bytes: Vec<u8>,
}
impl Scanline {
  /// A scanline from its parts.
  #[inline]
  #[must_use]
  pub const fn new(filter: u8, bytes: Vec<u8>) -> Self {
    Self { filter, bytes }
  }

  /// Re-tags the row without touching the pixel content.
  ///
  /// The new filter takes effect when the image is re-encoded.
  #[inline]
  pub fn set_filter(&mut self, filter: u8) {
    self.filter = filter;
  }
}

/// A flat, display-ready pixel buffer.
///
/// This is the shape an external display facility consumes: dimensions, a
/// pixel-format tag, and one buffer of samples already normalized to 8
/// bits (indexed color is resolved through the palette to RGB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatPixels {
  pub width: u32,
  pub height: u32,
  /// The color layout of `data`. Indexed images come out as [ColorType::Rgb].
  pub color_type: ColorType,
  /// Samples per pixel in `data`.
  pub samples_per_pixel: usize,
  /// Row-major samples, top-left origin, 8 bits each.
  pub data: Vec<u8>,
}

/// The image data stream of a document, decoded to scanlines on demand.
#[derive(Debug, Clone)]
pub struct ImageData {
  header: Ihdr,
  palette: Option<Palette>,
  raw: Vec<u8>,
  scanlines: Option<Vec<Scanline>>,
  complete: bool,
}
impl ImageData {
  /// Image data over an already-decompressed filtered stream.
  #[inline]
  #[must_use]
  pub const fn new(header: Ihdr, palette: Option<Palette>, decompressed: Vec<u8>) -> Self {
    Self { header, palette, raw: decompressed, scanlines: None, complete: true }
  }

  /// Image data built directly from scanlines, skipping any decode.
  #[inline]
  #[must_use]
  pub const fn from_scanlines(
    header: Ihdr, palette: Option<Palette>, scanlines: Vec<Scanline>,
  ) -> Self {
    Self { header, palette, raw: Vec::new(), scanlines: Some(scanlines), complete: true }
  }

  /// The header this data decodes under.
  #[inline]
  #[must_use]
  pub const fn header(&self) -> &Ihdr {
    &self.header
  }

  /// Mutable header access, mostly for deliberately re-flagging the
  /// interlace method before a re-encode.
  #[inline]
  pub fn header_mut(&mut self) -> &mut Ihdr {
    &mut self.header
  }

  /// The palette, for indexed-color images.
  #[inline]
  #[must_use]
  pub const fn palette(&self) -> Option<&Palette> {
    self.palette.as_ref()
  }

  /// Did the last decode consume everything the geometry asked for?
  ///
  /// `false` after a short or filter-corrupted stream was decoded to a
  /// partial scanline set.
  #[inline]
  pub fn decoded_completely(&mut self) -> bool {
    self.ensure_scanlines();
    self.complete
  }

  fn ensure_scanlines(&mut self) {
    if self.scanlines.is_none() {
      let (rows, complete) = self.decode_rows();
      self.scanlines = Some(rows);
      self.complete = complete;
    }
  }

  fn decode_rows(&self) -> (Vec<Scanline>, bool) {
    if self.header.is_interlaced() {
      return adam7::deinterlace(&self.header, &self.raw);
    }
    let row_bytes = self.header.bytes_per_scanline(self.header.width);
    if row_bytes == 0 {
      warn!("zero-width image has no scanline bytes");
      return (Vec::new(), true);
    }
    let bpp = self.header.bytes_per_pixel();
    let record = 1 + row_bytes;
    let mut rows: Vec<Scanline> = Vec::new();
    let mut offset = 0_usize;
    while offset + record <= self.raw.len() {
      let filter = self.raw[offset];
      let raw_row = &self.raw[offset + 1..offset + record];
      let prev: &[u8] = match rows.last() {
        Some(line) => &line.bytes,
        None => &[],
      };
      let recon = match unfilter_scanline(filter, raw_row, prev, bpp) {
        Ok(recon) => recon,
        Err(_) => {
          warn!(row = rows.len(), filter, "unknown filter tag, stopping decode");
          return (rows, false);
        }
      };
      rows.push(Scanline { filter, bytes: recon });
      offset += record;
    }
    if offset < self.raw.len() {
      warn!(extra = self.raw.len() - offset, "trailing bytes shorter than a scanline record");
    }
    if rows.len() != self.header.height as usize {
      warn!(
        rows = rows.len(),
        height = self.header.height,
        "scanline count differs from declared height"
      );
    }
    (rows, true)
  }

  /// The reconstructed scanlines, computing them on first access.
  #[inline]
  pub fn scanlines(&mut self) -> &[Scanline] {
    self.ensure_scanlines();
    self.scanlines.as_deref().unwrap()
  }

  /// Mutable scanline access (re-tag filters, drop rows, edit bytes).
  #[inline]
  pub fn scanlines_mut(&mut self) -> &mut Vec<Scanline> {
    self.ensure_scanlines();
    self.scanlines.as_mut().unwrap()
  }

  /// Drops scanlines beyond the declared image height.
  ///
  /// Hand-crafted files sometimes carry extra rows as a hiding spot; this
  /// is the cleanup for them (sequential layout only, since interlaced
  /// rows don't map one-to-one to image rows).
  pub fn truncate_to_height(&mut self) {
    let height = self.header.height as usize;
    let rows = self.scanlines_mut();
    if rows.len() > height {
      rows.truncate(height);
    }
  }

  /// Re-encodes the scanlines into a filtered (but not yet compressed)
  /// stream, using each row's own filter tag.
  pub fn to_bytes(&mut self) -> PngResult<Vec<u8>> {
    self.ensure_scanlines();
    let header = self.header;
    let rows = self.scanlines.as_deref().unwrap();
    if header.is_interlaced() {
      return adam7::interlace(&header, rows);
    }
    let bpp = header.bytes_per_pixel();
    let mut out: Vec<u8> = Vec::new();
    let mut prev: &[u8] = &[];
    for row in rows {
      let filtered = filter_scanline(row.filter, &row.bytes, prev, bpp)?;
      out.push(row.filter);
      out.extend_from_slice(&filtered);
      prev = &row.bytes;
    }
    Ok(out)
  }

  /// The pixels of one scanline.
  ///
  /// Indexed-color pixels are the palette indices; resolving them to RGB
  /// is a separate, explicit step.
  pub fn row_pixels(&mut self, row: usize) -> Option<Vec<Pixel>> {
    let depth = self.header.bit_depth;
    if !is_sample_depth(depth) {
      warn!(depth, "cannot unpack samples at a nonstandard bit depth");
      return None;
    }
    let spp = self.header.samples_per_pixel();
    let line = self.scanlines().get(row)?;
    Some(unpack_pixels(&line.bytes, depth, spp))
  }

  /// All pixels, row by row in *stored scanline order*.
  ///
  /// For an interlaced image that is pass order, not top-to-bottom image
  /// order; use [Pass::full_position](crate::adam7::Pass::full_position)
  /// or [flat_pixels](Self::flat_pixels) when image positions matter.
  pub fn pixels(&mut self) -> Vec<Pixel> {
    let depth = self.header.bit_depth;
    if !is_sample_depth(depth) {
      warn!(depth, "cannot unpack samples at a nonstandard bit depth");
      return Vec::new();
    }
    let spp = self.header.samples_per_pixel();
    let mut out: Vec<Pixel> = Vec::new();
    for line in self.scanlines() {
      out.extend(unpack_pixels(&line.bytes, depth, spp));
    }
    out
  }

  /// The pixel at column `x` of stored scanline `y`, if both are in range.
  pub fn get_pixel(&mut self, x: usize, y: usize) -> Option<Pixel> {
    self.row_pixels(y)?.get(x).copied()
  }

  /// Overwrites the pixel at column `x` of stored scanline `y`.
  ///
  /// For an indexed image a 3-sample pixel is looked up in the palette;
  /// when the color isn't there the raw first sample byte is stored
  /// instead of failing, so lossy edits still save. A 1-sample pixel is
  /// taken as a palette index directly.
  ///
  /// Returns `false` when `x`/`y` are out of range.
  pub fn put_pixel(&mut self, x: usize, y: usize, pixel: &Pixel) -> bool {
    let depth = self.header.bit_depth;
    if !is_sample_depth(depth) {
      warn!(depth, "cannot repack samples at a nonstandard bit depth");
      return false;
    }
    let spp = self.header.samples_per_pixel();
    let palette = self.palette.clone();
    let uses_palette = self.header.uses_palette();
    let Some(line) = self.scanlines_mut().get_mut(y) else { return false };

    let mut samples: Vec<u16> = SampleIter::new(&line.bytes, depth).collect();
    if (x + 1) * spp > samples.len() {
      return false;
    }
    if uses_palette {
      let index: u16 = match (pixel.samples(), &palette) {
        ([r, g, b, ..], Some(palette)) => {
          let color = RGB8 { r: *r as u8, g: *g as u8, b: *b as u8 };
          match palette.find(color) {
            Some(index) => index as u16,
            None => {
              warn!(?color, "color not in palette, storing raw first sample");
              pixel.first()
            }
          }
        }
        _ => pixel.first(),
      };
      samples[x * spp] = index;
    } else {
      for (slot, &s) in samples[x * spp..(x + 1) * spp].iter_mut().zip(pixel.samples()) {
        *slot = s;
      }
    }

    let old_len = line.bytes.len();
    let mut packed = pack_samples(&samples, depth);
    if packed.len() < old_len {
      // repacking floors away partial trailing bytes, keep the originals
      packed.extend_from_slice(&line.bytes[packed.len()..]);
    }
    line.bytes = packed;
    true
  }

  /// Resolves a palette index to its RGB entry.
  #[inline]
  #[must_use]
  pub fn palette_lookup(&self, index: usize) -> Option<RGB8> {
    self.palette.as_ref()?.get(index)
  }

  /// Renders a flat, 8-bit, top-left-origin pixel buffer for display.
  ///
  /// Interlaced rows are placed through the pass geometry, sub-byte
  /// samples are depth-normalized, and indexed color is resolved through
  /// the palette (missing entries come out black). Rows the decode never
  /// produced stay zeroed.
  pub fn flat_pixels(&mut self) -> FlatPixels {
    let header = self.header;
    let depth = header.bit_depth;
    let spp = header.samples_per_pixel();
    let uses_palette = header.uses_palette();
    if !is_sample_depth(depth) {
      warn!(depth, "cannot render at a nonstandard bit depth");
      return FlatPixels {
        width: header.width,
        height: header.height,
        color_type: if uses_palette { ColorType::Rgb } else { header.color_type },
        samples_per_pixel: if uses_palette { 3 } else { spp },
        data: Vec::new(),
      };
    }
    let out_spp = if uses_palette { 3 } else { spp };
    let width = header.width as usize;
    let height = header.height as usize;
    let palette = self.palette.clone();
    let mut data = vec![0_u8; width * height * out_spp];

    let place = |x: usize, y: usize, px: &Pixel, data: &mut Vec<u8>| {
      if x >= width || y >= height {
        return;
      }
      let base = (y * width + x) * out_spp;
      if uses_palette {
        let entry = palette
          .as_ref()
          .and_then(|p| p.get(px.first() as usize))
          .unwrap_or(RGB8 { r: 0, g: 0, b: 0 });
        data[base] = entry.r;
        data[base + 1] = entry.g;
        data[base + 2] = entry.b;
      } else {
        for (i, &s) in px.samples().iter().enumerate().take(out_spp) {
          data[base + i] = sample_to_depth_8(depth, s);
        }
      }
    };

    if header.is_interlaced() {
      let mut rows = 0_usize;
      self.ensure_scanlines();
      let lines = self.scanlines.as_deref().unwrap();
      'passes: for pass in adam7::ADAM7.iter() {
        let columns = pass.columns(header.width);
        if columns == 0 {
          continue;
        }
        for reduced_y in 0..pass.rows(header.height) {
          let Some(line) = lines.get(rows) else { break 'passes };
          rows += 1;
          let pixels = unpack_pixels(&line.bytes, depth, spp);
          for (reduced_x, px) in pixels.iter().take(columns as usize).enumerate() {
            let (x, y) = pass.full_position(reduced_x as u32, reduced_y);
            place(x as usize, y as usize, px, &mut data);
          }
        }
      }
    } else {
      self.ensure_scanlines();
      let lines = self.scanlines.as_deref().unwrap();
      for (y, line) in lines.iter().take(height).enumerate() {
        let pixels = unpack_pixels(&line.bytes, depth, spp);
        for (x, px) in pixels.iter().take(width).enumerate() {
          place(x, y, px, &mut data);
        }
      }
    }

    FlatPixels {
      width: header.width,
      height: header.height,
      color_type: if uses_palette { ColorType::Rgb } else { header.color_type },
      samples_per_pixel: out_spp,
      data,
    }
  }
}
