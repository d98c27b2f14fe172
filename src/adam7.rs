//! The Adam7 interlacing scheme.
//!
//! An interlaced PNG stores seven "reduced images", each a sub-sampling of
//! the full grid:
//!
//! ```text
//! 1 6 4 6 2 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! 3 6 4 6 3 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! ```
//!
//! Each pass is its own run of filter-tagged scanlines: the filter context
//! (the "previous row") resets at every pass boundary. Scanlines decoded
//! from an interlaced stream are in pass order, *not* top-to-bottom image
//! order; [Pass::full_position] maps a reduced position back to the full
//! grid.

use tracing::warn;

use crate::error::PngResult;
use crate::filter::{filter_scanline, unfilter_scanline};
use crate::ihdr::Ihdr;
use crate::image_data::Scanline;

/// One Adam7 pass: where it starts and how far apart its pixels sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
  pub x_start: u32,
  pub y_start: u32,
  pub x_step: u32,
  pub y_step: u32,
}
impl Pass {
  /// Columns of the reduced image for a full image `width` pixels wide.
  ///
  /// 0 when the pass starts beyond the image entirely.
  #[inline]
  #[must_use]
  pub const fn columns(self, width: u32) -> u32 {
    if self.x_start >= width {
      0
    } else {
      (width - self.x_start + self.x_step - 1) / self.x_step
    }
  }

  /// Rows of the reduced image for a full image `height` pixels tall.
  #[inline]
  #[must_use]
  pub const fn rows(self, height: u32) -> u32 {
    if self.y_start >= height {
      0
    } else {
      (height - self.y_start + self.y_step - 1) / self.y_step
    }
  }

  /// Converts a reduced-image position into the full-image position.
  #[inline]
  #[must_use]
  pub const fn full_position(self, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
    (self.x_start + reduced_x * self.x_step, self.y_start + reduced_y * self.y_step)
  }
}

/// The seven passes, in stream order.
pub const ADAM7: [Pass; 7] = [
  Pass { x_start: 0, y_start: 0, x_step: 8, y_step: 8 },
  Pass { x_start: 4, y_start: 0, x_step: 8, y_step: 8 },
  Pass { x_start: 0, y_start: 4, x_step: 4, y_step: 8 },
  Pass { x_start: 2, y_start: 0, x_step: 4, y_step: 4 },
  Pass { x_start: 0, y_start: 2, x_step: 2, y_step: 4 },
  Pass { x_start: 1, y_start: 0, x_step: 2, y_step: 2 },
  Pass { x_start: 0, y_start: 1, x_step: 1, y_step: 2 },
];

/// Decodes an interlaced (decompressed) stream into reconstructed
/// scanlines, in pass order.
///
/// A stream shorter than the pass geometry demands is not fatal: decoding
/// logs a warning and stops, and the second tuple field is `false` to say
/// the scanline set is partial. The same applies to a row carrying an
/// unknown filter tag, since the rows after it would reconstruct from
/// garbage context.
#[must_use]
pub fn deinterlace(header: &Ihdr, stream: &[u8]) -> (Vec<Scanline>, bool) {
  let bpp = header.bytes_per_pixel();
  let mut rows: Vec<Scanline> = Vec::new();
  let mut offset = 0_usize;
  for (pass_index, pass) in ADAM7.iter().enumerate() {
    let columns = pass.columns(header.width);
    if columns == 0 {
      continue;
    }
    let row_bytes = header.bytes_per_scanline(columns);
    let mut prev_index: Option<usize> = None;
    let mut y = pass.y_start;
    while y < header.height {
      if stream.len() < offset + 1 + row_bytes {
        warn!(
          pass = pass_index + 1,
          y,
          have = stream.len() - offset,
          need = 1 + row_bytes,
          "interlaced stream ended early, keeping partial scanlines"
        );
        return (rows, false);
      }
      let filter = stream[offset];
      let raw = &stream[offset + 1..offset + 1 + row_bytes];
      offset += 1 + row_bytes;
      let prev: &[u8] = match prev_index {
        Some(i) => &rows[i].bytes,
        None => &[],
      };
      let recon = match unfilter_scanline(filter, raw, prev, bpp) {
        Ok(recon) => recon,
        Err(_) => {
          warn!(pass = pass_index + 1, y, filter, "unknown filter tag, stopping decode");
          return (rows, false);
        }
      };
      rows.push(Scanline { filter, bytes: recon });
      prev_index = Some(rows.len() - 1);
      y = y.saturating_add(pass.y_step);
    }
  }
  if offset < stream.len() {
    warn!(extra = stream.len() - offset, "bytes past the interlaced geometry were ignored");
  }
  (rows, true)
}

/// Re-encodes scanlines into an interlaced stream: the same (pass, row)
/// traversal as [deinterlace], re-applying each row's own stored filter
/// tag.
///
/// Rows beyond what the pass geometry holds are appended anyway (with the
/// filter context chained on) so deliberately padded data survives a
/// save, with a warning.
pub fn interlace(header: &Ihdr, rows: &[Scanline]) -> PngResult<Vec<u8>> {
  let bpp = header.bytes_per_pixel();
  let mut out: Vec<u8> = Vec::new();
  let mut it = rows.iter();
  let mut prev: &[u8] = &[];
  'passes: for pass in ADAM7.iter() {
    let columns = pass.columns(header.width);
    if columns == 0 {
      continue;
    }
    prev = &[];
    let mut y = pass.y_start;
    while y < header.height {
      let Some(row) = it.next() else { break 'passes };
      let filtered = filter_scanline(row.filter, &row.bytes, prev, bpp)?;
      out.push(row.filter);
      out.extend_from_slice(&filtered);
      prev = &row.bytes;
      y = y.saturating_add(pass.y_step);
    }
  }
  let mut extra = 0_usize;
  for row in it {
    let filtered = filter_scanline(row.filter, &row.bytes, prev, bpp)?;
    out.push(row.filter);
    out.extend_from_slice(&filtered);
    prev = &row.bytes;
    extra += 1;
  }
  if extra > 0 {
    warn!(extra, "more scanlines than the pass geometry holds");
  }
  Ok(out)
}
