//! The five per-scanline filters: None, Sub, Up, Average, Paeth.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Both directions take the *previous reconstructed* scanline as context.
//! An empty previous row stands in for the all-zero virtual row above the
//! first scanline of a pass, which also gives the two degenerate encode
//! cases for free: Up with no previous row leaves the bytes unchanged, and
//! Paeth with no previous row collapses to Sub.
//!
//! `bpp` is the byte distance to the corresponding byte of the pixel to
//! the left, and is at least 1 even for pixels packed below one byte (see
//! [Ihdr::bytes_per_pixel](crate::ihdr::Ihdr::bytes_per_pixel)).

use crate::error::{PngError, PngResult};

/// Picks whichever of `a` (left), `b` (up), `c` (up-left) is closest to
/// the linear prediction `a + b - c`.
///
/// The order of the tie-breaking comparisons is fixed by the PNG spec and
/// must not be rearranged.
#[inline]
#[must_use]
pub(crate) const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reconstructs one scanline from its filtered form.
///
/// * `filter` is the row's filter tag (`0..=4`, anything else errors).
/// * `raw` is the filtered row, without the leading tag byte.
/// * `prev` is the previous *reconstructed* row of the same pass; pass an
///   empty slice for the first row.
/// * `bpp` is the filter lookback distance in bytes.
pub fn unfilter_scanline(filter: u8, raw: &[u8], prev: &[u8], bpp: usize) -> PngResult<Vec<u8>> {
  debug_assert!(bpp > 0);
  let mut out: Vec<u8> = Vec::with_capacity(raw.len());
  match filter {
    0 => out.extend_from_slice(raw),
    1 => {
      // Sub
      for (i, &x) in raw.iter().enumerate() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        out.push(x.wrapping_add(a));
      }
    }
    2 => {
      // Up
      for (i, &x) in raw.iter().enumerate() {
        let b = prev.get(i).copied().unwrap_or(0);
        out.push(x.wrapping_add(b));
      }
    }
    3 => {
      // Average
      for (i, &x) in raw.iter().enumerate() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        let b = prev.get(i).copied().unwrap_or(0);
        out.push(x.wrapping_add(((a as u32 + b as u32) / 2) as u8));
      }
    }
    4 => {
      // Paeth
      for (i, &x) in raw.iter().enumerate() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        let b = prev.get(i).copied().unwrap_or(0);
        let c = if i >= bpp { prev.get(i - bpp).copied().unwrap_or(0) } else { 0 };
        out.push(x.wrapping_add(paeth_predict(a, b, c)));
      }
    }
    unknown => return Err(PngError::UnknownFilterTag(unknown)),
  }
  Ok(out)
}

/// Filters one reconstructed scanline: the algebraic inverse of
/// [unfilter_scanline].
///
/// * `recon` is the reconstructed row.
/// * `prev` is the previous *reconstructed* row of the same pass; pass an
///   empty slice for the first row.
pub fn filter_scanline(filter: u8, recon: &[u8], prev: &[u8], bpp: usize) -> PngResult<Vec<u8>> {
  debug_assert!(bpp > 0);
  let mut out: Vec<u8> = Vec::with_capacity(recon.len());
  match filter {
    0 => out.extend_from_slice(recon),
    1 => {
      // Sub
      for (i, &x) in recon.iter().enumerate() {
        let a = if i >= bpp { recon[i - bpp] } else { 0 };
        out.push(x.wrapping_sub(a));
      }
    }
    2 => {
      // Up
      for (i, &x) in recon.iter().enumerate() {
        let b = prev.get(i).copied().unwrap_or(0);
        out.push(x.wrapping_sub(b));
      }
    }
    3 => {
      // Average
      for (i, &x) in recon.iter().enumerate() {
        let a = if i >= bpp { recon[i - bpp] } else { 0 };
        let b = prev.get(i).copied().unwrap_or(0);
        out.push(x.wrapping_sub(((a as u32 + b as u32) / 2) as u8));
      }
    }
    4 => {
      // Paeth
      for (i, &x) in recon.iter().enumerate() {
        let a = if i >= bpp { recon[i - bpp] } else { 0 };
        let b = prev.get(i).copied().unwrap_or(0);
        let c = if i >= bpp { prev.get(i - bpp).copied().unwrap_or(0) } else { 0 };
        out.push(x.wrapping_sub(paeth_predict(a, b, c)));
      }
    }
    unknown => return Err(PngError::UnknownFilterTag(unknown)),
  }
  Ok(out)
}
