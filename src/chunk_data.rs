//! Typed views of the chunk payloads this crate understands.
//!
//! Dispatch is a closed match on the 4-byte type code: header, palette,
//! the text family, timestamp, and physical dimensions get structured
//! decoding, while everything else (`IDAT` and `IEND` included) is carried
//! as opaque bytes and round-trips untouched.

use std::borrow::Cow;

use bytemuck::{cast_slice, try_cast_slice};
use miniz_oxide::inflate::decompress_to_vec_zlib;
use tracing::warn;

use crate::chunk::ChunkTy;
use crate::ihdr::Ihdr;
use crate::pixels::RGB8;

/// A chunk payload, interpreted where the type is known.
///
/// Variants that parse into structured fields can regenerate their payload
/// bytes exactly; the text variant keeps its raw bytes alongside the
/// best-effort decoded form, so that lossy text decoding never breaks
/// byte-level round-trips.
#[derive(Debug, Clone)]
pub enum ChunkData {
  /// `IHDR`: image header.
  Ihdr(Ihdr),
  /// `PLTE`: palette.
  Plte(Palette),
  /// `tEXt` / `zTXt` / `iTXt`: textual data.
  Text(TextData),
  /// `tIME`: last-modification timestamp.
  Time(TimeStamp),
  /// `pHYs`: physical pixel dimensions.
  Phys(PhysicalDims),
  /// Any other payload, preserved byte for byte.
  Raw(Vec<u8>),
}
impl ChunkData {
  /// Decodes a payload according to its chunk type.
  ///
  /// Failures (a fixed-size payload with the wrong size, mostly) come back
  /// as a reason string for the caller to wrap with the chunk's index and
  /// type. Text payloads never fail: their decoding is best-effort by
  /// design.
  pub fn parse(ty: ChunkTy, payload: &[u8]) -> Result<Self, &'static str> {
    Ok(match ty {
      ChunkTy::IHDR => Self::Ihdr(Ihdr::from_payload(payload)?),
      ChunkTy::PLTE => Self::Plte(Palette::from_payload(payload)?),
      ChunkTy::tIME => Self::Time(TimeStamp::from_payload(payload)?),
      ChunkTy::pHYs => Self::Phys(PhysicalDims::from_payload(payload)?),
      t if t.is_text() => Self::Text(TextData::parse(ty, payload)),
      _ => Self::Raw(payload.to_vec()),
    })
  }

  /// The payload bytes this data serializes to.
  #[must_use]
  pub fn to_bytes(&self) -> Cow<'_, [u8]> {
    match self {
      Self::Ihdr(ihdr) => Cow::Owned(ihdr.to_payload().to_vec()),
      Self::Plte(palette) => Cow::Owned(palette.to_payload()),
      Self::Text(text) => Cow::Borrowed(text.raw()),
      Self::Time(time) => Cow::Owned(time.to_payload().to_vec()),
      Self::Phys(phys) => Cow::Owned(phys.to_payload().to_vec()),
      Self::Raw(bytes) => Cow::Borrowed(bytes),
    }
  }

  /// Payload length in bytes.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to_bytes().len()
  }

  /// Is the payload empty?
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The raw bytes, when this is an uninterpreted payload.
  #[inline]
  #[must_use]
  pub fn as_raw(&self) -> Option<&[u8]> {
    match self {
      Self::Raw(bytes) => Some(bytes),
      _ => None,
    }
  }
}

/// An `RGB8` lookup table for indexed-color images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
  entries: Vec<RGB8>,
}
impl Palette {
  /// Parses `N x 3` payload bytes into entries.
  pub fn from_payload(payload: &[u8]) -> Result<Self, &'static str> {
    let entries: &[RGB8] =
      try_cast_slice(payload).map_err(|_| "palette length not divisible by 3")?;
    if entries.len() > 256 {
      warn!(entries = entries.len(), "palette has more than 256 entries");
    }
    Ok(Self { entries: entries.to_vec() })
  }

  /// The entries as a slice.
  #[inline]
  #[must_use]
  pub fn entries(&self) -> &[RGB8] {
    &self.entries
  }

  /// Entry count.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Is the palette empty?
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The entry at `index`, if in range.
  #[inline]
  #[must_use]
  pub fn get(&self, index: usize) -> Option<RGB8> {
    self.entries.get(index).copied()
  }

  /// The index of the first entry equal to `color`, if any.
  #[inline]
  #[must_use]
  pub fn find(&self, color: RGB8) -> Option<usize> {
    self.entries.iter().position(|e| *e == color)
  }

  #[inline]
  #[must_use]
  fn to_payload(&self) -> Vec<u8> {
    cast_slice(self.entries.as_slice()).to_vec()
  }
}

/// Decoded text-family chunk content.
///
/// The decoded `keyword` and `text` are for human consumption: embedded
/// NUL separators become spaces and invalid UTF-8 becomes replacement
/// characters, never an error. The raw payload is kept unmodified and is
/// what gets written back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextData {
  raw: Vec<u8>,
  /// The keyword before the first NUL separator.
  pub keyword: String,
  /// The (possibly decompressed) text after the keyword.
  pub text: String,
}
impl TextData {
  /// Best-effort decode of a `tEXt`/`zTXt`/`iTXt` payload.
  #[must_use]
  pub fn parse(ty: ChunkTy, payload: &[u8]) -> Self {
    let (keyword_bytes, rest) = match payload.iter().position(|&b| b == 0) {
      Some(nul) => (&payload[..nul], &payload[nul + 1..]),
      None => (payload, &payload[..0]),
    };
    let keyword = String::from_utf8_lossy(keyword_bytes).into_owned();
    let text = match ty {
      ChunkTy::zTXt => match rest {
        [_method, zlib_data @ ..] => match decompress_to_vec_zlib(zlib_data) {
          Ok(inflated) => String::from_utf8_lossy(&inflated).into_owned(),
          Err(_) => {
            warn!(keyword = %keyword, "zTXt text failed to decompress");
            lossy_with_spaces(zlib_data)
          }
        },
        [] => String::new(),
      },
      _ => lossy_with_spaces(rest),
    };
    Self { raw: payload.to_vec(), keyword, text }
  }

  /// The payload exactly as stored in the file.
  #[inline]
  #[must_use]
  pub fn raw(&self) -> &[u8] {
    &self.raw
  }
}

fn lossy_with_spaces(bytes: &[u8]) -> String {
  let spaced: Vec<u8> = bytes.iter().map(|&b| if b == 0 { b' ' } else { b }).collect();
  String::from_utf8_lossy(&spaced).into_owned()
}

/// The 7-byte `tIME` payload: an image's last-modification time, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeStamp {
  /// 4-digit year.
  pub year: u16,
  /// 1-12
  pub month: u8,
  /// 1-31
  pub day: u8,
  /// 0-23
  pub hour: u8,
  /// 0-59
  pub minute: u8,
  /// 0-60 (60 covers leap seconds)
  pub second: u8,
}
impl TimeStamp {
  /// Parses the 7-byte payload.
  pub fn from_payload(payload: &[u8]) -> Result<Self, &'static str> {
    match *payload {
      [y0, y1, month, day, hour, minute, second] => Ok(Self {
        year: u16::from_be_bytes([y0, y1]),
        month,
        day,
        hour,
        minute,
        second,
      }),
      _ => Err("payload is not 7 bytes"),
    }
  }

  /// The 7 payload bytes.
  #[inline]
  #[must_use]
  pub const fn to_payload(&self) -> [u8; 7] {
    let [y0, y1] = self.year.to_be_bytes();
    [y0, y1, self.month, self.day, self.hour, self.minute, self.second]
  }
}

/// The 9-byte `pHYs` payload: intended pixel size or aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalDims {
  /// Pixels per unit, X axis.
  pub ppu_x: u32,
  /// Pixels per unit, Y axis.
  pub ppu_y: u32,
  /// 0 = unit unknown (aspect ratio only), 1 = meter.
  pub unit: u8,
}
impl PhysicalDims {
  /// Parses the 9-byte payload.
  pub fn from_payload(payload: &[u8]) -> Result<Self, &'static str> {
    if payload.len() != 9 {
      return Err("payload is not 9 bytes");
    }
    let phys = Self {
      ppu_x: u32::from_be_bytes(payload[0..4].try_into().unwrap()),
      ppu_y: u32::from_be_bytes(payload[4..8].try_into().unwrap()),
      unit: payload[8],
    };
    if phys.unit > 1 {
      warn!(unit = phys.unit, "unknown pHYs unit");
    }
    Ok(phys)
  }

  /// Is the unit meters (as opposed to "unknown")?
  #[inline]
  #[must_use]
  pub const fn is_meters(&self) -> bool {
    self.unit == 1
  }

  /// The 9 payload bytes.
  #[inline]
  #[must_use]
  pub fn to_payload(&self) -> [u8; 9] {
    let mut out = [0_u8; 9];
    out[0..4].copy_from_slice(&self.ppu_x.to_be_bytes());
    out[4..8].copy_from_slice(&self.ppu_y.to_be_bytes());
    out[8] = self.unit;
    out
  }
}
