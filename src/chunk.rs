//! The raw chunk layer: length-prefixed, typed, CRC-suffixed records.
//!
//! A PNG datastream is the 8-byte signature followed by any number of
//! chunks. Each chunk is:
//!
//! * 4-byte big-endian payload length
//! * 4-byte ASCII type code
//! * the payload bytes
//! * 4-byte big-endian CRC-32 of (type ‖ payload)
//!
//! [RawChunkIter] walks that layout without interpreting any payloads, and
//! without panicking on garbage input. [Chunk] is the owned form used by a
//! parsed document; serializing a [Chunk] always recomputes the length and
//! CRC from the current payload, so an edited (or originally corrupt)
//! chunk is always written out valid.

use core::fmt::{Debug, Write};

use crate::chunk_data::ChunkData;
use crate::crc::chunk_crc;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the bytes begin with the PNG signature.
#[inline]
#[must_use]
pub const fn is_png_signature(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// A chunk's 4-byte type code.
///
/// The case of each ASCII letter encodes the ancillary/private/reflexive
/// bits from the PNG spec, but this crate treats the code as an opaque
/// 4-byte key for dispatch and only exposes the case bits as predicates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkTy(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkTy {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tEXt: Self = Self(*b"tEXt");
  pub const zTXt: Self = Self(*b"zTXt");
  pub const iTXt: Self = Self(*b"iTXt");
  pub const tIME: Self = Self(*b"tIME");
  pub const pHYs: Self = Self(*b"pHYs");

  /// The code as raw bytes.
  #[inline]
  #[must_use]
  pub const fn as_bytes(self) -> [u8; 4] {
    self.0
  }

  /// Is this one of the three text-family codes (`tEXt`, `zTXt`, `iTXt`)?
  #[inline]
  #[must_use]
  pub fn is_text(self) -> bool {
    self == Self::tEXt || self == Self::zTXt || self == Self::iTXt
  }

  /// Ancillary bit: lowercase first letter means the chunk is not critical
  /// to displaying the image.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & 0b0010_0000) != 0
  }

  /// Private bit: lowercase second letter means a non-registered chunk.
  #[inline]
  #[must_use]
  pub const fn is_private(self) -> bool {
    (self.0[1] & 0b0010_0000) != 0
  }
}
impl Debug for ChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}

/// An unparsed chunk, borrowing from the source bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  /// The 4-byte type code.
  pub ty: ChunkTy,
  /// The payload bytes exactly as stored.
  pub data: &'b [u8],
  /// The CRC the file claims for this chunk.
  pub declared_crc: u32,
  /// Byte-offset span `[start, end)` of the whole record within the source
  /// stream, signature included.
  pub span: (usize, usize),
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .field("span", &self.span)
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Truncated input never panics: a record that runs off the end of the
/// buffer simply ends the iteration. Use [RawChunkIter::remaining] after
/// iterating to see whether any unconsumed (truncated) bytes were left.
#[derive(Debug, Clone)]
pub struct RawChunkIter<'b> {
  spare: &'b [u8],
  offset: usize,
  stop_at_iend: bool,
  done: bool,
}
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, it will skip the 8-byte signature
  /// automatically (without checking it).
  #[inline]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => {
        Self { spare: rest, offset: 8, stop_at_iend: false, done: false }
      }
      _ => Self { spare: &[], offset: 0, stop_at_iend: false, done: true },
    }
  }

  /// Stop producing chunks once an `IEND` record has been yielded.
  ///
  /// By default the iterator reads through trailing bytes as well, since
  /// data hidden after `IEND` is a thing this crate wants to surface.
  #[inline]
  #[must_use]
  pub const fn stop_at_iend(mut self) -> Self {
    self.stop_at_iend = true;
    self
  }

  /// Bytes not yet consumed as complete chunks.
  #[inline]
  #[must_use]
  pub const fn remaining(&self) -> usize {
    self.spare.len()
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = RawChunk<'b>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.spare.is_empty() {
      return None;
    }
    let start = self.offset;
    let len: usize = if self.spare.len() >= 4 {
      let (len_bytes, rest) = self.spare.split_at(4);
      let len = u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;
      self.spare = rest;
      len
    } else {
      return None;
    };
    let ty: ChunkTy = if self.spare.len() >= 4 {
      let (ty_bytes, rest) = self.spare.split_at(4);
      self.spare = rest;
      ChunkTy(ty_bytes.try_into().unwrap())
    } else {
      return None;
    };
    let data: &'b [u8] = if self.spare.len() >= len {
      let (data, rest) = self.spare.split_at(len);
      self.spare = rest;
      data
    } else {
      return None;
    };
    let declared_crc: u32 = if self.spare.len() >= 4 {
      let (crc_bytes, rest) = self.spare.split_at(4);
      self.spare = rest;
      u32::from_be_bytes(crc_bytes.try_into().unwrap())
    } else {
      return None;
    };
    self.offset = start + 4 + 4 + len + 4;
    if self.stop_at_iend && ty == ChunkTy::IEND {
      self.done = true;
    }
    Some(RawChunk { ty, data, declared_crc, span: (start, self.offset) })
  }
}

/// An owned chunk within a parsed document.
#[derive(Debug, Clone)]
pub struct Chunk {
  /// The 4-byte type code.
  pub ty: ChunkTy,
  /// The (possibly interpreted) payload.
  pub data: ChunkData,
  /// The CRC the source file claimed, or `None` for chunks constructed
  /// in memory. Serialization ignores this and recomputes.
  pub declared_crc: Option<u32>,
}
impl Chunk {
  /// A new in-memory chunk. It has no declared CRC until written out.
  #[inline]
  #[must_use]
  pub const fn new(ty: ChunkTy, data: ChunkData) -> Self {
    Self { ty, data, declared_crc: None }
  }

  /// The CRC that the current type + payload actually hash to.
  #[inline]
  #[must_use]
  pub fn compute_crc(&self) -> u32 {
    chunk_crc(self.ty.as_bytes(), &self.data.to_bytes())
  }

  /// Does the declared CRC (if any) match the current payload?
  ///
  /// Chunks with no declared CRC are vacuously fine.
  #[inline]
  #[must_use]
  pub fn crc_is_valid(&self) -> bool {
    match self.declared_crc {
      Some(declared) => declared == self.compute_crc(),
      None => true,
    }
  }

  /// Serializes this chunk as `length ‖ type ‖ payload ‖ crc`.
  ///
  /// The length and CRC are recomputed from the payload as it is *now*, so
  /// an edited chunk (or one parsed from a corrupt file) always writes out
  /// self-consistent.
  pub fn write_into(&self, out: &mut Vec<u8>) {
    let payload = self.data.to_bytes();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&self.ty.as_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&chunk_crc(self.ty.as_bytes(), &payload).to_be_bytes());
  }

  /// [write_into](Self::write_into), into a fresh buffer.
  #[inline]
  #[must_use]
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out = Vec::new();
    self.write_into(&mut out);
    out
  }
}
