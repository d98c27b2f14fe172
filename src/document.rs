//! The top-level PNG document: a chunk list you can inspect, edit, and
//! write back out.
//!
//! Opening a document materializes the whole stream in memory first (via
//! a read-only memory map when the source is a file, with a plain read as
//! fallback) and then interprets chunks, so there is no partial-
//! consumption state to manage. A document and its image data are owned
//! by one call sequence: open, inspect or mutate, save.
//!
//! Saving recomputes every chunk's length and CRC from its current
//! payload. A file that arrived with broken CRCs therefore leaves valid.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use memmap2::Mmap;
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;
use tracing::{debug, warn};

use crate::chunk::{is_png_signature, Chunk, ChunkTy, RawChunkIter, PNG_SIGNATURE};
use crate::chunk_data::{ChunkData, Palette};
use crate::crc::crc_matches;
use crate::error::{PngError, PngResult};
use crate::ihdr::Ihdr;
use crate::image_data::ImageData;

/// A parsed PNG document.
#[derive(Debug, Clone)]
pub struct Png {
  chunks: Vec<Chunk>,
  spans: Vec<Option<(usize, usize)>>,
}
impl Png {
  /// Parses a document from bytes.
  ///
  /// Fatal here: a bad signature, or a known-type payload that doesn't
  /// decode (that aborts rather than silently dropping a chunk). CRC
  /// mismatches and a missing header only warn, and bytes after `IEND`
  /// are read like any others.
  pub fn from_bytes(bytes: &[u8]) -> PngResult<Self> {
    if !is_png_signature(bytes) {
      return Err(PngError::NotAPng);
    }
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut spans: Vec<Option<(usize, usize)>> = Vec::new();
    let mut it = RawChunkIter::new(bytes);
    for raw in &mut it {
      let index = chunks.len();
      debug!(index, ty = ?raw.ty, len = raw.data.len(), "found chunk");
      if !crc_matches(raw.declared_crc, raw.ty.as_bytes(), raw.data) {
        warn!(index, ty = ?raw.ty, declared = raw.declared_crc, "chunk crc mismatch");
      }
      let data = ChunkData::parse(raw.ty, raw.data)
        .map_err(|reason| PngError::ChunkParse { index, ty: raw.ty, reason })?;
      chunks.push(Chunk { ty: raw.ty, data, declared_crc: Some(raw.declared_crc) });
      spans.push(Some(raw.span));
    }
    if it.remaining() > 0 {
      warn!(bytes = it.remaining(), "truncated trailing chunk ignored");
    }
    if !chunks.iter().any(|c| c.ty == ChunkTy::IHDR) {
      warn!("found no header chunk");
    }
    Ok(Self { chunks, spans })
  }

  /// Reads a document from anything readable.
  pub fn from_reader<R: Read>(mut reader: R) -> PngResult<Self> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Self::from_bytes(&bytes)
  }

  /// Opens a document from a file path.
  ///
  /// The file is memory-mapped read-only for parsing; when mapping fails
  /// (pipes, some filesystems) it falls back to reading the file into
  /// memory. Either way the handle is released when this returns, since
  /// the parsed document owns copies of everything it needs.
  pub fn open<P: AsRef<Path>>(path: P) -> PngResult<Self> {
    let file = File::open(path)?;
    // The map is only read, and only within this call. A concurrent
    // writer to the underlying file is outside this crate's contract.
    match unsafe { Mmap::map(&file) } {
      Ok(map) => Self::from_bytes(&map),
      Err(error) => {
        debug!(%error, "mmap unavailable, falling back to a plain read");
        Self::from_reader(&file)
      }
    }
  }

  /// All chunks, in document order.
  #[inline]
  #[must_use]
  pub fn chunks(&self) -> &[Chunk] {
    &self.chunks
  }

  /// How many chunks the document holds.
  #[inline]
  #[must_use]
  pub fn chunk_count(&self) -> usize {
    self.chunks.len()
  }

  /// The chunk at `index`, or an out-of-range error.
  pub fn chunk_by_index(&self, index: usize) -> PngResult<&Chunk> {
    self.chunks.get(index).ok_or(PngError::IndexOutOfRange(index))
  }

  /// Mutable access to the chunk at `index`.
  pub fn chunk_by_index_mut(&mut self, index: usize) -> PngResult<&mut Chunk> {
    self.chunks.get_mut(index).ok_or(PngError::IndexOutOfRange(index))
  }

  /// All chunks of one type, in document order.
  #[inline]
  pub fn chunks_by_type(&self, ty: ChunkTy) -> impl Iterator<Item = &Chunk> {
    self.chunks.iter().filter(move |c| c.ty == ty)
  }

  /// The text-family chunks (`tEXt`, `zTXt`, `iTXt`), in document order.
  #[inline]
  pub fn text_chunks(&self) -> impl Iterator<Item = &Chunk> {
    self.chunks.iter().filter(|c| c.ty.is_text())
  }

  /// Where the chunk at `index` sat in the original byte stream, as a
  /// `[start, end)` span counted from the start of the file.
  ///
  /// `None` for chunks inserted after parsing, or out-of-range indexes.
  #[inline]
  #[must_use]
  pub fn chunk_span(&self, index: usize) -> Option<(usize, usize)> {
    self.spans.get(index).copied().flatten()
  }

  /// Inserts a chunk at `index`, shifting the rest down.
  pub fn insert_chunk(&mut self, index: usize, chunk: Chunk) -> PngResult<()> {
    if index > self.chunks.len() {
      return Err(PngError::IndexOutOfRange(index));
    }
    self.chunks.insert(index, chunk);
    self.spans.insert(index, None);
    Ok(())
  }

  /// Removes and returns the chunk at `index`.
  pub fn remove_chunk(&mut self, index: usize) -> PngResult<Chunk> {
    if index >= self.chunks.len() {
      return Err(PngError::IndexOutOfRange(index));
    }
    self.spans.remove(index);
    Ok(self.chunks.remove(index))
  }

  /// The image header, from the first `IHDR` chunk.
  #[must_use]
  pub fn header(&self) -> Option<&Ihdr> {
    self.chunks.iter().find_map(|c| match &c.data {
      ChunkData::Ihdr(ihdr) => Some(ihdr),
      _ => None,
    })
  }

  /// Mutable header access, e.g. to force the interlace flag before
  /// replacing the image data.
  pub fn header_mut(&mut self) -> Option<&mut Ihdr> {
    self.chunks.iter_mut().find_map(|c| match &mut c.data {
      ChunkData::Ihdr(ihdr) => Some(ihdr),
      _ => None,
    })
  }

  /// The palette, from the first `PLTE` chunk.
  #[must_use]
  pub fn palette(&self) -> Option<&Palette> {
    self.chunks.iter().find_map(|c| match &c.data {
      ChunkData::Plte(palette) => Some(palette),
      _ => None,
    })
  }

  /// Decodes the image data: all `IDAT` payloads concatenated in document
  /// order and inflated as one stream.
  ///
  /// `Ok(None)` when the document has no header or no `IDAT` chunk at
  /// all; a stream that fails to inflate is a hard error.
  pub fn image_data(&self) -> PngResult<Option<ImageData>> {
    let Some(header) = self.header().copied() else {
      warn!("no header chunk, image data is undecodable");
      return Ok(None);
    };
    let mut compressed: Vec<u8> = Vec::new();
    for chunk in self.chunks_by_type(ChunkTy::IDAT) {
      if let Some(bytes) = chunk.data.as_raw() {
        compressed.extend_from_slice(bytes);
      }
    }
    if compressed.is_empty() {
      return Ok(None);
    }
    let decompressed = decompress_to_vec_zlib(&compressed).map_err(|error| {
      warn!(%error, "image data failed to inflate");
      PngError::Decompression
    })?;
    debug!(bytes = decompressed.len(), "inflated image data");
    let palette = if header.uses_palette() {
      let palette = self.palette().cloned();
      if palette.is_none() {
        warn!("indexed color type but no palette chunk");
      }
      palette
    } else {
      None
    };
    Ok(Some(ImageData::new(header, palette, decompressed)))
  }

  /// Re-encodes `img` and installs it as the document's image data.
  ///
  /// The first `IDAT` chunk's payload is replaced with the freshly
  /// deflated stream and every other `IDAT` is removed: multiple chunks
  /// are one logical stream, so writing always collapses them to exactly
  /// one. A document with no `IDAT` yet gets one inserted ahead of
  /// `IEND`.
  pub fn set_image_data(&mut self, img: &mut ImageData) -> PngResult<()> {
    let stream = img.to_bytes()?;
    let compressed = compress_to_vec_zlib(&stream, 6);
    let mut payload = Some(compressed);
    let mut i = 0;
    while i < self.chunks.len() {
      if self.chunks[i].ty == ChunkTy::IDAT {
        match payload.take() {
          Some(bytes) => {
            self.chunks[i] = Chunk::new(ChunkTy::IDAT, ChunkData::Raw(bytes));
            self.spans[i] = None;
            i += 1;
          }
          None => {
            self.chunks.remove(i);
            self.spans.remove(i);
          }
        }
      } else {
        i += 1;
      }
    }
    if let Some(bytes) = payload {
      let at = self
        .chunks
        .iter()
        .position(|c| c.ty == ChunkTy::IEND)
        .unwrap_or(self.chunks.len());
      self.insert_chunk(at, Chunk::new(ChunkTy::IDAT, ChunkData::Raw(bytes)))?;
    }
    Ok(())
  }

  /// Checks every parsed chunk's declared CRC against its payload,
  /// failing on the first mismatch.
  ///
  /// This is the strict mode: the parser itself only warns.
  pub fn verify_crcs(&self) -> PngResult<()> {
    for (index, chunk) in self.chunks.iter().enumerate() {
      if let Some(declared) = chunk.declared_crc {
        let computed = chunk.compute_crc();
        if declared != computed {
          return Err(PngError::CrcMismatch { index, ty: chunk.ty, declared, computed });
        }
      }
    }
    Ok(())
  }

  /// Serializes the whole document: signature, then every chunk with a
  /// recomputed length and CRC.
  #[must_use]
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(&PNG_SIGNATURE);
    for chunk in &self.chunks {
      chunk.write_into(&mut out);
    }
    out
  }

  /// Writes the serialized document to any sink.
  pub fn save<W: Write>(&self, mut sink: W) -> PngResult<()> {
    sink.write_all(&self.to_bytes())?;
    Ok(())
  }

  /// Writes the serialized document to a file.
  pub fn save_file<P: AsRef<Path>>(&self, path: P) -> PngResult<()> {
    let file = File::create(path)?;
    self.save(file)
  }
}
