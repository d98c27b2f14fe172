use thiserror::Error;

use crate::chunk::ChunkTy;

/// Alias for a `Result` using [PngError].
pub type PngResult<T> = Result<T, PngError>;

/// Things that can go wrong while reading or writing PNG data.
///
/// Only *structural* problems show up here: anything that prevents building
/// a usable chunk list or byte stream. Soft anomalies (a wrong CRC, an
/// illegal bit depth for the color type, a short interlace stream) are
/// logged as warnings and processing continues, because corrupt and
/// hand-crafted PNGs are exactly what this crate is for inspecting.
#[derive(Debug, Error)]
pub enum PngError {
  /// The first 8 bytes were not the PNG signature.
  #[error("not a png: bad signature")]
  NotAPng,

  /// A chunk's payload didn't decode (wrong size for a fixed-size payload,
  /// and so on). Parsing stops rather than silently dropping the chunk.
  #[error("chunk {index} ({ty:?}): {reason}")]
  ChunkParse {
    /// Ordinal of the offending chunk within the stream.
    index: usize,
    /// The chunk's 4-byte type code.
    ty: ChunkTy,
    /// What was wrong with the payload.
    reason: &'static str,
  },

  /// A lookup by ordinal was out of bounds.
  #[error("index {0} out of range")]
  IndexOutOfRange(usize),

  /// The concatenated image-data stream failed to decompress.
  #[error("image data failed to decompress")]
  Decompression,

  /// A scanline was asked to (re-)filter with a tag outside `0..=4`.
  #[error("unknown filter tag {0}")]
  UnknownFilterTag(u8),

  /// A declared chunk CRC doesn't match the recomputed value. Only returned
  /// from the explicit strict check; the parser itself just warns.
  #[error("chunk {index} ({ty:?}): declared crc {declared:08X}, computed {computed:08X}")]
  CrcMismatch {
    /// Ordinal of the offending chunk.
    index: usize,
    /// The chunk's 4-byte type code.
    ty: ChunkTy,
    /// The CRC stored in the file.
    declared: u32,
    /// The CRC the bytes actually hash to.
    computed: u32,
  },

  /// An underlying I/O operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
