//! A crate for picking PNG files apart and putting them back together.
//!
//! `pngedit` parses a PNG byte stream into its chunk sequence,
//! reconstructs the real pixel grid out of the compressed, filtered,
//! optionally interlaced scanlines, and can serialize edited chunk or
//! pixel data back into a valid PNG, recomputed CRCs included. It is
//! deliberately forgiving on input: corrupt and hand-crafted files are
//! exactly what it exists to inspect, so soft anomalies are logged (via
//! `tracing`) rather than refused.
//!
//! The layers, bottom up:
//!
//! * [crc]: the chunk checksum.
//! * [chunk]: raw chunk records and their serialization.
//! * [chunk_data]: typed payloads for the chunk kinds this crate knows.
//! * [ihdr]: the image header and the sizes derived from it.
//! * [filter]: the five scanline filters, both directions.
//! * [adam7]: the seven-pass interlace geometry.
//! * [bits]: sample unpacking/repacking at bit depths 1 through 16.
//! * [image_data]: scanline decode/re-encode over one whole stream.
//! * [document]: the chunk list as a file: open, inspect, edit, save.
//!
//! ```no_run
//! use pngedit::Png;
//! # fn demo() -> pngedit::PngResult<()> {
//! let mut png = Png::open("tricky.png")?;
//! if let Some(mut img) = png.image_data()? {
//!   for line in img.scanlines_mut() {
//!     line.set_filter(0);
//!   }
//!   png.set_image_data(&mut img)?;
//! }
//! png.save_file("out.png")?;
//! # Ok(())
//! # }
//! ```

pub mod crc;
pub use crc::*;

pub mod error;
pub use error::*;

pub mod chunk;
pub use chunk::*;

pub mod chunk_data;
pub use chunk_data::*;

pub mod ihdr;
pub use ihdr::*;

pub mod filter;
pub use filter::*;

pub mod adam7;
pub use adam7::*;

pub mod bits;
pub use bits::*;

pub mod pixels;
pub use pixels::*;

pub mod image_data;
pub use image_data::*;

pub mod document;
pub use document::*;
