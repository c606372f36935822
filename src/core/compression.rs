//! Gzip support for object map files.
//!
//! Object maps are often shipped as `.obj.gz`. The whole file is wrapped,
//! header included, so compression is applied to the complete byte stream.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::util::Result;

/// Gzip member magic.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// True for paths ending in `.gz` (case-insensitive).
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Check if data starts with the gzip magic.
pub fn is_compressed(data: &[u8]) -> bool {
    data.len() >= GZIP_MAGIC.len() && data[..2] == GZIP_MAGIC
}

/// Compress a complete file image.
///
/// `level` is clamped to 0-9; 0 stores without compression but still
/// produces a valid gzip stream.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let level = Compression::new(level.min(9));
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip file image.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
