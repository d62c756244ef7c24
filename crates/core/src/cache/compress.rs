//! Gzip compression for oversized cache values.
//!
//! The compression decision is made on serialized size alone; callers store
//! a flag alongside the value and inflate transparently on retrieval.
//! Decompression output is bounded to keep a corrupted or hostile blob from
//! exhausting memory.

use crate::Error;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Ceiling on decompressed value size.
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Gzip-compress a serialized value.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    encoder.finish().map_err(|e| Error::Serialization(e.to_string()))
}

/// Inflate a gzip-compressed value with bounded output size.
///
/// Fails with `DecompressedTooLarge` if the inflated data would exceed
/// `MAX_DECOMPRESSED_SIZE`.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = GzDecoder::new(data).take(MAX_DECOMPRESSED_SIZE as u64 + 1);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    if out.len() > MAX_DECOMPRESSED_SIZE {
        return Err(Error::DecompressedTooLarge { max: MAX_DECOMPRESSED_SIZE });
    }

    Ok(out)
}
