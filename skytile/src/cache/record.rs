//! On-disk record layout.
//!
//! ```text
//! ┌───────────────┬────────────────────┬──────────────────────┐
//! │ type_tag: u32 │ original_len: u32  │ zlib stream ...      │
//! └───────────────┴────────────────────┴──────────────────────┘
//!   little-endian   little-endian
//! ```

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::CacheError;

/// The only content type currently written: zlib-compressed bytes.
pub const TYPE_ZLIB: u32 = 1;

/// Size of the fixed record header in bytes.
pub const HEADER_LEN: usize = 8;

/// Worst-case compressed size of `len` input bytes.
pub fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// Parsed record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub type_tag: u32,
    pub original_len: u32,
}

impl RecordHeader {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.type_tag.to_le_bytes());
        out[4..].copy_from_slice(&self.original_len.to_le_bytes());
        out
    }

    /// Parse the header at the start of `bytes`, if there are enough of them.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let type_tag = u32::from_le_bytes(bytes.get(0..4)?.try_into().ok()?);
        let original_len = u32::from_le_bytes(bytes.get(4..8)?.try_into().ok()?);
        Some(Self {
            type_tag,
            original_len,
        })
    }
}

/// Build a complete record (header + compressed payload) for `data`.
pub fn encode(data: &[u8]) -> Result<Vec<u8>, CacheError> {
    let original_len = u32::try_from(data.len()).map_err(|_| CacheError::TooLarge {
        len: data.len(),
    })?;

    let header = RecordHeader {
        type_tag: TYPE_ZLIB,
        original_len,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + compress_bound(data.len()));
    out.extend_from_slice(&header.to_bytes());

    let mut encoder = ZlibEncoder::new(out, Compression::default());
    encoder.write_all(data).map_err(CacheError::Compress)?;
    encoder.finish().map_err(CacheError::Compress)
}

/// Why a stored record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    Truncated { len: usize },
    UnknownTag(u32),
    OutOfMemory { len: u32 },
    Implausible { len: u32, compressed: usize },
    Corrupt(String),
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeFailure::Truncated { len } => {
                write!(f, "file is {} bytes, shorter than the header", len)
            }
            DecodeFailure::UnknownTag(tag) => write!(f, "unknown type tag {}", tag),
            DecodeFailure::OutOfMemory { len } => {
                write!(f, "cannot allocate {} bytes for the payload", len)
            }
            DecodeFailure::Implausible { len, compressed } => write!(
                f,
                "{} compressed bytes cannot hold the declared {} bytes",
                compressed, len
            ),
            DecodeFailure::Corrupt(msg) => write!(f, "corrupt payload: {}", msg),
        }
    }
}

/// Upper bound on the DEFLATE expansion ratio.
const MAX_INFLATE_RATIO: u64 = 1032;

/// Decode a stored record back to the original bytes.
///
/// The declared length is checked against what the payload could possibly
/// inflate to before anything is allocated, and the output buffer only grows
/// as decompressed bytes arrive.
pub fn decode(record: &[u8]) -> Result<Vec<u8>, DecodeFailure> {
    let header = RecordHeader::parse(record).ok_or(DecodeFailure::Truncated { len: record.len() })?;
    if header.type_tag != TYPE_ZLIB {
        return Err(DecodeFailure::UnknownTag(header.type_tag));
    }

    let payload = &record[HEADER_LEN..];
    let len = u64::from(header.original_len);
    if len > (payload.len() as u64).saturating_mul(MAX_INFLATE_RATIO) {
        return Err(DecodeFailure::Implausible {
            len: header.original_len,
            compressed: payload.len(),
        });
    }

    let mut out = Vec::new();
    out.try_reserve_exact(len as usize)
        .map_err(|_| DecodeFailure::OutOfMemory {
            len: header.original_len,
        })?;

    // One byte past the declared length detects an overlong stream
    ZlibDecoder::new(payload)
        .take(len + 1)
        .read_to_end(&mut out)
        .map_err(|e| DecodeFailure::Corrupt(e.to_string()))?;

    if out.len() as u64 != len {
        return Err(DecodeFailure::Corrupt(format!(
            "payload inflates to {} bytes, header says {}",
            out.len(),
            len
        )));
    }
    Ok(out)
}
