//! Error types for the GGUF header/metadata parser.

use thiserror::Error;

/// Errors surfaced while decoding a GGUF byte stream.
///
/// Parsing never truncates an out-of-bounds field; a declared length that
/// exceeds the configured safety bound is a hard [`SizeLimitExceeded`]
/// error, and running out of bytes inside a structurally expected field
/// surfaces as [`Io`].
///
/// [`SizeLimitExceeded`]: GgufError::SizeLimitExceeded
/// [`Io`]: GgufError::Io
#[derive(Debug, Error)]
pub enum GgufError {
    #[error("invalid magic: expected GGUF (0x46554747), got {0:#010x}")]
    InvalidMagic(u32),

    #[error("unsupported GGUF version: {0} (supported: 2, 3)")]
    UnsupportedVersion(u32),

    #[error("unknown metadata value type tag: {0}")]
    UnknownValueType(u32),

    #[error("{field} exceeds safety limit: {actual} > {limit}")]
    SizeLimitExceeded {
        field: &'static str,
        actual: u64,
        limit: u64,
    },

    #[error("I/O error reading GGUF stream: {0}")]
    Io(#[from] std::io::Error),
}
