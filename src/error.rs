// Error taxonomy for patch decoding.
//
// Every failure is fatal for the current session: the decoder never
// retries, and output already written to the "to" sink is left in place.

use std::io;

/// Errors raised while reading, applying or inspecting a patch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    // -- Format errors ------------------------------------------------------
    /// Fewer than 16 header bytes were available.
    #[error("patch header truncated: expected 16 bytes, got {len}")]
    TruncatedHeader { len: usize },

    /// The first 8 bytes are not the `detools0` tag.
    #[error("expected data format 'detools0', but got '{found}'")]
    BadMagic { found: String },

    #[error("expected to size greater than or equal to zero, but got {0}")]
    NegativeSize(i64),

    /// The payload ended between the first and the last byte of a size field.
    #[error("patch ended inside a size field")]
    TruncatedSize,

    #[error("size field does not fit in 64 bits")]
    SizeOverflow,

    #[error("negative {kind} size {size}")]
    NegativeOperationSize { kind: &'static str, size: i64 },

    #[error("Patch diff data too long.")]
    OversizedDiff,

    #[error("Patch extra data too long.")]
    OversizedExtra,

    #[error("To data size mismatch: expected {expected} bytes, produced {actual}.")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Decompressed or raw bytes remain after the declared target was built.
    #[error("End of patch not found.")]
    UnconsumedPatch,

    #[error("adjustment of {offset} bytes seeks outside the from data")]
    InvalidSeek { offset: i64 },

    // -- Exhaustion ---------------------------------------------------------
    /// The compressed source ran dry while the engine still wanted input.
    #[error("out of patch data")]
    OutOfPatchData,

    /// The engine reported end of stream before the request was satisfied.
    #[error("early end of patch data")]
    EarlyEnd,

    #[error("from data ended with {needed} diff bytes outstanding")]
    FromExhausted { needed: u64 },

    // -- Corruption / configuration -----------------------------------------
    #[error("patch decompression failed: {0}")]
    Corrupt(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PatchError {
    /// Whether this error means the patch payload ran out of data.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::OutOfPatchData | Self::EarlyEnd | Self::FromExhausted { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PatchError> = std::result::Result<T, E>;
