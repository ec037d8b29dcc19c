//! Error types for dftr

use thiserror::Error;

/// Result type alias using dftr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dftr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input and output buffers have different lengths
    #[error("Buffer length mismatch: input has {input} samples, output has {output}")]
    LengthMismatch {
        /// Input sequence length
        input: usize,
        /// Output sequence length
        output: usize,
    },

    /// Device memory cannot hold the working set
    ///
    /// Raised before any device allocation when the single-pass engine's
    /// working set does not fit, or when the staged engine cannot find a
    /// viable chunk size. The output buffer is never partially written.
    #[error("Out of device memory: need {required} bytes, {available} available")]
    OutOfMemory {
        /// Bytes the operation needs resident at once
        required: usize,
        /// Bytes the device can provide
        available: usize,
    },

    /// Backend-specific error (context, stream, transfer, or launch failure)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}
