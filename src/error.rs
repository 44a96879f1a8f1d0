//! Error types for deframer.

use thiserror::Error;

/// Main error type for configuration and write-side operations.
///
/// The read path never produces errors: stream-level conditions
/// (insufficient data, lost sync, disconnect) are reported as
/// [`Outcome::Control`](crate::Outcome) values instead.
#[derive(Debug, Error)]
pub enum DeframeError {
    /// A sync pattern was enabled but contains no bytes.
    #[error("sync pattern must contain at least one byte")]
    EmptySyncPattern,

    /// A hex sync pattern string could not be parsed.
    #[error("invalid sync pattern hex: {0}")]
    InvalidSyncPattern(String),

    /// Write-side sync fill: the pattern is longer than the outgoing buffer.
    #[error("sync pattern ({pattern} bytes) overruns outgoing data ({available} bytes)")]
    FillOverrun { pattern: usize, available: usize },
}

/// Result type alias using DeframeError.
pub type Result<T> = std::result::Result<T, DeframeError>;
