//! Sync pattern matching and resynchronization.
//!
//! A sync pattern is a fixed byte marker announcing the start of valid frame
//! data. After noise or a dropout the stream can resume mid-frame; the
//! matcher scans the buffered bytes for the marker, discards everything in
//! front of it, and reports each discard so operators can see corruption on
//! the link.
//!
//! # Example
//!
//! ```
//! use deframer::SyncPattern;
//!
//! // Patterns are configured as raw bytes or CCSDS-style hex strings.
//! let a = SyncPattern::new(b"\x1A\xCF\xFC\x1D".to_vec()).unwrap();
//! let b = SyncPattern::from_hex("0x1ACFFC1D").unwrap();
//! assert_eq!(a.as_bytes(), b.as_bytes());
//! ```

use bytes::Bytes;

use crate::buffer::StreamBuffer;
use crate::chain::DiscardLog;
use crate::error::{DeframeError, Result};

/// Immutable, validated sync pattern (at least one byte).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPattern {
    bytes: Bytes,
}

impl SyncPattern {
    /// Create a pattern from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DeframeError::EmptySyncPattern`] if `bytes` is empty.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(DeframeError::EmptySyncPattern);
        }
        Ok(Self { bytes })
    }

    /// Create a pattern from a hex string like `"0x1ACFFC1D"`.
    ///
    /// The `0x` prefix is optional and digits are case-insensitive. An odd
    /// number of digits or a non-hex character is rejected.
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(DeframeError::EmptySyncPattern);
        }
        if digits.len() % 2 != 0 {
            return Err(DeframeError::InvalidSyncPattern(format!(
                "odd number of hex digits in {:?}",
                s
            )));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DeframeError::InvalidSyncPattern(format!(
                "non-hex character in {:?}",
                s
            )));
        }

        let bytes: Vec<u8> = (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).expect("digits validated above"))
            .collect();
        Self::new(bytes)
    }

    /// Get the pattern bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the pattern length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; an empty pattern cannot be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Synchronization state of a matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Scanning for the pattern; leading bytes are candidates for discard.
    Searching,
    /// Pattern located; valid only until the current frame is produced.
    Found,
}

/// Searches the stream buffer for the configured pattern and maintains the
/// sync state across read cycles.
#[derive(Debug)]
pub struct SyncMatcher {
    pattern: SyncPattern,
    state: SyncState,
}

impl SyncMatcher {
    pub fn new(pattern: SyncPattern) -> Self {
        Self {
            pattern,
            state: SyncState::Searching,
        }
    }

    /// Get the current sync state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Get the configured pattern.
    pub fn pattern(&self) -> &SyncPattern {
        &self.pattern
    }

    /// Drop back to `Searching`; the next search scans from scratch.
    pub fn resync(&mut self) {
        self.state = SyncState::Searching;
    }

    /// Search the buffer for the pattern, discarding leading noise.
    ///
    /// No-op when sync is already `Found`. Returns `true` when the caller
    /// must stop and wait for more data, `false` when the stream is
    /// synchronized. Every discard is reported to `log`.
    ///
    /// Each loop iteration either returns or strictly shrinks the buffer,
    /// so termination is guaranteed.
    pub fn search<X>(&mut self, buffer: &mut StreamBuffer<X>, log: &dyn DiscardLog) -> bool {
        if self.state == SyncState::Found {
            return false;
        }
        let pattern = self.pattern.as_bytes();
        loop {
            if buffer.len() < pattern.len() {
                return true;
            }

            let data = buffer.as_slice();
            let Some(index) = data.iter().position(|&b| b == pattern[0]) else {
                // First pattern byte nowhere in the buffer: all noise.
                let count = buffer.len();
                log.log_discard(count, false);
                buffer.clear_data();
                return true;
            };

            if data.len() < index + pattern.len() {
                // Possible match at the tail; wait for more data.
                return true;
            }

            if &data[index..index + pattern.len()] == pattern {
                if index > 0 {
                    log.log_discard(index, true);
                    buffer.consume_front(index);
                }
                self.state = SyncState::Found;
                return false;
            }

            // False start: drop through the first candidate byte and rescan.
            log.log_discard(index + 1, false);
            buffer.consume_front(index + 1);
        }
    }
}
