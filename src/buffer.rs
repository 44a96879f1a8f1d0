//! Stream buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. The buffer grows only by
//! appended input and shrinks only by explicit front-consumption or a full
//! snapshot/clear, so its length is always the sum of all appends minus all
//! discards and extractions.
//!
//! Alongside the raw bytes the buffer carries an optional "extra" metadata
//! value (e.g. origin address information) correlated with the most recently
//! supplied input. Probe cycles (empty chunk, no metadata) leave the stored
//! value in place so already-buffered data stays associated with the input
//! that produced it.

use bytes::{Bytes, BytesMut};

/// Accumulating byte buffer with an extra-metadata side channel.
///
/// Exclusively owned by one [`Framer`](crate::Framer) instance; all
/// mutation happens through the explicit operations below.
#[derive(Debug)]
pub struct StreamBuffer<X> {
    /// Accumulated bytes from interface reads.
    data: BytesMut,
    /// Metadata associated with the most recent non-trivial input.
    extra: Option<X>,
}

impl<X> StreamBuffer<X> {
    /// Create an empty stream buffer.
    ///
    /// Default capacity: 4KB (typical ground-link read sizes are small).
    pub fn new() -> Self {
        Self::with_capacity(4 * 1024)
    }

    /// Create an empty stream buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            extra: None,
        }
    }

    /// Append a chunk and update the stored extra metadata.
    ///
    /// The stored extra is overwritten when `chunk` is non-empty, or when
    /// `extra` is supplied even with an empty chunk. An empty chunk with no
    /// extra (a probe cycle) retains the previously stored value.
    pub fn append(&mut self, chunk: &[u8], extra: Option<X>) {
        self.data.extend_from_slice(chunk);
        if !chunk.is_empty() || extra.is_some() {
            self.extra = extra;
        }
    }

    /// Remove `n` bytes from the front of the buffer.
    ///
    /// Callers must not consume more than [`len`](Self::len) bytes.
    pub fn consume_front(&mut self, n: usize) {
        debug_assert!(n <= self.data.len());
        let _ = self.data.split_to(n);
    }

    /// Snapshot the entire buffer contents and clear it.
    pub fn take_all(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    /// Discard all buffered bytes, keeping the stored extra metadata.
    pub fn clear_data(&mut self) {
        self.data.clear();
    }

    /// Reset the buffer completely: drop buffered bytes and stored extra.
    pub fn reset(&mut self) {
        self.data.clear();
        self.extra = None;
    }

    /// Get the buffered bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the stored extra metadata, if any.
    pub fn extra(&self) -> Option<&X> {
        self.extra.as_ref()
    }
}

impl<X> Default for StreamBuffer<X> {
    fn default() -> Self {
        Self::new()
    }
}
