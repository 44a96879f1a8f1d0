//! Frame extraction strategies.
//!
//! Once a framer is synchronized (or when no sync pattern is configured),
//! an [`Extractor`] decides how the buffered bytes become a frame. This
//! crate ships the whole-buffer [`BurstExtractor`]; fixed-length,
//! delimiter-terminated, and length-prefixed variants implement the same
//! contract.

use bytes::Bytes;

use crate::buffer::StreamBuffer;

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A complete frame payload.
    Ready(Bytes),
    /// Not enough buffered data for a frame.
    NoData,
    /// The stream lost alignment; the framer must search for sync again.
    Resync,
    /// The connection should be torn down.
    Disconnect,
}

/// Strategy converting buffered bytes into frame payloads.
///
/// An extractor may consume from the buffer and may return a replacement
/// extra-metadata value for the frame; `None` keeps the framer's working
/// value. [`BurstExtractor`] never resyncs or disconnects, but chained
/// decoders built on other strategies do, so those candidates are part of
/// the contract.
pub trait Extractor<X> {
    fn extract(&mut self, buffer: &mut StreamBuffer<X>) -> (Candidate, Option<X>);
}

/// Whole-buffer ("burst") extraction: everything currently buffered is one
/// frame.
///
/// Suited to links where one physical read corresponds to one frame, e.g.
/// a radio delivering complete downlink bursts.
#[derive(Debug, Default)]
pub struct BurstExtractor;

impl<X: Clone> Extractor<X> for BurstExtractor {
    fn extract(&mut self, buffer: &mut StreamBuffer<X>) -> (Candidate, Option<X>) {
        if buffer.is_empty() {
            return (Candidate::NoData, None);
        }
        let extra = buffer.extra().cloned();
        (Candidate::Ready(buffer.take_all()), extra)
    }
}
