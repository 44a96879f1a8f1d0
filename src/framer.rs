//! Read-cycle orchestration: the [`Framer`] state machine.
//!
//! A framer turns a fragmented byte stream into discrete frames. Each read
//! cycle appends the incoming chunk, drives the sync matcher and the
//! extraction strategy in a loop, applies the configured leading-byte
//! discard, and produces a normalized [`Outcome`].
//!
//! Probe cycles (empty chunk) drain frames already queued in the buffer, or
//! in a chained next stage, without requesting new I/O.
//!
//! # Example
//!
//! ```
//! use deframer::{Framer, Outcome, SyncPattern};
//!
//! let mut framer = Framer::<()>::builder()
//!     .name("DOWNLINK")
//!     .sync_pattern(SyncPattern::from_hex("0x1ACFFC1D").unwrap())
//!     .discard_leading_bytes(4)
//!     .build();
//!
//! // Noise before the marker is discarded; the marker itself is stripped
//! // by the leading-byte discard.
//! match framer.read(b"\xFF\xFF\x1A\xCF\xFC\x1Dpayload", None) {
//!     Outcome::Data { payload, .. } => assert_eq!(&payload[..], b"payload"),
//!     other => panic!("expected data, got {:?}", other),
//! }
//! ```

use bytes::{Buf, Bytes, BytesMut};

use crate::buffer::StreamBuffer;
use crate::chain::{DiscardLog, Protocol, TracingDiscardLog};
use crate::error::{DeframeError, Result};
use crate::extract::{BurstExtractor, Candidate, Extractor};
use crate::sync::{SyncMatcher, SyncPattern, SyncState};

/// Stream-level control condition reported instead of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// No frame is ready; the caller should read more data.
    Stop,
    /// The connection should be torn down and the framer discarded.
    Disconnect,
}

/// Result of one read cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<X> {
    /// A complete frame payload with its associated extra metadata.
    Data { payload: Bytes, extra: Option<X> },
    /// A control condition; no frame was produced.
    Control {
        signal: ControlSignal,
        extra: Option<X>,
    },
}

impl<X> Outcome<X> {
    fn control(signal: ControlSignal, extra: Option<X>) -> Self {
        Outcome::Control { signal, extra }
    }

    /// True when this outcome carries a frame payload.
    pub fn is_data(&self) -> bool {
        matches!(self, Outcome::Data { .. })
    }
}

/// Deframing state machine for one connection.
///
/// Constructed once per connection via [`Framer::builder`], then driven by
/// the owning interface's read loop. Single-owner: all cycles take
/// `&mut self` and no state is shared between instances.
pub struct Framer<X> {
    buffer: StreamBuffer<X>,
    matcher: Option<SyncMatcher>,
    discard_leading_bytes: usize,
    fill_sync_pattern: bool,
    extractor: Box<dyn Extractor<X>>,
    next: Option<Box<dyn Protocol<X>>>,
    log: Box<dyn DiscardLog>,
}

impl<X: Clone> Framer<X> {
    /// Start building a framer.
    pub fn builder() -> FramerBuilder<X> {
        FramerBuilder::new()
    }

    /// Process one read cycle.
    ///
    /// `chunk` is appended unconditionally; an empty chunk is a probe cycle.
    /// The stored extra metadata is overwritten when `chunk` is non-empty or
    /// `extra` is supplied, and retained otherwise.
    ///
    /// On a probe cycle with nothing ready here, the probe is forwarded to
    /// the chained next stage; the terminal stage answers
    /// [`ControlSignal::Stop`].
    pub fn read(&mut self, chunk: &[u8], extra: Option<X>) -> Outcome<X> {
        self.buffer.append(chunk, extra);

        loop {
            let need_more = match &mut self.matcher {
                Some(matcher) => matcher.search(&mut self.buffer, self.log.as_ref()),
                None => false,
            };
            // A probe cycle suppresses the matcher's stop and attempts
            // extraction on whatever is buffered.
            if need_more && !chunk.is_empty() {
                return Outcome::control(ControlSignal::Stop, self.buffer.extra().cloned());
            }

            let (candidate, frame_extra) = self.extractor.extract(&mut self.buffer);
            let extra = match frame_extra {
                Some(e) => Some(e),
                None => self.buffer.extra().cloned(),
            };

            match candidate {
                Candidate::Resync if !chunk.is_empty() => {
                    self.resync();
                    continue;
                }
                Candidate::Resync => {
                    // Probe: resync, then treat like any other non-frame
                    // condition instead of retrying.
                    self.resync();
                    return self.forward_probe(chunk, extra);
                }
                Candidate::NoData => {
                    return if chunk.is_empty() {
                        self.forward_probe(chunk, extra)
                    } else {
                        Outcome::control(ControlSignal::Stop, extra)
                    };
                }
                Candidate::Disconnect => {
                    tracing::debug!("extractor requested disconnect");
                    return Outcome::control(ControlSignal::Disconnect, extra);
                }
                Candidate::Ready(mut payload) => {
                    // Sync is only valid for the frame just extracted.
                    self.resync();
                    if self.discard_leading_bytes > 0 {
                        // Clamp: a discard longer than the frame yields an
                        // empty payload rather than reading out of bounds.
                        payload.advance(self.discard_leading_bytes.min(payload.len()));
                    }
                    return Outcome::Data { payload, extra };
                }
            }
        }
    }

    /// Prepare outgoing data for the link.
    ///
    /// When sync fill is enabled, prepends `discard_leading_bytes` zero
    /// bytes (the region a peer framer will strip) and overlays the sync
    /// pattern at the front. The pattern may extend past the prepended
    /// region into the data itself. Without fill, data passes through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DeframeError::FillOverrun`] if the pattern is longer than
    /// the outgoing buffer.
    pub fn write(&self, data: &[u8]) -> Result<Bytes> {
        if !self.fill_sync_pattern {
            return Ok(Bytes::copy_from_slice(data));
        }

        let mut out = BytesMut::with_capacity(self.discard_leading_bytes + data.len());
        out.resize(self.discard_leading_bytes, 0);
        out.extend_from_slice(data);

        if let Some(pattern) = self.matcher.as_ref().map(|m| m.pattern()) {
            if pattern.len() > out.len() {
                return Err(DeframeError::FillOverrun {
                    pattern: pattern.len(),
                    available: out.len(),
                });
            }
            out[..pattern.len()].copy_from_slice(pattern.as_bytes());
        }
        Ok(out.freeze())
    }

    /// Reset all stream state: buffered data, stored extra, sync state, and
    /// any chained next stage.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.resync();
        if let Some(next) = self.next.as_mut() {
            next.reset();
        }
    }

    /// Current sync state, or `None` when no pattern is configured.
    pub fn sync_state(&self) -> Option<SyncState> {
        self.matcher.as_ref().map(|m| m.state())
    }

    /// Number of bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn resync(&mut self) {
        if let Some(matcher) = self.matcher.as_mut() {
            matcher.resync();
        }
    }

    fn forward_probe(&mut self, chunk: &[u8], extra: Option<X>) -> Outcome<X> {
        match self.next.as_mut() {
            Some(next) => next.read(chunk, extra),
            None => Outcome::control(ControlSignal::Stop, extra),
        }
    }
}

impl<X: Clone> Protocol<X> for Framer<X> {
    fn read(&mut self, chunk: &[u8], extra: Option<X>) -> Outcome<X> {
        Framer::read(self, chunk, extra)
    }

    fn reset(&mut self) {
        Framer::reset(self)
    }
}

/// Builder for configuring and creating a [`Framer`].
pub struct FramerBuilder<X> {
    name: String,
    sync_pattern: Option<SyncPattern>,
    discard_leading_bytes: usize,
    fill_sync_pattern: bool,
    extractor: Option<Box<dyn Extractor<X>>>,
    next: Option<Box<dyn Protocol<X>>>,
    log: Option<Box<dyn DiscardLog>>,
}

impl<X: Clone> FramerBuilder<X> {
    /// Create a builder with defaults: no sync pattern, no leading-byte
    /// discard, burst extraction, no chained stage.
    pub fn new() -> Self {
        Self {
            name: "framer".to_string(),
            sync_pattern: None,
            discard_leading_bytes: 0,
            fill_sync_pattern: false,
            extractor: None,
            next: None,
            log: None,
        }
    }

    /// Name used to label discard log output (e.g. the interface name).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sync pattern searched for in the raw stream. Bytes encountered
    /// before the pattern are discarded. Default: none (no enforcement).
    pub fn sync_pattern(mut self, pattern: SyncPattern) -> Self {
        self.sync_pattern = Some(pattern);
        self
    }

    /// Number of bytes to discard from the front of each produced frame,
    /// typically used to strip the sync pattern or a header. A count longer
    /// than a frame clamps that frame to an empty payload. Default: 0.
    pub fn discard_leading_bytes(mut self, count: usize) -> Self {
        self.discard_leading_bytes = count;
        self
    }

    /// On [`Framer::write`], prepend the discarded leading bytes and fill
    /// in the sync pattern. Default: false.
    pub fn fill_sync_pattern(mut self, fill: bool) -> Self {
        self.fill_sync_pattern = fill;
        self
    }

    /// Replace the extraction strategy. Default: [`BurstExtractor`].
    pub fn extractor(mut self, extractor: impl Extractor<X> + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Chain a next stage; unresolved probe cycles are forwarded to it.
    pub fn chain(mut self, next: impl Protocol<X> + 'static) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    /// Replace the discard-event logger. Default: tracing warnings labelled
    /// with the framer name.
    pub fn discard_log(mut self, log: impl DiscardLog + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    /// Build the framer.
    pub fn build(self) -> Framer<X> {
        let name = self.name;
        Framer {
            buffer: StreamBuffer::new(),
            matcher: self.sync_pattern.map(SyncMatcher::new),
            discard_leading_bytes: self.discard_leading_bytes,
            fill_sync_pattern: self.fill_sync_pattern,
            extractor: self
                .extractor
                .unwrap_or_else(|| Box::new(BurstExtractor)),
            next: self.next,
            log: self
                .log
                .unwrap_or_else(|| Box::new(TracingDiscardLog::new(name))),
        }
    }
}

impl<X: Clone> Default for FramerBuilder<X> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared-handle discard recorder for asserting on events.
    #[derive(Clone, Default)]
    struct RecordingLog {
        events: Rc<RefCell<Vec<(usize, bool)>>>,
    }

    impl DiscardLog for RecordingLog {
        fn log_discard(&self, count: usize, matched: bool) {
            self.events.borrow_mut().push((count, matched));
        }
    }

    fn pattern(bytes: &'static [u8]) -> SyncPattern {
        SyncPattern::new(bytes).unwrap()
    }

    #[test]
    fn test_burst_without_sync_returns_whole_chunk() {
        let mut framer = Framer::<u32>::builder().build();
        let outcome = framer.read(b"\x01\x02\x03\x04", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"\x01\x02\x03\x04"),
                extra: None,
            }
        );
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_sync_and_whole_buffer_extraction() {
        let log = RecordingLog::default();
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .discard_log(log.clone())
            .build();

        let outcome = framer.read(b"XXABCDEF", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"ABCDEF"),
                extra: None,
            }
        );
        assert_eq!(*log.events.borrow(), vec![(2, true)]);
        // Sync drops back to searching once the frame is produced.
        assert_eq!(framer.sync_state(), Some(SyncState::Searching));
    }

    #[test]
    fn test_leading_discard() {
        let mut framer = Framer::<u32>::builder().discard_leading_bytes(3).build();
        let outcome = framer.read(b"ABCDEF", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"DEF"),
                extra: None,
            }
        );
    }

    #[test]
    fn test_leading_discard_clamps_to_empty() {
        let mut framer = Framer::<u32>::builder().discard_leading_bytes(10).build();
        let outcome = framer.read(b"short", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::new(),
                extra: None,
            }
        );
    }

    #[test]
    fn test_insufficient_data_stops() {
        let log = RecordingLog::default();
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .discard_log(log.clone())
            .build();

        let outcome = framer.read(b"A", None);
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Stop,
                extra: None,
            }
        );
        assert!(log.events.borrow().is_empty());
        assert_eq!(framer.buffered_len(), 1);
    }

    #[test]
    fn test_sync_pattern_split_across_reads() {
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .build();

        assert!(!framer.read(b"\x00\x00A", None).is_data());
        let outcome = framer.read(b"BCD", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"ABCD"),
                extra: None,
            }
        );
    }

    #[test]
    fn test_no_match_discards_entire_buffer() {
        let log = RecordingLog::default();
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .discard_log(log.clone())
            .build();

        let outcome = framer.read(b"XYZXYZ", None);
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Stop,
                extra: None,
            }
        );
        assert_eq!(*log.events.borrow(), vec![(6, false)]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_metadata_retention_across_probe() {
        let mut framer = Framer::<u32>::builder().build();
        let outcome = framer.read(b"frame", Some(7));
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"frame"),
                extra: Some(7),
            }
        );

        // Probe with no new metadata still reports the stored value.
        let outcome = framer.read(b"", None);
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Stop,
                extra: Some(7),
            }
        );
    }

    #[test]
    fn test_metadata_overwrite_on_probe() {
        let mut framer = Framer::<u32>::builder().build();
        let _ = framer.read(b"frame", Some(7));

        let outcome = framer.read(b"", Some(8));
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Stop,
                extra: Some(8),
            }
        );
    }

    #[test]
    fn test_idempotent_probing_when_empty() {
        let mut framer = Framer::<u32>::builder().build();
        for _ in 0..3 {
            let outcome = framer.read(b"", None);
            assert_eq!(
                outcome,
                Outcome::Control {
                    signal: ControlSignal::Stop,
                    extra: None,
                }
            );
            assert_eq!(framer.buffered_len(), 0);
        }
    }

    #[test]
    fn test_probe_drains_unsynced_data() {
        // A probe suppresses the matcher's stop and extracts whatever is
        // buffered, even before sync is found.
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .build();

        assert!(!framer.read(b"A", None).is_data());
        let outcome = framer.read(b"", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"A"),
                extra: None,
            }
        );
    }

    #[test]
    fn test_probe_forwards_to_chained_stage() {
        struct QueuedStage;
        impl Protocol<u32> for QueuedStage {
            fn read(&mut self, _chunk: &[u8], extra: Option<u32>) -> Outcome<u32> {
                Outcome::Data {
                    payload: Bytes::from_static(b"queued"),
                    extra,
                }
            }
            fn reset(&mut self) {}
        }

        let mut framer = Framer::<u32>::builder().chain(QueuedStage).build();

        // Probe with nothing buffered here: the next stage answers.
        let outcome = framer.read(b"", Some(3));
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"queued"),
                extra: Some(3),
            }
        );

        // A non-empty chunk is handled locally, not forwarded.
        let outcome = framer.read(b"local", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"local"),
                extra: None,
            }
        );
    }

    #[test]
    fn test_disconnect_candidate_returned_directly() {
        struct DisconnectExtractor;
        impl Extractor<u32> for DisconnectExtractor {
            fn extract(&mut self, _buffer: &mut StreamBuffer<u32>) -> (Candidate, Option<u32>) {
                (Candidate::Disconnect, None)
            }
        }

        struct PanicStage;
        impl Protocol<u32> for PanicStage {
            fn read(&mut self, _chunk: &[u8], _extra: Option<u32>) -> Outcome<u32> {
                panic!("disconnect must not be forwarded");
            }
            fn reset(&mut self) {}
        }

        let mut framer = Framer::<u32>::builder()
            .extractor(DisconnectExtractor)
            .chain(PanicStage)
            .build();

        // Even on a probe, disconnect bypasses the chain.
        let outcome = framer.read(b"", None);
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Disconnect,
                extra: None,
            }
        );
    }

    #[test]
    fn test_resync_candidate_retries_search() {
        // Yields Resync once, then defers to burst extraction.
        struct ResyncOnce {
            fired: bool,
            inner: BurstExtractor,
        }
        impl Extractor<u32> for ResyncOnce {
            fn extract(&mut self, buffer: &mut StreamBuffer<u32>) -> (Candidate, Option<u32>) {
                if !self.fired {
                    self.fired = true;
                    return (Candidate::Resync, None);
                }
                self.inner.extract(buffer)
            }
        }

        let log = RecordingLog::default();
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .extractor(ResyncOnce {
                fired: false,
                inner: BurstExtractor,
            })
            .discard_log(log.clone())
            .build();

        // First pass syncs, extractor demands resync, second pass syncs
        // again on the same buffer and extracts.
        let outcome = framer.read(b"ABCD", None);
        assert_eq!(
            outcome,
            Outcome::Data {
                payload: Bytes::from_static(b"ABCD"),
                extra: None,
            }
        );
    }

    #[test]
    fn test_reset_clears_stream_state() {
        let mut framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"AB"))
            .build();

        assert!(!framer.read(b"A", Some(1)).is_data());
        assert_eq!(framer.buffered_len(), 1);

        framer.reset();
        assert_eq!(framer.buffered_len(), 0);
        assert_eq!(framer.sync_state(), Some(SyncState::Searching));
        let outcome = framer.read(b"", None);
        assert_eq!(
            outcome,
            Outcome::Control {
                signal: ControlSignal::Stop,
                extra: None,
            }
        );
    }

    #[test]
    fn test_write_passthrough_without_fill() {
        let framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"\x12\x34"))
            .discard_leading_bytes(2)
            .build();
        let out = framer.write(b"\x56\x78").unwrap();
        assert_eq!(&out[..], b"\x56\x78");
    }

    #[test]
    fn test_write_fill_prepends_and_overlays_pattern() {
        // Pattern fits exactly in the discarded region.
        let framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"\x12\x34"))
            .discard_leading_bytes(2)
            .fill_sync_pattern(true)
            .build();
        let out = framer.write(b"\x56\x78").unwrap();
        assert_eq!(&out[..], b"\x12\x34\x56\x78");
    }

    #[test]
    fn test_write_fill_pattern_extends_into_data() {
        // Only one byte is discarded on read, so the second pattern byte
        // lives inside the frame data and is overwritten on write.
        let framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"\x12\x34\x56"))
            .discard_leading_bytes(1)
            .fill_sync_pattern(true)
            .build();
        let out = framer.write(b"\x00\x00\x9A\xBC").unwrap();
        assert_eq!(&out[..], b"\x12\x34\x56\x9A\xBC");
    }

    #[test]
    fn test_write_fill_without_pattern_prepends_zeroes() {
        let framer = Framer::<u32>::builder()
            .discard_leading_bytes(3)
            .fill_sync_pattern(true)
            .build();
        let out = framer.write(b"\xAA").unwrap();
        assert_eq!(&out[..], b"\x00\x00\x00\xAA");
    }

    #[test]
    fn test_write_fill_overrun_is_an_error() {
        let framer = Framer::<u32>::builder()
            .sync_pattern(pattern(b"\x12\x34\x56\x78"))
            .fill_sync_pattern(true)
            .build();
        let err = framer.write(b"\x9A").unwrap_err();
        assert!(matches!(err, DeframeError::FillOverrun { pattern: 4, available: 1 }));
    }
}
