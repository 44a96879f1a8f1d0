//! Protocol chaining and discard-event reporting.
//!
//! A ground-link pipeline is an ordered chain of deframing stages. Each stage
//! implements [`Protocol`]; when a probe cycle (empty chunk) finds nothing
//! ready in one stage, the stage forwards the probe to the next one so
//! frames queued anywhere in the chain drain before new I/O is requested.
//! The terminal stage answers any probe it cannot satisfy with
//! [`ControlSignal::Stop`](crate::ControlSignal).
//!
//! Discard events from sync-pattern searching are reported through the
//! [`DiscardLog`] collaborator; the default implementation emits `tracing`
//! warnings labelled with the stage name.

use crate::framer::Outcome;

/// A deframing stage that can be composed into a protocol chain.
///
/// [`Framer`](crate::Framer) is the canonical implementation; custom stages
/// (e.g. decompression or de-escaping layers) implement the same contract.
pub trait Protocol<X> {
    /// Process one read cycle.
    ///
    /// `chunk` may be empty: a probe cycle used to drain already-buffered
    /// frames without new I/O. `extra` is opaque metadata correlated with
    /// `chunk` (e.g. a source address).
    fn read(&mut self, chunk: &[u8], extra: Option<X>) -> Outcome<X>;

    /// Reset all stream state, discarding buffered data.
    ///
    /// Called when the owning connection (re)connects.
    fn reset(&mut self);
}

/// Collaborator notified of every buffer-discard event during sync search.
///
/// `count` is the number of bytes discarded; `matched` is true when the
/// discard was caused by a successful pattern match (leading noise stripped)
/// and false when the pattern was not found.
pub trait DiscardLog {
    fn log_discard(&self, count: usize, matched: bool);
}

/// Default discard logger emitting `tracing` warnings.
///
/// Carries the stage name so interleaved logs from several chained stages
/// stay attributable.
#[derive(Debug, Clone)]
pub struct TracingDiscardLog {
    name: String,
}

impl TracingDiscardLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DiscardLog for TracingDiscardLog {
    fn log_discard(&self, count: usize, matched: bool) {
        if matched {
            tracing::warn!(
                stage = %self.name,
                count,
                "sync found, discarding leading bytes"
            );
        } else {
            tracing::warn!(
                stage = %self.name,
                count,
                "sync not found, discarding data"
            );
        }
    }
}
