//! # deframer
//!
//! Stream deframing core for telemetry/command ground links.
//!
//! This crate turns a continuous, possibly-fragmented byte stream arriving
//! from a communication interface into discrete frames. A configurable
//! sync marker recovers alignment after noise on the link, and a
//! configurable leading-byte discard strips headers from each frame.
//!
//! ## Architecture
//!
//! - **[`StreamBuffer`]** — owned accumulating buffer with an extra-metadata
//!   side channel
//! - **[`SyncMatcher`]** — marker search, leading-noise discard, sync state
//! - **[`Extractor`]** — pluggable frame extraction; [`BurstExtractor`]
//!   treats the whole buffer as one frame
//! - **[`Framer`]** — read-cycle orchestration producing [`Outcome`]s
//! - **[`Protocol`]** — stage composition: probe cycles with nothing ready
//!   forward to the next chained stage
//!
//! ## Example
//!
//! ```
//! use deframer::{Framer, Outcome, SyncPattern};
//!
//! let mut framer = Framer::<()>::builder()
//!     .sync_pattern(SyncPattern::from_hex("0x1ACFFC1D").unwrap())
//!     .discard_leading_bytes(4)
//!     .build();
//!
//! // Fragmented input: nothing is ready until the frame completes.
//! assert!(!framer.read(b"\x1A\xCF", None).is_data());
//! match framer.read(b"\xFC\x1Dtelemetry", None) {
//!     Outcome::Data { payload, .. } => assert_eq!(&payload[..], b"telemetry"),
//!     other => panic!("expected data, got {:?}", other),
//! }
//! ```

pub mod buffer;
pub mod chain;
pub mod error;
pub mod extract;
pub mod framer;
pub mod sync;

pub use buffer::StreamBuffer;
pub use chain::{DiscardLog, Protocol, TracingDiscardLog};
pub use error::{DeframeError, Result};
pub use extract::{BurstExtractor, Candidate, Extractor};
pub use framer::{ControlSignal, Framer, FramerBuilder, Outcome};
pub use sync::{SyncMatcher, SyncPattern, SyncState};
