// src/output/mod.rs

//! Output routing and failure deduplication.
//!
//! - [`sink`] provides the `OutputSink` abstraction and the direct/buffering
//!   switch used while a restart is still unproven.
//! - [`dedupe`] canonicalizes captured output so repeated crashes can be
//!   recognised.
//! - [`style`] colours the supervisor's own report lines.

pub mod dedupe;
pub mod sink;
pub mod style;

pub use dedupe::{canonicalize, same_failure};
pub use sink::{BufferingSink, DirectSink, OutputSink, SinkSwitch};
pub use style::{ReportStyle, Tone, FAILURE_REPEAT_MARKER};
