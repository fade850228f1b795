//! Submission pipeline for intake.
//!
//! Turns live form snapshots into persisted, published records, manages
//! the attachment preview lifecycle, and drives a form session from user
//! events.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod session;
pub mod summary;

pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{
    CommitOutcome, CommitReport, PreviewApplied, PreviewDone, PreviewJob, Published,
    SubmissionPipeline, DEFAULT_STORAGE_KEY,
};
pub use preview::{PreviewCache, PreviewFactory, PreviewRef};
pub use session::{FormEvent, FormSession, FormView, LogRenderer, Renderer};
pub use summary::{record_lines, summary_lines, SummaryLine};
