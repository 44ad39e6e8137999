//! Batch liveness checking for numeric account ids.
//!
//! Free-form text is split into lines, each line yields at most one 14-digit
//! id, duplicates collapse, and every unique id is probed against a profile
//! picture service with bounded concurrency. An id whose picture resolves to
//! the service's placeholder (or cannot be fetched) is dead; anything else is
//! live. Partial results stream to the caller as progress snapshots.

pub mod checker;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod input;
pub mod probe;
pub mod scheduler;

// Re-export commonly used types
pub use checker::{Checker, RunState};
pub use config::{CheckerConfig, ScheduleStrategy};
pub use domain::{
    CheckOutcome, NormalizedId, ProgressSnapshot, ResultAggregator, UniqueIdSet, dedupe, extract,
};
pub use error::{CheckerError, Result};
pub use http::{HttpClient, HttpResponse, MockHttpClient, ProbeRequest, ReqwestHttpClient};
pub use input::{ParsedInput, parse_input};
pub use probe::LivenessProbe;
pub use scheduler::BatchScheduler;
pub use tokio_util::sync::CancellationToken;
