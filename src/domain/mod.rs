//! Core domain types for the liveness checker.
//!
//! This module contains pure domain types with no network dependencies:
//! - Account identifiers and their extraction from text
//! - Deduplicated id sets
//! - Probe outcomes
//! - Result aggregation and progress snapshots

pub mod id;
pub mod id_set;
pub mod outcome;
pub mod snapshot;

pub use id::{ID_LEN, NormalizedId, extract};
pub use id_set::{UniqueIdSet, dedupe};
pub use outcome::CheckOutcome;
pub use snapshot::{ProgressSnapshot, ResultAggregator};
