//! Error types for the liveness checker.

use thiserror::Error;

use crate::domain::snapshot::ProgressSnapshot;

/// Result type alias using the pulsecheck error type.
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Main error type for the liveness checker.
///
/// Per-identifier probe failures never show up here: they are folded into an
/// outcome inside the probe. Only pre-run validation problems, run-level
/// conditions and plumbing failures are reported through this type.
#[derive(Error, Debug)]
pub enum CheckerError {
    /// The input contained no line with a usable identifier
    #[error("No valid account ids found in input")]
    NoValidIds,

    /// A run is already outstanding on this run state
    #[error("A check is already running")]
    RunInProgress,

    /// The run was cancelled before every id was probed
    #[error("Check cancelled after {} of {} ids", .0.processed, .0.total)]
    Cancelled(Box<ProgressSnapshot>),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Filesystem or stdio error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckerError {
    /// The partial snapshot carried by a cancelled run, if any.
    pub fn partial_snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            CheckerError::Cancelled(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
