//! Probe outcomes.

use serde::{Deserialize, Serialize};

/// Classified result of probing one identifier.
///
/// By default the probe only ever yields `Live` or `Dead`: transport
/// failures are indistinguishable from removed accounts. `Unreachable` is
/// produced only when the checker is configured to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// The picture resolved to real content.
    Live,
    /// The picture resolved to the placeholder resource.
    Dead,
    /// The remote service could not be reached or answered with an error.
    Unreachable,
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::Live => "live",
            CheckOutcome::Dead => "dead",
            CheckOutcome::Unreachable => "unreachable",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, CheckOutcome::Live)
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
