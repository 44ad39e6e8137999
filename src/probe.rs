//! Single-identifier liveness probe.

use std::sync::Arc;

use crate::config::CheckerConfig;
use crate::domain::{CheckOutcome, NormalizedId};
use crate::http::{HttpClient, HttpResponse, ProbeRequest};

/// Probes one id against the profile picture service and classifies it.
///
/// A probe never fails: transport errors, timeouts and non-2xx responses all
/// fold into an outcome. One request per call, no retries.
pub struct LivenessProbe<H: HttpClient> {
    http_client: Arc<H>,
    endpoint: String,
    dead_marker: String,
    timeout_ms: u64,
    distinguish_unreachable: bool,
}

impl<H: HttpClient> Clone for LivenessProbe<H> {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            endpoint: self.endpoint.clone(),
            dead_marker: self.dead_marker.clone(),
            timeout_ms: self.timeout_ms,
            distinguish_unreachable: self.distinguish_unreachable,
        }
    }
}

impl<H: HttpClient> LivenessProbe<H> {
    pub fn new(http_client: Arc<H>, config: &CheckerConfig) -> Self {
        Self {
            http_client,
            endpoint: config.remote_endpoint_base.clone(),
            dead_marker: config.dead_marker.clone(),
            timeout_ms: config.timeout_ms,
            distinguish_unreachable: config.distinguish_unreachable,
        }
    }

    /// Probe `id` once.
    pub async fn probe(&self, id: &NormalizedId) -> CheckOutcome {
        let request = ProbeRequest::picture(&self.endpoint, id);

        match self.http_client.execute(&request, self.timeout_ms).await {
            Ok(response) => self.classify(id, &response),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Probe failed, treating as unreachable");
                self.failure_outcome()
            }
        }
    }

    fn classify(&self, id: &NormalizedId, response: &HttpResponse) -> CheckOutcome {
        if !response.is_success() {
            tracing::warn!(
                id = %id,
                status = response.status,
                "Probe got an error status, treating as unreachable"
            );
            return self.failure_outcome();
        }

        let outcome = if response.final_url.contains(&self.dead_marker) {
            CheckOutcome::Dead
        } else {
            CheckOutcome::Live
        };

        tracing::debug!(id = %id, outcome = %outcome, final_url = %response.final_url, "Probe classified");
        outcome
    }

    fn failure_outcome(&self) -> CheckOutcome {
        if self.distinguish_unreachable {
            CheckOutcome::Unreachable
        } else {
            CheckOutcome::Dead
        }
    }
}
