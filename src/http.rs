//! HTTP client abstraction for liveness probes.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request execution,
//! enabling testability with mock implementations.

use crate::domain::NormalizedId;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A single probe request against the profile picture service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// The id being probed
    pub id: NormalizedId,
    /// Base URL of the service (e.g., <https://graph.facebook.com>)
    pub endpoint: String,
    /// Path portion including the query (e.g., "/10001234567890/picture?type=normal")
    pub path: String,
}

impl ProbeRequest {
    /// Build the picture request for `id` against `endpoint`.
    pub fn picture(endpoint: &str, id: &NormalizedId) -> Self {
        Self {
            id: id.clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            path: format!("/{}/picture?type=normal", id),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.endpoint, self.path)
    }
}

/// Response from an HTTP request, after redirects were followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code of the final response
    pub status: u16,
    /// URL of the final resource after following redirects
    pub final_url: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for executing HTTP requests.
///
/// This abstraction allows for different implementations (production vs. testing)
/// and makes the probing logic testable without making real HTTP calls.
///
/// # Example
/// ```ignore
/// let client = ReqwestHttpClient::new();
/// let request = ProbeRequest::picture("https://graph.facebook.com", &id);
/// let response = client.execute(&request, 5000).await?;
/// println!("Status: {}, Final URL: {}", response.status, response.final_url);
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Execute a GET for the request, following redirects.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The request fails due to network issues
    /// - The request times out
    /// - The URL is invalid
    async fn execute(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
///
/// Redirects are followed with reqwest's default policy; the response body is
/// never read since only the final location matters.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Wrap an already configured client (proxy, TLS roots, user agent).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request), fields(id = %request.id))]
    async fn execute(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<HttpResponse> {
        let url = request.url();

        tracing::trace!(url = %url, timeout_ms, "Executing probe request");

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(url = %url, error = %e, "Probe request failed");
                e
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        tracing::debug!(status, final_url = %final_url, "Probe request completed");

        Ok(HttpResponse { status, final_url })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Mock HTTP client for testing.
///
/// Allows configuring predetermined responses for specific requests without
/// making actual HTTP calls.
///
/// # Example
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.add_response(
///     "GET /10001234567890/picture?type=normal",
///     Ok(HttpResponse {
///         status: 200,
///         final_url: "https://cdn.example.com/photo.jpg".to_string(),
///     }),
/// );
/// ```
#[derive(Clone)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<MockResponse>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

/// A mock response that can optionally wait for a trigger before completing.
enum MockResponse {
    /// Immediate response
    Immediate(Result<HttpResponse>),
    /// Response that waits for a trigger signal before completing
    Triggered {
        response: Result<HttpResponse>,
        trigger: Option<oneshot::Receiver<()>>,
    },
}

/// Record of a call made to the mock HTTP client.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub id: NormalizedId,
    pub endpoint: String,
    pub path: String,
    pub timeout_ms: u64,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The lookup key used for a probe of `id`.
    pub fn key_for(id: &NormalizedId) -> String {
        format!("GET /{}/picture?type=normal", id)
    }

    /// Add a predetermined response for a specific key.
    ///
    /// The key is formatted as "GET {path}". Multiple responses can be
    /// added for the same key - they will be returned in FIFO order.
    pub fn add_response(&self, key: &str, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(MockResponse::Immediate(response));
    }

    /// Respond to a probe of `id` with a 200 whose final URL is `final_url`.
    pub fn add_resolved(&self, id: &NormalizedId, final_url: &str) {
        self.add_response(
            &Self::key_for(id),
            Ok(HttpResponse {
                status: 200,
                final_url: final_url.to_string(),
            }),
        );
    }

    /// Add a response that will wait for a manual trigger before completing.
    ///
    /// Returns a sender that when triggered (by sending `()` or dropping) will
    /// cause the HTTP request to complete with the given response.
    pub fn add_response_with_trigger(
        &self,
        key: &str,
        response: Result<HttpResponse>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(MockResponse::Triggered {
                response,
                trigger: Some(rx),
            });
        tx
    }

    /// Get all calls that have been made to this mock client.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Get the number of requests currently in-flight (executing).
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<HttpResponse> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        // Decrement even if the probe future is dropped mid-flight
        let in_flight = self.in_flight.clone();
        let _guard = scopeguard::guard((), move |_| {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        self.calls.lock().push(MockCall {
            id: request.id.clone(),
            endpoint: request.endpoint.clone(),
            path: request.path.clone(),
            timeout_ms,
        });

        let key = format!("GET {}", request.path);
        let mock_response = {
            let mut responses = self.responses.lock();
            responses
                .get_mut(&key)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0))
        };

        match mock_response {
            Some(MockResponse::Immediate(response)) => response,
            Some(MockResponse::Triggered { response, trigger }) => {
                if let Some(rx) = trigger {
                    // Proceed on send or drop alike
                    let _ = rx.await;
                }
                response
            }
            None => Err(crate::error::CheckerError::Other(anyhow::anyhow!(
                "No mock response configured for GET {}",
                request.path
            ))),
        }
    }
}
