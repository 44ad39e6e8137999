//! Run orchestration: input validation, run-state bookkeeping and scheduling.
//!
//! A [`RunState`] is owned by the caller and handed to [`Checker::check`] by
//! reference. It holds the latest snapshot of the current (or last) run and
//! refuses a second run while one is outstanding.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::CheckerConfig;
use crate::domain::{ProgressSnapshot, UniqueIdSet};
use crate::error::{CheckerError, Result};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::input::{ParsedInput, parse_input};
use crate::probe::LivenessProbe;
use crate::scheduler::BatchScheduler;

/// State of the current or most recent run.
#[derive(Debug, Default)]
pub struct RunState {
    snapshot: Mutex<ProgressSnapshot>,
    running: AtomicBool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A copy of the latest snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot.lock().clone()
    }

    fn try_begin(&self) -> Result<()> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| CheckerError::RunInProgress)
    }

    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn publish(&self, snapshot: ProgressSnapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

/// Checks batches of pasted ids against the profile picture service.
pub struct Checker<H: HttpClient> {
    config: CheckerConfig,
    scheduler: BatchScheduler<H>,
}

impl Checker<ReqwestHttpClient> {
    /// A checker backed by a default reqwest client.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        Self::with_client(Arc::new(ReqwestHttpClient::new()), config)
    }
}

impl<H> Checker<H>
where
    H: HttpClient + 'static,
{
    pub fn with_client(http_client: Arc<H>, config: CheckerConfig) -> Result<Self> {
        config.validate()?;
        let probe = LivenessProbe::new(http_client, &config);
        let scheduler = BatchScheduler::new(probe, &config);
        Ok(Self { config, scheduler })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Parse input text under the configured line cap.
    pub fn prepare(&self, text: &str) -> ParsedInput {
        parse_input(text, self.config.max_ids_per_run)
    }

    /// Parse `text` and check every id found in it.
    ///
    /// Fails with [`CheckerError::NoValidIds`] before any probing when the
    /// text yields no id.
    pub async fn check<F>(
        &self,
        state: &RunState,
        text: &str,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<ProgressSnapshot>
    where
        F: FnMut(ProgressSnapshot),
    {
        let ids = self.prepare(text).into_ids()?;
        self.check_ids(state, &ids, cancel, on_progress).await
    }

    /// Check an already parsed id set.
    ///
    /// The state's snapshot is reset at the start and updated on every
    /// progress report; on cancellation it keeps the partial snapshot.
    pub async fn check_ids<F>(
        &self,
        state: &RunState,
        ids: &UniqueIdSet,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ProgressSnapshot>
    where
        F: FnMut(ProgressSnapshot),
    {
        if ids.is_empty() {
            return Err(CheckerError::NoValidIds);
        }

        state.try_begin()?;
        let _guard = scopeguard::guard((), |_| state.finish());

        state.publish(ProgressSnapshot::empty(ids.len()));
        tracing::info!(total = ids.len(), "Checking ids");

        let result = self
            .scheduler
            .run(ids, cancel, |snapshot| {
                state.publish(snapshot.clone());
                on_progress(snapshot);
            })
            .await;

        match &result {
            Ok(snapshot) => state.publish(snapshot.clone()),
            Err(CheckerError::Cancelled(partial)) => state.publish((**partial).clone()),
            Err(_) => {}
        }

        result
    }

    /// Forget the last run's results.
    pub fn clear(&self, state: &RunState) -> Result<()> {
        state.try_begin()?;
        state.publish(ProgressSnapshot::default());
        state.finish();
        Ok(())
    }
}
