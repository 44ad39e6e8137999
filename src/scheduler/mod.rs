//! Bounded-concurrency scheduling of liveness probes over one id set.
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::{CheckerConfig, ScheduleStrategy};
use crate::domain::{CheckOutcome, NormalizedId, ProgressSnapshot, ResultAggregator, UniqueIdSet};
use crate::error::{CheckerError, Result};
use crate::http::HttpClient;
use crate::probe::LivenessProbe;

/// Runs probes over a [`UniqueIdSet`] with at most `concurrency` outstanding.
///
/// Progress callbacks are invoked from the task driving [`BatchScheduler::run`],
/// one at a time and in order, each with an owned snapshot in which
/// `processed` matches the result lists.
pub struct BatchScheduler<H: HttpClient> {
    probe: LivenessProbe<H>,
    concurrency: usize,
    strategy: ScheduleStrategy,
}

impl<H> BatchScheduler<H>
where
    H: HttpClient + 'static,
{
    /// Create a scheduler. `config` is expected to be validated.
    pub fn new(probe: LivenessProbe<H>, config: &CheckerConfig) -> Self {
        Self {
            probe,
            concurrency: config.concurrency_bound.max(1),
            strategy: config.strategy,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn strategy(&self) -> ScheduleStrategy {
        self.strategy
    }

    /// Probe every id and return the final snapshot.
    ///
    /// If `cancel` fires, no further probes start, in-flight probes are
    /// dropped and [`CheckerError::Cancelled`] carries the last consistent
    /// snapshot.
    #[tracing::instrument(skip_all, fields(total = ids.len(), concurrency = self.concurrency, strategy = ?self.strategy))]
    pub async fn run<F>(
        &self,
        ids: &UniqueIdSet,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<ProgressSnapshot>
    where
        F: FnMut(ProgressSnapshot),
    {
        tracing::info!("Starting liveness run");

        let snapshot = match self.strategy {
            ScheduleStrategy::Chunked => self.run_chunked(ids, cancel, on_progress).await?,
            ScheduleStrategy::Pool => self.run_pool(ids, cancel, on_progress).await?,
        };

        tracing::info!(
            live = snapshot.live.len(),
            dead = snapshot.dead.len(),
            unreachable = snapshot.unreachable.len(),
            "Liveness run finished"
        );

        Ok(snapshot)
    }

    /// Consecutive chunks of `concurrency` ids; each chunk completes on its
    /// slowest probe before the next one starts.
    async fn run_chunked<F>(
        &self,
        ids: &UniqueIdSet,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ProgressSnapshot>
    where
        F: FnMut(ProgressSnapshot),
    {
        let mut aggregator = ResultAggregator::new(ids);

        for (chunk_index, chunk) in ids.as_slice().chunks(self.concurrency).enumerate() {
            if cancel.is_cancelled() {
                return Err(cancelled(&aggregator));
            }

            tracing::debug!(chunk = chunk_index, size = chunk.len(), "Probing chunk");

            let probes = join_all(chunk.iter().map(|id| self.probe.probe(id)));
            let outcomes = tokio::select! {
                outcomes = probes => outcomes,
                _ = cancel.cancelled() => return Err(cancelled(&aggregator)),
            };

            for (id, outcome) in chunk.iter().zip(outcomes) {
                aggregator.record(id, outcome);
            }

            on_progress(aggregator.snapshot());
        }

        Ok(aggregator.snapshot())
    }

    /// Semaphore-bounded pool: a finished probe frees its permit for the
    /// next pending id right away.
    async fn run_pool<F>(
        &self,
        ids: &UniqueIdSet,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ProgressSnapshot>
    where
        F: FnMut(ProgressSnapshot),
    {
        let mut aggregator = ResultAggregator::new(ids);
        let mut reporter = Reporter::new(self.concurrency);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<(NormalizedId, CheckOutcome)> = JoinSet::new();

        for id in ids {
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit.map_err(|e| {
                    CheckerError::Other(anyhow::anyhow!("Probe semaphore closed: {}", e))
                })?,
                _ = cancel.cancelled() => return Err(cancelled(&aggregator)),
            };

            while let Some(joined) = join_set.try_join_next() {
                record_joined(&mut aggregator, joined)?;
            }
            reporter.maybe_report(&aggregator, &mut on_progress);

            let probe = self.probe.clone();
            let id = id.clone();
            join_set.spawn(async move {
                // Permit is held for the duration of the probe
                let _permit = permit;
                let outcome = probe.probe(&id).await;
                (id, outcome)
            });
        }

        while !join_set.is_empty() {
            let joined = tokio::select! {
                Some(joined) = join_set.join_next() => joined,
                _ = cancel.cancelled() => return Err(cancelled(&aggregator)),
            };
            record_joined(&mut aggregator, joined)?;
            reporter.maybe_report(&aggregator, &mut on_progress);
        }

        reporter.finish(&aggregator, &mut on_progress);
        Ok(aggregator.snapshot())
    }
}

fn cancelled(aggregator: &ResultAggregator) -> CheckerError {
    let snapshot = aggregator.snapshot();
    tracing::info!(
        processed = snapshot.processed,
        total = snapshot.total,
        "Liveness run cancelled"
    );
    CheckerError::Cancelled(Box::new(snapshot))
}

fn record_joined(
    aggregator: &mut ResultAggregator,
    joined: std::result::Result<(NormalizedId, CheckOutcome), JoinError>,
) -> Result<()> {
    let (id, outcome) = joined.map_err(|e| {
        tracing::error!(error = %e, "Probe task panicked");
        CheckerError::Other(anyhow::anyhow!("Probe task failed: {}", e))
    })?;
    aggregator.record(&id, outcome);
    Ok(())
}

/// Progress cadence for the pool: one report per `every` completions.
struct Reporter {
    every: usize,
    last_reported: usize,
}

impl Reporter {
    fn new(every: usize) -> Self {
        Self {
            every,
            last_reported: 0,
        }
    }

    fn maybe_report<F>(&mut self, aggregator: &ResultAggregator, on_progress: &mut F)
    where
        F: FnMut(ProgressSnapshot),
    {
        if aggregator.processed() >= self.last_reported + self.every {
            self.report(aggregator, on_progress);
        }
    }

    fn finish<F>(&mut self, aggregator: &ResultAggregator, on_progress: &mut F)
    where
        F: FnMut(ProgressSnapshot),
    {
        if aggregator.processed() > self.last_reported {
            self.report(aggregator, on_progress);
        }
    }

    fn report<F>(&mut self, aggregator: &ResultAggregator, on_progress: &mut F)
    where
        F: FnMut(ProgressSnapshot),
    {
        let snapshot = aggregator.snapshot();
        self.last_reported = snapshot.processed;
        tracing::debug!(
            processed = snapshot.processed,
            total = snapshot.total,
            "Reporting progress"
        );
        on_progress(snapshot);
    }
}
