//! Incremental aggregation of probe outcomes into progress snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::NormalizedId;
use super::id_set::UniqueIdSet;
use super::outcome::CheckOutcome;

/// Point-in-time view of a run's progress and results.
///
/// Observers always receive an owned copy; the aggregator keeps the only
/// mutable state. Id lists follow the run's input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub live: Vec<NormalizedId>,
    pub dead: Vec<NormalizedId>,
    /// Only populated when unreachable ids are kept apart from dead ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreachable: Vec<NormalizedId>,
}

impl ProgressSnapshot {
    /// An empty snapshot for a run over `total` ids.
    pub fn empty(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// Completion percentage in `0.0..=100.0`. An empty run counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }

    /// One-line human readable status.
    pub fn summary(&self) -> String {
        if self.is_complete() {
            let mut msg = format!(
                "Check complete: {} live, {} dead",
                self.live.len(),
                self.dead.len()
            );
            if !self.unreachable.is_empty() {
                msg.push_str(&format!(", {} unreachable", self.unreachable.len()));
            }
            msg
        } else {
            format!(
                "Checked {}/{} ({:.0}%): {} live, {} dead",
                self.processed,
                self.total,
                self.percent(),
                self.live.len(),
                self.dead.len()
            )
        }
    }
}

/// Accumulates outcomes for one run.
///
/// Every id of the run's set is recorded at most once; outcomes for unknown
/// or already-recorded ids are rejected so that `processed` always equals the
/// combined length of the result lists.
#[derive(Debug)]
pub struct ResultAggregator {
    ids: Vec<NormalizedId>,
    positions: HashMap<NormalizedId, usize>,
    recorded: Vec<bool>,
    // Input positions, kept sorted so snapshots list ids in input order.
    live: Vec<usize>,
    dead: Vec<usize>,
    unreachable: Vec<usize>,
}

impl ResultAggregator {
    pub fn new(ids: &UniqueIdSet) -> Self {
        let ids: Vec<NormalizedId> = ids.iter().cloned().collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();
        let recorded = vec![false; ids.len()];
        Self {
            ids,
            positions,
            recorded,
            live: Vec::new(),
            dead: Vec::new(),
            unreachable: Vec::new(),
        }
    }

    /// Record the outcome for `id`.
    ///
    /// Returns `false` (and changes nothing) if `id` is not part of this run
    /// or already has an outcome.
    pub fn record(&mut self, id: &NormalizedId, outcome: CheckOutcome) -> bool {
        let Some(&pos) = self.positions.get(id) else {
            tracing::warn!(id = %id, "Ignoring outcome for id outside this run");
            return false;
        };
        if self.recorded[pos] {
            tracing::warn!(id = %id, "Ignoring duplicate outcome");
            return false;
        }
        self.recorded[pos] = true;

        let list = match outcome {
            CheckOutcome::Live => &mut self.live,
            CheckOutcome::Dead => &mut self.dead,
            CheckOutcome::Unreachable => &mut self.unreachable,
        };
        let at = list.partition_point(|&p| p < pos);
        list.insert(at, pos);
        true
    }

    pub fn processed(&self) -> usize {
        self.live.len() + self.dead.len() + self.unreachable.len()
    }

    pub fn total(&self) -> usize {
        self.ids.len()
    }

    /// An owned copy of the current state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let resolve = |positions: &[usize]| -> Vec<NormalizedId> {
            positions.iter().map(|&p| self.ids[p].clone()).collect()
        };
        ProgressSnapshot {
            processed: self.processed(),
            total: self.total(),
            live: resolve(&self.live),
            dead: resolve(&self.dead),
            unreachable: resolve(&self.unreachable),
        }
    }
}
