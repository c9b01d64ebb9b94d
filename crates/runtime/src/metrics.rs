use std::collections::BTreeMap;

pub const RECONCILE_PASSES: &str = "reconcile.passes";
pub const RECONCILE_SKIPPED: &str = "reconcile.skipped";
pub const RECONCILE_CREATED: &str = "reconcile.created";
pub const RECONCILE_UPDATED: &str = "reconcile.updated";
pub const RECONCILE_REMOVED: &str = "reconcile.removed";
/// Registry lookups performed while planning; linear in desired + materialized.
pub const RECONCILE_LOOKUPS: &str = "reconcile.lookups";
pub const OVERLAY_PASSES: &str = "overlay.passes";
pub const OVERLAY_RESTYLED: &str = "overlay.restyled";
pub const QUERY_STALE_DROPPED: &str = "query.stale_dropped";
pub const MARKERS_LIVE: &str = "markers.live";

/// Deterministic metrics aggregation.
///
/// Metrics must not depend on wall-clock time or unordered iteration.
/// Sorted maps keep snapshots stable for logs and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, name: &'static str, by: u64) {
        if by == 0 {
            return;
        }
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}
