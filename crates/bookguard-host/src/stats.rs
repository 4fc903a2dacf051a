//! Guard statistics
//!
//! Monotonic counters per interception point. Interceptors only ever add
//! to them, so relaxed atomics are enough.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::InterceptionPoint;

#[derive(Debug, Default)]
struct PointCounters {
    events: AtomicU64,
    checked: AtomicU64,
    neutralized: AtomicU64,
    write_failures: AtomicU64,
}

impl PointCounters {
    fn snapshot(&self) -> PointStats {
        PointStats {
            events: self.events.load(Ordering::Relaxed),
            checked: self.checked.load(Ordering::Relaxed),
            neutralized: self.neutralized.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Counter snapshot for one interception point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointStats {
    /// Events delivered to the interceptor
    pub events: u64,
    /// Book payloads measured
    pub checked: u64,
    /// Payloads neutralized and committed
    pub neutralized: u64,
    /// Commits the host refused
    pub write_failures: u64,
}

impl PointStats {
    fn add(self, other: PointStats) -> PointStats {
        PointStats {
            events: self.events + other.events,
            checked: self.checked + other.checked,
            neutralized: self.neutralized + other.neutralized,
            write_failures: self.write_failures + other.write_failures,
        }
    }
}

/// Guard statistics shared by all interceptors
#[derive(Debug, Default)]
pub struct GuardStats {
    edit: PointCounters,
    open: PointCounters,
    transfer: PointCounters,
}

impl GuardStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, point: InterceptionPoint) -> &PointCounters {
        match point {
            InterceptionPoint::Edit => &self.edit,
            InterceptionPoint::Open => &self.open,
            InterceptionPoint::Transfer => &self.transfer,
        }
    }

    pub fn point(&self, point: InterceptionPoint) -> PointStats {
        self.counters(point).snapshot()
    }

    /// Sum over all interception points
    pub fn total(&self) -> PointStats {
        InterceptionPoint::all()
            .iter()
            .fold(PointStats::default(), |acc, &p| acc.add(self.point(p)))
    }

    pub(crate) fn record_event(&self, point: InterceptionPoint) {
        self.counters(point).events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_checked(&self, point: InterceptionPoint) {
        self.counters(point).checked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_neutralized(&self, point: InterceptionPoint) {
        self.counters(point)
            .neutralized
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self, point: InterceptionPoint) {
        self.counters(point)
            .write_failures
            .fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_point() {
        let stats = GuardStats::new();
        stats.record_event(InterceptionPoint::Open);
        stats.record_checked(InterceptionPoint::Open);
        stats.record_checked(InterceptionPoint::Open);
        stats.record_neutralized(InterceptionPoint::Transfer);

        assert_eq!(
            stats.point(InterceptionPoint::Open),
            PointStats {
                events: 1,
                checked: 2,
                neutralized: 0,
                write_failures: 0,
            }
        );
        assert_eq!(stats.point(InterceptionPoint::Edit), PointStats::default());
        assert_eq!(stats.point(InterceptionPoint::Transfer).neutralized, 1);
    }

    #[test]
    fn test_total() {
        let stats = GuardStats::new();
        for &point in InterceptionPoint::all() {
            stats.record_event(point);
            stats.record_write_failure(point);
        }
        let total = stats.total();
        assert_eq!(total.events, 3);
        assert_eq!(total.write_failures, 3);
    }
}
