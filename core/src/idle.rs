//! Idle-tick accounting and cycle-threshold detection.

use std::time::Duration;

/// What a recorded idle tick means for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdleStep {
    /// Still inside the cycle; emit the dot only.
    Waiting,
    /// The idle span reached a full cycle; emit the pending-list report.
    /// The counter has already been reset when this is returned.
    CycleElapsed,
}

/// Counts consecutive idle ticks between labeled completions.
///
/// Invariant while waiting: `ticks * interval < cycle`. The threshold check
/// uses `>=` rather than `==` to tolerate scheduler jitter. The counter
/// resets on a labeled completion or on a cycle report, never accumulates
/// across both.
#[derive(Debug)]
pub(crate) struct IdleCounter {
    ticks: u32,
    interval: Duration,
    cycle: Duration,
}

impl IdleCounter {
    pub(crate) fn new(interval: Duration, cycle: Duration) -> Self {
        Self {
            ticks: 0,
            interval,
            cycle,
        }
    }

    /// Record one elapsed interval with no labeled completion.
    pub(crate) fn record_tick(&mut self) -> IdleStep {
        self.ticks = self.ticks.saturating_add(1);
        if self.interval.saturating_mul(self.ticks) >= self.cycle {
            self.ticks = 0;
            IdleStep::CycleElapsed
        } else {
            IdleStep::Waiting
        }
    }

    /// A labeled completion ends the idle span.
    pub(crate) fn reset(&mut self) {
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_exactly_at_cycle_boundary() {
        let mut idle = IdleCounter::new(Duration::from_millis(100), Duration::from_secs(5));
        for _ in 0..49 {
            assert_eq!(idle.record_tick(), IdleStep::Waiting);
        }
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
        // Counter restarted: the next full cycle takes another 50 ticks.
        for _ in 0..49 {
            assert_eq!(idle.record_tick(), IdleStep::Waiting);
        }
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
    }

    #[test]
    fn inequality_tolerates_non_divisible_cycle() {
        // 3s interval against a 10s cycle crosses at the fourth tick (12s).
        let mut idle = IdleCounter::new(Duration::from_secs(3), Duration::from_secs(10));
        for _ in 0..3 {
            assert_eq!(idle.record_tick(), IdleStep::Waiting);
        }
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
    }

    #[test]
    fn completion_resets_the_span() {
        let mut idle = IdleCounter::new(Duration::from_secs(1), Duration::from_secs(3));
        assert_eq!(idle.record_tick(), IdleStep::Waiting);
        assert_eq!(idle.record_tick(), IdleStep::Waiting);
        idle.reset();
        assert_eq!(idle.record_tick(), IdleStep::Waiting);
        assert_eq!(idle.record_tick(), IdleStep::Waiting);
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
    }

    #[test]
    fn cycle_no_longer_than_interval_reports_every_tick() {
        let mut idle = IdleCounter::new(Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
        assert_eq!(idle.record_tick(), IdleStep::CycleElapsed);
    }
}
