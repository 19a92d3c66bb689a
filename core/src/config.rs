//! Monitor pacing configuration.

use std::time::Duration;

use crate::MonitorError;

/// Pacing parameters for [`watch_pending`](crate::watch_pending).
///
/// Both values are soft pacing parameters for the monitor itself, not
/// deadlines enforced on the watched operations. `cycle` should be at least
/// `interval`; a shorter cycle is accepted but makes every idle tick produce
/// a pending-list report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between idle wake-ups; one `.` per elapsed interval.
    pub interval: Duration,
    /// Idle span after which the pending-list report is emitted.
    pub cycle: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            cycle: Duration::from_secs(5),
        }
    }
}

impl MonitorConfig {
    /// Reject configurations that cannot pace anything.
    pub(crate) fn validate(&self) -> Result<(), MonitorError> {
        if self.interval.is_zero() {
            return Err(MonitorError::ZeroInterval);
        }
        if self.cycle.is_zero() {
            return Err(MonitorError::ZeroCycle);
        }
        if self.cycle < self.interval {
            tracing::warn!(
                interval_ms = self.interval.as_millis() as u64,
                cycle_ms = self.cycle.as_millis() as u64,
                "cycle is shorter than interval; every idle tick will report"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_tenth_of_a_second_and_five_seconds() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.cycle, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = MonitorConfig {
            interval: Duration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::ZeroInterval)));
    }

    #[test]
    fn zero_cycle_is_rejected() {
        let config = MonitorConfig {
            cycle: Duration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::ZeroCycle)));
    }

    #[test]
    fn cycle_shorter_than_interval_is_accepted() {
        let config = MonitorConfig {
            interval: Duration::from_secs(1),
            cycle: Duration::from_millis(200),
        };
        assert!(config.validate().is_ok());
    }
}
