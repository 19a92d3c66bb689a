//! Monitor error taxonomy.

use std::io;

use thiserror::Error;
use tokio::task::JoinError;

/// Errors surfaced by [`watch_pending`](crate::watch_pending).
///
/// Operation failure is fatal to the monitor on purpose: a panicked or
/// externally aborted operation can never complete, and surfacing it beats
/// letting the race loop stall forever. The tick registry is drained before
/// any of these are returned.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `interval` must be positive; a zero interval would race a timer that
    /// is always complete.
    #[error("interval must be positive")]
    ZeroInterval,
    /// `cycle` must be positive.
    #[error("cycle must be positive")]
    ZeroCycle,
    /// A labeled operation panicked or was aborted outside the monitor.
    #[error("operation '{label}' failed before completing")]
    Operation {
        label: String,
        #[source]
        source: JoinError,
    },
    /// A timer tick task failed; only expected when the runtime is shutting
    /// down underneath the monitor.
    #[error("timer tick failed")]
    Timer(#[source] JoinError),
    /// Writing to or flushing the progress sink failed.
    #[error("progress sink write failed")]
    Sink(#[from] io::Error),
}
