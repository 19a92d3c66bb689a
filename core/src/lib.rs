//! Completion monitor for labeled asynchronous operations.
//!
//! `vigia` watches a set of independently running, labeled tasks and reports
//! their progress through a textual protocol: one `.` per interval that
//! passes without a completion, a pending-list line after every full idle
//! cycle, a ` {label} completou!` line the moment an operation finishes, and
//! a final `!` once nothing is left.
//!
//! The monitor observes; it never cancels, retries, or restarts the
//! operations it watches. Timer ticks it spawns for pacing are tracked in an
//! explicit registry and drained before [`watch_pending`] returns, so no
//! background timer outlives the watch.

mod config;
mod error;
mod idle;
mod monitor;
mod ops;
mod report;
mod tick;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::{MonitorStats, watch_pending};
pub use ops::LabeledOps;
