//! The tick-race loop: the monitor's core state machine.
//!
//! Each iteration spawns one fresh timer tick and races it against every
//! still-pending labeled operation, first-completed-wins. The outcome drives
//! the idle accounting and the progress protocol. Ticks that lose a race are
//! left sleeping and drained in one pass once the labeled set is exhausted.

use std::io::Write;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, select_all};
use tokio::runtime::Handle;
use tokio::task::JoinError;

use crate::MonitorError;
use crate::config::MonitorConfig;
use crate::idle::{IdleCounter, IdleStep};
use crate::ops::{LabeledOp, LabeledOps};
use crate::report::{ALL_DONE, IDLE_DOT, completion_line, pending_line};
use crate::tick::{TickId, TickPool};

/// Accounting returned by a completed watch.
///
/// `ticks_spawned == ticks_reaped` holds whenever [`watch_pending`] returns:
/// every timer tick is either consumed by a race or drained at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Labeled completion lines emitted.
    pub completed: usize,
    /// Idle dots emitted.
    pub idle_ticks: usize,
    /// Pending-list reports emitted.
    pub cycle_reports: usize,
    /// Timer ticks spawned over the whole watch.
    pub ticks_spawned: usize,
    /// Timer ticks consumed by races or drained at shutdown.
    pub ticks_reaped: usize,
}

/// First-completed-wins outcome of one race participant.
#[derive(Debug)]
enum RaceOutcome {
    /// A labeled operation finished (successfully or not).
    Labeled {
        index: usize,
        result: Result<(), JoinError>,
    },
    /// A timer tick elapsed.
    Tick(TickId),
    /// A timer tick task itself failed.
    TickLost(TickId, JoinError),
}

/// One race's outcomes, partitioned for the loop to act on.
#[derive(Debug, Default)]
struct RaceResolution {
    /// Indices of operations that completed successfully, in race order.
    completed: Vec<usize>,
    /// First operation failure observed, if any.
    failed: Option<(usize, JoinError)>,
    /// Every tick whose completion this race consumed.
    fired: Vec<TickId>,
    /// Whether the authoritative tick of this iteration elapsed.
    tick_fired: bool,
    /// First tick task failure observed, if any.
    timer_error: Option<JoinError>,
}

/// Watch `ops` until every labeled operation completes, reporting progress
/// to `sink`.
///
/// Must be called within a Tokio runtime; the scheduling context is captured
/// once at start and every timer tick is spawned on it. The caller's
/// operations are only observed, never cancelled, and the result values
/// they produce are not consumed here.
///
/// An empty set short-circuits to the terminal marker without spawning a
/// single timer. A handle that is already finished is reported on the very
/// first iteration. A failed (panicked or externally aborted) operation is
/// fatal: the error is returned to the caller, after the tick registry has
/// been drained.
pub async fn watch_pending<W: Write>(
    ops: LabeledOps,
    sink: &mut W,
    config: MonitorConfig,
) -> Result<MonitorStats, MonitorError> {
    config.validate()?;

    let mut entries = ops.into_entries();
    let mut pool = TickPool::new(Handle::current());

    let outcome = race_loop(&mut entries, sink, config, &mut pool).await;
    // Every exit path waits for the sleepers; losers of past races included.
    pool.drain().await;

    let mut stats = outcome?;
    stats.ticks_spawned = pool.spawned();
    stats.ticks_reaped = pool.reaped();
    tracing::debug!(
        completed = stats.completed,
        idle_ticks = stats.idle_ticks,
        cycle_reports = stats.cycle_reports,
        ticks = stats.ticks_spawned,
        "watch finished"
    );
    Ok(stats)
}

async fn race_loop<W: Write>(
    entries: &mut [LabeledOp],
    sink: &mut W,
    config: MonitorConfig,
    pool: &mut TickPool,
) -> Result<MonitorStats, MonitorError> {
    let mut stats = MonitorStats::default();
    let mut idle = IdleCounter::new(config.interval, config.cycle);

    while entries.iter().any(|op| !op.done) {
        let current = pool.spawn_tick(config.interval);
        let outcomes = race_first_completed(entries, pool, current).await;
        let resolution = resolve_outcomes(outcomes, current);

        // Bookkeeping first: consumed tick handles must leave the registry
        // before any early return below, or drain would join them twice.
        for id in &resolution.fired {
            pool.retire(*id);
        }
        for &index in &resolution.completed {
            entries[index].done = true;
        }

        if let Some(error) = resolution.timer_error {
            return Err(MonitorError::Timer(error));
        }

        if resolution.completed.is_empty() {
            if resolution.tick_fired {
                stats.idle_ticks += 1;
                emit(sink, IDLE_DOT)?;
                if idle.record_tick() == IdleStep::CycleElapsed {
                    let mut pending: Vec<&str> = entries
                        .iter()
                        .filter(|op| !op.done)
                        .map(|op| op.label.as_str())
                        .collect();
                    pending.sort_unstable();
                    emit(sink, &pending_line(&pending))?;
                    stats.cycle_reports += 1;
                }
            }
        } else {
            // Ties within one race are reported in label order, independent
            // of the scheduler's completion order.
            let mut labels: Vec<&str> = resolution
                .completed
                .iter()
                .map(|&index| entries[index].label.as_str())
                .collect();
            labels.sort_unstable();
            for label in labels {
                emit(sink, &completion_line(label))?;
                stats.completed += 1;
            }
            idle.reset();
        }

        if let Some((index, source)) = resolution.failed {
            return Err(MonitorError::Operation {
                label: entries[index].label.clone(),
                source,
            });
        }
    }

    emit(sink, ALL_DONE)?;
    Ok(stats)
}

/// Race every pending labeled operation against the current tick and return
/// everything found complete, winner first.
async fn race_first_completed<'a>(
    entries: &'a mut [LabeledOp],
    pool: &'a mut TickPool,
    current: TickId,
) -> Vec<RaceOutcome> {
    let mut futures: Vec<BoxFuture<'a, RaceOutcome>> = entries
        .iter_mut()
        .enumerate()
        .filter(|(_, op)| !op.done)
        .map(|(index, op)| {
            async move {
                let result = (&mut op.handle).await;
                RaceOutcome::Labeled { index, result }
            }
            .boxed()
        })
        .collect();

    let tick = pool.race_handle(current);
    futures.push(
        async move {
            match tick.await {
                Ok(()) => RaceOutcome::Tick(current),
                Err(error) => RaceOutcome::TickLost(current, error),
            }
        }
        .boxed(),
    );

    // The set is never empty here: the loop guard keeps at least one labeled
    // operation pending, and the fresh tick is always present.
    let (winner, _, losers) = select_all(futures).await;

    // Sweep the losers once so completions that tied with the winner land in
    // the same report batch.
    let mut outcomes = vec![winner];
    for loser in losers {
        if let Some(outcome) = loser.now_or_never() {
            outcomes.push(outcome);
        }
    }
    outcomes
}

/// Partition race outcomes into the events the loop acts on.
fn resolve_outcomes(outcomes: Vec<RaceOutcome>, current: TickId) -> RaceResolution {
    let mut resolution = RaceResolution::default();
    for outcome in outcomes {
        match outcome {
            RaceOutcome::Labeled {
                index,
                result: Ok(()),
            } => resolution.completed.push(index),
            RaceOutcome::Labeled {
                index,
                result: Err(error),
            } => {
                if resolution.failed.is_none() {
                    resolution.failed = Some((index, error));
                } else {
                    tracing::debug!(index, %error, "additional operation failure in same race");
                }
            }
            RaceOutcome::Tick(id) => {
                resolution.fired.push(id);
                if id == current {
                    resolution.tick_fired = true;
                } else {
                    // A stale loser from an earlier iteration: consumed, but
                    // never counted as idleness.
                    tracing::trace!(tick = id.0, "stale tick ignored for accounting");
                }
            }
            RaceOutcome::TickLost(id, error) => {
                resolution.fired.push(id);
                if resolution.timer_error.is_none() {
                    resolution.timer_error = Some(error);
                }
            }
        }
    }
    resolution
}

fn emit<W: Write>(sink: &mut W, text: &str) -> Result<(), MonitorError> {
    sink.write_all(text.as_bytes())?;
    sink.flush()?;
    Ok(())
}
