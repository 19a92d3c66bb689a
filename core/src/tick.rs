//! Ephemeral timer-tick tasks and their lifecycle registry.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Identity of one spawned tick. Only the tick spawned at the start of the
/// current race iteration is authoritative for idle accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickId(pub(crate) u64);

#[derive(Debug)]
struct Tick {
    id: TickId,
    handle: JoinHandle<()>,
}

/// Registry of every timer tick the monitor ever spawns.
///
/// Ticks that lose a race keep sleeping in the background; they are never
/// raced again, only awaited by [`TickPool::drain`] before the monitor
/// returns. A tick whose completion a race did consume must be
/// [retired](TickPool::retire) instead, since its handle has already been
/// joined. The `spawned`/`reaped` counters make the no-leak invariant
/// observable to callers and tests.
#[derive(Debug)]
pub(crate) struct TickPool {
    runtime: Handle,
    ticks: Vec<Tick>,
    next_id: u64,
    spawned: usize,
    reaped: usize,
}

impl TickPool {
    /// Captures the scheduling context every tick will be spawned on.
    pub(crate) fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            ticks: Vec::new(),
            next_id: 0,
            spawned: 0,
            reaped: 0,
        }
    }

    /// Spawn a fresh tick that completes after `interval`.
    pub(crate) fn spawn_tick(&mut self, interval: Duration) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;
        let handle = self.runtime.spawn(tokio::time::sleep(interval));
        self.ticks.push(Tick { id, handle });
        self.spawned += 1;
        tracing::trace!(tick = id.0, interval_ms = interval.as_millis() as u64, "tick spawned");
        id
    }

    /// Mutable handle of a registered tick, for the race.
    pub(crate) fn race_handle(&mut self, id: TickId) -> &mut JoinHandle<()> {
        self.ticks
            .iter_mut()
            .find(|tick| tick.id == id)
            .map(|tick| &mut tick.handle)
            .expect("current tick is registered until retired")
    }

    /// Forget a tick whose completion was consumed by a race.
    pub(crate) fn retire(&mut self, id: TickId) {
        let before = self.ticks.len();
        self.ticks.retain(|tick| tick.id != id);
        if self.ticks.len() < before {
            self.reaped += 1;
            tracing::trace!(tick = id.0, "tick consumed by race");
        }
    }

    /// Await every tick still registered, so no timer remains scheduled past
    /// the monitor's return. Runs on every exit path, success or error.
    pub(crate) async fn drain(&mut self) {
        for tick in self.ticks.drain(..) {
            if let Err(error) = tick.handle.await {
                tracing::warn!(tick = tick.id.0, %error, "tick task failed during drain");
            }
            self.reaped += 1;
        }
    }

    pub(crate) fn spawned(&self) -> usize {
        self.spawned
    }

    pub(crate) fn reaped(&self) -> usize {
        self.reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn drain_reaps_every_spawned_tick() {
        let mut pool = TickPool::new(Handle::current());
        for _ in 0..3 {
            pool.spawn_tick(Duration::from_millis(100));
        }
        assert_eq!(pool.spawned(), 3);
        assert_eq!(pool.reaped(), 0);

        pool.drain().await;
        assert_eq!(pool.spawned(), 3);
        assert_eq!(pool.reaped(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retired_ticks_are_not_drained_twice() {
        let mut pool = TickPool::new(Handle::current());
        let first = pool.spawn_tick(Duration::from_millis(10));
        pool.spawn_tick(Duration::from_millis(10));

        pool.race_handle(first).await.expect("tick sleeps never fail");
        pool.retire(first);
        assert_eq!(pool.reaped(), 1);

        pool.drain().await;
        assert_eq!(pool.spawned(), 2);
        assert_eq!(pool.reaped(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retire_ignores_unknown_ids() {
        let mut pool = TickPool::new(Handle::current());
        let id = pool.spawn_tick(Duration::from_millis(10));
        pool.retire(id);
        pool.retire(id);
        assert_eq!(pool.reaped(), 1);
    }
}
