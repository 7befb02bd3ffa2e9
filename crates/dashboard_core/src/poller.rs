//! Fixed-interval simulation ticks with a pending-tick guard.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[async_trait]
pub trait TickHandler: Send + Sync {
    async fn tick(&self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub started: u64,
    pub skipped: u64,
}

#[derive(Default)]
struct PollerCounters {
    in_flight: AtomicBool,
    started: AtomicU64,
    skipped: AtomicU64,
}

/// Clears the in-flight flag when the tick task ends, including on panic or abort.
struct InFlightGuard(Arc<PollerCounters>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

pub struct SimulationPoller {
    period: Duration,
    counters: Arc<PollerCounters>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationPoller {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            counters: Arc::new(PollerCounters::default()),
            timer: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the recurring timer, replacing one that is already running. The first
    /// tick fires immediately. While a tick is outstanding, timer firings are
    /// skipped rather than queued.
    pub fn start(&self, handler: Arc<dyn TickHandler>) {
        let counters = Arc::clone(&self.counters);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if counters.in_flight.swap(true, Ordering::SeqCst) {
                    counters.skipped.fetch_add(1, Ordering::SeqCst);
                    debug!("poller: previous tick still in flight, skipping");
                    continue;
                }
                counters.started.fetch_add(1, Ordering::SeqCst);
                let guard = InFlightGuard(Arc::clone(&counters));
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let _guard = guard;
                    handler.tick().await;
                });
            }
        });

        let previous = self.lock_timer().replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        info!(period_ms = period.as_millis() as u64, "poller: started");
    }

    /// Cancels the timer so no further ticks are scheduled. A tick already running
    /// is allowed to finish.
    pub fn stop(&self) {
        if let Some(task) = self.lock_timer().take() {
            task.abort();
            info!("poller: stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            started: self.counters.started.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
        }
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SimulationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
