//! Periodic task runner.
//!
//! Each background job runs in its own loop:
//! 1. Wait for the next interval tick (or an explicit trigger)
//! 2. Run one tick of the task to completion
//! 3. Check the control channel for shutdown between ticks
//!
//! A tick in progress is never interrupted; shutdown takes effect once it
//! returns.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

/// Messages that can be sent to a running scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Run a tick immediately.
    TriggerNow,
    /// Stop the scheduler.
    Shutdown,
}

/// Work performed on every scheduler tick.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs one pass. Failures are handled inside the task.
    async fn tick(&self);
}

/// Drives a [`PeriodicTask`] on a fixed period.
pub struct Scheduler {
    task: Arc<dyn PeriodicTask>,
    period: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(task: Arc<dyn PeriodicTask>, period: Duration) -> Self {
        Self { task, period }
    }

    /// Runs the scheduler loop until shutdown or until every sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<SchedulerMessage>) {
        let name = self.task.name();
        info!("{} scheduler started (every {:?})", name, self.period);

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.task.tick().await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::TriggerNow) => {
                            debug!("{} scheduler triggered manually", name);
                            self.task.tick().await;
                        }
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!("{} scheduler shutting down", name);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("task", &self.task.name())
            .field("period", &self.period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl PeriodicTask for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn tick(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_trigger_and_shutdown() {
        let counter = Arc::new(Counter::default());
        let scheduler = Scheduler::new(counter.clone(), Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel(4);

        tx.send(SchedulerMessage::TriggerNow).await.unwrap();
        tx.send(SchedulerMessage::TriggerNow).await.unwrap();
        tx.send(SchedulerMessage::Shutdown).await.unwrap();
        scheduler.run(rx).await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_period() {
        let counter = Arc::new(Counter::default());
        let scheduler = Scheduler::new(counter.clone(), Duration::from_secs(10));
        let (tx, rx) = mpsc::channel(1);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_secs(35)).await;
        tx.send(SchedulerMessage::Shutdown).await.unwrap();
        handle.await.unwrap();

        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_when_senders_dropped() {
        let counter = Arc::new(Counter::default());
        let scheduler = Scheduler::new(counter.clone(), Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        scheduler.run(rx).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }
}
