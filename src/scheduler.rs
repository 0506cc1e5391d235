//! Periodic task scheduling.
//!
//! The sensor poll and the weather refresh are plain closures handed to a
//! [`Scheduler`], so the evaluation logic never touches a real timer.

use futures_util::future::BoxFuture;
use log::debug;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// A repeating unit of work. Called once per tick; the returned future is
/// awaited before the next tick is taken.
pub type Task = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

pub trait Scheduler: Send + Sync {
    /// Run `task` every `period`, first after `delay`.
    fn schedule_after(
        &self,
        label: &'static str,
        delay: Duration,
        period: Duration,
        task: Task,
    ) -> JoinHandle<()>;

    /// Run `task` every `period`, starting immediately.
    fn schedule(&self, label: &'static str, period: Duration, task: Task) -> JoinHandle<()> {
        self.schedule_after(label, Duration::ZERO, period, task)
    }
}

/// Runs tasks on tokio intervals until the shutdown token is cancelled.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    shutdown: CancellationToken,
}

impl TokioScheduler {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(
        &self,
        label: &'static str,
        delay: Duration,
        period: Duration,
        mut task: Task,
    ) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + delay, period);
            // A slow fetch must not cause a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("[Scheduler] {} stopped", label);
                        break;
                    }
                    _ = ticker.tick() => task().await,
                }
            }
        })
    }
}
