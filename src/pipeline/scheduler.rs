// src/pipeline/scheduler.rs

//! Check scheduler.
//!
//! A single task owns the poll timer and a queue of on-demand check
//! requests. Timer ticks and requests both turn into cycles that run one
//! at a time, so two cycles never overlap. Requests that pile up while a
//! cycle is running are answered together by the next cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::cycle::{CycleOutcome, Watcher};

/// Queue depth for pending check-now requests.
const REQUEST_QUEUE: usize = 64;

/// Whether a cycle is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

struct CheckRequest {
    reply: oneshot::Sender<CycleOutcome>,
}

/// Cloneable handle used to trigger checks and observe the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<CheckRequest>,
    running: Arc<AtomicBool>,
    interval: Duration,
}

impl SchedulerHandle {
    /// Request an immediate cycle and wait for its outcome.
    ///
    /// Returns `None` if the scheduler has stopped.
    pub async fn check_now(&self) -> Option<CycleOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(CheckRequest { reply }).await.ok()?;
        rx.await.ok()
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.interval
    }
}

/// Timer-driven cycle runner.
pub struct Scheduler {
    watcher: Watcher,
    interval: Duration,
    rx: mpsc::Receiver<CheckRequest>,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler and its handle. `interval` must be non-zero.
    pub fn new(
        watcher: Watcher,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let running = Arc::new(AtomicBool::new(false));
        let handle = SchedulerHandle {
            tx,
            running: Arc::clone(&running),
            interval,
        };
        let scheduler = Self {
            watcher,
            interval,
            rx,
            running,
            shutdown,
        };
        (scheduler, handle)
    }

    /// Run until the shutdown token is cancelled.
    ///
    /// The first cycle starts immediately. A cycle in progress when
    /// shutdown is requested runs to completion, including its write to
    /// the seen-store.
    pub async fn run(mut self) {
        log::info!(
            "Scheduler started, checking every {}s",
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let waiters = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(request) = self.rx.recv() => {
                    let mut waiters = vec![request.reply];
                    while let Ok(request) = self.rx.try_recv() {
                        waiters.push(request.reply);
                    }
                    log::info!("Check requested by {} caller(s)", waiters.len());
                    waiters
                }
                _ = ticker.tick() => Vec::new(),
            };

            let outcome = self.cycle().await;
            ticker.reset();

            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        }

        self.rx.close();
        log::info!("Scheduler stopped");
    }

    async fn cycle(&self) -> CycleOutcome {
        self.running.store(true, Ordering::SeqCst);
        let outcome = self.watcher.run_cycle().await;
        self.running.store(false, Ordering::SeqCst);
        outcome
    }
}
