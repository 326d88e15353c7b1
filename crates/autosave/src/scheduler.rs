//! Cancellable timers on the Tokio runtime.
//!
//! Both timers own at most one spawned task. Starting again or cancelling
//! aborts the previous task, and dropping the timer cancels it too.
//! A debounced job that has already started is detached from its timer and
//! always runs to completion.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Runs a job once `delay` passes without another `schedule` call.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending job with `job`, run after the full delay.
    ///
    /// Once the delay passes the job runs as its own task, so a later
    /// `cancel` or `schedule` does not interrupt it.
    ///
    /// Must be called within a Tokio runtime.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            tokio::spawn(job);
        }));
    }

    /// Drop the job if it is still waiting.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a job is waiting for its delay.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs a job every `period`, first after one full period.
#[derive(Debug)]
pub struct IntervalTask {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTask {
    /// Create a stopped interval.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    /// Start ticking, replacing any running job.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start<F, Fut>(&mut self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        }));
    }

    /// Stop ticking.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the interval is ticking.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IntervalTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
