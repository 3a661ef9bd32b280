//! Preemption and destroy signals observed while blocked on a channel

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use vision_shared::{defaults, TransportError};

/// Called periodically while waiting; an `Err` preempts the wait
pub type PreemptCheck = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Cloneable signal that aborts every in-progress wait of a client
#[derive(Debug, Clone, Default)]
pub struct DestroyHandle {
    triggered: Arc<AtomicBool>,
}

impl DestroyHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal destruction. Waits observe it at their next poll.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

/// Signals a channel checks while it is blocked
#[derive(Clone, Default)]
pub struct Interrupts {
    preempt: Option<PreemptCheck>,
    destroy: DestroyHandle,
}

impl Interrupts {
    pub fn new(preempt: Option<PreemptCheck>, destroy: DestroyHandle) -> Self {
        Self { preempt, destroy }
    }

    /// Check the destroy flag and, if requested, the preemption callback
    pub fn poll(&self, check_preempt: bool) -> Result<(), TransportError> {
        if self.destroy.is_triggered() {
            return Err(TransportError::Destroyed);
        }
        if check_preempt {
            if let Some(check) = &self.preempt {
                check().map_err(|e| TransportError::Preempted(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Drive `operation` to completion while polling the signals.
    ///
    /// Fails with [`TransportError::Timeout`] once `timeout` elapses. The
    /// operation is dropped on timeout or interruption, so it must be
    /// cancel-safe.
    pub async fn run<F, T>(
        &self,
        operation: F,
        timeout: Option<Duration>,
        check_preempt: bool,
    ) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        tokio::pin!(operation);
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut ticker = interval(defaults::PREEMPT_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = &mut operation => return result,
                _ = ticker.tick() => self.poll(check_preempt)?,
                _ = sleep_until_deadline(deadline) => {
                    return Err(TransportError::Timeout(timeout.unwrap_or_default()));
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
