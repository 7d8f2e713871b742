//! Background transcript poller.
//!
//! Fetches the transcript on a fixed interval until the call finishes, the
//! deadline passes, or the owner cancels. Dropping the [`PollHandle`] also
//! cancels, so a poll never outlives whoever started it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::transcript::{TranscriptService, TranscriptSnapshot};
use crate::calls::CallStatus;
use crate::error::WorkflowError;

/// Polling cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between fetches. The first fetch is immediate.
    pub interval: Duration,
    /// Give up after this long, measured on the injected clock.
    pub max_duration: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_duration: Duration::from_secs(15 * 60),
        }
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed { transcript: Option<String> },
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

/// Owner's side of a running poll.
pub struct PollHandle {
    handle: Option<JoinHandle<PollOutcome>>,
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
    latest: watch::Receiver<Option<TranscriptSnapshot>>,
}

impl PollHandle {
    /// Stop polling. Takes effect immediately, even mid-wait.
    pub fn cancel(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Most recent snapshot, if any fetch has succeeded yet.
    pub fn latest(&self) -> Option<TranscriptSnapshot> {
        self.latest.borrow().clone()
    }

    /// Watch every new snapshot as it arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<TranscriptSnapshot>> {
        self.latest.clone()
    }

    /// Wait for the poll to reach a terminal state.
    pub async fn join(mut self) -> PollOutcome {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| PollOutcome::Failed {
                reason: format!("poll task panicked: {e}"),
            }),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel();
        }
    }
}

/// Spawn a poll of `customer_id`'s latest call.
///
/// Provider errors are logged and retried on the next tick. A missing
/// customer or missing call id ends the poll as `Failed`.
pub fn spawn_transcript_poller(
    service: Arc<TranscriptService>,
    customer_id: Uuid,
    config: PollConfig,
    clock: Arc<dyn Clock>,
) -> PollHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());
    let (tx, rx) = watch::channel(None);

    let task_shutdown = Arc::clone(&shutdown);
    let task_wake = Arc::clone(&wake);

    let handle = tokio::spawn(async move {
        info!(
            customer_id = %customer_id,
            interval_ms = config.interval.as_millis() as u64,
            "Transcript poller started"
        );

        let outcome = run_poll(
            &service,
            customer_id,
            config,
            clock.as_ref(),
            &task_shutdown,
            &task_wake,
            &tx,
        )
        .await;

        info!(customer_id = %customer_id, outcome = ?outcome, "Transcript poller stopped");
        outcome
    });

    PollHandle {
        handle: Some(handle),
        shutdown,
        wake,
        latest: rx,
    }
}

async fn run_poll(
    service: &TranscriptService,
    customer_id: Uuid,
    config: PollConfig,
    clock: &dyn Clock,
    shutdown: &AtomicBool,
    wake: &Notify,
    tx: &watch::Sender<Option<TranscriptSnapshot>>,
) -> PollOutcome {
    let started = clock.now();
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }

        if shutdown.load(Ordering::Relaxed) {
            return PollOutcome::Cancelled;
        }

        let elapsed = (clock.now() - started).to_std().unwrap_or_default();
        if elapsed >= config.max_duration {
            warn!(customer_id = %customer_id, elapsed_secs = elapsed.as_secs(), "Transcript poll timed out");
            return PollOutcome::TimedOut;
        }

        // A fetch may not outlive the deadline.
        let remaining = config.max_duration - elapsed;
        let result = tokio::select! {
            r = service.fetch(customer_id) => r,
            _ = tokio::time::sleep(remaining) => {
                warn!(customer_id = %customer_id, "Transcript fetch outlived the poll deadline");
                return PollOutcome::TimedOut;
            }
            _ = wake.notified() => return PollOutcome::Cancelled,
        };

        match result {
            Ok(snapshot) => {
                debug!(customer_id = %customer_id, status = ?snapshot.status, "Poll tick");
                let outcome = snapshot
                    .status
                    .is_terminal()
                    .then(|| terminal_outcome(&snapshot));
                tx.send_replace(Some(snapshot));

                if let Some(outcome) = outcome {
                    return outcome;
                }
            }
            Err(e @ (WorkflowError::NotFound(_) | WorkflowError::PreconditionFailed(_))) => {
                return PollOutcome::Failed {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                warn!(customer_id = %customer_id, error = %e, "Transcript poll tick failed");
            }
        }
    }
}

fn terminal_outcome(snapshot: &TranscriptSnapshot) -> PollOutcome {
    match snapshot.status {
        CallStatus::Completed => PollOutcome::Completed {
            transcript: snapshot.transcript.clone(),
        },
        _ => PollOutcome::Failed {
            reason: snapshot
                .error_message
                .clone()
                .unwrap_or_else(|| "call failed".to_string()),
        },
    }
}
