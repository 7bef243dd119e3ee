//! Client-side polling of the sync job until it finishes.

use std::time::Duration;

use leadsync_core::config::ClientConfig;
use leadsync_core::{SyncJobSnapshot, SyncStatus};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::StatusSource;
use crate::error::ClientError;

/// How often and how long to poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Interval multiplier applied after each poll; 1.0 keeps it fixed.
    pub backoff: f64,
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2), 600)
    }
}

impl PollPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    /// Factors that are not finite or below 1.0 fall back to a fixed interval.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = if factor.is_finite() && factor >= 1.0 {
            factor
        } else {
            warn!(factor, "ignoring invalid poll backoff");
            1.0
        };
        self.max_interval = max_interval;
        self
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::fixed(
            Duration::from_millis(config.poll_interval_ms),
            config.poll_max_attempts,
        )
        .with_backoff(
            config.poll_backoff,
            Duration::from_millis(config.poll_max_interval_ms),
        )
    }

    fn next_interval(&self, current: Duration) -> Duration {
        if !self.backoff.is_finite() || self.backoff <= 1.0 {
            return current;
        }
        let cap = self.max_interval.max(self.interval);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .map_or(cap, |next| next.min(cap))
    }
}

/// Running progress as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percentage: u8,
    pub message: String,
    pub processed: usize,
    pub total: usize,
}

async fn cancelled(rx: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: only a final `true` still counts.
            if *rx.borrow() {
                return;
            }
            return std::future::pending().await;
        }
    }
}

pub struct StatusPoller<'a, S: StatusSource + ?Sized> {
    source: &'a S,
    policy: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
    job_id: Option<Uuid>,
}

impl<'a, S: StatusSource + ?Sized> StatusPoller<'a, S> {
    pub fn new(source: &'a S, policy: PollPolicy) -> Self {
        Self {
            source,
            policy,
            cancel: None,
            job_id: None,
        }
    }

    /// Stop polling with `Cancelled` once `true` is sent on the channel.
    pub fn with_cancel(mut self, rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(rx);
        self
    }

    /// Follow one specific job. A snapshot for another job, or `idle` once
    /// this job has been seen, ends polling with `Superseded`.
    pub fn for_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Poll until the job completes, fails, the attempt cap is hit or the
    /// poller is cancelled. The first poll happens one interval after start.
    pub async fn run<F>(mut self, mut on_progress: F) -> Result<SyncJobSnapshot, ClientError>
    where
        F: FnMut(&Progress),
    {
        let mut interval = self.policy.interval;
        let mut seen_job = false;

        for attempt in 1..=self.policy.max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancelled(&mut self.cancel) => return Err(ClientError::Cancelled),
            }

            match self.source.sync_status().await {
                Ok(snap) if self.lost_job(&snap, &mut seen_job) => {
                    info!(attempt, status = %snap.status, current = ?snap.job_id, "tracked job no longer current");
                    return Err(ClientError::Superseded {
                        job_id: self.job_id.map(|id| id.to_string()).unwrap_or_default(),
                    });
                }
                Ok(snap) => match snap.status {
                    SyncStatus::Running => on_progress(&Progress {
                        percentage: snap.percentage.clamp(25, 95),
                        message: snap.message.clone(),
                        processed: snap.processed_leads,
                        total: snap.total_leads,
                    }),
                    SyncStatus::Completed => return Ok(snap),
                    SyncStatus::Error => {
                        return Err(ClientError::ApplicationError {
                            message: snap.message,
                        })
                    }
                    other => debug!(attempt, status = %other, "job not running yet"),
                },
                Err(e) => warn!(attempt, error = %e, "status poll failed, will retry"),
            }

            interval = self.policy.next_interval(interval);
        }

        Err(ClientError::Timeout {
            polls: self.policy.max_attempts,
        })
    }

    fn lost_job(&self, snap: &SyncJobSnapshot, seen_job: &mut bool) -> bool {
        let Some(expected) = self.job_id else {
            return false;
        };
        match snap.job_id {
            Some(current) if current == expected => {
                *seen_job = true;
                false
            }
            Some(_) => true,
            None => *seen_job && snap.status == SyncStatus::Idle,
        }
    }
}
