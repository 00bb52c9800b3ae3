//! Periodic security monitoring
//!
//! A `MonitoringService` owns one background task that runs every
//! registered `SecurityCheck` on a fixed interval. Outcomes are kept in a
//! bounded in-memory history and counted in the metrics registry. A failing
//! check is logged and recorded; it never stops the loop.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{CheckStatus, MonitoringCheck};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::crypto::sha256_bytes_hex;
use crate::metrics;

/// Number of check outcomes retained
pub const HISTORY_CAPACITY: usize = 100;

#[async_trait]
pub trait SecurityCheck: Send + Sync {
    /// Stable name recorded as the check `type`
    fn kind(&self) -> &str;

    /// `Ok` carries optional details for a passing check
    async fn run(&self) -> Result<Option<Value>>;
}

/// Detects modification or removal of watched files against a SHA-256
/// baseline taken at construction.
pub struct FileIntegrityCheck {
    baseline: Vec<(PathBuf, Option<String>)>,
}

impl FileIntegrityCheck {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let baseline = paths
            .into_iter()
            .map(|path| {
                let digest = match std::fs::read(&path) {
                    Ok(bytes) => Some(sha256_bytes_hex(&bytes)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Watched file unreadable at baseline");
                        None
                    }
                };
                (path, digest)
            })
            .collect();
        Self { baseline }
    }

    pub fn watched(&self) -> usize {
        self.baseline.len()
    }
}

#[async_trait]
impl SecurityCheck for FileIntegrityCheck {
    fn kind(&self) -> &str {
        "file_integrity"
    }

    async fn run(&self) -> Result<Option<Value>> {
        let mut changed = Vec::new();
        for (path, expected) in &self.baseline {
            let current = tokio::fs::read(path)
                .await
                .ok()
                .map(|bytes| sha256_bytes_hex(&bytes));
            if &current != expected {
                changed.push(path.display().to_string());
            }
        }

        if changed.is_empty() {
            Ok(Some(json!({ "files": self.baseline.len() })))
        } else {
            Err(anyhow!("watched files changed: {}", changed.join(", ")))
        }
    }
}

struct Shared {
    checks: Vec<Box<dyn SecurityCheck>>,
    history: Mutex<VecDeque<MonitoringCheck>>,
}

impl Shared {
    async fn run_all(&self) {
        for check in &self.checks {
            let kind = check.kind();
            let record = match check.run().await {
                Ok(details) => {
                    debug!(check = kind, "Security check passed");
                    MonitoringCheck::success(kind, details)
                }
                Err(e) => {
                    error!(check = kind, error = %e, "Security check failed");
                    MonitoringCheck::failure(kind, Some(json!({ "error": e.to_string() })))
                }
            };
            metrics::observe_security_check(kind, &record.status.to_string());
            self.record(record);
        }
    }

    fn record(&self, check: MonitoringCheck) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(check);
    }
}

/// Handle to the background monitoring task
pub struct MonitoringService {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl MonitoringService {
    /// Start the loop; the first round runs immediately.
    pub fn spawn(interval: Duration, checks: Vec<Box<dyn SecurityCheck>>) -> Self {
        let shared = Arc::new(Shared {
            checks,
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
        });
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        info!(
            interval_secs = interval.as_secs_f64(),
            checks = shared.checks.len(),
            "Starting security monitoring"
        );

        let task_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => task_shared.run_all().await,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Security monitoring stopped");
        });

        Self {
            shared,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Run every check now, outside the schedule
    pub async fn run_once(&self) {
        self.shared.run_all().await;
    }

    /// Snapshot of recorded outcomes, oldest first
    pub fn history(&self) -> Vec<MonitoringCheck> {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<MonitoringCheck> {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn failures(&self) -> usize {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.status == CheckStatus::Failure)
            .count()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal shutdown and wait for the task to exit
    pub async fn stop(&mut self) {
        self.shutdown.send_replace(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Monitoring task ended abnormally");
            }
        }
    }
}

impl Drop for MonitoringService {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}
