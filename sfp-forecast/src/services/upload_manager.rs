//! Upload Manager
//!
//! Owns the committed input file sequence and enforces the acceptance policy:
//! 1. Batch size: `committed + submitted <= max_files`, else the whole batch
//!    is refused with `TooManyFiles`
//! 2. Per-file size: `size <= max_size_bytes`, else `FileTooLarge`
//! 3. Per-file type: tag in the accepted set, else `UnsupportedType`
//!
//! Rejected files are dropped; the rest of the batch proceeds. Accepted files
//! go through a simulated transfer one after another (0→100 in steps of 10),
//! then the batch is committed and the full sequence is emitted once.

use super::Scheduler;
use crate::error::{RejectionReason, UploadResult};
use crate::models::{InputFile, RawFile};
use chrono::Utc;
use sfp_common::config::AcceptancePolicy;
use sfp_common::events::{EventBus, ForecastEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Percent added per simulated transfer step
const UPLOAD_STEP_PERCENT: usize = 10;

/// Per-file transfer progress, keyed by file name
pub type UploadProgress = BTreeMap<String, u8>;

/// Result of a finished batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Names of files committed by this batch, in submission order
    pub accepted: Vec<String>,
    /// Per-file rejections
    pub rejected: Vec<RejectionReason>,
    /// Full committed sequence after the batch
    pub committed: Vec<InputFile>,
}

/// Upload Manager service
pub struct UploadManager {
    policy: AcceptancePolicy,
    upload_step: Duration,
    scheduler: Arc<dyn Scheduler>,
    event_bus: EventBus,
    committed: Vec<InputFile>,
    progress_tx: watch::Sender<UploadProgress>,
}

impl UploadManager {
    /// Create an upload manager
    ///
    /// # Arguments
    /// * `policy` - Acceptance policy (max count, max size, accepted types)
    /// * `upload_step` - Delay between 10-unit transfer steps
    /// * `scheduler` - Drives the transfer ticks
    /// * `event_bus` - Receives progress, rejection and file-set events
    pub fn new(
        policy: AcceptancePolicy,
        upload_step: Duration,
        scheduler: Arc<dyn Scheduler>,
        event_bus: EventBus,
    ) -> Self {
        let (progress_tx, _) = watch::channel(UploadProgress::new());
        Self {
            policy,
            upload_step,
            scheduler,
            event_bus,
            committed: Vec::new(),
            progress_tx,
        }
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// Committed files, in commit order
    pub fn files(&self) -> &[InputFile] {
        &self.committed
    }

    /// Watch per-file transfer progress
    ///
    /// The map holds entries only while a batch is transferring.
    pub fn subscribe_progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress_tx.subscribe()
    }

    /// Check a single candidate against the size and type rules
    pub fn check_candidate(&self, raw: &RawFile) -> UploadResult<()> {
        if raw.size_bytes > self.policy.max_size_bytes {
            return Err(RejectionReason::FileTooLarge {
                file: raw.name.clone(),
                size_bytes: raw.size_bytes,
                max_bytes: self.policy.max_size_bytes,
            });
        }

        if !self.policy.accepts_type(&raw.type_tag) {
            return Err(RejectionReason::UnsupportedType {
                file: raw.name.clone(),
                type_tag: raw.type_tag.clone(),
            });
        }

        Ok(())
    }

    /// Submit a batch of candidate files
    ///
    /// Fails with `TooManyFiles` (and changes nothing) when the batch would
    /// exceed `max_files`. Otherwise returns after every accepted file has
    /// finished its simulated transfer and the batch is committed.
    pub async fn submit_batch(&mut self, candidates: Vec<RawFile>) -> UploadResult<BatchOutcome> {
        let current = self.committed.len();
        if current + candidates.len() > self.policy.max_files {
            let reason = RejectionReason::TooManyFiles {
                current,
                submitted: candidates.len(),
                max: self.policy.max_files,
            };
            tracing::warn!(current, submitted = candidates.len(), "Batch refused: {}", reason);
            return Err(reason);
        }

        let mut rejected = Vec::new();
        let mut transfers = Vec::new();
        for raw in candidates {
            match self.check_candidate(&raw) {
                Ok(()) => transfers.push(raw),
                Err(reason) => {
                    tracing::warn!(file = %raw.name, "File rejected: {}", reason);
                    self.event_bus.emit_lossy(ForecastEvent::FileRejected {
                        file_name: raw.name.clone(),
                        reason: reason.to_string(),
                        timestamp: Utc::now(),
                    });
                    rejected.push(reason);
                }
            }
        }

        // Sequential transfers: one file reaches 100 before the next starts
        let mut pending = Vec::with_capacity(transfers.len());
        for raw in transfers {
            self.simulate_transfer(&raw.name).await;
            pending.push(InputFile::from(raw));
        }

        let accepted: Vec<String> = pending.iter().map(|f| f.name().to_string()).collect();
        self.committed.extend(pending);
        self.progress_tx.send_replace(UploadProgress::new());

        tracing::info!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            committed = self.committed.len(),
            "Upload batch finished"
        );
        self.emit_files_changed();

        Ok(BatchOutcome {
            accepted,
            rejected,
            committed: self.committed.clone(),
        })
    }

    /// Remove a committed file by position
    ///
    /// Returns the new committed sequence, or `None` (no-op) when `index` is
    /// out of range.
    pub fn remove_file(&mut self, index: usize) -> Option<Vec<InputFile>> {
        if index >= self.committed.len() {
            tracing::debug!(index, len = self.committed.len(), "remove_file index out of range");
            return None;
        }

        let removed = self.committed.remove(index);
        tracing::info!(file = %removed.name(), remaining = self.committed.len(), "File removed");
        self.emit_files_changed();
        Some(self.committed.clone())
    }

    async fn simulate_transfer(&self, file_name: &str) {
        for percent in (0..=100).step_by(UPLOAD_STEP_PERCENT) {
            let percent = percent as u8;
            self.progress_tx.send_modify(|progress| {
                progress.insert(file_name.to_string(), percent);
            });
            self.event_bus.emit_lossy(ForecastEvent::UploadProgress {
                file_name: file_name.to_string(),
                percent,
                timestamp: Utc::now(),
            });
            tracing::trace!(file = %file_name, percent, "Upload progress");
            self.scheduler.after(self.upload_step).await;
        }
    }

    fn emit_files_changed(&self) {
        self.event_bus.emit_lossy(ForecastEvent::FilesChanged {
            file_names: self.committed.iter().map(|f| f.name().to_string()).collect(),
            timestamp: Utc::now(),
        });
    }
}
