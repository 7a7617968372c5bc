use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::UploadSettings;
use crate::metrics::{UPLOADS_ACTIVE, UPLOADS_TOTAL};
use crate::models::upload::{CandidateFile, UploadStatus, PROGRESS_COMPLETE, PROGRESS_STEP};

/// Simulated upload owned by one question card.
///
/// The progress timer runs as a spawned task that lives exactly as long as
/// this value: dropping the session (card collapsed, browser unmounted,
/// question deleted) aborts the task.
pub struct UploadSession {
    question_id: u32,
    status: watch::Receiver<UploadStatus>,
    ticker: Option<JoinHandle<()>>,
}

impl UploadSession {
    /// Starts the simulation for `file`, or returns an already failed
    /// session when the file breaks the size limit.
    pub fn start(question_id: u32, file: &CandidateFile, settings: &UploadSettings) -> Self {
        if let Some(reason) = size_violation(file, settings.max_file_size_bytes) {
            tracing::warn!(question_id, file = %file.name, %reason, "Upload rejected");
            UPLOADS_TOTAL.with_label_values(&["failed"]).inc();
            let (_tx, status) = watch::channel(UploadStatus::Failed { reason });
            return Self {
                question_id,
                status,
                ticker: None,
            };
        }

        tracing::info!(question_id, file = %file.name, "Upload started");

        let (tx, status) = watch::channel(UploadStatus::Uploading { progress: 0 });
        let period = Duration::from_millis(settings.tick_interval_ms.max(1));
        let ticker = tokio::spawn(advance_progress(question_id, tx, period));

        Self {
            question_id,
            status,
            ticker: Some(ticker),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status.borrow().clone()
    }

    /// Receiver for live progress; it sees the channel close once the
    /// session reaches a terminal status or is dropped.
    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status.clone()
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            if !ticker.is_finished() {
                ticker.abort();
                UPLOADS_TOTAL.with_label_values(&["cancelled"]).inc();
                tracing::debug!(question_id = self.question_id, "Upload timer cancelled");
            }
        }
    }
}

fn size_violation(file: &CandidateFile, max_bytes: u64) -> Option<String> {
    let size = file.size_bytes?;
    if max_bytes == 0 || size <= max_bytes {
        return None;
    }
    Some(format!(
        "{} is {} bytes, the limit is {} bytes",
        file.name, size, max_bytes
    ))
}

/// Keeps `uploads_active` accurate whether the task completes or is aborted.
struct ActiveUpload;

impl ActiveUpload {
    fn enter() -> Self {
        UPLOADS_ACTIVE.inc();
        ActiveUpload
    }
}

impl Drop for ActiveUpload {
    fn drop(&mut self) {
        UPLOADS_ACTIVE.dec();
    }
}

async fn advance_progress(question_id: u32, tx: watch::Sender<UploadStatus>, period: Duration) {
    let _active = ActiveUpload::enter();

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    let mut progress: u8 = 0;
    loop {
        ticker.tick().await;

        if progress >= PROGRESS_COMPLETE {
            tx.send_replace(UploadStatus::Succeeded);
            UPLOADS_TOTAL.with_label_values(&["succeeded"]).inc();
            tracing::info!(question_id, "Upload completed");
            break;
        }

        progress = progress.saturating_add(PROGRESS_STEP).min(PROGRESS_COMPLETE);
        tx.send_replace(UploadStatus::Uploading { progress });
        tracing::trace!(question_id, progress, "Upload progress");
    }
}
