use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use question_bank::QuestionBankEditor;
use question_browser::PracticeSessions;
use question_store::{InMemoryQuestionStore, QuestionRepository};

pub struct AppState {
    pub config: Config,
    pub questions: Arc<dyn QuestionRepository>,
    pub editor: Mutex<QuestionBankEditor>,
    pub practice: PracticeSessions,
}

impl AppState {
    /// State backed by the seeded in-memory store.
    pub fn new(config: Config) -> Self {
        Self::with_store(
            config,
            Arc::new(InMemoryQuestionStore::seeded().with_metrics()),
        )
    }

    pub fn with_store(config: Config, questions: Arc<dyn QuestionRepository>) -> Self {
        tracing::info!(
            tick_interval_ms = config.upload.tick_interval_ms,
            max_file_size_bytes = config.upload.max_file_size_bytes,
            "Initializing application state"
        );

        let editor = Mutex::new(QuestionBankEditor::new(questions.clone()));
        let practice = PracticeSessions::new(
            questions.clone(),
            config.upload.clone(),
            &config.practice,
        );

        Self {
            config,
            questions,
            editor,
            practice,
        }
    }
}

/// Periodically unmounts practice pages whose clients went away without
/// closing their session.
pub fn spawn_session_reaper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.practice.idle_ttl().min(Duration::from_secs(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = state.practice.evict_expired().await;
            if evicted > 0 {
                tracing::debug!(evicted, "Idle practice sessions reaped");
            }
        }
    })
}

pub mod error;
pub mod file_picker;
pub mod question_bank;
pub mod question_browser;
pub mod question_store;
pub mod upload_session;
