use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::{PracticeSettings, UploadSettings};
use crate::metrics::BROWSER_SESSIONS_ACTIVE;
use crate::models::practice::CardView;
use crate::models::upload::{CandidateFile, UploadStatus};
use crate::services::error::{PracticeError, PracticeResult};
use crate::services::file_picker::FilePicker;
use crate::services::question_store::{QuestionRepository, StoredQuestion};
use crate::services::upload_session::UploadSession;

/// Card state for one stored question, identified by its serial so that a
/// later question reusing the id starts from a fresh card.
struct QuestionCard {
    serial: u64,
    expanded: bool,
    upload: Option<UploadSession>,
}

impl QuestionCard {
    fn new(serial: u64) -> Self {
        Self {
            serial,
            expanded: false,
            upload: None,
        }
    }

    fn status(&self) -> UploadStatus {
        self.upload
            .as_ref()
            .map(UploadSession::status)
            .unwrap_or(UploadStatus::Idle)
    }
}

/// One viewer's practice page: a card per question in the shared store.
pub struct QuestionBrowser {
    store: Arc<dyn QuestionRepository>,
    picker: FilePicker,
    settings: UploadSettings,
    cards: HashMap<u32, QuestionCard>,
}

impl QuestionBrowser {
    pub fn new(store: Arc<dyn QuestionRepository>, settings: UploadSettings) -> Self {
        Self {
            store,
            picker: FilePicker::new(&settings),
            settings,
            cards: HashMap::new(),
        }
    }

    pub async fn cards(&mut self) -> Vec<CardView> {
        let entries = self.store.entries().await;
        self.prune(&entries);

        entries.iter().map(|entry| self.view(entry)).collect()
    }

    pub async fn card(&mut self, question_id: u32) -> PracticeResult<CardView> {
        let entry = self.question(question_id).await?;
        Ok(self.view(&entry))
    }

    /// Expands a collapsed card or collapses an expanded one. Collapsing
    /// discards the card's upload session.
    pub async fn toggle(&mut self, question_id: u32) -> PracticeResult<CardView> {
        let entry = self.question(question_id).await?;

        if self.cards.remove(&question_id).is_some() {
            tracing::debug!(question_id, expanded = false, "Card toggled");
        } else {
            let mut card = QuestionCard::new(entry.serial);
            card.expanded = true;
            self.cards.insert(question_id, card);
            tracing::debug!(question_id, expanded = true, "Card toggled");
        }

        Ok(self.view(&entry))
    }

    /// Hands dropped files to the card. The first file the picker accepts
    /// starts a simulated upload.
    pub async fn drop_files(
        &mut self,
        question_id: u32,
        files: Vec<CandidateFile>,
    ) -> PracticeResult<CardView> {
        let entry = self.question(question_id).await?;
        let card = match self.cards.get_mut(&question_id) {
            Some(card) if card.expanded => card,
            _ => return Err(PracticeError::CardCollapsed(question_id)),
        };

        match card.status() {
            UploadStatus::Uploading { .. } => {
                return Err(PracticeError::UploadInProgress(question_id))
            }
            UploadStatus::Succeeded => {
                return Err(PracticeError::UploadAlreadyCompleted(question_id))
            }
            UploadStatus::Idle | UploadStatus::Failed { .. } => {}
        }

        let file = self
            .picker
            .accept(files)
            .into_iter()
            .next()
            .ok_or_else(|| PracticeError::NoAcceptedFile {
                accepted: self.picker.accepted_formats(),
            })?;

        card.upload = Some(UploadSession::start(question_id, &file, &self.settings));

        Ok(self.view(&entry))
    }

    /// Live status of the card's upload. Without a session the receiver
    /// holds `Idle` and is already closed.
    pub async fn subscribe(
        &mut self,
        question_id: u32,
    ) -> PracticeResult<watch::Receiver<UploadStatus>> {
        self.question(question_id).await?;

        let receiver = match self.cards.get(&question_id).and_then(|c| c.upload.as_ref()) {
            Some(session) => session.subscribe(),
            None => watch::channel(UploadStatus::Idle).1,
        };
        Ok(receiver)
    }

    /// Looks the question up and drops a card left behind by a deleted
    /// question, including one whose id has since been reused.
    async fn question(&mut self, question_id: u32) -> PracticeResult<StoredQuestion> {
        let entry = self.store.entry(question_id).await;
        let serial = entry.as_ref().map(|e| e.serial);

        if self
            .cards
            .get(&question_id)
            .is_some_and(|card| Some(card.serial) != serial)
        {
            self.cards.remove(&question_id);
            tracing::debug!(question_id, "Stale card dropped");
        }

        entry.ok_or(PracticeError::QuestionNotFound(question_id))
    }

    fn prune(&mut self, entries: &[StoredQuestion]) {
        self.cards.retain(|id, card| {
            entries
                .iter()
                .any(|e| e.question.id == *id && e.serial == card.serial)
        });
    }

    fn view(&self, entry: &StoredQuestion) -> CardView {
        match self
            .cards
            .get(&entry.question.id)
            .filter(|card| card.serial == entry.serial)
        {
            Some(card) => CardView::new(&entry.question, card.expanded, card.status()),
            None => CardView::new(&entry.question, false, UploadStatus::Idle),
        }
    }
}

struct MountedBrowser {
    browser: Arc<Mutex<QuestionBrowser>>,
    last_access: Instant,
}

/// Mounted practice pages, keyed by session id. A page nobody touches for
/// the idle TTL is unmounted.
pub struct PracticeSessions {
    store: Arc<dyn QuestionRepository>,
    settings: UploadSettings,
    idle_ttl: Duration,
    browsers: Mutex<HashMap<Uuid, MountedBrowser>>,
}

impl PracticeSessions {
    pub fn new(
        store: Arc<dyn QuestionRepository>,
        settings: UploadSettings,
        practice: &PracticeSettings,
    ) -> Self {
        Self {
            store,
            settings,
            idle_ttl: practice.session_idle_ttl(),
            browsers: Mutex::new(HashMap::new()),
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn open(&self) -> (Uuid, Arc<Mutex<QuestionBrowser>>) {
        let session_id = Uuid::new_v4();
        let browser = Arc::new(Mutex::new(QuestionBrowser::new(
            self.store.clone(),
            self.settings.clone(),
        )));

        let mut browsers = self.browsers.lock().await;
        Self::evict(&mut browsers, self.idle_ttl);
        browsers.insert(
            session_id,
            MountedBrowser {
                browser: browser.clone(),
                last_access: Instant::now(),
            },
        );
        BROWSER_SESSIONS_ACTIVE.inc();
        tracing::info!(%session_id, "Practice session opened");

        (session_id, browser)
    }

    /// Returns the session's browser and marks it as used.
    pub async fn get(&self, session_id: Uuid) -> PracticeResult<Arc<Mutex<QuestionBrowser>>> {
        let mut browsers = self.browsers.lock().await;
        Self::evict(&mut browsers, self.idle_ttl);

        let mounted = browsers
            .get_mut(&session_id)
            .ok_or(PracticeError::SessionNotFound(session_id))?;
        mounted.last_access = Instant::now();
        Ok(mounted.browser.clone())
    }

    /// Unmounts the page. Its cards, and with them any running upload
    /// timers, are dropped once no request holds the browser any more.
    pub async fn close(&self, session_id: Uuid) -> PracticeResult<()> {
        let removed = self.browsers.lock().await.remove(&session_id);
        match removed {
            Some(_) => {
                BROWSER_SESSIONS_ACTIVE.dec();
                tracing::info!(%session_id, "Practice session closed");
                Ok(())
            }
            None => Err(PracticeError::SessionNotFound(session_id)),
        }
    }

    /// Unmounts every page idle for longer than the TTL. Returns how many
    /// were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut browsers = self.browsers.lock().await;
        Self::evict(&mut browsers, self.idle_ttl)
    }

    fn evict(browsers: &mut HashMap<Uuid, MountedBrowser>, idle_ttl: Duration) -> usize {
        let before = browsers.len();
        browsers.retain(|session_id, mounted| {
            let alive = mounted.last_access.elapsed() < idle_ttl;
            if !alive {
                tracing::info!(%session_id, "Practice session expired");
            }
            alive
        });

        let evicted = before - browsers.len();
        if evicted > 0 {
            BROWSER_SESSIONS_ACTIVE.sub(evicted as i64);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.browsers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionDraft;
    use crate::services::question_store::InMemoryQuestionStore;
    use std::time::Duration;

    fn video(name: &str) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            mime_type: Some("video/mp4".to_string()),
            size_bytes: Some(2_048),
        }
    }

    fn browser() -> (Arc<InMemoryQuestionStore>, QuestionBrowser) {
        let store = Arc::new(InMemoryQuestionStore::seeded());
        let settings = UploadSettings {
            tick_interval_ms: 500,
            ..UploadSettings::default()
        };
        let browser = QuestionBrowser::new(store.clone(), settings);
        (store, browser)
    }

    #[tokio::test]
    async fn cards_start_collapsed_and_idle() {
        let (_, mut browser) = browser();
        let cards = browser.cards().await;
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| !c.expanded));
        assert!(cards.iter().all(|c| c.upload == UploadStatus::Idle));
    }

    #[tokio::test]
    async fn drop_on_collapsed_card_is_rejected() {
        let (_, mut browser) = browser();
        let err = browser.drop_files(1, vec![video("a.mp4")]).await.unwrap_err();
        assert_eq!(err, PracticeError::CardCollapsed(1));
    }

    #[tokio::test]
    async fn rejected_files_leave_status_idle() {
        let (_, mut browser) = browser();
        browser.toggle(1).await.unwrap();

        let empty = browser.drop_files(1, Vec::new()).await.unwrap_err();
        assert!(matches!(empty, PracticeError::NoAcceptedFile { .. }));

        let pdf = CandidateFile {
            name: "brief.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            size_bytes: Some(10),
        };
        assert!(browser.drop_files(1, vec![pdf]).await.is_err());

        assert_eq!(browser.card(1).await.unwrap().upload, UploadStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_upload_reveals_model_answer() {
        let (store, mut browser) = browser();
        browser.toggle(2).await.unwrap();

        let view = browser.drop_files(2, vec![video("take.mp4")]).await.unwrap();
        assert_eq!(view.upload, UploadStatus::Uploading { progress: 0 });
        assert!(view.model_answer.is_none());

        tokio::time::sleep(Duration::from_secs(6)).await;

        let view = browser.card(2).await.unwrap();
        assert_eq!(view.upload, UploadStatus::Succeeded);
        let expected = store.get(2).await.unwrap().answer;
        assert_eq!(view.model_answer, Some(expected));

        let again = browser.drop_files(2, vec![video("take2.mp4")]).await;
        assert_eq!(again.unwrap_err(), PracticeError::UploadAlreadyCompleted(2));
    }

    #[tokio::test(start_paused = true)]
    async fn second_drop_while_uploading_is_rejected() {
        let (_, mut browser) = browser();
        browser.toggle(1).await.unwrap();
        browser.drop_files(1, vec![video("a.mp4")]).await.unwrap();

        let err = browser.drop_files(1, vec![video("b.mp4")]).await.unwrap_err();
        assert_eq!(err, PracticeError::UploadInProgress(1));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_upload_can_be_retried() {
        let store = Arc::new(InMemoryQuestionStore::seeded());
        let settings = UploadSettings {
            max_file_size_bytes: 100,
            ..UploadSettings::default()
        };
        let mut browser = QuestionBrowser::new(store, settings);
        browser.toggle(1).await.unwrap();

        let view = browser.drop_files(1, vec![video("huge.mp4")]).await.unwrap();
        assert!(matches!(view.upload, UploadStatus::Failed { .. }));

        let small = CandidateFile {
            size_bytes: Some(50),
            ..video("small.mp4")
        };
        let view = browser.drop_files(1, vec![small]).await.unwrap();
        assert_eq!(view.upload, UploadStatus::Uploading { progress: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn collapsing_discards_the_upload() {
        let (_, mut browser) = browser();
        browser.toggle(1).await.unwrap();
        browser.drop_files(1, vec![video("a.mp4")]).await.unwrap();
        let mut rx = browser.subscribe(1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        let collapsed = browser.toggle(1).await.unwrap();
        assert!(!collapsed.expanded);
        assert_eq!(collapsed.upload, UploadStatus::Idle);

        while rx.changed().await.is_ok() {}
        assert!(matches!(*rx.borrow(), UploadStatus::Uploading { .. }));

        let reopened = browser.toggle(1).await.unwrap();
        assert_eq!(reopened.upload, UploadStatus::Idle);
    }

    #[tokio::test]
    async fn editor_changes_are_visible() {
        let (store, mut browser) = browser();
        store
            .insert(QuestionDraft {
                id: None,
                title: "Closing Argument".to_string(),
                description: "Sum up the case".to_string(),
                difficulty: crate::models::Difficulty::Advanced,
                time_limit: "5-7 minutes".to_string(),
                answer: "Return to the theory of the case".to_string(),
            })
            .await;
        browser.toggle(1).await.unwrap();
        store.remove(1).await;

        let cards = browser.cards().await;
        let ids: Vec<u32> = cards.iter().map(|c| c.question_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(
            browser.toggle(1).await.unwrap_err(),
            PracticeError::QuestionNotFound(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reused_id_starts_from_a_fresh_card() {
        let (store, mut browser) = browser();
        browser.toggle(2).await.unwrap();
        browser.drop_files(2, vec![video("take.mp4")]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(browser.card(2).await.unwrap().upload, UploadStatus::Succeeded);

        store.remove(2).await.unwrap();
        let replacement = store
            .insert(QuestionDraft {
                id: None,
                title: "Brand New".to_string(),
                description: "Open for the defence".to_string(),
                difficulty: crate::models::Difficulty::Beginner,
                time_limit: "2 minutes".to_string(),
                answer: "Tell the jury the story".to_string(),
            })
            .await;
        assert_eq!(replacement.id, 2);

        let view = browser.card(2).await.unwrap();
        assert_eq!(view.title, "Brand New");
        assert!(!view.expanded);
        assert_eq!(view.upload, UploadStatus::Idle);
        assert!(view.model_answer.is_none());

        assert_eq!(
            browser.drop_files(2, vec![video("again.mp4")]).await.unwrap_err(),
            PracticeError::CardCollapsed(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn card_list_drops_cards_of_replaced_ids() {
        let (store, mut browser) = browser();
        browser.toggle(2).await.unwrap();

        store.remove(2).await.unwrap();
        store
            .insert(QuestionDraft {
                id: None,
                title: "Brand New".to_string(),
                description: "Open for the defence".to_string(),
                difficulty: crate::models::Difficulty::Beginner,
                time_limit: "2 minutes".to_string(),
                answer: "Tell the jury the story".to_string(),
            })
            .await;

        let cards = browser.cards().await;
        assert_eq!(cards[1].question_id, 2);
        assert!(!cards[1].expanded);
        assert!(browser.cards.get(&2).is_none());
    }

    #[tokio::test]
    async fn edits_keep_the_card_state() {
        let (store, mut browser) = browser();
        browser.toggle(1).await.unwrap();

        let mut edited = store.get(1).await.unwrap();
        edited.title = "Renamed".to_string();
        store.replace(edited).await.unwrap();

        let view = browser.card(1).await.unwrap();
        assert_eq!(view.title, "Renamed");
        assert!(view.expanded);
    }

    #[tokio::test]
    async fn rejected_drop_on_collapsed_card_keeps_no_state() {
        let (_, mut browser) = browser();
        assert!(browser.drop_files(1, vec![video("a.mp4")]).await.is_err());
        assert!(browser.cards.is_empty());
    }

    fn sessions(ttl_secs: u64) -> PracticeSessions {
        let store: Arc<dyn QuestionRepository> = Arc::new(InMemoryQuestionStore::seeded());
        PracticeSessions::new(
            store,
            UploadSettings::default(),
            &PracticeSettings {
                session_idle_ttl_secs: ttl_secs,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires_after_ttl() {
        let sessions = sessions(60);
        let (id, _) = sessions.open().await;

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(
            sessions.get(id).await.err().unwrap(),
            PracticeError::SessionNotFound(id)
        );
        assert!(sessions.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn access_keeps_session_alive() {
        let sessions = sessions(60);
        let (id, _) = sessions.open().await;

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(40)).await;
            assert!(sessions.get(id).await.is_ok());
        }
        assert_eq!(sessions.evict_expired().await, 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sessions.evict_expired().await, 1);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_cancels_running_uploads() {
        let sessions = sessions(2);
        let (_, browser) = sessions.open().await;
        let mut rx = {
            let mut browser = browser.lock().await;
            browser.toggle(1).await.unwrap();
            browser.drop_files(1, vec![video("a.mp4")]).await.unwrap();
            browser.subscribe(1).await.unwrap()
        };
        drop(browser);

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(sessions.evict_expired().await, 1);

        while rx.changed().await.is_ok() {}
        assert!(matches!(*rx.borrow(), UploadStatus::Uploading { progress } if progress < 100));
    }

    #[tokio::test]
    async fn sessions_open_and_close() {
        let sessions = sessions(1_800);

        let (id, _) = sessions.open().await;
        assert_eq!(sessions.len().await, 1);
        assert!(sessions.get(id).await.is_ok());

        sessions.close(id).await.unwrap();
        assert!(sessions.is_empty().await);
        assert_eq!(
            sessions.close(id).await.unwrap_err(),
            PracticeError::SessionNotFound(id)
        );
    }
}
