use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::metrics::QUESTIONS_STORED;
use crate::models::question::{seed_questions, Question, QuestionDraft};

/// A stored question tagged with the serial of the insert that created it.
///
/// Ids can come back after a delete, serials never do: two entries with the
/// same id but different serials are different questions.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuestion {
    pub serial: u64,
    pub question: Question,
}

/// Storage behind both the management view and the practice browser.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions in insertion order.
    async fn list(&self) -> Vec<Question>;

    async fn get(&self, id: u32) -> Option<Question>;

    /// Like `list`, with each entry's serial.
    async fn entries(&self) -> Vec<StoredQuestion>;

    async fn entry(&self, id: u32) -> Option<StoredQuestion>;

    /// Appends the draft under a freshly assigned id.
    async fn insert(&self, draft: QuestionDraft) -> Question;

    /// Replaces the entry with the same id in place, keeping its serial.
    /// Returns `None` when no such entry exists.
    async fn replace(&self, question: Question) -> Option<Question>;

    /// Removes the entry with `id`, returning it if it existed.
    async fn remove(&self, id: u32) -> Option<Question>;

    async fn count(&self) -> usize;
}

struct StoreInner {
    entries: Vec<StoredQuestion>,
    next_serial: u64,
}

/// Session-lifetime store; a restart resets it to the seed records.
pub struct InMemoryQuestionStore {
    inner: RwLock<StoreInner>,
    reports_metrics: bool,
}

impl InMemoryQuestionStore {
    pub fn new(questions: Vec<Question>) -> Self {
        let entries: Vec<StoredQuestion> = questions
            .into_iter()
            .zip(1u64..)
            .map(|(question, serial)| StoredQuestion { serial, question })
            .collect();
        let next_serial = entries.len() as u64 + 1;

        Self {
            inner: RwLock::new(StoreInner {
                entries,
                next_serial,
            }),
            reports_metrics: false,
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_questions())
    }

    /// Makes this store drive the process-wide `questions_stored` gauge.
    /// Only the store serving the application should do so.
    pub fn with_metrics(mut self) -> Self {
        self.reports_metrics = true;
        QUESTIONS_STORED.set(self.inner.get_mut().entries.len() as i64);
        self
    }

    fn report(&self, stored: usize) {
        if self.reports_metrics {
            QUESTIONS_STORED.set(stored as i64);
        }
    }
}

impl Default for InMemoryQuestionStore {
    fn default() -> Self {
        Self::seeded()
    }
}

/// `count + 1`, unless an earlier delete left that id in use, in which case
/// the id after the current maximum is taken.
fn next_id(entries: &[StoredQuestion]) -> u32 {
    let candidate = entries.len() as u32 + 1;
    if entries.iter().all(|e| e.question.id != candidate) {
        return candidate;
    }
    entries.iter().map(|e| e.question.id).max().unwrap_or(0) + 1
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionStore {
    async fn list(&self) -> Vec<Question> {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .map(|e| e.question.clone())
            .collect()
    }

    async fn get(&self, id: u32) -> Option<Question> {
        self.entry(id).await.map(|e| e.question)
    }

    async fn entries(&self) -> Vec<StoredQuestion> {
        self.inner.read().await.entries.clone()
    }

    async fn entry(&self, id: u32) -> Option<StoredQuestion> {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.question.id == id)
            .cloned()
    }

    async fn insert(&self, draft: QuestionDraft) -> Question {
        let mut inner = self.inner.write().await;
        let question = draft.into_question(next_id(&inner.entries));
        let serial = inner.next_serial;
        inner.next_serial += 1;
        inner.entries.push(StoredQuestion {
            serial,
            question: question.clone(),
        });
        self.report(inner.entries.len());
        question
    }

    async fn replace(&self, question: Question) -> Option<Question> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .entries
            .iter_mut()
            .find(|e| e.question.id == question.id)?;
        slot.question = question.clone();
        Some(question)
    }

    async fn remove(&self, id: u32) -> Option<Question> {
        let mut inner = self.inner.write().await;
        let index = inner.entries.iter().position(|e| e.question.id == id)?;
        let removed = inner.entries.remove(index);
        self.report(inner.entries.len());
        Some(removed.question)
    }

    async fn count(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;

    fn draft(title: &str) -> QuestionDraft {
        QuestionDraft {
            id: None,
            title: title.to_string(),
            description: "Cross-examine a hostile witness".to_string(),
            difficulty: Difficulty::Advanced,
            time_limit: "5 minutes".to_string(),
            answer: "Lead, never ask why".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_count_plus_one() {
        let store = InMemoryQuestionStore::seeded();
        let created = store.insert(draft("Closing Argument")).await;
        assert_eq!(created.id, 3);
        assert_eq!(store.count().await, 3);
    }

    #[tokio::test]
    async fn insert_ignores_draft_id() {
        let store = InMemoryQuestionStore::seeded();
        let mut d = draft("Closing Argument");
        d.id = Some(1);
        let created = store.insert(d).await;
        assert_eq!(created.id, 3);
    }

    #[tokio::test]
    async fn insert_after_deleting_first_entry_keeps_ids_unique() {
        let store = InMemoryQuestionStore::seeded();
        store.remove(1).await.unwrap();

        // count + 1 == 2 is still taken by the second seed record
        let created = store.insert(draft("Re-direct")).await;
        assert_eq!(created.id, 3);

        let ids: Vec<u32> = store.list().await.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn insert_after_deleting_last_entry_reuses_count_plus_one() {
        let store = InMemoryQuestionStore::seeded();
        store.remove(2).await.unwrap();
        let created = store.insert(draft("Re-direct")).await;
        assert_eq!(created.id, 2);
    }

    #[tokio::test]
    async fn replace_keeps_position() {
        let store = InMemoryQuestionStore::seeded();
        let mut first = store.get(1).await.unwrap();
        first.title = "X".to_string();

        store.replace(first).await.unwrap();

        let questions = store.list().await;
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[0].title, "X");
        assert_eq!(questions[1].id, 2);
    }

    #[tokio::test]
    async fn replace_unknown_id_is_a_no_op() {
        let store = InMemoryQuestionStore::seeded();
        let ghost = draft("Ghost").into_question(42);
        assert!(store.replace(ghost).await.is_none());
        assert_eq!(store.list().await, seed_questions());
    }

    #[tokio::test]
    async fn remove_unknown_id_returns_none() {
        let store = InMemoryQuestionStore::seeded();
        assert!(store.remove(9).await.is_none());
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn reused_id_gets_a_fresh_serial() {
        let store = InMemoryQuestionStore::seeded();
        let before = store.entry(2).await.unwrap().serial;

        store.remove(2).await.unwrap();
        store.insert(draft("Re-direct")).await;

        let after = store.entry(2).await.unwrap();
        assert_eq!(after.question.title, "Re-direct");
        assert_ne!(after.serial, before);
    }

    #[tokio::test]
    async fn replace_keeps_serial() {
        let store = InMemoryQuestionStore::seeded();
        let before = store.entry(1).await.unwrap();

        let mut edited = before.question.clone();
        edited.title = "Renamed".to_string();
        store.replace(edited).await.unwrap();

        let after = store.entry(1).await.unwrap();
        assert_eq!(after.serial, before.serial);
        assert_eq!(after.question.title, "Renamed");
    }

    #[tokio::test]
    async fn only_the_metered_store_moves_the_gauge() {
        QUESTIONS_STORED.set(99);

        let scratch = InMemoryQuestionStore::seeded();
        scratch.insert(draft("Scratch")).await;
        scratch.remove(1).await.unwrap();
        assert_eq!(QUESTIONS_STORED.get(), 99);

        let metered = InMemoryQuestionStore::seeded().with_metrics();
        assert_eq!(QUESTIONS_STORED.get(), 2);
        metered.insert(draft("Counted")).await;
        assert_eq!(QUESTIONS_STORED.get(), 3);
    }
}
