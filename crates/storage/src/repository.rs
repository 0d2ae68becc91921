use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use tutor_core::model::{LearnerId, Mastery, TopicId};

/// Errors surfaced by mastery store adapters.
///
/// Absence of a record is not an error; `read_mastery` reports it as `None`
/// and sessions start from mastery 0.0.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read contract for persisted mastery, keyed by `(learner, topic)`.
///
/// The session controller only reads; mastery updates are a side effect of
/// the external evaluator, so no write operation appears in this contract.
#[async_trait]
pub trait MasteryStore: Send + Sync {
    /// Looks up the stored mastery for a learner on a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails. A missing record is
    /// `Ok(None)`.
    async fn read_mastery(
        &self,
        learner: &LearnerId,
        topic: &TopicId,
    ) -> Result<Option<Mastery>, StorageError>;
}

/// Simple in-memory mastery store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryMasteryStore {
    records: Arc<Mutex<HashMap<(String, String), Mastery>>>,
}

impl InMemoryMasteryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores a mastery value, replacing any existing record.
    ///
    /// Test/seed helper; the running session never writes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn set_mastery(
        &self,
        learner: &LearnerId,
        topic: &TopicId,
        mastery: Mastery,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (learner.as_str().to_owned(), topic.as_str().to_owned()),
            mastery,
        );
        Ok(())
    }
}

#[async_trait]
impl MasteryStore for InMemoryMasteryStore {
    async fn read_mastery(
        &self,
        learner: &LearnerId,
        topic: &TopicId,
    ) -> Result<Option<Mastery>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(learner.as_str().to_owned(), topic.as_str().to_owned()))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner() -> LearnerId {
        LearnerId::new("learner-1").unwrap()
    }

    fn topic() -> TopicId {
        TopicId::new("topic-1").unwrap()
    }

    #[tokio::test]
    async fn missing_record_reads_as_none() {
        let store = InMemoryMasteryStore::new();
        let read = store.read_mastery(&learner(), &topic()).await.unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn stored_mastery_round_trips() {
        let store = InMemoryMasteryStore::new();
        store
            .set_mastery(&learner(), &topic(), Mastery::clamped(0.2))
            .unwrap();

        let read = store.read_mastery(&learner(), &topic()).await.unwrap();
        assert_eq!(read, Some(Mastery::clamped(0.2)));

        let other_topic = TopicId::new("topic-2").unwrap();
        let read = store.read_mastery(&learner(), &other_topic).await.unwrap();
        assert_eq!(read, None);
    }
}
