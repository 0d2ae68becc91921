use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteMasteryStore;
use crate::repository::{MasteryStore, StorageError};
use tutor_core::model::{LearnerId, Mastery, TopicId};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl MasteryStore for SqliteMasteryStore {
    async fn read_mastery(
        &self,
        learner: &LearnerId,
        topic: &TopicId,
    ) -> Result<Option<Mastery>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT mastery
                FROM mastery_records
                WHERE learner_id = ?1 AND topic_id = ?2
            ",
        )
        .bind(learner.as_str())
        .bind(topic.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let value: f64 = row
                    .try_get("mastery")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(Mastery::clamped(value)))
            }
        }
    }
}

impl SqliteMasteryStore {
    /// Insert or replace a mastery record.
    ///
    /// Used by the seed binary and tests. The session controller never calls
    /// this: during a live session, mastery persistence belongs to the
    /// evaluator's side effects.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn upsert_mastery(
        &self,
        learner: &LearnerId,
        topic: &TopicId,
        mastery: Mastery,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO mastery_records (learner_id, topic_id, mastery, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (learner_id, topic_id)
                DO UPDATE SET mastery = excluded.mastery, updated_at = excluded.updated_at
            ",
        )
        .bind(learner.as_str())
        .bind(topic.as_str())
        .bind(mastery.value())
        .bind(updated_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(conn)?;

        Ok(())
    }
}
