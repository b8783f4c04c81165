use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    Collection, Database,
};

use crate::metrics::{record_db_operation, track_db_operation};
use crate::models::question::{Question, QuestionRecord};
use crate::utils::mongo::is_duplicate_key;
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use crate::utils::time::now_bson;

pub const QUESTIONS_COLLECTION: &str = "questions";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The unique index on the question text rejected the insert.
    #[error("question already stored: {0}")]
    Collision(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

/// The durable corpus of accepted questions, unique by question text.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Exact match on the question text.
    async fn contains(&self, text: &str) -> anyhow::Result<bool>;

    /// Inserts once; a second insert of the same text reports `Collision`.
    async fn insert(&self, question: &Question) -> Result<(), PersistError>;
}

pub struct MongoQuestionStore {
    lookup: Collection<Document>,
    records: Collection<QuestionRecord>,
    retry: RetryConfig,
}

impl MongoQuestionStore {
    pub fn new(mongo: &Database) -> Self {
        Self {
            lookup: mongo.collection(QUESTIONS_COLLECTION),
            records: mongo.collection(QUESTIONS_COLLECTION),
            retry: RetryConfig {
                max_attempts: 3,
                base_backoff: Duration::from_millis(20),
                max_backoff: Duration::from_millis(200),
                jitter_max: Some(Duration::from_millis(20)),
            },
        }
    }
}

#[async_trait]
impl QuestionStore for MongoQuestionStore {
    async fn contains(&self, text: &str) -> anyhow::Result<bool> {
        track_db_operation(
            "find_one",
            QUESTIONS_COLLECTION,
            retry_async_with_config(self.retry.clone(), || async {
                self.lookup
                    .find_one(doc! { "question": text })
                    .await
                    .map(|found| found.is_some())
                    .context("Failed to look up question text")
            }),
        )
        .await
    }

    async fn insert(&self, question: &Question) -> Result<(), PersistError> {
        let record = QuestionRecord {
            question: question.clone(),
            created_at: now_bson(),
        };

        let start = Instant::now();
        let result = self.records.insert_one(&record).await;
        let elapsed = start.elapsed();

        match result {
            Ok(_) => {
                record_db_operation("insert_one", QUESTIONS_COLLECTION, "success", elapsed);
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                record_db_operation("insert_one", QUESTIONS_COLLECTION, "duplicate", elapsed);
                Err(PersistError::Collision(question.question.clone()))
            }
            Err(e) => {
                record_db_operation("insert_one", QUESTIONS_COLLECTION, "error", elapsed);
                Err(PersistError::Storage(
                    anyhow::Error::new(e).context("Failed to insert question"),
                ))
            }
        }
    }
}
