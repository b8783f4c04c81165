use std::time::Instant;

use anyhow::{anyhow, Result};
use mongodb::{Collection, Database};

use crate::metrics::{record_db_operation, ANSWERS_SAVED_TOTAL};
use crate::models::result::{AnswerResult, SaveResultRequest};
use crate::utils::mongo::is_duplicate_key;
use crate::utils::time::now_bson;

pub const RESULTS_COLLECTION: &str = "results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// An identical result was stored before; nothing was written.
    AlreadySaved,
}

pub struct ResultService {
    results: Collection<AnswerResult>,
}

impl ResultService {
    pub fn new(mongo: &Database) -> Self {
        Self {
            results: mongo.collection(RESULTS_COLLECTION),
        }
    }

    /// Idempotent thanks to the compound unique index on
    /// (questionId, userAnswer, correct, timeSpent).
    pub async fn save_result(&self, req: SaveResultRequest) -> Result<SaveOutcome> {
        let correct_label = if req.correct { "true" } else { "false" };
        let result = AnswerResult::from_request(req, now_bson());

        let start = Instant::now();
        let outcome = self.results.insert_one(&result).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(_) => {
                record_db_operation("insert_one", RESULTS_COLLECTION, "success", elapsed);
                ANSWERS_SAVED_TOTAL
                    .with_label_values(&[correct_label, "saved"])
                    .inc();
                tracing::info!(
                    "Result saved: question={}, correct={}, time_spent={}",
                    result.question_id,
                    result.correct,
                    result.time_spent
                );
                Ok(SaveOutcome::Saved)
            }
            Err(e) if is_duplicate_key(&e) => {
                record_db_operation("insert_one", RESULTS_COLLECTION, "duplicate", elapsed);
                ANSWERS_SAVED_TOTAL
                    .with_label_values(&[correct_label, "duplicate"])
                    .inc();
                tracing::debug!("Result already stored for question={}", result.question_id);
                Ok(SaveOutcome::AlreadySaved)
            }
            Err(e) => {
                record_db_operation("insert_one", RESULTS_COLLECTION, "error", elapsed);
                Err(anyhow!("Failed to save result: {}", e))
            }
        }
    }
}
