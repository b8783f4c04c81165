use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, Document},
    Collection, Database,
};

use super::result_service::RESULTS_COLLECTION;
use crate::metrics::track_db_operation;
use crate::models::stats::{format_percentage, StatsResponse, TopQuestion};

const TOP_QUESTIONS_LIMIT: i64 = 5;

pub struct StatsService {
    results: Collection<Document>,
    questions_per_quiz: u32,
}

impl StatsService {
    pub fn new(mongo: &Database, questions_per_quiz: u32) -> Self {
        Self {
            results: mongo.collection(RESULTS_COLLECTION),
            questions_per_quiz: questions_per_quiz.max(1),
        }
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let total = track_db_operation("count_documents", RESULTS_COLLECTION, async {
            self.results
                .count_documents(doc! {})
                .await
                .context("Failed to count results")
        })
        .await?;

        let correct = track_db_operation("count_documents", RESULTS_COLLECTION, async {
            self.results
                .count_documents(doc! { "correct": true })
                .await
                .context("Failed to count correct results")
        })
        .await?;

        let top_questions = self.top_questions().await?;

        Ok(StatsResponse {
            total_quizzes: total / u64::from(self.questions_per_quiz),
            total_questions: total,
            correct_percentage: format_percentage(correct, total),
            top_questions,
        })
    }

    /// Questions ranked by share of correct answers, ties broken by answer count.
    async fn top_questions(&self) -> Result<Vec<TopQuestion>> {
        let pipeline = vec![
            doc! {
                "$group": {
                    "_id": "$questionId",
                    "total": { "$sum": 1 },
                    "correct": { "$sum": { "$cond": ["$correct", 1, 0] } },
                }
            },
            doc! {
                "$project": {
                    "_id": 1,
                    "total": 1,
                    "correct": 1,
                    "percentageCorrect": {
                        "$multiply": [{ "$divide": ["$correct", "$total"] }, 100]
                    },
                }
            },
            doc! { "$sort": { "percentageCorrect": -1, "total": -1 } },
            doc! { "$limit": TOP_QUESTIONS_LIMIT },
        ];

        let documents: Vec<Document> = track_db_operation("aggregate", RESULTS_COLLECTION, async {
            let cursor = self
                .results
                .aggregate(pipeline)
                .await
                .context("Failed to aggregate top questions")?;
            cursor
                .try_collect::<Vec<Document>>()
                .await
                .context("Failed to read top questions")
        })
        .await?;

        Ok(documents
            .into_iter()
            .filter_map(|document| match from_document::<TopQuestion>(document) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!("Skipping malformed top question row: {}", e);
                    None
                }
            })
            .collect())
    }
}
