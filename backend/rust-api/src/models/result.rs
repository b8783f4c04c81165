use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultRequest {
    #[validate(length(min = 1, message = "questionId must not be empty"))]
    pub question_id: String,
    #[validate(range(min = 0, max = 3, message = "userAnswer must be between 0 and 3"))]
    pub user_answer: i32,
    pub correct: bool,
    #[validate(range(min = 0, message = "timeSpent must not be negative"))]
    pub time_spent: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResultResponse {
    pub success: bool,
}

/// Document shape of the `results` collection. Written once per answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: String,
    pub user_answer: i32,
    pub correct: bool,
    pub time_spent: i64,
    pub timestamp: BsonDateTime,
}

impl AnswerResult {
    pub fn from_request(req: SaveResultRequest, timestamp: BsonDateTime) -> Self {
        Self {
            question_id: req.question_id,
            user_answer: req.user_answer,
            correct: req.correct,
            time_spent: req.time_spent,
            timestamp,
        }
    }
}
