use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_quizzes: u64,
    pub total_questions: u64,
    /// Percentage with two decimals, e.g. `"66.67"`.
    pub correct_percentage: String,
    pub top_questions: Vec<TopQuestion>,
}

/// One row of the "most answered correctly" ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQuestion {
    #[serde(rename = "_id")]
    pub question_id: Option<String>,
    pub total: i64,
    pub correct: i64,
    pub percentage_correct: f64,
}

pub fn format_percentage(correct: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", correct as f64 / total as f64 * 100.0)
}
