use mongodb::bson::DateTime as BsonDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A validated multiple-choice question as served to the quiz front end.
///
/// `options` is a fixed-size array, so every value of this type already
/// satisfies the four-option invariant. `correct_index` is always `< 4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: [String; OPTION_COUNT],
    pub correct_index: u8,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Question {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index as usize]
    }
}

/// Topics used to diversify generation prompts. Not part of a question's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    History,
    Science,
    Sports,
    Geography,
    Entertainment,
    Literature,
    Art,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::History,
        Category::Science,
        Category::Sports,
        Category::Geography,
        Category::Entertainment,
        Category::Literature,
        Category::Art,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::History => "history",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Geography => "geography",
            Category::Entertainment => "entertainment",
            Category::Literature => "literature",
            Category::Art => "art",
        }
    }

    pub fn parse(value: &str) -> Option<Category> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }

    /// Picks a category uniformly, never returning `previous` (when given).
    pub fn random_excluding<R: Rng + ?Sized>(rng: &mut R, previous: Option<Category>) -> Category {
        let candidates: Vec<Category> = Self::ALL
            .into_iter()
            .filter(|category| Some(*category) != previous)
            .collect();
        candidates[rng.random_range(0..candidates.len())]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document shape of the `questions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "createdAt")]
    pub created_at: BsonDateTime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(default)]
    pub used_questions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_question_wire_format() {
        let question = Question {
            question: "What is 2 + 2?".to_string(),
            options: [
                "3".to_string(),
                "4".to_string(),
                "5".to_string(),
                "22".to_string(),
            ],
            correct_index: 1,
            explanation: "Basic arithmetic".to_string(),
            category: Some(Category::Science),
        };

        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["question"], "What is 2 + 2?");
        assert_eq!(json["correctIndex"], 1);
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
        assert_eq!(json["category"], "science");
        assert_eq!(question.correct_option(), "4");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("History"), Some(Category::History));
        assert_eq!(Category::parse(" art "), Some(Category::Art));
        assert_eq!(Category::parse("cooking"), None);
    }

    #[test]
    fn test_random_category_skips_previous() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let picked = Category::random_excluding(&mut rng, Some(Category::Art));
            assert_ne!(picked, Category::Art);
        }
    }

    #[test]
    fn test_used_questions_default_to_empty() {
        let req: CreateQuestionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.used_questions.is_empty());
    }
}
