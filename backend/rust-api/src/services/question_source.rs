use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::metrics::{LLM_REQUESTS_TOTAL, LLM_REQUEST_DURATION_SECONDS};
use crate::models::question::Category;

const SYSTEM_PROMPT: &str = "You are an assistant specialised in writing trivia quiz questions.";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("generator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generator returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("generator response malformed: {0}")]
    MalformedResponse(String),
}

/// Produces raw, unvalidated question text for a category.
///
/// `nonce` is unique per call and only nudges the generator away from
/// repeating earlier phrasing.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, category: Category, nonce: &str) -> Result<String, SourceError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client (DeepSeek by default).
#[derive(Clone)]
pub struct LlmQuestionSource {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmQuestionSource {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    async fn request_completion(&self, prompt: String) -> Result<String, SourceError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status,
                message: api_error_message(&body),
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SourceError::MalformedResponse("no completion content".to_string()))
    }
}

#[async_trait]
impl QuestionSource for LlmQuestionSource {
    async fn generate(&self, category: Category, nonce: &str) -> Result<String, SourceError> {
        tracing::debug!(%category, nonce, "Requesting question from LLM");

        let start = Instant::now();
        let result = self.request_completion(build_prompt(category, nonce)).await;
        let status = match &result {
            Ok(_) => "success",
            Err(SourceError::Transport(_)) => "transport_error",
            Err(SourceError::Status { .. }) => "http_error",
            Err(SourceError::MalformedResponse(_)) => "malformed",
        };

        LLM_REQUESTS_TOTAL.with_label_values(&[status]).inc();
        LLM_REQUEST_DURATION_SECONDS
            .with_label_values(&[status])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

pub fn build_prompt(category: Category, nonce: &str) -> String {
    format!(
        r#"Write one trivia quiz question about {category} with 4 answer options.
Answer with JSON only, in exactly this format:
{{
  "question": "The question here",
  "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
  "correctIndex": 0,
  "explanation": "Why the correct answer is correct"
}}
correctIndex must be a number (0-3) pointing at the correct option. The four options must be different.
Request id: {nonce}. Do not mention it; write a question you have not written before."#
    )
}

/// Pulls `error.message` out of an OpenAI-style error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_category_and_nonce() {
        let prompt = build_prompt(Category::Geography, "abc-123");
        assert!(prompt.contains("about geography"));
        assert!(prompt.contains("Request id: abc-123"));
        assert!(prompt.contains("\"correctIndex\": 0"));
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"error":{"message":"Insufficient Balance"}}"#),
            "Insufficient Balance"
        );
        assert_eq!(api_error_message("Bad gateway"), "Bad gateway");
        assert_eq!(api_error_message(""), "Unknown error");
    }

    #[test]
    fn test_completion_response_parsing() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"question\":\"q\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.choices[0].message.content.as_deref(),
            Some("{\"question\":\"q\"}")
        );
    }
}
