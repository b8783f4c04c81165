//! Schema check for generator output.
//!
//! Generators answer in free text that usually, but not always, contains a
//! JSON object, sometimes wrapped in a markdown code fence. Extraction is
//! best effort; the schema check after it is strict.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::models::question::{Category, Question, OPTION_COUNT};

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)```").unwrap();
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    /// Always recoverable: the caller asks the generator again.
    #[error("malformed question candidate: {reason}")]
    MalformedSchema { reason: String, raw: String },
}

impl ValidationError {
    fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        ValidationError::MalformedSchema {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ValidationError::MalformedSchema { reason, .. } => reason,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            ValidationError::MalformedSchema { raw, .. } => raw,
        }
    }
}

/// Locates the JSON object inside generator text: the span from the first `{`
/// to the last `}` of the code fence body, or of the whole text when the
/// fence holds no object.
pub fn extract_json(raw: &str) -> Option<&str> {
    CODE_FENCE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|body| brace_span(body.as_str()))
        .or_else(|| brace_span(raw))
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Validates raw generator text.
pub fn validate(raw: &str) -> Result<Question, ValidationError> {
    let json = extract_json(raw)
        .ok_or_else(|| ValidationError::malformed("no JSON object found in response", raw))?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| ValidationError::malformed(format!("invalid JSON: {}", e), raw))?;

    check_schema(&value).map_err(|reason| ValidationError::malformed(reason, raw))
}

/// Validates an already decoded candidate.
pub fn validate_value(candidate: &Value) -> Result<Question, ValidationError> {
    check_schema(candidate).map_err(|reason| ValidationError::malformed(reason, candidate.to_string()))
}

fn check_schema(candidate: &Value) -> Result<Question, String> {
    let object = candidate
        .as_object()
        .ok_or_else(|| "candidate is not a JSON object".to_string())?;

    let question = non_empty_str(object, "question")
        .or_else(|| non_empty_str(object, "text"))
        .ok_or_else(|| "missing or empty question text".to_string())?;

    let raw_options = object
        .get("options")
        .and_then(Value::as_array)
        .ok_or_else(|| "options must be an array".to_string())?;

    if raw_options.len() != OPTION_COUNT {
        return Err(format!(
            "expected {} options, got {}",
            OPTION_COUNT,
            raw_options.len()
        ));
    }

    let mut options: [String; OPTION_COUNT] = Default::default();
    let mut seen = HashSet::new();
    for (i, option) in raw_options.iter().enumerate() {
        let text = option
            .as_str()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| format!("option {} is not a non-empty string", i))?;
        if !seen.insert(text.to_lowercase()) {
            return Err(format!("option {} duplicates another option", i));
        }
        options[i] = text.to_string();
    }

    let correct_index = coerce_index(object.get("correctIndex"))?;

    let explanation = non_empty_str(object, "explanation")
        .ok_or_else(|| "missing or empty explanation".to_string())?;

    let category = object
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::parse);

    Ok(Question {
        question,
        options,
        correct_index,
        explanation,
        category,
    })
}

fn non_empty_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Numbers only; fractional values are truncated toward zero before the range check.
fn coerce_index(value: Option<&Value>) -> Result<u8, String> {
    let number = value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .ok_or_else(|| "correctIndex must be a number".to_string())?;

    let index = number.trunc();
    if !(0.0..OPTION_COUNT as f64).contains(&index) {
        return Err(format!("correctIndex {} out of range 0..=3", number));
    }
    Ok(index as u8)
}
