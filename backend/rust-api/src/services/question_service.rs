use std::collections::HashSet;

use uuid::Uuid;

use super::option_randomizer;
use super::question_source::QuestionSource;
use super::question_store::{PersistError, QuestionStore};
use super::question_validator::{self, ValidationError};
use super::uniqueness_gate::UniquenessGate;
use crate::config::DEFAULT_MAX_GENERATION_ATTEMPTS;
use crate::metrics::{
    record_generation_attempt, GENERATION_ATTEMPTS_PER_QUESTION, GENERATION_EXHAUSTED_TOTAL,
};
use crate::models::question::{Category, Question};

/// Why a single attempt did not produce a servable question.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttemptFailure {
    #[error("question generator unavailable: {0}")]
    GeneratorUnavailable(String),

    #[error(transparent)]
    MalformedSchema(#[from] ValidationError),

    #[error("question already used: {0}")]
    Duplicate(String),

    #[error("another request stored the same question first: {0}")]
    Collision(String),
}

impl AttemptFailure {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            AttemptFailure::GeneratorUnavailable(_) => "generator_unavailable",
            AttemptFailure::MalformedSchema(_) => "malformed",
            AttemptFailure::Duplicate(_) => "duplicate",
            AttemptFailure::Collision(_) => "collision",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(
        "could not generate a unique question after {attempts} attempts (last failure: {})",
        .last_failure.as_ref().map(ToString::to_string).unwrap_or_else(|| "none".to_string())
    )]
    Exhausted {
        attempts: u32,
        last_failure: Option<AttemptFailure>,
    },
}

#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub question: Question,
    /// 1-based number of the attempt that succeeded.
    pub attempts: u32,
    /// `false` when the corpus write failed for a reason other than a collision.
    pub persisted: bool,
}

/// Drives the generate → validate → randomize → check → persist loop.
pub struct QuestionService<G, S> {
    source: G,
    store: S,
    max_attempts: u32,
}

impl<G: QuestionSource, S: QuestionStore> QuestionService<G, S> {
    pub fn new(source: G, store: S, max_attempts: u32) -> Self {
        Self {
            source,
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn with_default_attempts(source: G, store: S) -> Self {
        Self::new(source, store, DEFAULT_MAX_GENERATION_ATTEMPTS)
    }

    /// Produces a question whose text is neither in `session_exclusions` nor
    /// already in the corpus. Attempts run strictly one after another.
    pub async fn generate_unique(
        &self,
        session_exclusions: &HashSet<String>,
    ) -> Result<GeneratedQuestion, GenerationError> {
        let mut previous_category = None;
        let mut last_failure = None;

        for attempt in 1..=self.max_attempts {
            match self
                .attempt(session_exclusions, &mut previous_category)
                .await
            {
                Ok((question, persisted)) => {
                    record_generation_attempt(if persisted { "success" } else { "storage_error" });
                    GENERATION_ATTEMPTS_PER_QUESTION.observe(attempt as f64);
                    tracing::info!(
                        attempt,
                        persisted,
                        category = ?question.category,
                        "Generated question"
                    );
                    return Ok(GeneratedQuestion {
                        question,
                        attempts: attempt,
                        persisted,
                    });
                }
                Err(failure) => {
                    record_generation_attempt(failure.outcome_label());
                    match &failure {
                        AttemptFailure::MalformedSchema(e) => tracing::warn!(
                            attempt,
                            raw = %e.raw(),
                            "Generator output rejected: {}",
                            e.reason()
                        ),
                        other => tracing::warn!(attempt, "Generation attempt failed: {}", other),
                    }
                    last_failure = Some(failure);
                }
            }
        }

        GENERATION_EXHAUSTED_TOTAL.inc();
        tracing::error!(
            attempts = self.max_attempts,
            "Giving up on question generation"
        );
        Err(GenerationError::Exhausted {
            attempts: self.max_attempts,
            last_failure,
        })
    }

    async fn attempt(
        &self,
        session_exclusions: &HashSet<String>,
        previous_category: &mut Option<Category>,
    ) -> Result<(Question, bool), AttemptFailure> {
        let category = Category::random_excluding(&mut rand::rng(), *previous_category);
        *previous_category = Some(category);
        let nonce = Uuid::new_v4().to_string();

        let raw = self
            .source
            .generate(category, &nonce)
            .await
            .map_err(|e| AttemptFailure::GeneratorUnavailable(e.to_string()))?;

        let mut candidate = question_validator::validate(&raw)?;
        if candidate.category.is_none() {
            candidate.category = Some(category);
        }

        let question = option_randomizer::randomize(candidate, &mut rand::rng());

        let gate = UniquenessGate::new(&self.store);
        if !gate.is_unique(&question.question, session_exclusions).await {
            return Err(AttemptFailure::Duplicate(question.question));
        }

        match self.store.insert(&question).await {
            Ok(()) => Ok((question, true)),
            Err(PersistError::Collision(text)) => Err(AttemptFailure::Collision(text)),
            Err(PersistError::Storage(e)) => {
                // Still served: the corpus write is a record, not a precondition.
                tracing::error!("Failed to persist generated question: {:#}", e);
                Ok((question, false))
            }
        }
    }
}
