use std::{collections::HashSet, sync::Arc, time::Duration};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    extractors::AppJson,
    models::{
        question::{CreateQuestionRequest, Question},
        result::{SaveResultRequest, SaveResultResponse},
        stats::StatsResponse,
    },
    services::{
        question_service::QuestionService,
        question_source::LlmQuestionSource,
        question_store::MongoQuestionStore,
        result_service::{ResultService, SaveOutcome},
        stats_service::StatsService,
        AppState,
    },
};

pub(crate) async fn create_question(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let session_exclusions: HashSet<String> = req
        .used_questions
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    tracing::info!(
        "Generating question, {} excluded for this session",
        session_exclusions.len()
    );

    let service = QuestionService::new(
        LlmQuestionSource::new(state.http_client.clone(), &state.config),
        MongoQuestionStore::new(&state.mongo),
        state.config.max_generation_attempts,
    );

    let generation = service.generate_unique(&session_exclusions);
    let result = match state.config.request_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), generation)
            .await
            .map_err(|_| {
                tracing::error!("Question generation timed out after {}s", secs);
                ApiError::timeout("Timed out while generating a question")
            })?,
        None => generation.await,
    };

    match result {
        Ok(generated) => {
            if !generated.persisted {
                tracing::warn!("Serving question that was not stored in the corpus");
            }
            Ok(Json(generated.question))
        }
        Err(e) => {
            tracing::error!("Failed to generate question: {}", e);
            Err(ApiError::unavailable("Could not generate a question"))
        }
    }
}

pub(crate) async fn save_result(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SaveResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let service = ResultService::new(&state.mongo);
    let outcome = service.save_result(req).await?;
    if outcome == SaveOutcome::AlreadySaved {
        tracing::debug!("Duplicate result ignored");
    }

    Ok((
        StatusCode::CREATED,
        Json(SaveResultResponse { success: true }),
    ))
}

pub(crate) async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let service = StatsService::new(&state.mongo, state.config.questions_per_quiz);
    let stats = service.stats().await.map_err(|e| {
        tracing::error!("Failed to load stats: {:#}", e);
        ApiError::internal("Failed to load statistics")
    })?;
    Ok(Json(stats))
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    fn unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    fn timeout(message: impl Into<String>) -> Self {
        ApiError::GatewayTimeout(message.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", err);
        ApiError::internal("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::GatewayTimeout(message) => (StatusCode::GATEWAY_TIMEOUT, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
