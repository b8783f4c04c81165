mod common;

use axum::body::to_bytes;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use tower::ServiceExt;

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_question_rejects_malformed_body() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/question")
                .header("content-type", "application/json")
                .body(Body::from("{\"usedQuestions\": \"not-a-list\"}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let json = json_body(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_question_returns_503_when_generation_exhausted() {
    // Nothing listens on the discard port, so every generator call fails
    // before the question store is consulted.
    let config = quiz_ia_api::Config {
        llm_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        llm_timeout_secs: 5,
        max_generation_attempts: 2,
        ..common::test_config()
    };
    let app = common::create_test_app_with_config(config).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/question")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"usedQuestions": ["Who painted the Mona Lisa?"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Could not generate a question");
    assert!(json.get("question").is_none());
    assert!(json.get("options").is_none());
}

#[tokio::test]
async fn test_save_result_rejects_out_of_range_answer() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/save-result")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&json!({
                        "questionId": "What is the capital of Peru?",
                        "userAnswer": 7,
                        "correct": false,
                        "timeSpent": 12
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("userAnswer"));
}

#[tokio::test]
async fn test_save_result_rejects_missing_fields() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/save-result")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"userAnswer": 1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_metrics_requires_basic_auth() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let credentials = general_purpose::STANDARD.encode("metrics:secret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header(header::AUTHORIZATION, format!("Basic {}", credentials))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trace_id_is_echoed_or_generated() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("x-trace-id", "quiz-trace-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "quiz-trace-1"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let generated = response.headers().get("x-trace-id").unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/does-not-exist.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_allows_question_route() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/question")
                .header(header::ORIGIN, "https://quiz.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
