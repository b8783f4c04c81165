#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::Router;
use quiz_ia_api::{
    config::Config,
    create_router,
    models::question::{Category, Question},
    services::{
        question_source::{QuestionSource, SourceError},
        question_store::{PersistError, QuestionStore},
        AppState,
    },
};
use serde_json::json;
use tokio::sync::Barrier;

/// Router backed by a lazily connecting MongoDB client. Only requests that
/// are rejected before reaching the database can be exercised with it.
pub async fn create_test_app() -> Router {
    create_test_app_with_config(test_config()).await
}

pub async fn create_test_app_with_config(config: Config) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to create MongoDB client");

    let app_state = Arc::new(
        AppState::new(config, mongo_client).expect("Failed to initialize test app state"),
    );

    create_router(app_state)
}

pub fn test_config() -> Config {
    Config {
        mongo_uri: std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
        static_dir: "tests/no-static-files".to_string(),
        metrics_auth: "metrics:secret".to_string(),
        ..Config::default()
    }
}

/// Generator text for a valid question with the correct answer first.
pub fn question_json(text: &str) -> String {
    json!({
        "question": text,
        "options": ["Right", "Wrong A", "Wrong B", "Wrong C"],
        "correctIndex": 0,
        "explanation": format!("Explanation for {}", text),
    })
    .to_string()
}

pub fn unavailable() -> SourceError {
    SourceError::Status {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

/// Question source answering with `respond(call_number)`; calls are 1-based.
pub struct FnSource<F> {
    respond: F,
    calls: Arc<AtomicU32>,
}

impl<F> FnSource<F>
where
    F: Fn(u32) -> Result<String, SourceError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

#[async_trait]
impl<F> QuestionSource for FnSource<F>
where
    F: Fn(u32) -> Result<String, SourceError> + Send + Sync,
{
    async fn generate(&self, _category: Category, _nonce: &str) -> Result<String, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.respond)(call)
    }
}

/// In-memory corpus with a unique constraint on question text. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    texts: Arc<Mutex<HashSet<String>>>,
    lookups: Arc<AtomicU32>,
    inserts: Arc<AtomicU32>,
    collisions: Arc<AtomicU32>,
    fail_lookups: bool,
    fail_inserts: bool,
    lookup_barrier: Option<(String, Arc<Barrier>)>,
}

impl MemoryStore {
    pub fn with_texts(texts: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut guard = store.texts.lock().unwrap();
            guard.extend(texts.iter().map(|text| text.to_string()));
        }
        store
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Lookups of `text` wait on `barrier`, so concurrent callers all pass
    /// the uniqueness check before any of them writes.
    pub fn with_lookup_barrier(mut self, text: &str, barrier: Arc<Barrier>) -> Self {
        self.lookup_barrier = Some((text.to_string(), barrier));
        self
    }

    pub fn has(&self, text: &str) -> bool {
        self.texts.lock().unwrap().contains(text)
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> u32 {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn collisions(&self) -> u32 {
        self.collisions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn contains(&self, text: &str) -> anyhow::Result<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some((gated, barrier)) = &self.lookup_barrier {
            if gated == text {
                barrier.wait().await;
            }
        }
        if self.fail_lookups {
            anyhow::bail!("lookup unavailable");
        }
        Ok(self.texts.lock().unwrap().contains(text))
    }

    async fn insert(&self, question: &Question) -> Result<(), PersistError> {
        if self.fail_inserts {
            return Err(PersistError::Storage(anyhow::anyhow!("disk full")));
        }
        let inserted = self
            .texts
            .lock()
            .unwrap()
            .insert(question.question.clone());
        if inserted {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            self.collisions.fetch_add(1, Ordering::SeqCst);
            Err(PersistError::Collision(question.question.clone()))
        }
    }
}
