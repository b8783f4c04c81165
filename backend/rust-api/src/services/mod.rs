use std::time::Duration;

use anyhow::Context;
use mongodb::{bson::doc, options::IndexOptions, Client as MongoClient, Database, IndexModel};

use crate::config::Config;

pub mod option_randomizer;
pub mod question_service;
pub mod question_source;
pub mod question_store;
pub mod question_validator;
pub mod result_service;
pub mod stats_service;
pub mod uniqueness_gate;

use question_store::QUESTIONS_COLLECTION;
use result_service::RESULTS_COLLECTION;

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Does not touch the network; MongoDB connects lazily on first use.
    pub fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            mongo,
            http_client,
        })
    }
}

/// Creates the indexes the services rely on. The unique index on question
/// text is what makes concurrent generation safe.
pub async fn ensure_indexes(mongo: &Database) -> anyhow::Result<()> {
    let questions = mongo.collection::<mongodb::bson::Document>(QUESTIONS_COLLECTION);
    questions
        .create_index(
            IndexModel::builder()
                .keys(doc! { "question": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await
        .context("Failed to create unique index on questions.question")?;
    questions
        .create_index(IndexModel::builder().keys(doc! { "createdAt": 1 }).build())
        .await
        .context("Failed to create index on questions.createdAt")?;

    let results = mongo.collection::<mongodb::bson::Document>(RESULTS_COLLECTION);
    results
        .create_index(
            IndexModel::builder()
                .keys(doc! { "questionId": 1, "userAnswer": 1, "correct": 1, "timeSpent": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await
        .context("Failed to create unique index on results")?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}
