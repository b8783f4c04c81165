use serde::Deserialize;
use std::env;

pub const DEFAULT_LLM_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub max_generation_attempts: u32,
    /// Wall-clock budget for one `/api/question` request. `None` disables it.
    pub request_timeout_secs: Option<u64>,
    pub questions_per_quiz: u32,
    pub bind_addr: String,
    pub static_dir: String,
    pub allowed_origins: Vec<String>,
    /// `username:password` expected by the `/metrics` Basic auth guard.
    pub metrics_auth: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017/quiz-ia".to_string(),
            mongo_database: "quiz-ia".to_string(),
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_api_key: String::new(),
            llm_model: "deepseek-chat".to_string(),
            llm_temperature: 0.7,
            llm_max_tokens: 2048,
            llm_timeout_secs: 30,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
            request_timeout_secs: Some(120),
            questions_per_quiz: 10,
            bind_addr: "0.0.0.0:3000".to_string(),
            static_dir: "public".to_string(),
            allowed_origins: Vec::new(),
            metrics_auth: "admin:changeme".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGODB_URI"))
            .unwrap_or(defaults.mongo_uri);

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or(defaults.mongo_database);

        let llm_api_key = settings
            .get_string("llm.api_key")
            .or_else(|_| env::var("DEEPSEEK_API_KEY"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    eprintln!("WARNING: no LLM API key configured, question generation will fail");
                }
                defaults.llm_api_key.clone()
            });

        let llm_api_url = settings
            .get_string("llm.api_url")
            .unwrap_or(defaults.llm_api_url);
        let llm_model = settings
            .get_string("llm.model")
            .unwrap_or(defaults.llm_model);
        let llm_temperature = settings
            .get_float("llm.temperature")
            .map(|value| value as f32)
            .unwrap_or(defaults.llm_temperature);
        let llm_max_tokens = get_u64(&settings, "llm.max_tokens")
            .map(|value| value as u32)
            .unwrap_or(defaults.llm_max_tokens);
        let llm_timeout_secs =
            get_u64(&settings, "llm.timeout_secs").unwrap_or(defaults.llm_timeout_secs);

        let max_generation_attempts = get_u64(&settings, "generation.max_attempts")
            .map(|value| value.max(1) as u32)
            .unwrap_or(defaults.max_generation_attempts);

        // 0 turns the per-request timeout off
        let request_timeout_secs = match get_u64(&settings, "generation.request_timeout_secs") {
            Some(0) => None,
            Some(secs) => Some(secs),
            None => defaults.request_timeout_secs,
        };

        let questions_per_quiz = get_u64(&settings, "quiz.questions_per_quiz")
            .map(|value| value.max(1) as u32)
            .unwrap_or(defaults.questions_per_quiz);

        let bind_addr = settings
            .get_string("server.bind_addr")
            .ok()
            .or_else(|| env::var("PORT").ok().map(|port| format!("0.0.0.0:{}", port)))
            .unwrap_or(defaults.bind_addr);

        let static_dir = settings
            .get_string("server.static_dir")
            .unwrap_or(defaults.static_dir);

        let allowed_origins = settings
            .get_string("server.allowed_origins")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.allowed_origins);

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or(defaults.metrics_auth);

        Ok(Config {
            mongo_uri,
            mongo_database,
            llm_api_url,
            llm_api_key,
            llm_model,
            llm_temperature,
            llm_max_tokens,
            llm_timeout_secs,
            max_generation_attempts,
            request_timeout_secs,
            questions_per_quiz,
            bind_addr,
            static_dir,
            allowed_origins,
            metrics_auth,
        })
    }
}

fn get_u64(settings: &config::Config, key: &str) -> Option<u64> {
    settings
        .get_int(key)
        .ok()
        .and_then(|value| u64::try_from(value).ok())
}

/// Comma separated origin list, blanks dropped.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
