use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::{env, fs};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub database_path: String,
    /// API key for the external evaluation service. Absent means subjective
    /// grading always degrades to needs-review.
    pub llm_api_key: Option<String>,
    pub llm_endpoint: String,
    pub llm_timeout_secs: u64,
    pub makeup_max_attempts: i32,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();

        CONFIG.get_or_init(|| {
            let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "examine".into());
            let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".into());
            let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/engine.log".into());
            let database_path = env::var("DATABASE_PATH").expect("DATABASE_PATH must be set");
            let llm_api_key = env::var("LLM_API_KEY").ok();
            let llm_endpoint = env::var("LLM_ENDPOINT").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent".into()
            });
            let llm_timeout_secs = env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            let makeup_max_attempts = env::var("MAKEUP_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2);

            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                fs::create_dir_all(parent).expect("Failed to create log directory");
            }

            Config {
                project_name,
                log_level,
                log_file,
                database_path,
                llm_api_key,
                llm_endpoint,
                llm_timeout_secs,
                makeup_max_attempts,
            }
        })
    }

    pub fn get() -> &'static Self {
        CONFIG.get().expect("Config not initialized")
    }

    /// Like [`Config::get`], but usable from code that must also work
    /// before/without initialization (library defaults, tests).
    pub fn try_get() -> Option<&'static Self> {
        CONFIG.get()
    }
}
