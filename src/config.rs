use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Candidate models, newest first. Each is probed in order at startup.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: Option<String>,
    pub gemini_api_key: String,
    pub database_path: String,
    pub export_dir: PathBuf,
    pub bind_addr: String,
    pub github_api_url: String,
    pub gemini_api_url: String,
    pub gemini_models: Vec<String>,
    pub request_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub max_tree_depth: usize,
    pub eager_exports: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("GEMINI_API_KEY environment variable not set".to_string())
            })?;

        let github_token = env::var("GITHUB_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "repoinsight.db".to_string());

        let export_dir = env::var("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let github_api_url = env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string());

        let gemini_api_url = env::var("GEMINI_API_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string());

        let gemini_models = env::var("GEMINI_MODELS")
            .ok()
            .map(|v| parse_model_list(&v))
            .filter(|models| !models.is_empty())
            .unwrap_or_else(default_models);

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let model_timeout_secs = env::var("MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        let max_tree_depth = env::var("MAX_TREE_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let eager_exports = env::var("EAGER_EXPORTS")
            .ok()
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            github_token,
            gemini_api_key,
            database_path,
            export_dir,
            bind_addr,
            github_api_url,
            gemini_api_url,
            gemini_models,
            request_timeout_secs,
            model_timeout_secs,
            max_tree_depth,
            eager_exports,
        })
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_tree_depth: usize,
    pub eager_exports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: 3,
            eager_exports: true,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_tree_depth: config.max_tree_depth,
            eager_exports: config.eager_exports,
        }
    }
}
