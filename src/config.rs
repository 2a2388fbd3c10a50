use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::scoring::ScoringConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    pub github: Option<GitHubConfig>,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    pub assessment: Option<AssessmentConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    #[default]
    Production,
}

impl RuntimeEnvironment {
    pub fn is_development(&self) -> bool {
        matches!(self, RuntimeEnvironment::Development)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    pub app_id: u64,
    pub private_key_path: PathBuf,
}

#[derive(Deserialize, Clone, Default)]
pub struct WebhookConfig {
    #[serde(default)]
    pub secret: String,
}

// Manual Debug impl to avoid leaking the webhook secret
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Title and label that identify the tracked scorecard issue.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
    #[serde(default = "default_issue_title")]
    pub issue_title: String,
    #[serde(default = "default_issue_label")]
    pub issue_label: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            issue_title: default_issue_title(),
            issue_label: default_issue_label(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct AssessmentConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the API key
impl std::fmt::Debug for AssessmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_issue_title() -> String {
    "DevEx Scorecard".to_string()
}

fn default_issue_label() -> String {
    "devex-scorecard".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    120
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("scorecard").required(false));
        }

        // Environment variable overrides with SCORECARD_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SCORECARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook.secret
    }
}
