use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::assessment::{prompt, AssessmentGenerator, RepositoryContext};
use crate::config::AssessmentConfig;
use crate::error::{AppError, Result};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Assessment generator backed by the Anthropic Messages API.
pub struct ClaudeGenerator {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl ClaudeGenerator {
    /// `scoring_guide` is embedded in the system prompt of every request.
    pub fn new(config: &AssessmentConfig, scoring_guide: &str) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::Config("assessment.api_key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: prompt::system_prompt(scoring_guide),
        })
    }

    fn request_for(&self, context: &RepositoryContext) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: self.system_prompt.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt::user_message(context),
            }],
        }
    }

    async fn send_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Assessment(format!("Request timed out: {e}"))
                } else {
                    AppError::AssessmentUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AssessmentRateLimited(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Assessment(format!("API returned {status}: {body}")));
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| AppError::Assessment(format!("Unreadable API response: {e}")))
    }
}

#[async_trait]
impl AssessmentGenerator for ClaudeGenerator {
    async fn generate(&self, context: &RepositoryContext) -> Result<String> {
        let request = self.request_for(context);
        let response = self.send_message(&request).await?;

        tracing::info!(
            repo = %context.repository,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Claude response"
        );

        let text = extract_text(&response.content);
        if text.trim().is_empty() {
            return Err(AppError::Assessment("Response contained no text".to_string()));
        }
        Ok(text)
    }
}

// --- Request types ---

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

// --- Response types ---

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

fn extract_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
