//! The generation oracle: the external text-generation service every stage
//! delegates to, plus an HTTP client for OpenAI-compatible chat-completions APIs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::OracleError;
use crate::stage::StageId;

/// Stages always ask for maximal determinism.
pub const TEMPERATURE: f32 = 0.0;

/// One oracle invocation: a fixed instruction plus the bound inputs.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Stage on whose behalf the call is made (logging and routing only).
    pub stage: StageId,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the service for a JSON object reply.
    pub json_output: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub tokens_used: u32,
    pub model: String,
}

/// External text-generation capability.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, OracleError>;
}

// ── Configuration ──

/// Connection and budget settings for the oracle.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API root, e.g. `https://api.openai.com/v1` (no trailing slash needed).
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Per-call deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── Chat-completions client ──

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl ChatCompletionsOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn body<'a>(&'a self, request: &'a GenerateRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl Oracle for ChatCompletionsOracle {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(url = %url, stage = %request.stage, model = %self.model, "calling oracle");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let response = decode_completion(&resp.text().await?)?;
        info!(
            stage = %request.stage,
            model = %response.model,
            tokens_used = response.tokens_used,
            "oracle replied"
        );
        Ok(response)
    }
}

/// Pull the first choice's text out of a chat-completions reply body.
fn decode_completion(body: &str) -> Result<GenerateResponse, OracleError> {
    let completion: ChatCompletion = serde_json::from_str(body)?;
    let text = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(OracleError::EmptyResponse)?;

    Ok(GenerateResponse {
        text,
        tokens_used: completion.usage.map(|u| u.total_tokens).unwrap_or(0),
        model: completion.model,
    })
}
