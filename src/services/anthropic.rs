use serde::{Deserialize, Serialize};

use crate::config::{Config, SchemaMode};
use crate::error::UpstreamError;
use crate::models::{AnalysisResult, FoodImage};
use crate::services::prompts::{food_message, IMAGE_SYSTEM_PROMPT, IMAGE_USER_PROMPT, SYSTEM_PROMPT};
use crate::services::FoodAnalyzer;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const TEXT_MAX_TOKENS: u32 = 500;
const IMAGE_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

pub struct AnthropicClient {
    api_key: String,
    api_url: String,
    model: String,
    schema_mode: SchemaMode,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            schema_mode: config.schema_mode,
            client: builder.build()?,
        })
    }

    async fn send(&self, request: &MessagesRequest<'_>) -> Result<AnalysisResult, UpstreamError> {
        log::info!("🤖 Sending request to Anthropic with model: {}", self.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 Anthropic response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Anthropic API error response: {}", body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let body = response.text().await?;
        log::debug!("📄 Raw Anthropic response size: {} bytes", body.len());

        let result = extract_result(&body)?;

        if self.schema_mode == SchemaMode::Strict {
            result.verdict().map_err(UpstreamError::SchemaViolation)?;
        }

        Ok(result)
    }
}

#[async_trait::async_trait]
impl FoodAnalyzer for AnthropicClient {
    async fn analyze_food(&self, food: &str) -> Result<AnalysisResult, UpstreamError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: TEXT_MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text(food_message(food)),
            }],
        };

        self.send(&request).await
    }

    async fn analyze_food_image(&self, image: &FoodImage) -> Result<AnalysisResult, UpstreamError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: IMAGE_MAX_TOKENS,
            system: IMAGE_SYSTEM_PROMPT,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: image.media_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    ContentPart::Text {
                        text: IMAGE_USER_PROMPT.to_string(),
                    },
                ]),
            }],
        };

        self.send(&request).await
    }
}

/// Vendor error text from a failed response, or `API error: <code>`.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| format!("API error: {}", status.as_u16()))
}

/// Pulls the JSON verdict out of the first text block of a messages response.
fn extract_result(body: &str) -> Result<AnalysisResult, UpstreamError> {
    let envelope: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        log::warn!("Could not parse Anthropic response envelope: {}", e);
        UpstreamError::ParseFailure(e.to_string())
    })?;

    let text = envelope
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(UpstreamError::EmptyResponse)?;

    serde_json::from_str(text.trim()).map_err(|e| {
        log::warn!("Could not parse model output as JSON: {}", e);
        UpstreamError::ParseFailure(e.to_string())
    })
}
