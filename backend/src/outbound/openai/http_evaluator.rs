//! Reqwest-backed roast evaluator.
//!
//! This adapter owns transport details only: building the chat completions
//! request, timeout and HTTP error mapping, and extracting the reply text.
//! Whether the reply is a usable roast is decided by the domain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    ChatMessageDto, ChatRequestDto, ChatResponseDto, ContentPartDto, ImageUrlDto,
    ResponseFormatDto,
};
use crate::domain::CapturedImage;
use crate::domain::ports::{RoastEvaluator, RoastEvaluatorError};

/// Instruction sent alongside every image.
pub const ROAST_INSTRUCTION: &str = "Roast the person in this photo. Reply with a JSON object \
with exactly these keys: \"score\" (a number from 7 to 10 with one decimal place rating how \
roastable the photo is), \"nickname\" (a short funny nickname) and \"roast\" (a funny roast \
under 50 words). Keep it light-hearted and never offensive.";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 300;

/// Connection settings for the evaluator endpoint.
pub struct OpenAiEvaluatorConfig {
    /// Full URL of the chat completions endpoint.
    pub endpoint: Url,
    pub model: String,
    pub api_key: Zeroizing<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl OpenAiEvaluatorConfig {
    pub fn new(endpoint: Url, api_key: Zeroizing<String>, timeout: Duration) -> Self {
        Self {
            endpoint,
            model: DEFAULT_MODEL.to_owned(),
            api_key,
            timeout,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Evaluator adapter posting to one chat completions endpoint.
pub struct OpenAiHttpEvaluator {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Zeroizing<String>,
    max_tokens: u32,
}

impl OpenAiHttpEvaluator {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: OpenAiEvaluatorConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            model: config.model,
            api_key: config.api_key,
            max_tokens: config.max_tokens,
        })
    }

    fn request_body<'a>(&'a self, image_url: String) -> ChatRequestDto<'a> {
        build_request(&self.model, self.max_tokens, image_url)
    }
}

fn build_request(model: &str, max_tokens: u32, image_url: String) -> ChatRequestDto<'_> {
    ChatRequestDto {
        model,
        messages: vec![ChatMessageDto {
            role: "user",
            content: vec![
                ContentPartDto::Text {
                    text: ROAST_INSTRUCTION,
                },
                ContentPartDto::ImageUrl {
                    image_url: ImageUrlDto { url: image_url },
                },
            ],
        }],
        response_format: ResponseFormatDto::json_object(),
        max_tokens: Some(max_tokens),
    }
}

#[async_trait]
impl RoastEvaluator for OpenAiHttpEvaluator {
    async fn evaluate(&self, image: &CapturedImage) -> Result<String, RoastEvaluatorError> {
        let body = self.request_body(image.to_data_url());
        debug!(
            model = %self.model,
            image_bytes = image.len(),
            content_type = image.content_type().as_mime(),
            "requesting roast"
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        parse_reply(bytes.as_ref())
    }
}

fn parse_reply(body: &[u8]) -> Result<String, RoastEvaluatorError> {
    let decoded: ChatResponseDto = serde_json::from_slice(body).map_err(|error| {
        RoastEvaluatorError::decode(format!("invalid chat completion payload: {error}"))
    })?;
    decoded.into_reply().ok_or_else(RoastEvaluatorError::empty_reply)
}

fn map_transport_error(error: reqwest::Error) -> RoastEvaluatorError {
    if error.is_timeout() {
        RoastEvaluatorError::timeout(error.to_string())
    } else {
        RoastEvaluatorError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RoastEvaluatorError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RoastEvaluatorError::timeout(format!("status {}", status.as_u16()))
        }
        _ => RoastEvaluatorError::status(status.as_u16(), body_preview(body)),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        preview.push_str("...");
    }
    preview
}
