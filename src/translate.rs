use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::TranslatorConfig;

pub const SOURCE_LANGUAGE: &str = "auto";
pub const TARGET_LANGUAGE: &str = "en";

/// Longest input the public translate endpoint accepts in one request.
const MAX_INPUT_CHARS: usize = 5000;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("nothing to translate")]
    EmptyInput,

    #[error("text is {0} characters, limit is {}", MAX_INPUT_CHARS)]
    TooLong(usize),

    #[error("request to translation service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected translation response: {0}")]
    UnexpectedResponse(String),
}

/// Converts text from an auto-detected language to English.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

/// Client for Google's public `translate_a/single` endpoint
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        let chars = text.chars().count();
        if chars > MAX_INPUT_CHARS {
            return Err(TranslateError::TooLong(chars));
        }

        let url = format!("{}/translate_a/single", self.base_url);
        debug!("Translating {} chars via {}", chars, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", SOURCE_LANGUAGE),
                ("tl", TARGET_LANGUAGE),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Status { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::UnexpectedResponse(e.to_string()))?;
        parse_translation(&json)
    }
}

/// Concatenate the translated segments found at `[0][*][0]`.
///
/// A `null` segment list means the service had nothing to translate and yields
/// an empty string.
fn parse_translation(json: &Value) -> Result<String, TranslateError> {
    let root = json
        .as_array()
        .ok_or_else(|| TranslateError::UnexpectedResponse("expected a JSON array".to_string()))?;

    let segments = match root.first() {
        Some(Value::Array(segments)) => segments,
        Some(Value::Null) | None => return Ok(String::new()),
        Some(_) => {
            return Err(TranslateError::UnexpectedResponse(
                "segment list is not an array".to_string(),
            ))
        }
    };

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
