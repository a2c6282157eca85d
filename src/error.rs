use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("{0}")]
    Config(String),

    #[error("malformed update: {0}")]
    MalformedUpdate(#[from] serde_json::Error),

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

impl BotError {
    pub fn config(msg: impl Into<String>) -> Self {
        BotError::Config(msg.into())
    }
}

/// Every failure surfaces as a 500 so the upstream delivery system applies its own retry policy.
impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        error!("Webhook request failed: {}", self);
        let body = match &self {
            BotError::Config(_) | BotError::MalformedUpdate(_) => self.to_string(),
            BotError::Telegram(_) => "error".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
