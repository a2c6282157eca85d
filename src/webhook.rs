//! Webhook delivery mode.
//!
//! Telegram pushes each update as a JSON `POST` to `/api/index` (or the
//! `/api/webhook` alias). Every request acquires its own transport from the
//! [`Connector`], replies through it, and drops it before the response is
//! returned, so nothing is shared across invocations.
//!
//! Routes:
//! - `GET /` liveness check
//! - `POST /api/index`, `POST /api/webhook` receive one update
//! - `GET|POST /set_webhook` register `<base_url>/api/index` with Telegram

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{info, warn};

use crate::bot;
use crate::config::{Config, WEBHOOK_PATH};
use crate::error::{self, BotError};
use crate::platform::update::WebhookUpdate;
use crate::platform::Connector;
use crate::translate::Translator;

pub const LIVENESS_TEXT: &str = "Bot is alive and listening.";

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    translator: Arc<dyn Translator>,
    connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(
        config: Config,
        translator: Arc<dyn Translator>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            translator,
            connector,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(WEBHOOK_PATH, post(receive_update))
        .route("/api/webhook", post(receive_update))
        .route("/set_webhook", get(register_webhook).post(register_webhook))
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn receive_update(
    State(state): State<AppState>,
    body: Bytes,
) -> error::Result<&'static str> {
    info!("Webhook received ({} bytes)", body.len());

    let token = state.config.telegram.require_token()?;
    let update = WebhookUpdate::from_slice(&body)?;
    let update_id = update.update_id;

    let Some(incoming) = update.into_incoming(state.config.telegram.username()) else {
        info!("Update {} carries no message, acknowledging", update_id);
        return Ok("ok");
    };

    let transport = state.connector.connect(token)?;
    let replied = bot::respond(&incoming, state.translator.as_ref(), transport.as_ref()).await?;
    drop(transport);

    info!("Update {} processed (replied: {})", update_id, replied);
    Ok("ok")
}

async fn register_webhook(State(state): State<AppState>) -> error::Result<&'static str> {
    let (Some(token), Some(url)) = (
        state.config.telegram.require_token().ok(),
        state.config.webhook.endpoint_url(),
    ) else {
        return Err(BotError::config("VERCEL_URL or BOT_TOKEN not configured."));
    };

    info!("Setting webhook to {}", url);
    let transport = state.connector.connect(token)?;
    transport.set_webhook(&url).await?;
    Ok("Webhook has been set.")
}

/// Serve the webhook routes until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let config = state.config.clone();

    if config.webhook.register_on_start {
        match (
            config.telegram.require_token().ok(),
            config.webhook.endpoint_url(),
        ) {
            (Some(token), Some(url)) => {
                info!("Registering webhook {} on startup", url);
                state
                    .connector
                    .connect(token)?
                    .set_webhook(&url)
                    .await
                    .context("Failed to register webhook on startup")?;
            }
            _ => warn!("register_on_start is set but VERCEL_URL or BOT_TOKEN is missing"),
        }
    }

    let addr = config.webhook.bind.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Webhook server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
