use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me};
use tracing::{info, warn};

use crate::bot::respond;
use crate::config::TelegramConfig;
use crate::error::{BotError, Result};
use crate::platform::{Connector, IncomingMessage, MessageKind, OutgoingReply, Transport};
use crate::translate::Translator;

/// Telegram rejects messages over 4096 characters; stay below it with some slack.
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Split long messages for Telegram's length limit, preferring newline or space boundaries
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            // Only break early when it keeps at least half a chunk
            let window = &text[start..end];
            let min = window.len() / 2;
            window
                .rfind('\n')
                .filter(|&pos| pos >= min)
                .or_else(|| window.rfind(' ').filter(|&pos| pos >= min))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Bot API client for one token
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_reply(&self, reply: OutgoingReply) -> Result<()> {
        for chunk in split_message(&reply.text, MAX_MESSAGE_LEN) {
            self.bot.send_message(ChatId(reply.chat_id), chunk).await?;
        }
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|e| BotError::config(format!("Invalid webhook URL {}: {}", url, e)))?;
        self.bot.set_webhook(url).await?;
        Ok(())
    }
}

/// Creates a fresh [`TelegramTransport`] per request
pub struct TelegramConnector {
    api_url: Option<Url>,
}

impl TelegramConnector {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let api_url = config
            .api_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|e| BotError::config(format!("Invalid TELEGRAM_API_URL {}: {}", raw, e)))
            })
            .transpose()?;
        Ok(Self { api_url })
    }

    pub fn build_bot(&self, token: &str) -> Bot {
        let bot = Bot::new(token);
        match &self.api_url {
            Some(url) => bot.set_api_url(url.clone()),
            None => bot,
        }
    }
}

impl Connector for TelegramConnector {
    fn connect(&self, token: &str) -> Result<Box<dyn Transport>> {
        Ok(Box::new(TelegramTransport::new(self.build_bot(token))))
    }
}

/// Long-poll Telegram until Ctrl-C. In-flight handlers finish before the loop exits.
pub async fn run_polling(bot: Bot, translator: Arc<dyn Translator>) -> Result<()> {
    // getUpdates is rejected while a webhook is registered
    if let Err(e) = bot.delete_webhook().await {
        warn!("Failed to delete webhook before polling: {}", e);
    }

    info!("Starting Telegram long polling...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![translator])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram polling stopped");
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    me: Me,
    translator: Arc<dyn Translator>,
) -> Result<()> {
    let incoming = IncomingMessage::addressed(msg.chat.id.0, msg.text(), Some(me.username()));

    if matches!(incoming.kind, MessageKind::Text(_)) {
        bot.send_chat_action(msg.chat.id, ChatAction::Typing)
            .await
            .ok();
    }

    let transport = TelegramTransport::new(bot);
    respond(&incoming, translator.as_ref(), &transport).await?;
    Ok(())
}
