pub mod telegram;
pub mod update;

use async_trait::async_trait;

use crate::error::Result;

/// What an incoming message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// `/name args...`; the name is lowercased with our own `@botname` suffix removed
    Command { name: String },
    /// Free text to translate, never empty
    Text(String),
    /// Anything without text (photos, stickers, empty messages)
    Other,
}

/// A normalized message received from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub kind: MessageKind,
}

impl IncomingMessage {
    /// Classify the raw text of a message.
    pub fn new(chat_id: i64, text: Option<&str>) -> Self {
        Self::addressed(chat_id, text, None)
    }

    /// Classify the raw text of a message received by the bot named `bot_username`.
    ///
    /// `/cmd@OtherBot` is meant for another bot in the same group and classifies as
    /// [`MessageKind::Other`]. Without a known username every suffix is accepted.
    pub fn addressed(chat_id: i64, text: Option<&str>, bot_username: Option<&str>) -> Self {
        let kind = match text {
            None | Some("") => MessageKind::Other,
            Some(t) if t.starts_with('/') => parse_command(t, bot_username),
            Some(t) => MessageKind::Text(t.to_string()),
        };
        Self { chat_id, kind }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Text(body) => Some(body),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, MessageKind::Command { .. })
    }
}

fn parse_command(text: &str, bot_username: Option<&str>) -> MessageKind {
    let token = text[1..].split_whitespace().next().unwrap_or("");
    let (name, target) = match token.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (token, None),
    };

    if let (Some(target), Some(me)) = (target, bot_username) {
        if !target.eq_ignore_ascii_case(me.trim_start_matches('@')) {
            return MessageKind::Other;
        }
    }

    MessageKind::Command {
        name: name.to_lowercase(),
    }
}

/// A reply addressed to the chat the triggering message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub chat_id: i64,
    pub text: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_reply(&self, reply: OutgoingReply) -> Result<()>;

    /// Ask the platform to push updates to `url`.
    async fn set_webhook(&self, url: &str) -> Result<()>;
}

/// Builds a [`Transport`] for one unit of work. The handle is released when dropped.
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Box<dyn Transport>>;
}
