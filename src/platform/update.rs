//! Telegram `Update` payloads as pushed to the webhook endpoint.
//!
//! Only the fields the bot reacts to are modelled; everything else in the
//! Bot API schema is ignored during deserialization.

use serde::Deserialize;

use crate::error::Result;
use crate::platform::IncomingMessage;

#[derive(Debug, Deserialize)]
pub struct WebhookUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessage {
    pub message_id: i64,
    pub chat: UpdateChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChat {
    pub id: i64,
}

impl WebhookUpdate {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// `None` for updates that carry no message (edits, callbacks, member changes).
    pub fn into_incoming(self, bot_username: Option<&str>) -> Option<IncomingMessage> {
        let message = self.message?;
        Some(IncomingMessage::addressed(
            message.chat.id,
            message.text.as_deref(),
            bot_username,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::platform::MessageKind;

    #[test]
    fn test_text_message_update() {
        let body = br#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "from": {"id": 42, "is_bot": false, "first_name": "Ana"},
                "chat": {"id": 42, "type": "private", "first_name": "Ana"},
                "text": "Hola"
            }
        }"#;
        let update = WebhookUpdate::from_slice(body).unwrap();
        assert_eq!(update.update_id, 10);
        let msg = update.into_incoming(None).unwrap();
        assert_eq!(msg.chat_id, 42);
        assert_eq!(msg.kind, MessageKind::Text("Hola".to_string()));
    }

    #[test]
    fn test_photo_message_is_other() {
        let body = br#"{
            "update_id": 11,
            "message": {
                "message_id": 6,
                "date": 1700000000,
                "chat": {"id": -100123, "type": "supergroup", "title": "Group"},
                "photo": [{"file_id": "x", "file_unique_id": "y", "width": 1, "height": 1}]
            }
        }"#;
        let msg = WebhookUpdate::from_slice(body)
            .unwrap()
            .into_incoming(None)
            .unwrap();
        assert_eq!(msg.chat_id, -100123);
        assert_eq!(msg.kind, MessageKind::Other);
    }

    #[test]
    fn test_update_without_message() {
        let body = br#"{"update_id": 12, "edited_message": {"message_id": 1}}"#;
        let update = WebhookUpdate::from_slice(body).unwrap();
        assert!(update.into_incoming(None).is_none());
    }

    #[test]
    fn test_malformed_payloads() {
        let bodies: [&[u8]; 3] = [b"not json", br#"{"message": {}}"#, b"[]"];
        for body in bodies {
            let err = WebhookUpdate::from_slice(body).unwrap_err();
            assert!(matches!(err, BotError::MalformedUpdate(_)));
        }
    }
}
