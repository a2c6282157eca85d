use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::platform::{IncomingMessage, MessageKind, OutgoingReply, Transport};
use crate::translate::Translator;

pub const GREETING: &str = "Hi! Send me a message and I'll translate it to English.";
pub const TRANSLATED_PREFIX: &str = "Translated:\n";
pub const TRANSLATION_FAILED: &str = "Sorry, I couldn't translate that.";

/// Decide the reply for one message.
///
/// `/start` and free text always produce exactly one reply. Unknown commands
/// and messages without text produce none. Translation failures are logged and
/// turned into [`TRANSLATION_FAILED`]; this never returns an error.
pub async fn dispatch(msg: &IncomingMessage, translator: &dyn Translator) -> Option<OutgoingReply> {
    let text = match &msg.kind {
        MessageKind::Command { name } if name == "start" => GREETING.to_string(),
        MessageKind::Command { name } => {
            debug!("Ignoring unknown command /{} in chat {}", name, msg.chat_id);
            return None;
        }
        MessageKind::Text(body) => {
            info!("Received text to translate in chat {}: {}", msg.chat_id, body);
            match translator.translate(body).await {
                Ok(translated) => format!("{}{}", TRANSLATED_PREFIX, translated),
                Err(e) => {
                    error!("Translation failed for {:?}: {}", body, e);
                    TRANSLATION_FAILED.to_string()
                }
            }
        }
        MessageKind::Other => {
            debug!("Ignoring non-text message in chat {}", msg.chat_id);
            return None;
        }
    };

    Some(OutgoingReply {
        chat_id: msg.chat_id,
        text,
    })
}

/// Dispatch a message and deliver the reply, if any. Returns whether a reply was sent.
///
/// A translation Telegram refuses to deliver is replaced by [`TRANSLATION_FAILED`]
/// so the user still gets an answer.
pub async fn respond(
    msg: &IncomingMessage,
    translator: &dyn Translator,
    transport: &dyn Transport,
) -> Result<bool> {
    let Some(reply) = dispatch(msg, translator).await else {
        return Ok(false);
    };

    let chat_id = reply.chat_id;
    let is_translation = reply.text.starts_with(TRANSLATED_PREFIX);

    match transport.send_reply(reply).await {
        Ok(()) => Ok(true),
        Err(e) if is_translation => {
            warn!("Failed to deliver translation to chat {}: {}", chat_id, e);
            transport
                .send_reply(OutgoingReply {
                    chat_id,
                    text: TRANSLATION_FAILED.to_string(),
                })
                .await?;
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
