use teloxide::types::Message;

use crate::media::{ChatSessionId, MediaKind, MediaReference};

/// A Telegram message reduced to what the indexer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The chat sent a piece of media that can be indexed.
    Upload {
        chat_id: ChatSessionId,
        kind: MediaKind,
        reference: MediaReference,
    },
    /// The chat sent plain text, possibly a keyword list.
    Text {
        chat_id: ChatSessionId,
        text: String,
    },
    /// Anything else (locations, voice notes, documents, ...).
    Unsupported,
}

/// Classify an inbound message.
///
/// Photos carry several sizes; the largest (last) one is indexed.
pub fn normalize_message(msg: &Message) -> InboundEvent {
    let chat_id = msg.chat.id.0;

    if let Some(sticker) = msg.sticker() {
        return InboundEvent::Upload {
            chat_id,
            kind: MediaKind::Sticker,
            reference: sticker.file.id.to_string(),
        };
    }

    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        return InboundEvent::Upload {
            chat_id,
            kind: MediaKind::Photo,
            reference: largest.file.id.to_string(),
        };
    }

    if let Some(animation) = msg.animation() {
        return InboundEvent::Upload {
            chat_id,
            kind: MediaKind::Animated,
            reference: animation.file.id.to_string(),
        };
    }

    if let Some(text) = msg.text() {
        return InboundEvent::Text {
            chat_id,
            text: text.to_string(),
        };
    }

    InboundEvent::Unsupported
}
