//! Telegram messages → engine events

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod inbound_tests;

use teloxide::types::Message;

use convert_types::{BotCommand, EventPayload, InboundEvent, OwnerId, PayloadSource, StickerFormat};

/// Convert a message into an [`InboundEvent`].
///
/// Returns `None` for messages without a human sender (channel posts) and
/// for content the bot does not handle.
pub fn to_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    if user.is_bot {
        return None;
    }

    let payload = match msg.text() {
        Some(text) => match BotCommand::parse(text) {
            Some(command) => EventPayload::Command { command },
            None => EventPayload::Text {
                text: text.to_string(),
            },
        },
        None => EventPayload::Media {
            source: media_source(msg)?,
        },
    };

    let chat_id = msg.chat.id.0;
    Some(InboundEvent {
        owner: OwnerId::new(chat_id, user.id.0 as i64),
        chat_id,
        message_id: msg.id.0,
        is_private: msg.chat.is_private(),
        sender_name: Some(user.first_name.clone()),
        payload,
    })
}

/// The file a message carries, largest photo size first
pub fn media_source(msg: &Message) -> Option<PayloadSource> {
    if let Some(document) = msg.document() {
        return Some(PayloadSource::Document {
            file_id: document.file.id.clone(),
            file_name: document.file_name.clone(),
        });
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(PayloadSource::Photo {
            file_id: photo.file.id.clone(),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(PayloadSource::Audio {
            file_id: audio.file.id.clone(),
            file_name: audio.file_name.clone(),
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(PayloadSource::Voice {
            file_id: voice.file.id.clone(),
        });
    }
    if let Some(video) = msg.video() {
        return Some(PayloadSource::Video {
            file_id: video.file.id.clone(),
            file_name: video.file_name.clone(),
        });
    }
    if let Some(note) = msg.video_note() {
        return Some(PayloadSource::VideoNote {
            file_id: note.file.id.clone(),
        });
    }
    if let Some(sticker) = msg.sticker() {
        let format = if sticker.flags.is_video {
            StickerFormat::Video
        } else if sticker.flags.is_animated {
            StickerFormat::Animated
        } else {
            StickerFormat::Static
        };
        return Some(PayloadSource::Sticker {
            file_id: sticker.file.id.clone(),
            set_name: sticker.set_name.clone(),
            format,
        });
    }
    None
}
