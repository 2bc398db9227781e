//! Payload references for files and text awaiting a conversion decision

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of payload a session was opened for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadKind {
    Document,
    Photo,
    Audio,
    Voice,
    Video,
    VideoNote,
    Sticker,
    Text,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT",
            Self::Photo => "PHOTO",
            Self::Audio => "AUDIO",
            Self::Voice => "VOICE",
            Self::Video => "VIDEO",
            Self::VideoNote => "VIDEO_NOTE",
            Self::Sticker => "STICKER",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sticker encoding as reported by the transport
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StickerFormat {
    Static,
    Animated,
    Video,
}

impl StickerFormat {
    /// Static stickers are WebP images; animated and video stickers share the TGS slot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Static => "webp",
            Self::Animated | Self::Video => "tgs",
        }
    }
}

/// What was sent, with enough detail to re-derive a filename and download the bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadSource {
    Document {
        file_id: String,
        file_name: Option<String>,
    },
    Photo {
        file_id: String,
    },
    Audio {
        file_id: String,
        file_name: Option<String>,
    },
    Voice {
        file_id: String,
    },
    Video {
        file_id: String,
        file_name: Option<String>,
    },
    VideoNote {
        file_id: String,
    },
    Sticker {
        file_id: String,
        set_name: Option<String>,
        format: StickerFormat,
    },
    Text {
        text: String,
    },
}

impl PayloadSource {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Document { .. } => PayloadKind::Document,
            Self::Photo { .. } => PayloadKind::Photo,
            Self::Audio { .. } => PayloadKind::Audio,
            Self::Voice { .. } => PayloadKind::Voice,
            Self::Video { .. } => PayloadKind::Video,
            Self::VideoNote { .. } => PayloadKind::VideoNote,
            Self::Sticker { .. } => PayloadKind::Sticker,
            Self::Text { .. } => PayloadKind::Text,
        }
    }

    /// Transport file id, `None` for text payloads
    pub fn file_id(&self) -> Option<&str> {
        match self {
            Self::Document { file_id, .. }
            | Self::Photo { file_id }
            | Self::Audio { file_id, .. }
            | Self::Voice { file_id }
            | Self::Video { file_id, .. }
            | Self::VideoNote { file_id }
            | Self::Sticker { file_id, .. } => Some(file_id),
            Self::Text { .. } => None,
        }
    }

    /// Filename the input is known by.
    ///
    /// Documents only have the name the sender declared. Audio and video fall
    /// back to a canonical name when the sender supplied none; photos, voice
    /// notes and video notes never carry one.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Document { file_name, .. } => file_name.clone(),
            Self::Photo { .. } => Some("photo.jpg".to_string()),
            Self::Audio { file_name, .. } => {
                Some(file_name.clone().unwrap_or_else(|| "audio.ogg".to_string()))
            }
            Self::Voice { .. } => Some("voice.ogg".to_string()),
            Self::Video { file_name, .. } => {
                Some(file_name.clone().unwrap_or_else(|| "video.mp4".to_string()))
            }
            Self::VideoNote { .. } => Some("video_note.mp4".to_string()),
            Self::Sticker {
                set_name, format, ..
            } => {
                let stem = set_name.as_deref().unwrap_or("sticker");
                Some(format!("{}.{}", stem, format.extension()))
            }
            Self::Text { .. } => None,
        }
    }

    /// Extension of [`file_name`](Self::file_name), without the dot.
    ///
    /// `None` when there is no name, no dot, or nothing after the last dot.
    pub fn source_extension(&self) -> Option<String> {
        self.file_name().as_deref().and_then(extension_of).map(str::to_string)
    }
}

/// Extension after the last dot of `name`
pub fn extension_of(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        None
    } else {
        Some(ext)
    }
}

/// Reference to the message that carried a payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadRef {
    pub chat_id: i64,
    pub message_id: i32,
    pub source: PayloadSource,
}

impl PayloadRef {
    pub fn new(chat_id: i64, message_id: i32, source: PayloadSource) -> Self {
        Self {
            chat_id,
            message_id,
            source,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sticker(format: StickerFormat, set_name: Option<&str>) -> PayloadSource {
        PayloadSource::Sticker {
            file_id: "st1".to_string(),
            set_name: set_name.map(str::to_string),
            format,
        }
    }

    // ── file_name() ───────────────────────────────────────────────────────────

    #[test]
    fn test_document_uses_declared_name() {
        let src = PayloadSource::Document {
            file_id: "d".to_string(),
            file_name: Some("report.docx".to_string()),
        };
        assert_eq!(src.file_name().as_deref(), Some("report.docx"));
        assert_eq!(src.source_extension().as_deref(), Some("docx"));
    }

    #[test]
    fn test_document_without_name_has_no_extension() {
        let src = PayloadSource::Document {
            file_id: "d".to_string(),
            file_name: None,
        };
        assert!(src.file_name().is_none());
        assert!(src.source_extension().is_none());
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(
            PayloadSource::Photo { file_id: "p".into() }.file_name().as_deref(),
            Some("photo.jpg")
        );
        assert_eq!(
            PayloadSource::Voice { file_id: "v".into() }.file_name().as_deref(),
            Some("voice.ogg")
        );
        assert_eq!(
            PayloadSource::VideoNote { file_id: "n".into() }.file_name().as_deref(),
            Some("video_note.mp4")
        );
    }

    #[test]
    fn test_audio_and_video_fallback_names() {
        let audio = PayloadSource::Audio {
            file_id: "a".into(),
            file_name: None,
        };
        let video = PayloadSource::Video {
            file_id: "v".into(),
            file_name: None,
        };
        assert_eq!(audio.source_extension().as_deref(), Some("ogg"));
        assert_eq!(video.source_extension().as_deref(), Some("mp4"));
    }

    #[test]
    fn test_sticker_extensions() {
        assert_eq!(
            sticker(StickerFormat::Static, None).file_name().as_deref(),
            Some("sticker.webp")
        );
        assert_eq!(
            sticker(StickerFormat::Animated, Some("cats")).file_name().as_deref(),
            Some("cats.tgs")
        );
        assert_eq!(
            sticker(StickerFormat::Video, None).source_extension().as_deref(),
            Some("tgs")
        );
    }

    #[test]
    fn test_text_has_no_file() {
        let src = PayloadSource::Text {
            text: "hello".into(),
        };
        assert_eq!(src.kind(), PayloadKind::Text);
        assert!(src.file_id().is_none());
        assert!(src.file_name().is_none());
    }

    // ── extension_of() ────────────────────────────────────────────────────────

    #[test]
    fn test_extension_of_edge_cases() {
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of(".bashrc"), Some("bashrc"));
    }

    #[test]
    fn test_payload_kind_serializes_screaming() {
        let json = serde_json::to_string(&PayloadKind::VideoNote).expect("serialize");
        assert_eq!(json, "\"VIDEO_NOTE\"");
        assert_eq!(PayloadKind::VideoNote.to_string(), "VIDEO_NOTE");
    }
}
