//! Extension catalog: format families, their extensions and special operations
//!
//! The catalog is static data. Every lookup is a pure function over the
//! tables below, so it can be shared between tasks without locking.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payload::PayloadKind;

/// A named action triggered by a keyword instead of a target extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpecialOp {
    Color,
    Positive,
    Read,
    SendPhoto,
    SendDoc,
    SendVid,
    SpeechToText,
    TextToSpeech,
    Upscale,
    Extract,
    Compile,
    Scan,
    Run,
    BgRemove,
    Ocr,
}

impl SpecialOp {
    pub const ALL: [SpecialOp; 15] = [
        Self::Color,
        Self::Positive,
        Self::Read,
        Self::SendPhoto,
        Self::SendDoc,
        Self::SendVid,
        Self::SpeechToText,
        Self::TextToSpeech,
        Self::Upscale,
        Self::Extract,
        Self::Compile,
        Self::Scan,
        Self::Run,
        Self::BgRemove,
        Self::Ocr,
    ];

    /// Keyword the user types (or taps) to request the operation
    pub fn token(&self) -> &'static str {
        match self {
            Self::Color => "COLOR",
            Self::Positive => "POSITIVE",
            Self::Read => "READ",
            Self::SendPhoto => "SENDPHOTO",
            Self::SendDoc => "SENDDOC",
            Self::SendVid => "SENDVID",
            Self::SpeechToText => "SpeechToText",
            Self::TextToSpeech => "TextToSpeech",
            Self::Upscale => "UPSCALE",
            Self::Extract => "EXTRACT",
            Self::Compile => "COMPILE",
            Self::Scan => "SCAN",
            Self::Run => "RUN",
            Self::BgRemove => "BG REMOVE",
            Self::Ocr => "OCR",
        }
    }

    /// Exact, case-sensitive token match
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    /// Stable key used to look the operation up in a converter registry
    pub fn key(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Positive => "positive",
            Self::Read => "read",
            Self::SendPhoto => "send_photo",
            Self::SendDoc => "send_doc",
            Self::SendVid => "send_vid",
            Self::SpeechToText => "speech_to_text",
            Self::TextToSpeech => "text_to_speech",
            Self::Upscale => "upscale",
            Self::Extract => "extract",
            Self::Compile => "compile",
            Self::Scan => "scan",
            Self::Run => "run",
            Self::BgRemove => "bg_remove",
            Self::Ocr => "ocr",
        }
    }

    /// Status line shown while the operation runs
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Color | Self::Positive => "Processing",
            Self::Read => "Reading File",
            Self::SendPhoto => "Sending in Photo Format",
            Self::SendDoc => "Sending in Document Format",
            Self::SendVid => "Sending in Stream Format",
            Self::SpeechToText => "Transcripting, takes long time for Long Files",
            Self::TextToSpeech => "Generating Speech",
            Self::Upscale => "Upscaling Your Image",
            Self::Extract => "Extracting File",
            Self::Compile => "Compiling",
            Self::Scan => "Scanning",
            Self::Run => "Running",
            Self::BgRemove => "Background Removing",
            Self::Ocr => "Reading Text",
        }
    }
}

impl fmt::Display for SpecialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A named group of related formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Image,
    VideoAudio,
    Document,
    Presentation,
    Spreadsheet,
    Ebook,
    Font,
    Archive,
    Subtitle,
    Program,
    Model3d,
}

impl Family {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "Images",
            Self::VideoAudio => "Videos/Audios",
            Self::Document => "Documents",
            Self::Presentation => "Presentations",
            Self::Spreadsheet => "Spreadsheets",
            Self::Ebook => "eBooks",
            Self::Font => "Fonts",
            Self::Archive => "Archives",
            Self::Subtitle => "Subtitles",
            Self::Program => "Programming Languages",
            Self::Model3d => "3D Files",
        }
    }
}

struct FamilySpec {
    family: Family,
    /// Every extension that belongs to the family
    members: &'static [&'static str],
    /// Extensions offered as conversion targets
    targets: &'static [&'static str],
    special_ops: &'static [SpecialOp],
}

const FAMILIES: &[FamilySpec] = &[
    FamilySpec {
        family: Family::Image,
        members: &[
            "SVG", "ICO", "GIF", "TIFF", "BMP", "WEBP", "JP2", "JPEG", "JPG", "PNG",
        ],
        targets: &[
            "ICO", "GIF", "TIFF", "BMP", "WEBP", "JPEG", "JPG", "PNG", "SVG",
        ],
        special_ops: &[
            SpecialOp::Ocr,
            SpecialOp::Color,
            SpecialOp::Positive,
            SpecialOp::Upscale,
            SpecialOp::Scan,
            SpecialOp::BgRemove,
            SpecialOp::SendPhoto,
            SpecialOp::SendDoc,
        ],
    },
    FamilySpec {
        family: Family::VideoAudio,
        members: &[
            "AIFF", "AAC", "M4A", "OGA", "WMA", "FLAC", "WAV", "OPUS", "OGG", "MP3", "MKV",
            "MP4", "MOV", "AVI", "M4B", "VOB", "DVD", "WEBM", "WMV",
        ],
        targets: &[
            "AIFF", "AAC", "M4A", "OGA", "WMA", "FLAC", "WAV", "OPUS", "OGG", "MP3", "MKV",
            "MP4", "MOV", "AVI", "GIF", "M4B", "VOB", "DVD", "WEBM", "WMV",
        ],
        special_ops: &[
            SpecialOp::SendVid,
            SpecialOp::SendDoc,
            SpecialOp::SpeechToText,
        ],
    },
    FamilySpec {
        family: Family::Document,
        members: &[
            "ODT", "DOC", "DOCX", "DOTX", "PDF", "XML", "HTML", "DOTM", "WPS", "OTT", "TXT",
        ],
        targets: &[
            "ODT", "DOC", "DOCX", "DOTX", "PDF", "XML", "HTML", "DOTM", "WPS", "OTT", "TXT",
        ],
        special_ops: &[SpecialOp::Read, SpecialOp::TextToSpeech],
    },
    FamilySpec {
        family: Family::Presentation,
        members: &[
            "ODP", "PPT", "PPTX", "PPTM", "PPSX", "POTM", "POTX", "PPS", "POT", "ODG", "OTP",
            "XML", "PDF",
        ],
        targets: &[
            "ODP", "PPT", "PPTX", "PPTM", "PPSX", "POTM", "POTX", "PPS", "POT", "ODG", "OTP",
            "XML", "PDF",
        ],
        special_ops: &[],
    },
    FamilySpec {
        family: Family::Spreadsheet,
        members: &[
            "ODS", "XLS", "HTML", "XLSX", "XLSM", "XLTM", "XLTX", "OTS", "XML", "PDF", "CSV",
            "XLM",
        ],
        targets: &[
            "ODS", "XLS", "HTML", "XLSX", "XLSM", "XLTM", "XLTX", "OTS", "XML", "PDF", "CSV",
            "XLM",
        ],
        special_ops: &[],
    },
    FamilySpec {
        family: Family::Ebook,
        members: &[
            "EPUB", "MOBI", "AZW3", "KFX", "FB2", "HTMLZ", "LIT", "LRF", "PDB", "PDF", "TXT",
        ],
        targets: &[
            "EPUB", "MOBI", "AZW3", "KFX", "FB2", "HTMLZ", "LIT", "LRF", "PDB", "PDF", "TXT",
        ],
        special_ops: &[],
    },
    FamilySpec {
        family: Family::Font,
        members: &[
            "SFD", "BDF", "FNT", "OTF", "PFA", "PFB", "TTC", "TTF", "UFO", "WOFF",
        ],
        targets: &[
            "SFD", "BDF", "FNT", "OTF", "PFA", "PFB", "TTC", "TTF", "UFO", "WOFF",
        ],
        special_ops: &[],
    },
    FamilySpec {
        family: Family::Archive,
        members: &["ZIP", "RAR", "7Z", "TAR", "XZ", "GZ", "BZ"],
        targets: &[],
        special_ops: &[SpecialOp::Extract],
    },
    FamilySpec {
        family: Family::Subtitle,
        members: &["TTML", "SRT", "VTT"],
        targets: &["TTML", "SRT", "VTT"],
        special_ops: &[],
    },
    FamilySpec {
        family: Family::Program,
        members: &[
            "C", "CPP", "PY", "RS", "JL", "KT", "NIM", "DART", "GO", "JAVA", "JS", "TS", "JAR",
        ],
        targets: &["CPP", "RS", "JL", "KT", "NIM", "DART", "GO", "TS", "JS"],
        special_ops: &[SpecialOp::Read, SpecialOp::Compile, SpecialOp::Run],
    },
    FamilySpec {
        family: Family::Model3d,
        members: &[
            "CTM", "PLY", "STL", "3DS", "DAE", "OBJ", "LWO", "OFF", "WRL",
        ],
        targets: &["CTM", "PLY", "STL", "3DS", "DAE", "OBJ", "LWO", "OFF"],
        special_ops: &[],
    },
];

/// What a literal token turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyMatch {
    /// A member extension of these families, in catalog order
    Extension(Vec<Family>),
    /// A special-operation keyword, valid for these families
    SpecialOp { op: SpecialOp, families: Vec<Family> },
    Unknown,
}

/// Menu offered to the user once a family is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyMenu {
    pub family: Family,
    pub targets: Vec<&'static str>,
    pub special_ops: Vec<SpecialOp>,
}

impl FamilyMenu {
    /// Every button label, targets first
    pub fn buttons(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|t| t.to_string())
            .chain(self.special_ops.iter().map(|op| op.token().to_string()))
            .collect()
    }

    /// Buttons laid out `width` per row
    pub fn rows(&self, width: usize) -> Vec<Vec<String>> {
        self.buttons()
            .chunks(width.max(1))
            .map(<[String]>::to_vec)
            .collect()
    }
}

/// Read-only view over the static family tables
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionCatalog;

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self
    }

    fn spec(&self, family: Family) -> &'static FamilySpec {
        FAMILIES
            .iter()
            .find(|s| s.family == family)
            .unwrap_or(&FAMILIES[0])
    }

    pub fn families(&self) -> impl Iterator<Item = Family> {
        FAMILIES.iter().map(|s| s.family)
    }

    /// Classify a literal token.
    ///
    /// Special-operation keywords are matched exactly; extensions are matched
    /// case-insensitively and may belong to several families.
    pub fn classify(&self, token: &str) -> FamilyMatch {
        let token = token.trim();
        if let Some(op) = SpecialOp::from_token(token) {
            let families = FAMILIES
                .iter()
                .filter(|s| s.special_ops.contains(&op))
                .map(|s| s.family)
                .collect();
            return FamilyMatch::SpecialOp { op, families };
        }

        let families: Vec<Family> = FAMILIES
            .iter()
            .filter(|s| s.members.iter().any(|m| m.eq_ignore_ascii_case(token)))
            .map(|s| s.family)
            .collect();
        if families.is_empty() {
            FamilyMatch::Unknown
        } else {
            FamilyMatch::Extension(families)
        }
    }

    pub fn is_special_op(&self, family: Family, token: &str) -> bool {
        SpecialOp::from_token(token)
            .is_some_and(|op| self.spec(family).special_ops.contains(&op))
    }

    /// Family a payload belongs to.
    ///
    /// Photos and stickers are images, every audio/video kind shares one
    /// family, documents are classified by their extension and text has none.
    pub fn family_for(&self, kind: PayloadKind, source_ext: Option<&str>) -> Option<Family> {
        match kind {
            PayloadKind::Photo | PayloadKind::Sticker => Some(Family::Image),
            PayloadKind::Audio
            | PayloadKind::Voice
            | PayloadKind::Video
            | PayloadKind::VideoNote => Some(Family::VideoAudio),
            PayloadKind::Document => match self.classify(source_ext?) {
                FamilyMatch::Extension(families) => families.first().copied(),
                _ => None,
            },
            PayloadKind::Text => None,
        }
    }

    pub fn menu(&self, family: Family) -> FamilyMenu {
        let spec = self.spec(family);
        FamilyMenu {
            family,
            targets: spec.targets.to_vec(),
            special_ops: spec.special_ops.to_vec(),
        }
    }

    /// Comma-separated member list, e.g. for the welcome text
    pub fn describe(&self, family: Family) -> String {
        self.spec(family).members.join(", ")
    }
}
