//! Outcome of matching a reply against a pending session

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SpecialOp;

/// Why a reply did not produce a job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Target equals the source extension
    SameExtension,
    /// The payload has no family, or the keyword does not apply to it
    UnsupportedPayload,
    /// No extension could be derived from the payload
    UnparseableFilename,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SameExtension => "same_extension",
            Self::UnsupportedPayload => "unsupported_payload",
            Self::UnparseableFilename => "unparseable_filename",
        };
        f.write_str(s)
    }
}

/// Decided outcome of a reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    SpecialOp { op: SpecialOp },
    Conversion { from: String, to: String },
    Rejected { reason: RejectReason },
}

impl Resolution {
    pub fn special(op: SpecialOp) -> Self {
        Self::SpecialOp { op }
    }

    pub fn conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
