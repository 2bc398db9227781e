//! Jobs handed to the runner and the reports it emits

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use convert_types::{OwnerId, PayloadRef, SpecialOp};

/// What a job should do with its input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Convert { from: String, to: String },
    Special { op: SpecialOp },
    /// Fetch a message behind a `t.me` link
    FetchLink,
    /// Fetch the files behind a magnet URI
    FetchMagnet,
    /// Turn pending multi-line text into a file
    Make,
    /// Re-upload the pending file under a new name
    Rename { name: String },
    /// Free-form text with no pending session
    Other,
}

impl Operation {
    /// Registry key for the operation
    pub fn key(&self) -> &'static str {
        match self {
            Self::Convert { .. } => "convert",
            Self::Special { op } => op.key(),
            Self::FetchLink => "fetch_link",
            Self::FetchMagnet => "fetch_magnet",
            Self::Make => "make",
            Self::Rename { .. } => "rename",
            Self::Other => "other",
        }
    }

    pub fn target_ext(&self) -> Option<&str> {
        match self {
            Self::Convert { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Initial status line, if the operation announces itself
    pub fn status_text(&self) -> Option<String> {
        match self {
            Self::Convert { from, to } => Some(format!(
                "Converting from {} to {}",
                from.to_uppercase(),
                to.to_uppercase()
            )),
            Self::Special { op } => Some(op.status_text().to_string()),
            Self::FetchMagnet => Some("Processing...".to_string()),
            Self::Make => Some("Making File".to_string()),
            Self::Rename { .. } => Some("Renaming File".to_string()),
            Self::FetchLink | Self::Other => None,
        }
    }
}

/// Where progress and failure messages for a job go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSink {
    pub chat_id: i64,
    /// Message the status lines reply to
    pub reply_to: i32,
}

impl From<&PayloadRef> for StatusSink {
    fn from(payload: &PayloadRef) -> Self {
        Self {
            chat_id: payload.chat_id,
            reply_to: payload.message_id,
        }
    }
}

/// One unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: Uuid,
    pub owner: OwnerId,
    pub operation: Operation,
    pub input: PayloadRef,
    pub status_sink: StatusSink,
}

impl Job {
    /// Status messages reply to the message that carried the input.
    pub fn new(owner: OwnerId, operation: Operation, input: PayloadRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            status_sink: StatusSink::from(&input),
            owner,
            operation,
            input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed { error: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Emitted once per job when it reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: Uuid,
    pub owner: OwnerId,
    pub operation: &'static str,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use convert_types::PayloadSource;

    #[test]
    fn test_convert_status_text_uppercases() {
        let op = Operation::Convert {
            from: "docx".into(),
            to: "pdf".into(),
        };
        assert_eq!(op.status_text().as_deref(), Some("Converting from DOCX to PDF"));
        assert_eq!(op.key(), "convert");
        assert_eq!(op.target_ext(), Some("pdf"));
    }

    #[test]
    fn test_special_op_key_and_status() {
        let op = Operation::Special {
            op: SpecialOp::BgRemove,
        };
        assert_eq!(op.key(), "bg_remove");
        assert_eq!(op.status_text().as_deref(), Some("Background Removing"));
        assert!(op.target_ext().is_none());
    }

    #[test]
    fn test_link_and_free_text_are_silent() {
        assert!(Operation::FetchLink.status_text().is_none());
        assert!(Operation::Other.status_text().is_none());
        assert_eq!(Operation::FetchMagnet.status_text().as_deref(), Some("Processing..."));
    }

    #[test]
    fn test_job_status_sink_follows_input() {
        let input = PayloadRef::new(42, 7, PayloadSource::Photo { file_id: "p".into() });
        let job = Job::new(OwnerId::private(42), Operation::Special { op: SpecialOp::Scan }, input);
        assert_eq!(
            job.status_sink,
            StatusSink {
                chat_id: 42,
                reply_to: 7
            }
        );
    }

    #[test]
    fn test_job_ids_are_unique() {
        let input = PayloadRef::new(1, 1, PayloadSource::Photo { file_id: "p".into() });
        let a = Job::new(OwnerId::private(1), Operation::Other, input.clone());
        let b = Job::new(OwnerId::private(1), Operation::Other, input);
        assert_ne!(a.id, b.id);
    }
}
