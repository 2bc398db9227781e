use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;

/// A message the gateway has delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl MessageRef {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Reply keyboard attached to an outgoing text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// One-time keyboard shown only to the user being replied to
    Keyboard {
        rows: Vec<Vec<String>>,
        placeholder: String,
    },
    /// Hide a keyboard previously shown to that user
    RemoveKeyboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingText {
    pub chat_id: i64,
    pub reply_to: Option<i32>,
    pub text: String,
    pub markup: Option<Markup>,
}

impl OutgoingText {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            reply_to: None,
            text: text.into(),
            markup: None,
        }
    }

    pub fn reply_to(mut self, message_id: i32) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }
}

/// How a produced file is presented in the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Document,
    Photo,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub chat_id: i64,
    pub reply_to: Option<i32>,
    pub path: PathBuf,
    pub kind: UploadKind,
    pub caption: Option<String>,
}

/// Outbound side of the chat transport.
///
/// The router and runner only ever talk to the chat through this trait, so
/// tests can drive the whole flow with [`MockGateway`](crate::mocks::MockGateway).
pub trait MessagingGateway: Send + Sync + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn reply(
        &self,
        message: OutgoingText,
    ) -> impl Future<Output = Result<MessageRef, Self::Error>> + Send;

    /// Fetch the bytes behind `file_id` into `dest`. Returns the written path.
    fn download(
        &self,
        file_id: String,
        dest: PathBuf,
    ) -> impl Future<Output = Result<PathBuf, Self::Error>> + Send;

    fn delete(&self, message: MessageRef) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn upload(
        &self,
        file: OutgoingFile,
    ) -> impl Future<Output = Result<MessageRef, Self::Error>> + Send;
}
