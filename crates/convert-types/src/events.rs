//! Inbound events handed to the router by the transport loop

use serde::{Deserialize, Serialize};

use crate::owner::OwnerId;
use crate::payload::{PayloadRef, PayloadSource};

/// Commands the router handles directly
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BotCommand {
    Start,
    Help,
    Cancel,
    /// `/rename <new name>`; the name is optional so a bare `/rename` can be answered with usage
    Rename { name: Option<String> },
    Make,
}

impl BotCommand {
    /// Parse `/command[@bot] [args]`.
    ///
    /// Returns `None` for anything that is not one of the known commands, so
    /// unknown slash-text flows through as plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "cancel" => Some(Self::Cancel),
            "make" => Some(Self::Make),
            "rename" => Some(Self::Rename {
                name: (!args.is_empty()).then(|| args.to_string()),
            }),
            _ => None,
        }
    }
}

/// What an inbound message carried
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Command { command: BotCommand },
    Media { source: PayloadSource },
    Text { text: String },
}

/// One inbound message, already stripped of transport types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundEvent {
    pub owner: OwnerId,
    pub chat_id: i64,
    pub message_id: i32,
    /// Private (one-to-one) chat with the bot
    pub is_private: bool,
    /// Display name of the sender, used in greetings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub payload: EventPayload,
}

impl InboundEvent {
    /// Reference to this message as a session payload
    pub fn payload_ref(&self, source: PayloadSource) -> PayloadRef {
        PayloadRef::new(self.chat_id, self.message_id, source)
    }
}
