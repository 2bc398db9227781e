//! Owner identity for pending sessions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies whose pending file a session holds
///
/// Format: `tg-{chat_id}-{user_id}`
///
/// Examples:
/// - Private chat: `tg-123456789-123456789`
/// - User in a group: `tg--1001234567890-42`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OwnerId {
    chat_id: i64,
    user_id: i64,
}

impl OwnerId {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }

    /// Owner in a private chat, where chat id and user id coincide
    pub fn private(user_id: i64) -> Self {
        Self::new(user_id, user_id)
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tg-{}-{}", self.chat_id, self.user_id)
    }
}
