//! Telegram-specific error handling
//!
//! Classifies teloxide errors so the gateway knows whether to wait and
//! repeat a request, repeat it in a migrated chat, or give up.

use std::time::Duration;

use teloxide::types::ChatId;
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

/// Result of handling an API error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// Retry after this duration
    Retry(Duration),
    /// Chat migrated to a new ID
    Migrated(ChatId),
    /// Permanent failure; do not retry
    Permanent(String),
    /// Non-permanent failure; worth one more attempt after a short pause
    Transient(String),
}

/// Pause before repeating a request that failed transiently
pub const TRANSIENT_BACKOFF: Duration = Duration::from_millis(500);

/// What the gateway does after a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAttempt {
    /// Sleep, then repeat in the same chat
    After(Duration),
    /// Repeat straight away in this chat
    InChat(ChatId),
    GiveUp,
}

impl ErrorOutcome {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn next_attempt(&self) -> NextAttempt {
        match self {
            Self::Retry(wait) => NextAttempt::After(*wait),
            Self::Migrated(chat) => NextAttempt::InChat(*chat),
            Self::Transient(_) => NextAttempt::After(TRANSIENT_BACKOFF),
            Self::Permanent(_) => NextAttempt::GiveUp,
        }
    }
}

/// Classify a `RequestError` raised by `operation`.
pub fn classify(operation: &str, err: &RequestError) -> ErrorOutcome {
    match err {
        // ── Flood control ────────────────────────────────────────────────────
        RequestError::RetryAfter(secs) => {
            let wait = Duration::from_secs(secs.duration().as_secs().max(1));
            warn!(operation, wait_secs = wait.as_secs(), "Flood control, retrying later");
            ErrorOutcome::Retry(wait)
        }

        // ── Chat migration ───────────────────────────────────────────────────
        RequestError::MigrateToChatId(new_id) => {
            warn!(operation, new_chat_id = new_id.0, "Chat migrated");
            ErrorOutcome::Migrated(*new_id)
        }

        // ── Network / I/O ────────────────────────────────────────────────────
        RequestError::Network(_) | RequestError::Io(_) => {
            debug!(operation, error = %err, "Transport error");
            ErrorOutcome::Transient(err.to_string())
        }

        RequestError::InvalidJson { raw, .. } => {
            let message = format!("Invalid JSON response: {}", raw);
            warn!(operation, "{}", message);
            ErrorOutcome::Transient(message)
        }

        // ── Telegram API errors ──────────────────────────────────────────────
        RequestError::Api(api_err) => classify_api(operation, api_err),
    }
}

fn classify_api(operation: &str, api_err: &ApiError) -> ErrorOutcome {
    let (permanent, message): (bool, String) = match api_err {
        // Bot status ──────────────────────────────────────────────────────────
        ApiError::BotBlocked => (true, "Bot was blocked by the user".into()),
        ApiError::BotKicked => (true, "Bot was kicked from the group".into()),
        ApiError::BotKickedFromSupergroup => (true, "Bot was kicked from the supergroup".into()),
        ApiError::InvalidToken => (true, "Bot token is invalid".into()),
        ApiError::CantInitiateConversation => {
            (true, "Can't initiate conversation with the user".into())
        }
        ApiError::CantTalkWithBots => (true, "Can't send messages to bots".into()),

        // Message operations ──────────────────────────────────────────────────
        ApiError::MessageToDeleteNotFound => (true, "Message to delete not found".into()),
        ApiError::MessageCantBeDeleted => (true, "Message can't be deleted".into()),
        ApiError::MessageToReplyNotFound => (true, "Message to reply to not found".into()),
        ApiError::MessageTextIsEmpty => (true, "Message text must not be empty".into()),
        ApiError::MessageIsTooLong => (true, "Message is too long (max 4096 characters)".into()),
        ApiError::TooMuchMessages => (false, "Too many messages sent to this chat".into()),

        // Chat / user ─────────────────────────────────────────────────────────
        ApiError::ChatNotFound => (true, "Chat not found".into()),
        ApiError::UserNotFound => (true, "User not found".into()),
        ApiError::GroupDeactivated => (true, "Group is deactivated".into()),
        ApiError::UserDeactivated => (true, "User is deactivated".into()),
        ApiError::NotEnoughRightsToPostMessages => {
            (true, "Not enough rights to post messages".into())
        }

        // Files ───────────────────────────────────────────────────────────────
        ApiError::WrongFileId => (true, "Wrong file ID".into()),
        ApiError::WrongFileIdOrUrl => (true, "Wrong file ID or URL".into()),
        ApiError::RequestEntityTooLarge => (true, "Request entity too large (file too big)".into()),

        // Catch-all ───────────────────────────────────────────────────────────
        ApiError::Unknown(raw) => (false, format!("Unknown Telegram API error: {}", raw)),
        _ => (false, format!("Unhandled Telegram API error: {}", api_err)),
    };

    if permanent {
        warn!(operation, "Permanent Telegram error: {}", message);
        ErrorOutcome::Permanent(message)
    } else {
        debug!(operation, "Transient Telegram error: {}", message);
        ErrorOutcome::Transient(message)
    }
}
