//! Telegram implementation of the messaging gateway

use std::future::Future;
use std::path::PathBuf;

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    File, InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove, MessageId, ReplyMarkup,
    ReplyParameters,
};
use teloxide::{DownloadError, RequestError};
use tracing::{debug, info};

use convert_core::{Markup, MessageRef, MessagingGateway, OutgoingFile, OutgoingText, UploadKind};

use crate::errors::{classify, NextAttempt};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("telegram request failed: {0}")]
    Request(#[from] RequestError),

    #[error("file download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Run `call` against `chat`, repeating it once when the failure is
    /// worth another attempt. A migrated group is retried in its new chat.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        chat: ChatId,
        mut call: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut(ChatId) -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        match call(chat).await {
            Ok(value) => Ok(value),
            Err(err) => match classify(operation, &err).next_attempt() {
                NextAttempt::After(wait) => {
                    tokio::time::sleep(wait).await;
                    call(chat).await
                }
                NextAttempt::InChat(new_chat) => {
                    info!(operation, old_chat_id = chat.0, new_chat_id = new_chat.0, "Retrying in migrated chat");
                    call(new_chat).await
                }
                NextAttempt::GiveUp => Err(err),
            },
        }
    }

    async fn get_file(&self, file_id: &str) -> Result<File, RequestError> {
        match self.bot.get_file(file_id.to_string()).await {
            Ok(file) => Ok(file),
            Err(err) => match classify("get_file", &err).next_attempt() {
                NextAttempt::After(wait) => {
                    tokio::time::sleep(wait).await;
                    self.bot.get_file(file_id.to_string()).await
                }
                NextAttempt::InChat(_) | NextAttempt::GiveUp => Err(err),
            },
        }
    }
}

fn reply_parameters(reply_to: Option<i32>) -> Option<ReplyParameters> {
    reply_to.map(|id| ReplyParameters::new(MessageId(id)))
}

/// Core markup as a Telegram reply keyboard
pub fn to_reply_markup(markup: &Markup) -> ReplyMarkup {
    match markup {
        Markup::Keyboard { rows, placeholder } => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
                .collect();
            let mut keyboard = KeyboardMarkup::new(rows);
            keyboard.resize_keyboard = true;
            keyboard.one_time_keyboard = true;
            keyboard.selective = true;
            keyboard.input_field_placeholder = placeholder.clone();
            ReplyMarkup::Keyboard(keyboard)
        }
        Markup::RemoveKeyboard => {
            let mut remove = KeyboardRemove::new();
            remove.selective = true;
            ReplyMarkup::KeyboardRemove(remove)
        }
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef::new(msg.chat.id.0, msg.id.0)
}

impl MessagingGateway for TelegramGateway {
    type Error = GatewayError;

    async fn reply(&self, message: OutgoingText) -> Result<MessageRef, GatewayError> {
        let sent = self
            .with_retry("send_message", ChatId(message.chat_id), |chat| {
                let mut req = self.bot.send_message(chat, message.text.clone());
                req.reply_parameters = reply_parameters(message.reply_to);
                req.reply_markup = message.markup.as_ref().map(to_reply_markup);
                async move { req.await }
            })
            .await?;
        Ok(message_ref(&sent))
    }

    async fn download(&self, file_id: String, dest: PathBuf) -> Result<PathBuf, GatewayError> {
        let file = self.get_file(&file_id).await?;

        let mut out = tokio::fs::File::create(&dest).await?;
        self.bot.download_file(&file.path, &mut out).await?;
        debug!(file_id = %file_id, path = %dest.display(), "Downloaded file");
        Ok(dest)
    }

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError> {
        self.with_retry("delete_message", ChatId(message.chat_id), |chat| {
            let req = self.bot.delete_message(chat, MessageId(message.message_id));
            async move { req.await }
        })
        .await?;
        Ok(())
    }

    async fn upload(&self, file: OutgoingFile) -> Result<MessageRef, GatewayError> {
        let sent = self
            .with_retry("upload", ChatId(file.chat_id), |chat| {
                let input = InputFile::file(file.path.clone());
                let reply = reply_parameters(file.reply_to);
                let caption = file.caption.clone();
                let bot = self.bot.clone();
                let kind = file.kind;
                async move {
                    match kind {
                        UploadKind::Document => {
                            let mut req = bot.send_document(chat, input);
                            req.caption = caption;
                            req.reply_parameters = reply;
                            req.await
                        }
                        UploadKind::Photo => {
                            let mut req = bot.send_photo(chat, input);
                            req.caption = caption;
                            req.reply_parameters = reply;
                            req.await
                        }
                        UploadKind::Video => {
                            let mut req = bot.send_video(chat, input);
                            req.caption = caption;
                            req.reply_parameters = reply;
                            req.supports_streaming = Some(true);
                            req.await
                        }
                    }
                }
            })
            .await?;
        Ok(message_ref(&sent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_markup_is_one_time_and_selective() {
        let markup = Markup::Keyboard {
            rows: vec![
                vec!["PDF".to_string(), "ODT".to_string()],
                vec!["READ".to_string()],
            ],
            placeholder: "convert to".to_string(),
        };
        let json = serde_json::to_value(to_reply_markup(&markup)).unwrap();
        assert_eq!(json["keyboard"][0][1]["text"], "ODT");
        assert_eq!(json["keyboard"][1][0]["text"], "READ");
        assert_eq!(json["one_time_keyboard"], true);
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["selective"], true);
        assert_eq!(json["input_field_placeholder"], "convert to");
    }

    #[test]
    fn test_remove_keyboard_is_selective() {
        let json = serde_json::to_value(to_reply_markup(&Markup::RemoveKeyboard)).unwrap();
        assert_eq!(json["remove_keyboard"], true);
        assert_eq!(json["selective"], true);
    }

    #[test]
    fn test_reply_parameters_optional() {
        assert!(reply_parameters(None).is_none());
        assert_eq!(
            reply_parameters(Some(9)).map(|p| p.message_id),
            Some(MessageId(9))
        );
    }
}
