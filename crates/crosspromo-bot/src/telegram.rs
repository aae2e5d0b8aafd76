//! TelegramTransport - teloxide による Transport 実装
//!
//! - Target::Handle は `@name` のチャンネルユーザー名、Target::Id は数値 chat id
//! - 「削除対象のメッセージが無い」は DeleteStatus::NotFound
//! - ネットワーク系の失敗は Unreachable、それ以外は Rejected

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, Recipient};
use teloxide::{ApiError, RequestError};
use url::Url;

use crosspromo_core::domain::{
    ButtonGrid, DeleteStatus, MediaKind, MediaRef, MessageBody, MessageRef, SourceRef, Target, TransportError,
};
use crosspromo_core::ports::Transport;

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub fn recipient(target: &Target) -> Recipient {
    match target {
        Target::Id(id) => Recipient::Id(ChatId(*id)),
        Target::Handle(handle) => Recipient::ChannelUsername(format!("@{handle}")),
    }
}

fn map_error(err: RequestError) -> TransportError {
    match err {
        RequestError::Network(e) => TransportError::Unreachable(e.to_string()),
        RequestError::Io(e) => TransportError::Unreachable(e.to_string()),
        other => TransportError::Rejected(other.to_string()),
    }
}

fn keyboard(grid: &ButtonGrid) -> Result<InlineKeyboardMarkup, TransportError> {
    let mut rows = Vec::with_capacity(grid.len());
    for row in grid {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            let url = Url::parse(&button.url)
                .map_err(|e| TransportError::Rejected(format!("bad button url {:?}: {e}", button.url)))?;
            buttons.push(InlineKeyboardButton::url(button.text.clone(), url));
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

fn input_file(media: &MediaRef) -> Result<InputFile, TransportError> {
    match media {
        MediaRef::Url(raw) => Url::parse(raw)
            .map(InputFile::url)
            .map_err(|e| TransportError::Rejected(format!("bad media url {raw:?}: {e}"))),
        MediaRef::FileId(id) => Ok(InputFile::file_id(id.clone())),
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_content(
        &self,
        target: &Target,
        body: &MessageBody,
        buttons: Option<&ButtonGrid>,
    ) -> Result<MessageRef, TransportError> {
        let chat = recipient(target);
        let markup = buttons.map(keyboard).transpose()?;

        let sent = match body {
            MessageBody::Text(text) => {
                let mut req = self.bot.send_message(chat, text.clone());
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await
            }
            MessageBody::Media { kind, media, caption } => {
                let file = input_file(media)?;
                match kind {
                    MediaKind::Photo => {
                        let mut req = self.bot.send_photo(chat, file);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        if let Some(markup) = markup {
                            req = req.reply_markup(markup);
                        }
                        req.await
                    }
                    MediaKind::Video => {
                        let mut req = self.bot.send_video(chat, file);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        if let Some(markup) = markup {
                            req = req.reply_markup(markup);
                        }
                        req.await
                    }
                    MediaKind::Document => {
                        let mut req = self.bot.send_document(chat, file);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        if let Some(markup) = markup {
                            req = req.reply_markup(markup);
                        }
                        req.await
                    }
                }
            }
        };

        sent.map(|msg| MessageRef(msg.id.0)).map_err(map_error)
    }

    async fn forward_content(&self, target: &Target, source: &SourceRef) -> Result<MessageRef, TransportError> {
        self.bot
            .forward_message(recipient(target), recipient(&source.chat), MessageId(source.message.0))
            .await
            .map(|msg| MessageRef(msg.id.0))
            .map_err(map_error)
    }

    async fn delete_content(&self, target: &Target, message_ref: MessageRef) -> Result<DeleteStatus, TransportError> {
        match self
            .bot
            .delete_message(recipient(target), MessageId(message_ref.0))
            .await
        {
            Ok(_) => Ok(DeleteStatus::Deleted),
            Err(RequestError::Api(ApiError::MessageToDeleteNotFound)) => Ok(DeleteStatus::NotFound),
            Err(err) => Err(map_error(err)),
        }
    }

    async fn get_member_count(&self, channel: &Target) -> Result<u64, TransportError> {
        self.bot
            .get_chat_member_count(recipient(channel))
            .await
            .map(u64::from)
            .map_err(map_error)
    }
}
