//! AdminNotifier - PromoEvent を管理者への DM に変換する EventSink
//!
//! 期限切れの自動削除だけを通知する（NOTIFY_ON_MANUAL_DELETION で切替）。
//! 送信は別タスクで行い、worker のサイクルを待たせない。
//! 送信失敗はログのみ。core の結果には影響しない。

use async_trait::async_trait;
use teloxide::prelude::*;

use crosspromo_core::domain::{AdminId, AdminList, PromoEvent};
use crosspromo_core::ports::EventSink;

use crate::render;

pub struct AdminNotifier {
    bot: Bot,
    admins: AdminList,
    notify_on_expiry: bool,
}

impl AdminNotifier {
    pub fn new(bot: Bot, admins: AdminList, notify_on_expiry: bool) -> Self {
        Self {
            bot,
            admins,
            notify_on_expiry,
        }
    }
}

#[async_trait]
impl EventSink for AdminNotifier {
    async fn emit(&self, event: PromoEvent) {
        let text = match &event {
            PromoEvent::Expired { record, .. } if self.notify_on_expiry => render::expiry_notice(record),
            _ => {
                tracing::trace!(event = event.name(), "event not forwarded to admins");
                return;
            }
        };

        let bot = self.bot.clone();
        let admins: Vec<AdminId> = self.admins.iter().collect();
        tokio::spawn(async move {
            for admin in admins {
                if let Err(err) = bot.send_message(ChatId(admin.0), text.clone()).await {
                    tracing::warn!(admin = admin.0, error = %err, "admin notification failed");
                }
            }
        });
    }
}
