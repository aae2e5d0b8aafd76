//! Transport port - メッセージ配信（Telegram など）
//!
//! 外部プラットフォームへの send / forward / delete / メンバー数取得。
//! 失敗は 1 呼び出し単位で `TransportError` として返す。

use async_trait::async_trait;

use crate::domain::{ButtonGrid, DeleteStatus, MessageBody, MessageRef, SourceRef, Target, TransportError};

/// Transport は配信先チャンネルへの操作を提供
///
/// # 設計原則
/// - delete は「もう存在しない」を `DeleteStatus::NotFound` で返す（エラーにしない）
/// - リトライはしない。フォールバックは Dispatcher 側の責務
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_content(
        &self,
        target: &Target,
        body: &MessageBody,
        buttons: Option<&ButtonGrid>,
    ) -> Result<MessageRef, TransportError>;

    async fn forward_content(&self, target: &Target, source: &SourceRef) -> Result<MessageRef, TransportError>;

    async fn delete_content(&self, target: &Target, message_ref: MessageRef) -> Result<DeleteStatus, TransportError>;

    async fn get_member_count(&self, channel: &Target) -> Result<u64, TransportError>;
}
