//! EventSink port - イベント記録・通知の抽象化
//!
//! - NoopEventSink: 何もしない（デフォルト）
//! - bot 側: 管理者への通知

use async_trait::async_trait;

use crate::domain::PromoEvent;

/// EventSink はドメインイベントを受け取る
///
/// 失敗しても core の結果は変わらないので戻り値は持たない。
/// 実装側でログに残すこと。
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: PromoEvent);
}
