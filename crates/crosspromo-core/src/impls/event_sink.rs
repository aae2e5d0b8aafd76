//! EventSink 実装
//!
//! - NoopEventSink: デフォルト
//! - CollectingEventSink: テスト用（受け取ったイベントを保持）

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::PromoEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, event: PromoEvent) {
        tracing::trace!(event = event.name(), "event dropped (no sink)");
    }
}

#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<PromoEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<PromoEvent> {
        self.events.lock().await.clone()
    }

    /// Event names in emission order.
    pub async fn names(&self) -> Vec<&'static str> {
        self.events.lock().await.iter().map(PromoEvent::name).collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: PromoEvent) {
        self.events.lock().await.push(event);
    }
}
