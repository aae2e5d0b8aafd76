//! PromoAppBuilder - ports のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: store / transport が無ければ build() で落とす
//! - Clock / IdGenerator / EventSink は省略時に本番用デフォルトを使う

use std::sync::Arc;

use crate::app::config::AutoDeleteConfig;
use crate::app::dispatcher::PromoDispatcher;
use crate::app::expiry_worker::{ExpiryWorkerHandle, start_reconciliation};
use crate::app::factory::PromoFactory;
use crate::app::listing::PromoListing;
use crate::app::manual_delete::ManualDelete;
use crate::app::sessions::CampaignSessions;
use crate::impls::NoopEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, PromoStore, SystemClock, Transport, UlidGenerator};

/// PromoAppBuilder は PromoApp を構築
///
/// # 使用例
/// ```ignore
/// let app = PromoAppBuilder::new()
///     .store(Arc::new(InMemoryPromoStore::new()))
///     .transport(Arc::new(RecordingTransport::new()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct PromoAppBuilder {
    store: Option<Arc<dyn PromoStore>>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
    auto_delete: AutoDeleteConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no promo store configured")]
    MissingStore,

    #[error("no transport configured")]
    MissingTransport,
}

impl PromoAppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn PromoStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn auto_delete(mut self, config: AutoDeleteConfig) -> Self {
        self.auto_delete = config;
        self
    }

    pub fn build(self) -> Result<PromoApp, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids: Arc<dyn IdGenerator> = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let events: Arc<dyn EventSink> = self.events.unwrap_or_else(|| Arc::new(NoopEventSink));

        let factory = PromoFactory::new(ids, clock.clone());
        Ok(PromoApp {
            dispatcher: PromoDispatcher::new(store.clone(), transport.clone(), factory, events.clone()),
            manual_delete: ManualDelete::new(store.clone(), transport.clone(), events.clone()),
            listing: PromoListing::new(store.clone(), clock.clone()),
            store,
            transport,
            clock,
            events,
            auto_delete: self.auto_delete,
        })
    }
}

/// PromoApp はホスト（bot）に公開する操作の束
pub struct PromoApp {
    pub dispatcher: PromoDispatcher,
    pub manual_delete: ManualDelete,
    pub listing: PromoListing,
    store: Arc<dyn PromoStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    auto_delete: AutoDeleteConfig,
}

impl PromoApp {
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn sessions(&self, ttl: chrono::Duration) -> CampaignSessions {
        CampaignSessions::new(self.clock.clone(), ttl)
    }

    /// Start the expiry worker with the configured auto-delete settings.
    pub fn start_reconciliation(&self) -> Option<ExpiryWorkerHandle> {
        start_reconciliation(
            self.store.clone(),
            self.transport.clone(),
            self.clock.clone(),
            self.events.clone(),
            self.auto_delete,
        )
    }
}
