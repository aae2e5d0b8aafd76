//! PromoListing - 有効な販促の一覧・詳細（読み取り専用）

use std::sync::Arc;

use crate::domain::{PromoId, PromoPage, PromoView, StoreError};
use crate::ports::{Clock, PromoStore};

pub const PAGE_SIZE: usize = 5;

/// Counters shown by `/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromoStats {
    pub live: usize,
    /// Past their expiry instant but not yet picked up by the worker.
    pub awaiting_expiry: usize,
}

pub struct PromoListing {
    store: Arc<dyn PromoStore>,
    clock: Arc<dyn Clock>,
}

impl PromoListing {
    pub fn new(store: Arc<dyn PromoStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Zero-based page of records, oldest first.
    pub async fn page(&self, page: usize) -> Result<PromoPage, StoreError> {
        let records = self.store.list_all().await?;
        let now = self.clock.now();
        let total = records.len();
        let total_pages = total.div_ceil(PAGE_SIZE);
        let items = records
            .into_iter()
            .skip(page.saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .map(|record| PromoView::at(record, now))
            .collect();
        Ok(PromoPage {
            items,
            page,
            total_pages,
            total,
        })
    }

    pub async fn details(&self, promo_id: &PromoId) -> Result<Option<PromoView>, StoreError> {
        let record = self.store.get(promo_id).await?;
        Ok(record.map(|r| PromoView::at(r, self.clock.now())))
    }

    pub async fn stats(&self) -> Result<PromoStats, StoreError> {
        let now = self.clock.now();
        let records = self.store.list_all().await?;
        Ok(PromoStats {
            live: records.len(),
            awaiting_expiry: records.iter().filter(|r| r.is_expired(now)).count(),
        })
    }
}
