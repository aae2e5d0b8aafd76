//! Events - ドメインイベント
//!
//! EventSink へ送られる。通知の失敗は core の結果に影響しない。

use chrono::{DateTime, Utc};

use super::campaign::AdminId;
use super::ids::PromoId;
use super::promo::PromoRecord;

/// PromoEvent は販促ライフサイクルで発生したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoEvent {
    /// A campaign finished fanning out.
    Dispatched {
        success_count: usize,
        total_count: usize,
        last_promo_id: Option<PromoId>,
    },
    /// The expiry worker retired a record.
    Expired {
        record: PromoRecord,
        expired_at: DateTime<Utc>,
    },
    /// An administrator deleted a record by id.
    ManuallyDeleted {
        record: PromoRecord,
        by: Option<AdminId>,
    },
}

impl PromoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PromoEvent::Dispatched { .. } => "dispatched",
            PromoEvent::Expired { .. } => "expired",
            PromoEvent::ManuallyDeleted { .. } => "manually_deleted",
        }
    }
}
