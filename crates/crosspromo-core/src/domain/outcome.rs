//! Outcome - 各操作の構造化された結果
//!
//! 表示層（bot）はここから文言を組み立てる。core は文言を持たない方針だが、
//! 配信サマリーだけは管理者向けの定型文を `render()` で提供する。

use chrono::{DateTime, Utc};

use super::ids::PromoId;
use super::promo::{MessageRef, PromoRecord, Target};

/// Failed target names shown inline before collapsing into "and N more".
pub const FAILED_NAMES_SHOWN: usize = 3;

/// Result of fanning one campaign out to its targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub success_count: usize,
    pub total_count: usize,
    pub failed: Vec<String>,
    pub created: Vec<PromoId>,
    pub last_promo_id: Option<PromoId>,
    pub duration_seconds: u64,
}

impl DispatchSummary {
    pub fn all_failed(&self) -> bool {
        self.total_count > 0 && self.success_count == 0
    }

    /// "a, b, c and 2 more..." style list, or None when nothing failed.
    pub fn failed_line(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let shown = self
            .failed
            .iter()
            .take(FAILED_NAMES_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let hidden = self.failed.len().saturating_sub(FAILED_NAMES_SHOWN);
        if hidden > 0 {
            Some(format!("{shown} and {hidden} more..."))
        } else {
            Some(shown)
        }
    }

    pub fn render(&self, heading: &str) -> String {
        let mut text = format!(
            "✅ {heading} posted in {}/{} channels!\n⏰ Auto-delete after {}.\n",
            self.success_count,
            self.total_count,
            humanize_seconds(self.duration_seconds),
        );
        if let Some(id) = &self.last_promo_id {
            text.push_str(&format!("📋 Promo ID: {id}\n"));
        }
        if let Some(failed) = self.failed_line() {
            text.push_str(&format!("\n❌ Failed: {failed}"));
        }
        text
    }
}

/// What the transport said when asked to delete a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    /// Message already gone; treated as success.
    NotFound,
}

/// Transport side of a retire operation after errors have been swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDeletion {
    Deleted,
    AlreadyGone,
    Failed(String),
}

/// Result of the shared delete-then-purge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetireOutcome {
    pub transport: TransportDeletion,
    /// False when another actor purged the record first.
    pub purged: bool,
}

/// Result of an administrator deleting one promo by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualDeleteOutcome {
    Deleted {
        promo_id: PromoId,
        target: Target,
        message_ref: MessageRef,
        transport: TransportDeletion,
    },
    /// Unknown id, or already removed (by the expiry worker or an earlier request).
    NotFound { promo_id: PromoId },
}

/// Per-cycle counters of the expiry worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned: usize,
    pub expired: usize,
    pub purged: usize,
    pub transport_failures: usize,
    pub store_failures: usize,
}

/// Read model of one live record at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoView {
    pub record: PromoRecord,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub expired: bool,
}

impl PromoView {
    pub fn at(record: PromoRecord, now: DateTime<Utc>) -> Self {
        let expires_at = record.expires_at();
        let remaining_seconds = record.remaining(now).num_seconds();
        let expired = record.is_expired(now);
        Self {
            record,
            expires_at,
            remaining_seconds,
            expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoPage {
    pub items: Vec<PromoView>,
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl PromoPage {
    pub fn has_previous(&self) -> bool {
        self.page > 0 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// "1 hour", "90 minutes", "2 days" style rendering for durations.
pub fn humanize_seconds(seconds: u64) -> String {
    fn unit(n: u64, singular: &str) -> String {
        if n == 1 {
            format!("1 {singular}")
        } else {
            format!("{n} {singular}s")
        }
    }
    match seconds {
        s if s >= 86_400 && s % 86_400 == 0 => unit(s / 86_400, "day"),
        s if s >= 3_600 && s % 3_600 == 0 => unit(s / 3_600, "hour"),
        s if s >= 60 && s % 60 == 0 => unit(s / 60, "minute"),
        s => unit(s, "second"),
    }
}
