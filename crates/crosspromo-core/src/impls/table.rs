//! PromoTable - ストア実装が共有するインメモリ表
//!
//! promo_id 主キーと `(target, message_ref)` 自然キーの 2 つの索引を持つ。

use std::collections::HashMap;

use crate::domain::{MessageRef, PromoId, PromoRecord, Target};

#[derive(Debug, Clone, Default)]
pub(crate) struct PromoTable {
    /// All live records (single source of truth).
    records: HashMap<PromoId, PromoRecord>,

    /// Natural key index.
    by_key: HashMap<(Target, MessageRef), PromoId>,
}

impl PromoTable {
    pub(crate) fn from_records(records: impl IntoIterator<Item = PromoRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Insert, replacing any live record with the same natural key.
    pub(crate) fn insert(&mut self, record: PromoRecord) -> Option<PromoRecord> {
        let key = (record.target.clone(), record.message_ref);
        let replaced = self
            .by_key
            .insert(key, record.promo_id)
            .and_then(|old| self.records.remove(&old));
        self.records.insert(record.promo_id, record);
        replaced
    }

    pub(crate) fn get(&self, promo_id: &PromoId) -> Option<&PromoRecord> {
        self.records.get(promo_id)
    }

    pub(crate) fn remove(&mut self, target: &Target, message_ref: MessageRef) -> Option<PromoRecord> {
        let id = self.by_key.remove(&(target.clone(), message_ref))?;
        self.records.remove(&id)
    }

    /// Oldest first; ULIDs break ties between equal timestamps.
    pub(crate) fn sorted(&self) -> Vec<PromoRecord> {
        let mut all: Vec<PromoRecord> = self.records.values().cloned().collect();
        all.sort_by(|a, b| (a.created_at, a.promo_id).cmp(&(b.created_at, b.promo_id)));
        all
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use ulid::Ulid;

    fn record(target: &str, msg: i32, offset_secs: i64) -> PromoRecord {
        PromoRecord {
            promo_id: PromoId::from_ulid(Ulid::new()),
            target: target.parse().unwrap(),
            message_ref: MessageRef(msg),
            duration_seconds: 60,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn same_natural_key_replaces() {
        let mut table = PromoTable::default();
        let first = record("@a", 1, 0);
        let second = record("@a", 1, 5);
        assert!(table.insert(first.clone()).is_none());
        assert_eq!(table.insert(second.clone()), Some(first.clone()));
        assert_eq!(table.len(), 1);
        assert!(table.get(&first.promo_id).is_none());
        assert_eq!(table.get(&second.promo_id), Some(&second));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut table = PromoTable::default();
        let r = record("-100", 9, 0);
        table.insert(r.clone());
        assert_eq!(table.remove(&r.target, r.message_ref), Some(r.clone()));
        assert_eq!(table.remove(&r.target, r.message_ref), None);
    }

    #[test]
    fn sorted_is_oldest_first() {
        let table = PromoTable::from_records([record("@c", 3, 20), record("@a", 1, 0), record("@b", 2, 10)]);
        let order: Vec<i32> = table.sorted().iter().map(|r| r.message_ref.0).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
