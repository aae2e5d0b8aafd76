//! InMemoryPromoStore - 開発用・フォールバック用のストア
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で呼び出し単位のアトミック性を保証
//! - ロックを await 越しに保持しない（各メソッド内で完結）

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::table::PromoTable;
use crate::domain::{MessageRef, PromoId, PromoRecord, StoreError, Target};
use crate::ports::PromoStore;

/// InMemoryPromoStore はプロセス内だけのストア
///
/// 再起動でレコードは消える。DB/ファイルが設定されていないときの
/// フォールバックとして使う。
#[derive(Clone)]
pub struct InMemoryPromoStore {
    table: Arc<Mutex<PromoTable>>,
    /// 障害注入用。false の間は全操作が Unavailable を返す。
    available: Arc<AtomicBool>,
}

impl Default for InMemoryPromoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPromoStore {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(PromoTable::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        }
    }
}

#[async_trait]
impl PromoStore for InMemoryPromoStore {
    async fn save(&self, record: PromoRecord) -> Result<PromoId, StoreError> {
        self.check()?;
        let id = record.promo_id;
        self.table.lock().await.insert(record);
        Ok(id)
    }

    async fn get(&self, promo_id: &PromoId) -> Result<Option<PromoRecord>, StoreError> {
        self.check()?;
        Ok(self.table.lock().await.get(promo_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PromoRecord>, StoreError> {
        self.check()?;
        Ok(self.table.lock().await.sorted())
    }

    async fn delete(&self, target: &Target, message_ref: MessageRef) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.table.lock().await.remove(target, message_ref).is_some())
    }
}
