//! PromoStore port - 販促レコードの正本（source of truth）
//!
//! # 実装
//! - InMemoryPromoStore（開発用・DB 未設定時のフォールバック）
//! - JsonFilePromoStore（再起動をまたいで expiry 情報を保持）

use async_trait::async_trait;

use crate::domain::{MessageRef, PromoId, PromoRecord, StoreError, Target};

/// PromoStore は promos テーブルの CRUD
///
/// # 設計原則
/// - 呼び出し単位でアトミック（worker と手動削除が同時に触っても壊れない）
/// - `delete` は存在しないキーに対して `Ok(false)` を返す（エラーではない）
/// - `(target, message_ref)` は生存レコード間で一意。同じキーの save は置き換え
#[async_trait]
pub trait PromoStore: Send + Sync {
    async fn save(&self, record: PromoRecord) -> Result<PromoId, StoreError>;

    async fn get(&self, promo_id: &PromoId) -> Result<Option<PromoRecord>, StoreError>;

    /// All live records, oldest first.
    async fn list_all(&self) -> Result<Vec<PromoRecord>, StoreError>;

    /// Returns true when a record was removed by this call.
    async fn delete(&self, target: &Target, message_ref: MessageRef) -> Result<bool, StoreError>;
}
