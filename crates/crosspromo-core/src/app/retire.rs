//! retire - 「配信先から削除して、ストアから消す」共通操作
//!
//! expiry worker と手動削除の両方がここを通る。
//!
//! # 不変条件
//! - transport の削除は先に試みるが、結果に関係なく purge まで必ず進む
//! - transport の「既に無い」は成功扱い
//! - purge が false なら別の actor が先に消している（レース。エラーではない）
//! - ストア障害だけが呼び出し元へ伝播する

use crate::domain::{DeleteStatus, PromoRecord, RetireOutcome, StoreError, TransportDeletion};
use crate::ports::{PromoStore, Transport};

pub async fn retire(
    store: &dyn PromoStore,
    transport: &dyn Transport,
    record: &PromoRecord,
) -> Result<RetireOutcome, StoreError> {
    let transport_result = match transport.delete_content(&record.target, record.message_ref).await {
        Ok(DeleteStatus::Deleted) => TransportDeletion::Deleted,
        Ok(DeleteStatus::NotFound) => {
            tracing::debug!(
                promo_id = %record.promo_id,
                channel = %record.target,
                message_ref = %record.message_ref,
                "message already gone"
            );
            TransportDeletion::AlreadyGone
        }
        Err(err) => {
            tracing::warn!(
                promo_id = %record.promo_id,
                channel = %record.target,
                message_ref = %record.message_ref,
                error = %err,
                "transport delete failed; purging record anyway"
            );
            TransportDeletion::Failed(err.to_string())
        }
    };

    let purged = store.delete(&record.target, record.message_ref).await?;
    if !purged {
        tracing::debug!(promo_id = %record.promo_id, "record already purged by another actor");
    }

    Ok(RetireOutcome {
        transport: transport_result,
        purged,
    })
}
