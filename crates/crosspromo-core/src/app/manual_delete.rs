//! ManualDelete - 管理者による promo_id 指定の削除
//!
//! expiry worker と同じ retire() を同期的に呼ぶだけ。
//! 見つからない / 既に消えている場合は NotFound（エラーではない）。

use std::sync::Arc;

use crate::app::retire::retire;
use crate::domain::{AdminId, ManualDeleteOutcome, PromoError, PromoEvent, PromoId};
use crate::ports::{EventSink, PromoStore, Transport};

pub struct ManualDelete {
    store: Arc<dyn PromoStore>,
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
}

impl ManualDelete {
    pub fn new(store: Arc<dyn PromoStore>, transport: Arc<dyn Transport>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            transport,
            events,
        }
    }

    pub async fn delete(&self, promo_id: &PromoId, by: Option<AdminId>) -> Result<ManualDeleteOutcome, PromoError> {
        let Some(record) = self.store.get(promo_id).await? else {
            tracing::debug!(%promo_id, "manual delete: unknown promo");
            return Ok(ManualDeleteOutcome::NotFound { promo_id: *promo_id });
        };

        let outcome = retire(self.store.as_ref(), self.transport.as_ref(), &record).await?;
        if !outcome.purged {
            // lost the race against the worker (or another admin)
            return Ok(ManualDeleteOutcome::NotFound { promo_id: *promo_id });
        }

        tracing::info!(
            %promo_id,
            channel = %record.target,
            message_ref = %record.message_ref,
            admin = by.map(|a| a.0),
            "promo deleted manually"
        );
        let result = ManualDeleteOutcome::Deleted {
            promo_id: record.promo_id,
            target: record.target.clone(),
            message_ref: record.message_ref,
            transport: outcome.transport,
        };
        self.events.emit(PromoEvent::ManuallyDeleted { record, by }).await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageBody, PromoRecord, StoreError, Target, TransportDeletion};
    use crate::impls::{CollectingEventSink, DeleteBehavior, InMemoryPromoStore, RecordingTransport};
    use chrono::Utc;
    use ulid::Ulid;

    async fn setup() -> (Arc<InMemoryPromoStore>, Arc<RecordingTransport>, Arc<CollectingEventSink>, PromoRecord) {
        let store = Arc::new(InMemoryPromoStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let events = Arc::new(CollectingEventSink::new());
        let target = Target::Id(-1001);
        let message_ref = transport
            .send_content(&target, &MessageBody::Text("x".into()), None)
            .await
            .unwrap();
        let record = PromoRecord {
            promo_id: PromoId::from_ulid(Ulid::new()),
            target,
            message_ref,
            duration_seconds: 86_400,
            created_at: Utc::now(),
        };
        store.save(record.clone()).await.unwrap();
        (store, transport, events, record)
    }

    #[tokio::test]
    async fn delete_twice_is_not_found_second_time() {
        let (store, transport, events, record) = setup().await;
        let manual = ManualDelete::new(store.clone(), transport.clone(), events.clone());

        let first = manual.delete(&record.promo_id, Some(AdminId(7))).await.unwrap();
        assert_eq!(
            first,
            ManualDeleteOutcome::Deleted {
                promo_id: record.promo_id,
                target: record.target.clone(),
                message_ref: record.message_ref,
                transport: TransportDeletion::Deleted,
            }
        );

        let second = manual.delete(&record.promo_id, Some(AdminId(7))).await.unwrap();
        assert_eq!(second, ManualDeleteOutcome::NotFound { promo_id: record.promo_id });
        assert_eq!(events.names().await, vec!["manually_deleted"]);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_but_record_purged() {
        let (store, transport, events, record) = setup().await;
        transport.set_default_delete_behavior(DeleteBehavior::Fail);
        let manual = ManualDelete::new(store.clone(), transport, events);

        let outcome = manual.delete(&record.promo_id, None).await.unwrap();
        assert!(matches!(
            outcome,
            ManualDeleteOutcome::Deleted { transport: TransportDeletion::Failed(_), .. }
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn store_outage_is_an_error() {
        let (store, transport, events, record) = setup().await;
        store.set_available(false);
        let manual = ManualDelete::new(store, transport, events);
        let err = manual.delete(&record.promo_id, None).await.unwrap_err();
        assert!(matches!(err, PromoError::Store(StoreError::Unavailable(_))));
    }
}
