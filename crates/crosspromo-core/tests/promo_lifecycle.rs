//! dispatch → expire / manual delete → list の通しシナリオ

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use crosspromo_core::app::{AutoDeleteConfig, Campaign, ExpiryWorker, PromoApp, PromoAppBuilder};
use crosspromo_core::domain::{
    CampaignTarget, ManualDeleteOutcome, PromoContent, PromoEvent, PromoTemplate, Target, TransportDeletion,
};
use crosspromo_core::impls::{
    CollectingEventSink, DeleteBehavior, InMemoryPromoStore, JsonFilePromoStore, RecordingTransport, SendFailure,
};
use crosspromo_core::ports::{FixedClock, PromoStore};

struct Harness {
    store: Arc<InMemoryPromoStore>,
    transport: Arc<RecordingTransport>,
    clock: Arc<FixedClock>,
    events: Arc<CollectingEventSink>,
    app: PromoApp,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryPromoStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()));
    let events = Arc::new(CollectingEventSink::new());
    let app = PromoAppBuilder::new()
        .store(store.clone())
        .transport(transport.clone())
        .clock(clock.clone())
        .events(events.clone())
        .auto_delete(AutoDeleteConfig {
            enabled: true,
            check_interval: StdDuration::from_secs(60),
            error_backoff: StdDuration::from_secs(60),
        })
        .build()
        .unwrap();
    Harness {
        store,
        transport,
        clock,
        events,
        app,
    }
}

impl Harness {
    fn worker(&self) -> ExpiryWorker {
        ExpiryWorker::new(
            self.store.clone(),
            self.transport.clone(),
            self.clock.clone(),
            self.events.clone(),
            AutoDeleteConfig::default(),
        )
    }
}

fn channels(names: &[&str]) -> Vec<CampaignTarget> {
    names
        .iter()
        .map(|n| CampaignTarget::with_title(Target::Handle((*n).into()), n.to_uppercase()))
        .collect()
}

fn template_campaign(names: &[&str], duration_seconds: u64) -> Campaign {
    let targets = channels(names);
    let template = PromoTemplate::Standard;
    Campaign {
        content: PromoContent::text(template.render_text(&targets, None, "PromoFather")),
        buttons: template.render_buttons(&targets, Some("promofather_bot")),
        targets,
        duration_seconds,
    }
}

#[tokio::test]
async fn one_bad_target_in_five_yields_four_records() {
    let h = harness();
    h.transport.fail_sends_to(Target::Handle("ch3".into()), SendFailure::Everything);

    let summary = h
        .app
        .dispatcher
        .dispatch(&template_campaign(&["ch1", "ch2", "ch3", "ch4", "ch5"], 3600))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 4);
    assert_eq!(summary.total_count, 5);
    assert_eq!(summary.failed, vec!["CH3".to_string()]);
    assert!(summary.render("Promo").contains("4/5"));

    let records = h.store.list_all().await.unwrap();
    assert_eq!(records.len(), 4);
    for delivered in h.transport.delivered() {
        let matching = records
            .iter()
            .filter(|r| r.target == delivered.target && r.message_ref == delivered.message_ref)
            .count();
        assert_eq!(matching, 1);
    }
}

#[tokio::test]
async fn record_expires_between_thirty_and_sixty_one_seconds() {
    let h = harness();
    h.app
        .dispatcher
        .dispatch(&template_campaign(&["solo"], 60))
        .await
        .unwrap();
    let record = h.store.list_all().await.unwrap().remove(0);
    assert_eq!(record.expires_at(), record.created_at + Duration::seconds(60));

    let worker = h.worker();

    h.clock.advance(Duration::seconds(30));
    let report = worker.run_cycle().await.unwrap();
    assert_eq!(report.expired, 0);
    assert!(h.transport.delete_calls().is_empty());
    assert_eq!(h.store.len().await, 1);

    h.clock.advance(Duration::seconds(31));
    let report = worker.run_cycle().await.unwrap();
    assert_eq!(report.purged, 1);
    assert_eq!(h.transport.delete_calls(), vec![(record.target.clone(), record.message_ref)]);
    assert!(h.store.list_all().await.unwrap().is_empty());

    let page = h.app.listing.page(0).await.unwrap();
    assert_eq!(page.total, 0);

    let events = h.events.events().await;
    assert!(matches!(events.last(), Some(PromoEvent::Expired { record: r, .. }) if r.promo_id == record.promo_id));
}

#[tokio::test]
async fn every_delete_failing_still_purges_all() {
    let h = harness();
    h.app
        .dispatcher
        .dispatch(&template_campaign(&["a", "b", "c", "d", "e", "f", "g"], 10))
        .await
        .unwrap();
    h.transport.set_default_delete_behavior(DeleteBehavior::Fail);
    h.clock.advance(Duration::seconds(10));

    let report = h.worker().run_cycle().await.unwrap();
    assert_eq!(report.expired, 7);
    assert_eq!(report.transport_failures, 7);
    assert_eq!(report.purged, 7);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn manual_delete_twice_reports_not_found() {
    let h = harness();
    let summary = h
        .app
        .dispatcher
        .dispatch(&template_campaign(&["only"], 3600))
        .await
        .unwrap();
    let promo_id = summary.last_promo_id.unwrap();

    let first = h.app.manual_delete.delete(&promo_id, None).await.unwrap();
    assert!(matches!(
        first,
        ManualDeleteOutcome::Deleted { transport: TransportDeletion::Deleted, .. }
    ));
    let second = h.app.manual_delete.delete(&promo_id, None).await.unwrap();
    assert_eq!(second, ManualDeleteOutcome::NotFound { promo_id });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_and_manual_delete_race_safely() {
    let h = harness();
    let summary = h
        .app
        .dispatcher
        .dispatch(&template_campaign(&["race"], 60))
        .await
        .unwrap();
    let promo_id = summary.last_promo_id.unwrap();
    let record = h.store.get(&promo_id).await.unwrap().unwrap();

    h.clock.advance(Duration::seconds(61));
    h.transport.set_delete_delay(StdDuration::from_millis(20));

    let worker = h.worker();
    let (cycle, manual) = tokio::join!(worker.run_cycle(), h.app.manual_delete.delete(&promo_id, None));
    let cycle = cycle.unwrap();
    let manual = manual.unwrap();

    // exactly one actor purged the record
    let manual_won = matches!(manual, ManualDeleteOutcome::Deleted { .. });
    assert_eq!(cycle.purged + usize::from(manual_won), 1);

    let left = h.store.list_all().await.unwrap();
    assert!(
        !left
            .iter()
            .any(|r| r.target == record.target && r.message_ref == record.message_ref)
    );
}

#[tokio::test]
async fn empty_store_cycle_is_a_noop() {
    let h = harness();
    let report = h.worker().run_cycle().await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.purged, 0);
}

#[tokio::test]
async fn json_store_keeps_expiry_intent_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("promos.json");
    let transport = Arc::new(RecordingTransport::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()));

    {
        let store = Arc::new(JsonFilePromoStore::open(&path).await.unwrap());
        let app = PromoAppBuilder::new()
            .store(store)
            .transport(transport.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        app.dispatcher
            .dispatch(&template_campaign(&["durable1", "durable2"], 120))
            .await
            .unwrap();
    }

    let store = Arc::new(JsonFilePromoStore::open(&path).await.unwrap());
    assert_eq!(store.list_all().await.unwrap().len(), 2);

    clock.advance(Duration::seconds(120));
    let worker = ExpiryWorker::new(
        store.clone(),
        transport.clone(),
        clock.clone(),
        Arc::new(CollectingEventSink::new()),
        AutoDeleteConfig::default(),
    );
    assert_eq!(worker.run_cycle().await.unwrap().purged, 2);
    assert_eq!(transport.live_messages(), 0);

    let reopened = JsonFilePromoStore::open(&path).await.unwrap();
    assert!(reopened.list_all().await.unwrap().is_empty());
}
