//! ExpiryWorker - 期限切れ販促の回収ループ
//!
//! # フロー（1 サイクル）
//! 1. PromoStore::list_all() で全件取得
//! 2. is_expired(now) のものだけ retire（delete → purge）
//! 3. check_interval だけ眠って繰り返す
//!
//! # 障害時の方針
//! - 1 件の transport 失敗はログして次のレコードへ
//! - ストア障害はサイクルを打ち切り、error_backoff 眠ってからやり直す
//! - ループ自体は shutdown シグナル以外では終わらない

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::config::AutoDeleteConfig;
use crate::app::retire::retire;
use crate::domain::{CycleReport, PromoEvent, StoreError, TransportDeletion};
use crate::ports::{Clock, EventSink, PromoStore, Transport};

pub struct ExpiryWorker {
    store: Arc<dyn PromoStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: AutoDeleteConfig,
}

impl ExpiryWorker {
    pub fn new(
        store: Arc<dyn PromoStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        config: AutoDeleteConfig,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            events,
            config,
        }
    }

    /// One full scan. Only a failed `list_all` is returned as an error;
    /// per-record failures are counted in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        self.cycle(None).await
    }

    async fn cycle(&self, shutdown: Option<&watch::Receiver<bool>>) -> Result<CycleReport, StoreError> {
        let records = self.store.list_all().await?;
        let mut report = CycleReport {
            scanned: records.len(),
            ..CycleReport::default()
        };

        for record in records {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                tracing::debug!("shutdown requested mid-cycle");
                break;
            }

            let now = self.clock.now();
            if !record.is_expired(now) {
                continue;
            }
            report.expired += 1;

            let outcome = match retire(self.store.as_ref(), self.transport.as_ref(), &record).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(promo_id = %record.promo_id, error = %err, "failed to purge expired promo");
                    report.store_failures += 1;
                    continue;
                }
            };
            if matches!(outcome.transport, TransportDeletion::Failed(_)) {
                report.transport_failures += 1;
            }
            if outcome.purged {
                report.purged += 1;
                tracing::info!(
                    promo_id = %record.promo_id,
                    channel = %record.target,
                    message_ref = %record.message_ref,
                    "expired promo removed"
                );
                self.events
                    .emit(PromoEvent::Expired {
                        record,
                        expired_at: now,
                    })
                    .await;
            }
        }

        Ok(report)
    }

    /// Spawn the reconciliation loop on the current runtime.
    pub fn spawn(self) -> ExpiryWorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        ExpiryWorkerHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.config.check_interval.as_secs(),
            "expiry worker started"
        );
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let pause = match self.cycle(Some(&shutdown_rx)).await {
                Ok(report) if report.store_failures > 0 => {
                    tracing::warn!(?report, "expiry cycle hit store failures; backing off");
                    self.config.error_backoff
                }
                Ok(report) => {
                    tracing::debug!(?report, "expiry cycle complete");
                    self.config.check_interval
                }
                Err(err) => {
                    tracing::error!(error = %err, "expiry cycle failed; backing off");
                    self.config.error_backoff
                }
            };

            if !sleep_or_shutdown(&mut shutdown_rx, pause).await {
                break;
            }
        }
        tracing::info!("expiry worker stopped");
    }
}

/// Returns false when the loop should stop.
async fn sleep_or_shutdown(shutdown_rx: &mut watch::Receiver<bool>, pause: Duration) -> bool {
    tokio::select! {
        changed = shutdown_rx.changed() => changed.is_ok() && !*shutdown_rx.borrow(),
        _ = tokio::time::sleep(pause) => true,
    }
}

/// Handle to a running expiry worker.
/// - `shutdown_tx` を drop してもワーカーは止まる
/// - `shutdown_and_join()` で現在のレコード処理を終えてから停止する
pub struct ExpiryWorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ExpiryWorkerHandle {
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(err) = self.join.await {
            tracing::error!(error = %err, "expiry worker task panicked");
        }
    }
}

/// Host entry point: start the worker unless auto-delete is disabled.
pub fn start_reconciliation(
    store: Arc<dyn PromoStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: AutoDeleteConfig,
) -> Option<ExpiryWorkerHandle> {
    if !config.enabled {
        tracing::info!("auto-delete disabled; expiry worker not started");
        return None;
    }
    Some(ExpiryWorker::new(store, transport, clock, events, config).spawn())
}
