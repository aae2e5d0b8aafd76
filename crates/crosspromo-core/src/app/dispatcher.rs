//! PromoDispatcher - 1 キャンペーンを各配信先へ展開する
//!
//! # フロー（配信先ごとに独立）
//! 1. delivery_plan() を先頭から試す（メディア → テキスト など）
//! 2. 最初に成功した message_ref で PromoRecord を即座に保存
//! 3. 全モード失敗なら failed に名前を積んで次の配信先へ
//!
//! 1 件の失敗でバッチは止まらない。止まるのはストア障害のときだけで、
//! その場合も途中までの DispatchSummary を PromoError::Interrupted で返す。
//! 再実行は新しい独立したバッチになる（重複排除はしない）。

use std::sync::Arc;

use crate::app::factory::PromoFactory;
use crate::domain::{
    ButtonGrid, CampaignTarget, DeliveryStep, DispatchSummary, MessageRef, PromoContent, PromoError, PromoEvent,
    Target, TransportError,
};
use crate::ports::{EventSink, PromoStore, Transport};

/// One campaign: same content and lifetime for every target.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub targets: Vec<CampaignTarget>,
    pub content: PromoContent,
    pub buttons: Option<ButtonGrid>,
    pub duration_seconds: u64,
}

pub struct PromoDispatcher {
    store: Arc<dyn PromoStore>,
    transport: Arc<dyn Transport>,
    factory: PromoFactory,
    events: Arc<dyn EventSink>,
}

impl PromoDispatcher {
    pub fn new(
        store: Arc<dyn PromoStore>,
        transport: Arc<dyn Transport>,
        factory: PromoFactory,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            transport,
            factory,
            events,
        }
    }

    pub async fn dispatch(&self, campaign: &Campaign) -> Result<DispatchSummary, PromoError> {
        if campaign.targets.is_empty() {
            return Err(PromoError::NoTargets);
        }

        let plan = campaign.content.delivery_plan();
        let mut summary = DispatchSummary {
            total_count: campaign.targets.len(),
            duration_seconds: campaign.duration_seconds,
            ..DispatchSummary::default()
        };

        for (index, channel) in campaign.targets.iter().enumerate() {
            let message_ref = match self.deliver(&channel.target, &plan, campaign.buttons.as_ref()).await {
                Ok(message_ref) => message_ref,
                Err(err) => {
                    tracing::warn!(channel = %channel.target, error = %err, "promo delivery failed");
                    summary.failed.push(channel.display_name());
                    continue;
                }
            };

            let record = self
                .factory
                .build(channel.target.clone(), message_ref, campaign.duration_seconds);
            let promo_id = record.promo_id;
            if let Err(err) = self.store.save(record).await {
                tracing::error!(channel = %channel.target, %message_ref, error = %err, "failed to persist promo");
                self.discard_orphan(&channel.target, message_ref).await;
                // this target and every unattempted one count as failed
                summary
                    .failed
                    .extend(campaign.targets[index..].iter().map(CampaignTarget::display_name));
                self.emit_dispatched(&summary).await;
                return Err(PromoError::Interrupted {
                    summary: Box::new(summary),
                    source: err,
                });
            }

            tracing::info!(%promo_id, channel = %channel.target, %message_ref, "promo posted");
            summary.success_count += 1;
            summary.created.push(promo_id);
            summary.last_promo_id = Some(promo_id);
        }

        tracing::info!(
            success = summary.success_count,
            total = summary.total_count,
            "campaign dispatched"
        );
        self.emit_dispatched(&summary).await;
        Ok(summary)
    }

    async fn emit_dispatched(&self, summary: &DispatchSummary) {
        self.events
            .emit(PromoEvent::Dispatched {
                success_count: summary.success_count,
                total_count: summary.total_count,
                last_promo_id: summary.last_promo_id,
            })
            .await;
    }

    /// Try each step in order; the last step's error wins.
    async fn deliver(
        &self,
        target: &Target,
        plan: &[DeliveryStep],
        buttons: Option<&ButtonGrid>,
    ) -> Result<MessageRef, TransportError> {
        let mut last_error = TransportError::Rejected("empty delivery plan".into());
        for (attempt, step) in plan.iter().enumerate() {
            let result = match step {
                DeliveryStep::Send { body, with_buttons } => {
                    let buttons = if *with_buttons { buttons } else { None };
                    self.transport.send_content(target, body, buttons).await
                }
                DeliveryStep::Forward(source) => self.transport.forward_content(target, source).await,
            };
            match result {
                Ok(message_ref) => return Ok(message_ref),
                Err(err) => {
                    if attempt + 1 < plan.len() {
                        tracing::debug!(channel = %target, error = %err, "delivery attempt failed, falling back");
                    }
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    /// A delivered message without a record would never expire.
    async fn discard_orphan(&self, target: &Target, message_ref: MessageRef) {
        if let Err(err) = self.transport.delete_content(target, message_ref).await {
            tracing::warn!(channel = %target, %message_ref, error = %err, "could not remove unrecorded promo message");
        }
    }
}
