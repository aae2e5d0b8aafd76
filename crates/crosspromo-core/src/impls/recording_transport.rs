//! RecordingTransport - テスト・ドライラン用の Transport
//!
//! # 学習ポイント
//! - 呼び出しをすべて記録し、テストから検査できる
//! - 宛先ごとに失敗を仕込める（配信モード単位 / 削除）
//! - std::sync::Mutex はロック中に await しない箇所だけで使う

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ButtonGrid, DeleteStatus, MessageBody, MessageRef, SourceRef, Target, TransportError};
use crate::ports::Transport;

const FIRST_MESSAGE_REF: i32 = 1000;

/// Which delivery modes a scripted target rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendFailure {
    /// Every send and forward fails.
    Everything,
    /// Media sends fail; text still goes through.
    Media,
    /// Forwards fail; sends still go through.
    Forward,
}

/// Scripted answer for delete calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteBehavior {
    #[default]
    Delete,
    NotFound,
    Fail,
}

/// One successful delivery as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub target: Target,
    pub message_ref: MessageRef,
    pub payload: DeliveredPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveredPayload {
    Sent {
        body: MessageBody,
        buttons: Option<ButtonGrid>,
    },
    Forwarded(SourceRef),
}

#[derive(Default)]
struct Script {
    send_failures: HashMap<Target, SendFailure>,
    delete_behavior: HashMap<Target, DeleteBehavior>,
    default_delete: DeleteBehavior,
    member_counts: HashMap<Target, u64>,
}

#[derive(Default)]
struct Journal {
    delivered: Vec<Delivered>,
    /// Delete calls in arrival order, including failed ones.
    delete_calls: Vec<(Target, MessageRef)>,
    live: HashSet<(Target, MessageRef)>,
}

/// RecordingTransport はメッセージを実際には送らない Transport
pub struct RecordingTransport {
    next_ref: AtomicI32,
    script: Mutex<Script>,
    journal: Mutex<Journal>,
    delete_delay: Mutex<Option<Duration>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_ref: AtomicI32::new(FIRST_MESSAGE_REF),
            script: Mutex::new(Script::default()),
            journal: Mutex::new(Journal::default()),
            delete_delay: Mutex::new(None),
        }
    }

    pub fn fail_sends_to(&self, target: Target, failure: SendFailure) {
        lock(&self.script).send_failures.insert(target, failure);
    }

    pub fn set_delete_behavior(&self, target: Target, behavior: DeleteBehavior) {
        lock(&self.script).delete_behavior.insert(target, behavior);
    }

    /// Behavior for targets without a per-target script.
    pub fn set_default_delete_behavior(&self, behavior: DeleteBehavior) {
        lock(&self.script).default_delete = behavior;
    }

    pub fn set_member_count(&self, channel: Target, count: u64) {
        lock(&self.script).member_counts.insert(channel, count);
    }

    /// Delay every delete call; used to widen race windows in tests.
    pub fn set_delete_delay(&self, delay: Duration) {
        *lock(&self.delete_delay) = Some(delay);
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        lock(&self.journal).delivered.clone()
    }

    pub fn delete_calls(&self) -> Vec<(Target, MessageRef)> {
        lock(&self.journal).delete_calls.clone()
    }

    /// Messages delivered and not yet deleted.
    pub fn live_messages(&self) -> usize {
        lock(&self.journal).live.len()
    }

    fn check_send(&self, target: &Target, forward: bool, media: bool) -> Result<(), TransportError> {
        let rejected = match lock(&self.script).send_failures.get(target) {
            Some(SendFailure::Everything) => true,
            Some(SendFailure::Media) => media,
            Some(SendFailure::Forward) => forward,
            None => false,
        };
        if rejected {
            Err(TransportError::Rejected(format!("scripted failure for {target}")))
        } else {
            Ok(())
        }
    }

    fn record(&self, target: &Target, payload: DeliveredPayload) -> MessageRef {
        let message_ref = MessageRef(self.next_ref.fetch_add(1, Ordering::SeqCst));
        let mut journal = lock(&self.journal);
        journal.live.insert((target.clone(), message_ref));
        journal.delivered.push(Delivered {
            target: target.clone(),
            message_ref,
            payload,
        });
        message_ref
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_content(
        &self,
        target: &Target,
        body: &MessageBody,
        buttons: Option<&ButtonGrid>,
    ) -> Result<MessageRef, TransportError> {
        self.check_send(target, false, matches!(body, MessageBody::Media { .. }))?;
        Ok(self.record(
            target,
            DeliveredPayload::Sent {
                body: body.clone(),
                buttons: buttons.cloned(),
            },
        ))
    }

    async fn forward_content(&self, target: &Target, source: &SourceRef) -> Result<MessageRef, TransportError> {
        self.check_send(target, true, false)?;
        Ok(self.record(target, DeliveredPayload::Forwarded(source.clone())))
    }

    async fn delete_content(&self, target: &Target, message_ref: MessageRef) -> Result<DeleteStatus, TransportError> {
        let delay = *lock(&self.delete_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = {
            let script = lock(&self.script);
            script
                .delete_behavior
                .get(target)
                .copied()
                .unwrap_or(script.default_delete)
        };

        let mut journal = lock(&self.journal);
        journal.delete_calls.push((target.clone(), message_ref));
        match behavior {
            DeleteBehavior::Fail => Err(TransportError::Rejected(format!(
                "scripted delete failure for {target}/{message_ref}"
            ))),
            DeleteBehavior::NotFound => {
                journal.live.remove(&(target.clone(), message_ref));
                Ok(DeleteStatus::NotFound)
            }
            DeleteBehavior::Delete => {
                if journal.live.remove(&(target.clone(), message_ref)) {
                    Ok(DeleteStatus::Deleted)
                } else {
                    Ok(DeleteStatus::NotFound)
                }
            }
        }
    }

    async fn get_member_count(&self, channel: &Target) -> Result<u64, TransportError> {
        lock(&self.script)
            .member_counts
            .get(channel)
            .copied()
            .ok_or_else(|| TransportError::Rejected(format!("chat not found: {channel}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MediaKind, MediaRef};

    fn photo() -> MessageBody {
        MessageBody::Media {
            kind: MediaKind::Photo,
            media: MediaRef::Url("https://example.com/p.jpg".into()),
            caption: None,
        }
    }

    #[tokio::test]
    async fn assigns_increasing_refs_and_records() {
        let transport = RecordingTransport::new();
        let a = Target::Handle("a".into());
        let first = transport.send_content(&a, &MessageBody::Text("x".into()), None).await.unwrap();
        let second = transport.send_content(&a, &photo(), None).await.unwrap();
        assert!(second.0 > first.0);
        assert_eq!(transport.delivered().len(), 2);
        assert_eq!(transport.live_messages(), 2);
    }

    #[tokio::test]
    async fn media_failure_still_allows_text() {
        let transport = RecordingTransport::new();
        let a = Target::Id(-100);
        transport.fail_sends_to(a.clone(), SendFailure::Media);
        assert!(transport.send_content(&a, &photo(), None).await.is_err());
        assert!(transport.send_content(&a, &MessageBody::Text("ok".into()), None).await.is_ok());
    }

    #[tokio::test]
    async fn delete_reports_not_found_second_time() {
        let transport = RecordingTransport::new();
        let a = Target::Handle("a".into());
        let msg = transport.send_content(&a, &MessageBody::Text("x".into()), None).await.unwrap();
        assert_eq!(transport.delete_content(&a, msg).await.unwrap(), DeleteStatus::Deleted);
        assert_eq!(transport.delete_content(&a, msg).await.unwrap(), DeleteStatus::NotFound);
        assert_eq!(transport.delete_calls().len(), 2);
    }

    #[tokio::test]
    async fn scripted_delete_failure() {
        let transport = RecordingTransport::new();
        transport.set_default_delete_behavior(DeleteBehavior::Fail);
        let err = transport.delete_content(&Target::Id(1), MessageRef(1)).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
    }

    #[tokio::test]
    async fn member_count_lookup() {
        let transport = RecordingTransport::new();
        let chan = Target::Handle("big".into());
        transport.set_member_count(chan.clone(), 12_000);
        assert_eq!(transport.get_member_count(&chan).await.unwrap(), 12_000);
        assert!(transport.get_member_count(&Target::Handle("nope".into())).await.is_err());
    }
}
