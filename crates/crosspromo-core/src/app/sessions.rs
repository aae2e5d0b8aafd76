//! CampaignSessions - 管理者ごとのキャンペーン作成中の状態
//!
//! # 設計原則
//! - 管理者 1 人につき進行中の選択は最大 1 つ（begin は上書き）
//! - 完了・キャンセル時は clear() で明示的に消す
//! - 放置されたセッションは evict_idle() で TTL に従って回収する
//! - 永続化しない（再起動で消える）

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;

use crate::domain::{AdminId, CampaignSelection, Category, SubscriberRange};
use crate::ports::Clock;

pub struct CampaignSessions {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    sessions: Mutex<HashMap<AdminId, CampaignSelection>>,
}

impl CampaignSessions {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a fresh selection, dropping any previous one.
    pub async fn begin(
        &self,
        admin: AdminId,
        category: Category,
        subscriber_range: Option<SubscriberRange>,
    ) -> CampaignSelection {
        let selection = CampaignSelection::new(category, subscriber_range, self.clock.now());
        self.sessions.lock().await.insert(admin, selection.clone());
        selection
    }

    /// Mutate the admin's selection in place. Returns None without a session.
    pub async fn update<R>(&self, admin: AdminId, f: impl FnOnce(&mut CampaignSelection) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        let selection = sessions.get_mut(&admin)?;
        let result = f(selection);
        selection.touched_at = self.clock.now();
        Some(result)
    }

    pub async fn get(&self, admin: AdminId) -> Option<CampaignSelection> {
        self.sessions.lock().await.get(&admin).cloned()
    }

    pub async fn clear(&self, admin: AdminId) -> Option<CampaignSelection> {
        self.sessions.lock().await.remove(&admin)
    }

    /// Drop sessions untouched for longer than the TTL; returns how many.
    pub async fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.signed_duration_since(s.touched_at) <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "idle campaign sessions evicted");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
