//! Campaign - キャンペーン作成中の語彙と選択状態

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::content::PromoContent;
use super::promo::Target;
use super::template::PromoTemplate;

/// Telegram user id of an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdminId(pub i64);

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static allow-list of administrators.
#[derive(Debug, Clone, Default)]
pub struct AdminList {
    ids: Vec<AdminId>,
}

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = AdminId>) -> Self {
        let mut ids: Vec<AdminId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self { ids }
    }

    pub fn contains(&self, id: AdminId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = AdminId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    News,
    Tech,
    Entertainment,
    Movies,
    Sports,
    Forex,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::News,
        Category::Tech,
        Category::Entertainment,
        Category::Movies,
        Category::Sports,
        Category::Forex,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Tech => "tech",
            Category::Entertainment => "ent",
            Category::Movies => "movies",
            Category::Sports => "sports",
            Category::Forex => "forex",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::News => "📰 News & Updates",
            Category::Tech => "💻 Technology & Internet",
            Category::Entertainment => "🎭 Entertainment & Lifestyle",
            Category::Movies => "🎬 Movies & Series",
            Category::Sports => "⚽ Sports",
            Category::Forex => "💸 Forex, Betting & Crypto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct UnknownKey {
    pub what: &'static str,
    pub value: String,
}

impl FromStr for Category {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKey {
                what: "category",
                value: s.to_string(),
            })
    }
}

/// Subscriber bucket used to pick comparable channels.
///
/// Bounds are inclusive on both ends, so 5000 and 10000 fall in two buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberRange {
    From500To999,
    From1kTo5k,
    From5kTo10k,
    Over10k,
}

impl SubscriberRange {
    pub const ALL: [SubscriberRange; 4] = [
        SubscriberRange::From500To999,
        SubscriberRange::From1kTo5k,
        SubscriberRange::From5kTo10k,
        SubscriberRange::Over10k,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SubscriberRange::From500To999 => "500-999",
            SubscriberRange::From1kTo5k => "1k-5k",
            SubscriberRange::From5kTo10k => "5k-10k",
            SubscriberRange::Over10k => "10k+",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SubscriberRange::From500To999 => "500 – 999 subs",
            SubscriberRange::From1kTo5k => "1k – 5k subs",
            SubscriberRange::From5kTo10k => "5k – 10k subs",
            SubscriberRange::Over10k => "10k+ subs",
        }
    }

    pub fn contains(self, subscribers: u64) -> bool {
        match self {
            SubscriberRange::From500To999 => (500..=999).contains(&subscribers),
            SubscriberRange::From1kTo5k => (1_000..=5_000).contains(&subscribers),
            SubscriberRange::From5kTo10k => (5_000..=10_000).contains(&subscribers),
            SubscriberRange::Over10k => subscribers >= 10_000,
        }
    }
}

impl FromStr for SubscriberRange {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriberRange::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKey {
                what: "subscriber range",
                value: s.to_string(),
            })
    }
}

/// A campaign destination plus the name shown in summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignTarget {
    pub target: Target,
    pub title: Option<String>,
}

impl CampaignTarget {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            title: None,
        }
    }

    pub fn with_title(target: Target, title: impl Into<String>) -> Self {
        Self {
            target,
            title: Some(title.into()),
        }
    }

    pub fn display_name(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.target.to_string())
    }
}

/// Per-administrator selection while a campaign is being composed.
///
/// Not persisted; lives in `CampaignSessions` and is cleared on completion
/// or cancellation.
#[derive(Debug, Clone)]
pub struct CampaignSelection {
    pub category: Category,
    pub subscriber_range: Option<SubscriberRange>,
    /// Insertion-ordered, no duplicates.
    pub targets: Vec<CampaignTarget>,
    pub template: PromoTemplate,
    pub custom_content: Option<PromoContent>,
    pub touched_at: DateTime<Utc>,
}

impl CampaignSelection {
    pub fn new(category: Category, subscriber_range: Option<SubscriberRange>, now: DateTime<Utc>) -> Self {
        Self {
            category,
            subscriber_range,
            targets: Vec::new(),
            template: PromoTemplate::default(),
            custom_content: None,
            touched_at: now,
        }
    }

    /// Returns false when the target was already selected.
    pub fn add_target(&mut self, target: CampaignTarget) -> bool {
        if self.targets.iter().any(|t| t.target == target.target) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn remove_target(&mut self, target: &Target) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| &t.target != target);
        self.targets.len() < before
    }
}
