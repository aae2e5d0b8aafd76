//! PromoRecord - 配信済み販促投稿 1 件のメタデータ
//!
//! `(target, message_ref)` が自然キー。削除系の操作はすべてこのペアで行う。
//! `expires_at` / `is_expired` は保存せず、常に `created_at + duration` から導出する。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ids::PromoId;

/// Target is a channel, addressed either by numeric chat id or by public handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Id(i64),
    /// Handle without the leading '@'.
    Handle(String),
}

impl Target {
    /// Public handle, if the channel has one.
    pub fn handle(&self) -> Option<&str> {
        match self {
            Target::Handle(h) => Some(h),
            Target::Id(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Id(id) => write!(f, "{id}"),
            Target::Handle(h) => write!(f, "@{h}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetParseError {
    #[error("empty target")]
    Empty,

    #[error("invalid channel handle '{0}'")]
    InvalidHandle(String),

    #[error("invalid channel id '{0}'")]
    InvalidId(String),
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetParseError::Empty);
        }
        if let Some(handle) = s.strip_prefix('@') {
            let valid = !handle.is_empty()
                && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(TargetParseError::InvalidHandle(s.to_string()));
            }
            return Ok(Target::Handle(handle.to_string()));
        }
        s.parse::<i64>()
            .map(Target::Id)
            .map_err(|_| TargetParseError::InvalidId(s.to_string()))
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Transport-side id of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub i32);

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One promotional post placed in one target channel.
///
/// Design:
/// - Created once per successful delivery, never mutated afterwards.
/// - There is no "extend" operation; `duration_seconds` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRecord {
    pub promo_id: PromoId,
    pub target: Target,
    pub message_ref: MessageRef,
    pub duration_seconds: u64,
    pub created_at: DateTime<Utc>,
}

impl PromoRecord {
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.duration_seconds).unwrap_or(i64::MAX);
        let ttl = Duration::try_seconds(secs).unwrap_or(Duration::MAX);
        self.created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Time left before expiry, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).max(Duration::zero())
    }

    pub fn natural_key(&self) -> (&Target, MessageRef) {
        (&self.target, self.message_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn record(duration_seconds: u64) -> PromoRecord {
        PromoRecord {
            promo_id: PromoId::from_ulid(Ulid::new()),
            target: Target::Handle("rustnews".into()),
            message_ref: MessageRef(42),
            duration_seconds,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[rstest]
    #[case("@rust_news", Target::Handle("rust_news".into()))]
    #[case("-1001234567890", Target::Id(-1001234567890))]
    #[case("  @abc  ", Target::Handle("abc".into()))]
    fn target_parses(#[case] raw: &str, #[case] expected: Target) {
        assert_eq!(raw.parse::<Target>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("@")]
    #[case("@bad-handle")]
    #[case("channel")]
    fn target_rejects_garbage(#[case] raw: &str) {
        assert!(raw.parse::<Target>().is_err());
    }

    #[test]
    fn target_display_roundtrips() {
        for t in [Target::Id(-100), Target::Handle("x_y".into())] {
            assert_eq!(t.to_string().parse::<Target>().unwrap(), t);
        }
    }

    #[test]
    fn expires_at_is_created_plus_duration() {
        let r = record(60);
        assert_eq!(r.expires_at(), r.created_at + Duration::seconds(60));
    }

    #[rstest]
    #[case(0, false)]
    #[case(30, false)]
    #[case(59, false)]
    #[case(60, true)]
    #[case(61, true)]
    fn expiry_boundary_is_inclusive(#[case] elapsed: i64, #[case] expired: bool) {
        let r = record(60);
        let now = r.created_at + Duration::seconds(elapsed);
        assert_eq!(r.is_expired(now), expired);
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let r = record(60);
        assert_eq!(r.remaining(r.created_at + Duration::seconds(20)), Duration::seconds(40));
        assert_eq!(r.remaining(r.created_at + Duration::hours(2)), Duration::zero());
    }

    #[test]
    fn huge_duration_does_not_overflow() {
        let r = record(u64::MAX);
        assert!(!r.is_expired(r.created_at + Duration::days(365 * 100)));
    }

    #[test]
    fn record_serializes_with_string_target() {
        let r = record(3600);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["target"], "@rustnews");
        assert_eq!(json["message_ref"], 42);
        let back: PromoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
