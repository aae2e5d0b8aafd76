//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID
//! promo_id は管理者が `/deletepromo` で指定する外部ハンドルです。
//! ULID（48-bit ミリ秒 timestamp + 80-bit 乱数）を使うため、
//! 同一ミリ秒に大量発行しても衝突は現実的に起きません。
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を持ち、`T` はコンパイル時だけ使うマーカー型です。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "promo-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// 文字列表現は `{prefix}{ulid}`。serde でも同じ表現を使うので、
/// JSON ストアに保存した ID をそのまま管理者に見せられます。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    /// Millisecond timestamp embedded in the id.
    pub fn timestamp_ms(&self) -> u64 {
        self.ulid.timestamp_ms()
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// IdParseError は文字列から Id への変換エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("id must start with '{expected}'")]
    MissingPrefix { expected: &'static str },

    #[error("invalid ulid: {0}")]
    InvalidUlid(String),
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .strip_prefix(T::prefix())
            .ok_or(IdParseError::MissingPrefix {
                expected: T::prefix(),
            })?;
        let ulid = Ulid::from_string(raw).map_err(|e| IdParseError::InvalidUlid(e.to_string()))?;
        Ok(Self::from_ulid(ulid))
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Promo のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Promo {}

impl IdMarker for Promo {
    fn prefix() -> &'static str {
        "promo-"
    }
}

/// Identifier of one delivered promo post (one target, one message).
pub type PromoId = Id<Promo>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let ulid = Ulid::new();
        let id = PromoId::from_ulid(ulid);
        assert_eq!(id.to_string(), format!("promo-{ulid}"));
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = PromoId::from_ulid(Ulid::new());
        let parsed: PromoId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let raw = format!("task-{}", Ulid::new());
        let err = raw.parse::<PromoId>().unwrap_err();
        assert_eq!(err, IdParseError::MissingPrefix { expected: "promo-" });
    }

    #[test]
    fn parse_rejects_legacy_numeric_ids() {
        // 旧形式（PROMO_<unix>_<4桁>）は受け付けない
        assert!("PROMO_1700000000_1234".parse::<PromoId>().is_err());
        assert!("promo-not-a-ulid".parse::<PromoId>().is_err());
    }

    #[test]
    fn serde_uses_display_form() {
        let id = PromoId::from_ulid(Ulid::new());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: PromoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        assert_eq!(std::mem::size_of::<PromoId>(), std::mem::size_of::<Ulid>());
    }
}
