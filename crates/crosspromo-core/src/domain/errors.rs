//! Errors - エラー型
//!
//! - TransportError: 1 件単位で閉じる（dispatcher はフォールバック、worker はログして次へ）
//! - StoreError: リクエスト系の呼び出し元へ伝播、worker ではバックオフ
//! - NotFound はエラーではなく結果型（DeleteStatus / ManualDeleteOutcome）で表す

use thiserror::Error;

use crate::domain::outcome::DispatchSummary;

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("promo store unavailable: {0}")]
    Unavailable(String),

    #[error("promo store data is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Messaging transport failures for a single call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The platform refused the request (bad chat, no rights, bad media...).
    #[error("rejected by transport: {0}")]
    Rejected(String),

    /// Network or timeout; the request may or may not have reached the platform.
    #[error("transport unreachable: {0}")]
    Unreachable(String),
}

/// Errors surfaced to callers of request-style operations.
#[derive(Debug, Error)]
pub enum PromoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("campaign has no targets")]
    NoTargets,

    /// The store failed after some targets were already posted.
    /// `summary` lists what was created; the rest are counted as failed.
    #[error("campaign stopped after {}/{} targets: {source}", .summary.success_count, .summary.total_count)]
    Interrupted {
        summary: Box<DispatchSummary>,
        source: StoreError,
    },
}
