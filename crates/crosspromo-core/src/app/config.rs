//! AutoDeleteConfig - expiry worker の設定
//!
//! 環境変数の解釈は bot 側の責務。core は解釈済みの値だけを受け取る。

use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoDeleteConfig {
    /// When false the worker is never started.
    pub enabled: bool,
    /// Sleep between two cycles.
    pub check_interval: Duration,
    /// Sleep after a cycle that hit a store failure.
    pub error_backoff: Duration,
}

impl Default for AutoDeleteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl AutoDeleteConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
