//! BotConfig - 環境変数からの設定読み込み
//!
//! `.env` は main で dotenvy が先に読み込む。ここでは lookup 関数だけを見るので、
//! テストでは HashMap を渡せる。

use std::path::PathBuf;
use std::time::Duration;

use crosspromo_core::app::AutoDeleteConfig;
use crosspromo_core::domain::{AdminId, AdminList};
use url::Url;

const DEFAULT_BOT_NAME: &str = "PromoFather";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_ERROR_BACKOFF_SECS: u64 = 60;
const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub owner_id: AdminId,
    /// Always contains the owner.
    pub admins: AdminList,
    pub bot_name: String,
    pub promo_images: Vec<Url>,
    /// None means the in-memory store.
    pub store_path: Option<PathBuf>,
    pub auto_delete: AutoDeleteConfig,
    /// Tell admins when the worker removes an expired promo.
    pub notify_on_expiry: bool,
    pub session_ttl: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let owner_raw = get("OWNER_ID").ok_or(ConfigError::Missing("OWNER_ID"))?;
        let owner_id = AdminId(parse_i64("OWNER_ID", &owner_raw)?);

        let mut admins = match get("ADMINS") {
            Some(raw) => parse_id_list("ADMINS", &raw)?,
            None => Vec::new(),
        };
        admins.push(owner_id);

        let promo_images = match get("PROMO_IMAGE") {
            Some(raw) => parse_url_list("PROMO_IMAGE", &raw)?,
            None => Vec::new(),
        };

        let auto_delete = AutoDeleteConfig {
            enabled: opt_bool(get("AUTO_DELETE_ENABLED"), "AUTO_DELETE_ENABLED", true)?,
            check_interval: opt_secs(
                get("AUTO_DELETE_CHECK_INTERVAL"),
                "AUTO_DELETE_CHECK_INTERVAL",
                DEFAULT_CHECK_INTERVAL_SECS,
            )?,
            error_backoff: opt_secs(
                get("AUTO_DELETE_ERROR_BACKOFF"),
                "AUTO_DELETE_ERROR_BACKOFF",
                DEFAULT_ERROR_BACKOFF_SECS,
            )?,
        };

        Ok(Self {
            token,
            owner_id,
            admins: AdminList::new(admins),
            bot_name: get("BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            promo_images,
            store_path: get("PROMO_STORE_PATH").map(PathBuf::from),
            auto_delete,
            notify_on_expiry: opt_bool(get("NOTIFY_ON_MANUAL_DELETION"), "NOTIFY_ON_MANUAL_DELETION", true)?,
            session_ttl: opt_secs(get("SESSION_TTL"), "SESSION_TTL", DEFAULT_SESSION_TTL_SECS)?,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    }
}

fn parse_i64(var: &'static str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(var, raw, "expected an integer id"))
}

fn parse_id_list(var: &'static str, raw: &str) -> Result<Vec<AdminId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_i64(var, s).map(AdminId))
        .collect()
}

fn parse_url_list(var: &'static str, raw: &str) -> Result<Vec<Url>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Url::parse(s).map_err(|_| invalid(var, s, "expected a URL")))
        .collect()
}

pub(crate) fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(var, raw, "expected true/false/1/0/yes/no")),
    }
}

pub(crate) fn parse_positive_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(var, raw, "must be positive")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(invalid(var, raw, "expected whole seconds")),
    }
}

fn opt_bool(raw: Option<String>, var: &'static str, default: bool) -> Result<bool, ConfigError> {
    raw.map_or(Ok(default), |v| parse_bool(var, &v))
}

fn opt_secs(raw: Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    raw.map_or(Ok(Duration::from_secs(default)), |v| parse_positive_secs(var, &v))
}
