//! crosspromo-bot - Telegram クロスプロモーション Bot
//!
//! 起動順:
//! 1. `.env` と環境変数から BotConfig を読む
//! 2. ストア（JSON ファイル or インメモリ）と Telegram Transport を組み立てる
//! 3. 期限切れ回収ワーカーとセッション掃除タスクを起動
//! 4. Ctrl-C まで long polling、終了時にワーカーを止めて join

mod commands;
mod config;
mod notify;
mod render;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use teloxide::prelude::*;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crosspromo_core::app::PromoAppBuilder;
use crosspromo_core::impls::{InMemoryPromoStore, JsonFilePromoStore};
use crosspromo_core::ports::PromoStore;

use crate::commands::{BotState, schema};
use crate::config::BotConfig;
use crate::notify::AdminNotifier;
use crate::telegram::TelegramTransport;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BotConfig::from_env().context("failed to load configuration")?;
    let bot = Bot::new(config.token.clone());

    let me = bot.get_me().await.context("failed to reach Telegram (getMe)")?;
    let bot_username = me.user.username.clone();

    let store: Arc<dyn PromoStore> = match &config.store_path {
        Some(path) => {
            let store = JsonFilePromoStore::open(path.clone())
                .await
                .with_context(|| format!("failed to open promo store {}", path.display()))?;
            tracing::info!(path = %path.display(), "using JSON promo store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("PROMO_STORE_PATH not set; promos are kept in memory and lost on restart");
            Arc::new(InMemoryPromoStore::new())
        }
    };

    let app = PromoAppBuilder::new()
        .store(store)
        .transport(Arc::new(TelegramTransport::new(bot.clone())))
        .events(Arc::new(AdminNotifier::new(
            bot.clone(),
            config.admins.clone(),
            config.notify_on_expiry,
        )))
        .auto_delete(config.auto_delete)
        .build()?;

    let worker = app.start_reconciliation();
    if worker.is_none() {
        tracing::info!("auto-delete disabled; expired promos stay until deleted by hand");
    }

    let ttl = chrono::Duration::from_std(config.session_ttl).context("SESSION_TTL out of range")?;
    let sessions = app.sessions(ttl);
    let state = Arc::new(BotState::new(
        app,
        sessions,
        config.admins.clone(),
        config.bot_name.clone(),
        bot_username.clone(),
        config.promo_images.clone(),
        config.auto_delete.enabled,
    ));

    let (sweep_tx, sweep_rx) = watch::channel(false);
    let sweeper = tokio::spawn(sweep_sessions(state.clone(), sweep_rx));

    tracing::info!(
        username = bot_username.as_deref().unwrap_or("unknown"),
        owner = config.owner_id.0,
        admins = config.admins.len(),
        auto_delete = config.auto_delete.enabled,
        "start polling"
    );

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::trace!(update_id = ?upd.id, "unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Dispatcher error"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("polling stopped, shutting down");
    let _ = sweep_tx.send(true);
    join_logged("session sweeper", sweeper).await;
    if let Some(worker) = worker {
        worker.shutdown_and_join().await;
    }
    Ok(())
}

/// Wait for a background task; a panic is logged, not propagated.
async fn join_logged(name: &'static str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(task = name, error = %err, "background task panicked");
            false
        }
    }
}

/// Drop campaign sessions nobody has touched within the TTL.
async fn sweep_sessions(state: Arc<BotState>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let evicted = state.sessions.evict_idle().await;
                if evicted > 0 {
                    tracing::info!(evicted, "idle campaign sessions dropped");
                }
            }
        }
    }
}
