//! 管理者コマンド
//!
//! # フロー
//! 1. /campaign でセッション開始（カテゴリ・購読者レンジ）
//! 2. /target で配信先を追加（レンジ指定時はメンバー数を確認）
//! 3. /template でテンプレート選択
//! 4. /send <hours> でテンプレート投稿、またはメッセージに返信して /post <hours>
//!
//! コマンド本体（execute）は Bot に依存しないので、インメモリの core でテストできる。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::MessageOrigin;
use teloxide::utils::command::BotCommands;
use url::Url;

use crosspromo_core::app::{Campaign, CampaignSessions, PromoApp};
use crosspromo_core::domain::{
    AdminId, AdminList, CampaignTarget, Category, MediaKind, MediaRef, MessageRef, PromoContent, PromoError, PromoId,
    PromoTemplate, SourceRef, SubscriberRange, Target,
};

use crate::render;

/// Longest campaign an admin can schedule.
const MAX_HOURS: u64 = 720;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Cross-promo admin commands:")]
pub enum Command {
    #[command(description = "show this help")]
    Help,
    #[command(description = "show this help")]
    Start,
    #[command(description = "start a campaign: /campaign <category> [500-999|1k-5k|5k-10k|10k+]")]
    Campaign(String),
    #[command(description = "add targets: /target @channel -100123 ...")]
    Target(String),
    #[command(description = "remove a target: /untarget @channel")]
    Untarget(String),
    #[command(description = "pick a template: /template template3")]
    Template(String),
    #[command(description = "list templates")]
    Templates,
    #[command(description = "post the template campaign: /send <hours>")]
    Send(String),
    #[command(description = "reply to a message to post it: /post <hours>")]
    Post(String),
    #[command(description = "drop the campaign in progress")]
    Cancel,
    #[command(description = "list live promos: /listpromos [page]")]
    Listpromos(String),
    #[command(description = "promo details: /promo <id>")]
    Promo(String),
    #[command(description = "delete a promo now: /deletepromo <id>")]
    Deletepromo(String),
    #[command(description = "bot statistics")]
    Stats,
}

/// Shared handler state.
pub struct BotState {
    pub app: PromoApp,
    pub sessions: CampaignSessions,
    pub admins: AdminList,
    pub bot_name: String,
    pub bot_username: Option<String>,
    /// Banners for template posts, used in rotation.
    pub promo_images: Vec<Url>,
    pub auto_delete_enabled: bool,
    next_image: AtomicUsize,
}

impl BotState {
    pub fn new(
        app: PromoApp,
        sessions: CampaignSessions,
        admins: AdminList,
        bot_name: String,
        bot_username: Option<String>,
        promo_images: Vec<Url>,
        auto_delete_enabled: bool,
    ) -> Self {
        Self {
            app,
            sessions,
            admins,
            bot_name,
            bot_username,
            promo_images,
            auto_delete_enabled,
            next_image: AtomicUsize::new(0),
        }
    }

    fn next_image(&self) -> Option<&Url> {
        if self.promo_images.is_empty() {
            return None;
        }
        let i = self.next_image.fetch_add(1, Ordering::Relaxed);
        self.promo_images.get(i % self.promo_images.len())
    }
}

pub fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}

async fn handle_command(bot: Bot, state: Arc<BotState>, msg: Message, cmd: Command) -> anyhow::Result<()> {
    let Some(admin) = msg.from.as_ref().map(|u| AdminId(u.id.0 as i64)) else {
        return Ok(());
    };

    let reply = if !state.admins.contains(admin) {
        tracing::debug!(user = admin.0, ?cmd, "command from non-admin ignored");
        render::NOT_ADMIN.to_string()
    } else {
        let replied = msg.reply_to_message().and_then(content_of);
        match execute(&state, admin, cmd, replied).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(admin = admin.0, error = %err, "command failed");
                format!("❌ Something went wrong: {err}")
            }
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Run one admin command. `replied` is the content of the message the
/// command replied to, if any.
pub async fn execute(
    state: &BotState,
    admin: AdminId,
    cmd: Command,
    replied: Option<PromoContent>,
) -> anyhow::Result<String> {
    let text = match cmd {
        Command::Help | Command::Start => Command::descriptions().to_string(),
        Command::Campaign(args) => match parse_campaign_args(&args) {
            Ok((category, range)) => {
                let selection = state.sessions.begin(admin, category, range).await;
                render::selection(&selection)
            }
            Err(usage) => usage,
        },
        Command::Target(args) => add_targets(state, admin, &args).await,
        Command::Untarget(args) => match args.trim().parse::<Target>() {
            Ok(target) => match state.sessions.update(admin, |s| s.remove_target(&target)).await {
                None => render::NO_SESSION.to_string(),
                Some(true) => format!("🗑 Removed {target}."),
                Some(false) => format!("{target} was not selected."),
            },
            Err(err) => format!("Usage: /untarget @channel ({err})"),
        },
        Command::Template(args) if args.trim().is_empty() => {
            render::templates(state.sessions.get(admin).await.map(|s| s.template))
        }
        Command::Template(args) => {
            let requested = args.trim();
            let template = PromoTemplate::from_id_or_default(requested);
            match state.sessions.update(admin, |s| s.template = template).await {
                Some(()) if template.id().eq_ignore_ascii_case(requested) => {
                    format!("🎨 Template set to {} ({}).", template.name(), template.id())
                }
                Some(()) => format!(
                    "Unknown template '{requested}', using {} ({}). See /templates.",
                    template.name(),
                    template.id()
                ),
                None => render::NO_SESSION.to_string(),
            }
        }
        Command::Templates => render::templates(state.sessions.get(admin).await.map(|s| s.template)),
        Command::Send(args) => match parse_hours(&args) {
            Ok(seconds) => dispatch_selection(state, admin, seconds, None).await?,
            Err(usage) => usage,
        },
        Command::Post(args) => {
            let Some(content) = replied else {
                return Ok("Reply to the message you want to promote with /post <hours>.".to_string());
            };
            match parse_hours(&args) {
                Ok(seconds) => {
                    let pending = content.clone();
                    match state.sessions.update(admin, |s| s.custom_content = Some(pending)).await {
                        Some(()) => dispatch_selection(state, admin, seconds, Some(content)).await?,
                        None => render::NO_SESSION.to_string(),
                    }
                }
                Err(usage) => usage,
            }
        }
        Command::Cancel => match state.sessions.clear(admin).await {
            Some(_) => "❌ Campaign cancelled.".to_string(),
            None => "No campaign in progress.".to_string(),
        },
        Command::Listpromos(args) => match parse_page(&args) {
            Ok(page) => render::promo_page(&state.app.listing.page(page).await?),
            Err(usage) => usage,
        },
        Command::Promo(args) => match args.trim().parse::<PromoId>() {
            Ok(id) => match state.app.listing.details(&id).await? {
                Some(view) => render::promo_details(&view),
                None => format!("❌ Promo {id} not found."),
            },
            Err(_) => "Usage: /promo <promo id>".to_string(),
        },
        Command::Deletepromo(args) => match args.trim().parse::<PromoId>() {
            Ok(id) => render::manual_delete(&state.app.manual_delete.delete(&id, Some(admin)).await?),
            Err(_) => "Usage: /deletepromo <promo id>".to_string(),
        },
        Command::Stats => {
            let stats = state.app.listing.stats().await?;
            render::stats(
                &stats,
                state.sessions.len().await,
                state.admins.len(),
                state.auto_delete_enabled,
            )
        }
    };
    Ok(text)
}

async fn add_targets(state: &BotState, admin: AdminId, args: &str) -> String {
    let Some(selection) = state.sessions.get(admin).await else {
        return render::NO_SESSION.to_string();
    };
    if args.trim().is_empty() {
        return "Usage: /target @channel -100123 ...".to_string();
    }

    let transport = state.app.transport();
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for raw in args.split_whitespace() {
        let target = match raw.parse::<Target>() {
            Ok(target) => target,
            Err(err) => {
                skipped.push((raw.to_string(), err.to_string()));
                continue;
            }
        };
        if let Some(range) = selection.subscriber_range {
            match transport.get_member_count(&target).await {
                Ok(count) if range.contains(count) => {}
                Ok(count) => {
                    skipped.push((target.to_string(), format!("{count} subscribers, outside {}", range.display_name())));
                    continue;
                }
                Err(err) => {
                    skipped.push((target.to_string(), format!("could not check subscribers ({err})")));
                    continue;
                }
            }
        }
        accepted.push(target);
    }

    let outcome = state
        .sessions
        .update(admin, |s| {
            let mut added = Vec::new();
            let mut duplicates = Vec::new();
            for target in accepted {
                let name = target.to_string();
                if s.add_target(CampaignTarget::new(target)) {
                    added.push(name);
                } else {
                    duplicates.push((name, "already selected".to_string()));
                }
            }
            (added, duplicates, s.targets.len())
        })
        .await;

    match outcome {
        Some((added, duplicates, total)) => {
            skipped.extend(duplicates);
            render::target_report(&added, &skipped, total)
        }
        // cancelled while member counts were being checked
        None => render::NO_SESSION.to_string(),
    }
}

/// Post the admin's selection. `custom` is the replied-to content for /post;
/// None posts the selected template. The pending custom content never
/// outlives this call: success clears the session, anything else clears
/// just the pending content.
async fn dispatch_selection(
    state: &BotState,
    admin: AdminId,
    duration_seconds: u64,
    custom: Option<PromoContent>,
) -> anyhow::Result<String> {
    let Some(selection) = state.sessions.get(admin).await else {
        return Ok(render::NO_SESSION.to_string());
    };

    let buttons = selection
        .template
        .render_buttons(&selection.targets, state.bot_username.as_deref());
    let (content, heading) = match custom {
        Some(content) => (content, "Custom promo"),
        None => {
            let text = selection
                .template
                .render_text(&selection.targets, Some(selection.category), &state.bot_name);
            let content = match state.next_image() {
                Some(image) => PromoContent::media(MediaKind::Photo, MediaRef::Url(image.to_string()), Some(text)),
                None => PromoContent::text(text),
            };
            (content, "Promo")
        }
    };

    let campaign = Campaign {
        targets: selection.targets.clone(),
        content,
        buttons,
        duration_seconds,
    };
    match state.app.dispatcher.dispatch(&campaign).await {
        Ok(summary) => {
            state.sessions.clear(admin).await;
            if summary.all_failed() {
                let failed = summary.failed_line().unwrap_or_default();
                Ok(format!("❌ {heading} failed in all {} channels: {failed}", summary.total_count))
            } else {
                Ok(summary.render(heading))
            }
        }
        Err(PromoError::Interrupted { summary, source }) => {
            // some channels already carry the post; a retry would duplicate it
            state.sessions.clear(admin).await;
            tracing::error!(admin = admin.0, error = %source, "campaign interrupted by store failure");
            Ok(render::interrupted(&summary, heading, &source.to_string()))
        }
        Err(PromoError::NoTargets) => {
            drop_pending_content(state, admin).await;
            Ok("No targets selected. Add some with /target @channel ...".to_string())
        }
        Err(err) => {
            drop_pending_content(state, admin).await;
            Err(err.into())
        }
    }
}

async fn drop_pending_content(state: &BotState, admin: AdminId) {
    state.sessions.update(admin, |s| s.custom_content = None).await;
}

/// Content of a message an admin replied to with /post.
pub fn content_of(msg: &Message) -> Option<PromoContent> {
    let caption = msg.caption().map(str::to_string);

    if let Some(MessageOrigin::Channel { chat, message_id, .. }) = msg.forward_origin() {
        return Some(PromoContent::Forward {
            source: SourceRef {
                chat: Target::Id(chat.id.0),
                message: MessageRef(message_id.0),
            },
            fallback_text: msg.text().map(str::to_string).or(caption),
        });
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        let id = photo.file.id.to_string();
        return Some(PromoContent::media(MediaKind::Photo, MediaRef::FileId(id), caption));
    }
    if let Some(video) = msg.video() {
        let id = video.file.id.to_string();
        return Some(PromoContent::media(MediaKind::Video, MediaRef::FileId(id), caption));
    }
    if let Some(document) = msg.document() {
        let id = document.file.id.to_string();
        return Some(PromoContent::media(MediaKind::Document, MediaRef::FileId(id), caption));
    }
    msg.text().map(PromoContent::text)
}

fn parse_campaign_args(args: &str) -> Result<(Category, Option<SubscriberRange>), String> {
    let usage = || {
        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
        let ranges: Vec<&str> = SubscriberRange::ALL.iter().map(|r| r.key()).collect();
        format!(
            "Usage: /campaign <category> [range]\nCategories: {}\nRanges: {}",
            categories.join(", "),
            ranges.join(", ")
        )
    };
    let mut parts = args.split_whitespace();
    let category = parts
        .next()
        .and_then(|c| c.parse::<Category>().ok())
        .ok_or_else(usage)?;
    let range = match parts.next() {
        Some(raw) => Some(raw.parse::<SubscriberRange>().map_err(|_| usage())?),
        None => None,
    };
    if parts.next().is_some() {
        return Err(usage());
    }
    Ok((category, range))
}

/// Whole hours in 1..=MAX_HOURS, returned as seconds.
fn parse_hours(args: &str) -> Result<u64, String> {
    match args.trim().parse::<u64>() {
        Ok(hours) if (1..=MAX_HOURS).contains(&hours) => Ok(hours * 3600),
        _ => Err(format!("Give the duration in whole hours (1-{MAX_HOURS}), e.g. /send 24")),
    }
}

/// One-based page from the user, zero-based page for the listing.
fn parse_page(args: &str) -> Result<usize, String> {
    let raw = args.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    match raw.parse::<usize>() {
        Ok(page) if page >= 1 => Ok(page - 1),
        _ => Err("Usage: /listpromos [page]".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crosspromo_core::app::{AutoDeleteConfig, PromoAppBuilder};
    use crosspromo_core::impls::{DeliveredPayload, InMemoryPromoStore, RecordingTransport};
    use crosspromo_core::ports::FixedClock;
    use rstest::rstest;

    const ADMIN: AdminId = AdminId(10);

    fn state_with(transport: Arc<RecordingTransport>, images: &[&str]) -> BotState {
        state_with_store(Arc::new(InMemoryPromoStore::new()), transport, images)
    }

    fn state_with_store(
        store: Arc<InMemoryPromoStore>,
        transport: Arc<RecordingTransport>,
        images: &[&str],
    ) -> BotState {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()));
        let app = PromoAppBuilder::new()
            .store(store)
            .transport(transport)
            .clock(clock)
            .auto_delete(AutoDeleteConfig::disabled())
            .build()
            .unwrap();
        let sessions = app.sessions(chrono::Duration::minutes(30));
        BotState::new(
            app,
            sessions,
            AdminList::new([ADMIN]),
            "PromoFather".into(),
            Some("promofather_bot".into()),
            images.iter().map(|u| Url::parse(u).unwrap()).collect(),
            false,
        )
    }

    async fn run(state: &BotState, cmd: Command) -> String {
        execute(state, ADMIN, cmd, None).await.unwrap()
    }

    #[rstest]
    #[case("news", Ok((Category::News, None)))]
    #[case("Tech 1k-5k", Ok((Category::Tech, Some(SubscriberRange::From1kTo5k))))]
    #[case("", Err(()))]
    #[case("cooking", Err(()))]
    #[case("news 2k", Err(()))]
    #[case("news 1k-5k extra", Err(()))]
    fn campaign_args(#[case] raw: &str, #[case] expected: Result<(Category, Option<SubscriberRange>), ()>) {
        assert_eq!(parse_campaign_args(raw).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("1", Ok(3600))]
    #[case(" 24 ", Ok(86_400))]
    #[case("0", Err(()))]
    #[case("721", Err(()))]
    #[case("two", Err(()))]
    fn hours(#[case] raw: &str, #[case] expected: Result<u64, ()>) {
        assert_eq!(parse_hours(raw).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("", Ok(0))]
    #[case("1", Ok(0))]
    #[case("3", Ok(2))]
    #[case("0", Err(()))]
    fn pages(#[case] raw: &str, #[case] expected: Result<usize, ()>) {
        assert_eq!(parse_page(raw).map_err(|_| ()), expected);
    }

    #[tokio::test]
    async fn full_template_flow() {
        let transport = Arc::new(RecordingTransport::new());
        let state = state_with(transport.clone(), &["https://example.com/banner.jpg"]);

        run(&state, Command::Campaign("news".into())).await;
        let report = run(&state, Command::Target("@alpha @beta @alpha".into())).await;
        assert!(report.contains("Added: @alpha, @beta"));
        assert!(report.contains("already selected"));

        run(&state, Command::Template("template6".into())).await;
        let reply = run(&state, Command::Send("2".into())).await;
        assert!(reply.starts_with("✅ Promo posted in 2/2 channels!"), "{reply}");
        assert!(state.sessions.get(ADMIN).await.is_none());

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 2);
        assert!(matches!(
            &delivered[0].payload,
            DeliveredPayload::Sent { buttons: Some(rows), .. } if rows.len() == 3
        ));

        let listing = run(&state, Command::Listpromos(String::new())).await;
        assert!(listing.contains("2 total"));
    }

    #[test]
    fn banners_rotate() {
        let state = state_with(
            Arc::new(RecordingTransport::new()),
            &["https://example.com/a.jpg", "https://example.com/b.jpg"],
        );
        let picks: Vec<String> = (0..3).map(|_| state.next_image().unwrap().to_string()).collect();
        assert_eq!(
            picks,
            ["https://example.com/a.jpg", "https://example.com/b.jpg", "https://example.com/a.jpg"]
        );
        assert!(state_with(Arc::new(RecordingTransport::new()), &[]).next_image().is_none());
    }

    #[tokio::test]
    async fn subscriber_range_filters_targets() {
        let transport = Arc::new(RecordingTransport::new());
        transport.set_member_count(Target::Handle("small".into()), 700);
        transport.set_member_count(Target::Handle("big".into()), 20_000);
        let state = state_with(transport, &[]);

        run(&state, Command::Campaign("tech 500-999".into())).await;
        let report = run(&state, Command::Target("@small @big @ghost".into())).await;
        assert!(report.contains("Added: @small"));
        assert!(report.contains("Skipped @big: 20000 subscribers"));
        assert!(report.contains("Skipped @ghost: could not check"));
        assert_eq!(state.sessions.get(ADMIN).await.unwrap().targets.len(), 1);
    }

    #[tokio::test]
    async fn post_requires_reply_and_uses_custom_content() {
        let transport = Arc::new(RecordingTransport::new());
        let state = state_with(transport.clone(), &[]);
        run(&state, Command::Campaign("sports".into())).await;
        run(&state, Command::Target("-1001".into())).await;

        let reply = run(&state, Command::Post("1".into())).await;
        assert!(reply.starts_with("Reply to the message"));

        let reply = execute(&state, ADMIN, Command::Post("1".into()), Some(PromoContent::text("hello")))
            .await
            .unwrap();
        assert!(reply.starts_with("✅ Custom promo posted in 1/1 channels!"));
        assert!(matches!(
            &transport.delivered()[0].payload,
            DeliveredPayload::Sent { body: crosspromo_core::domain::MessageBody::Text(t), .. } if t == "hello"
        ));
    }

    #[tokio::test]
    async fn failed_post_does_not_leak_into_later_send() {
        let transport = Arc::new(RecordingTransport::new());
        let state = state_with(transport.clone(), &[]);
        run(&state, Command::Campaign("news".into())).await;

        let reply = execute(&state, ADMIN, Command::Post("1".into()), Some(PromoContent::text("OLD CUSTOM")))
            .await
            .unwrap();
        assert!(reply.starts_with("No targets selected"));
        assert!(state.sessions.get(ADMIN).await.unwrap().custom_content.is_none());

        run(&state, Command::Target("@alpha".into())).await;
        let reply = run(&state, Command::Send("1".into())).await;
        assert!(reply.starts_with("✅ Promo posted in 1/1 channels!"), "{reply}");
        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(matches!(
            &delivered[0].payload,
            DeliveredPayload::Sent { body: crosspromo_core::domain::MessageBody::Text(t), .. } if t != "OLD CUSTOM"
        ));
    }

    #[tokio::test]
    async fn store_outage_ends_campaign_with_partial_report() {
        let store = Arc::new(InMemoryPromoStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let state = state_with_store(store.clone(), transport.clone(), &[]);
        run(&state, Command::Campaign("movies".into())).await;
        run(&state, Command::Target("@one @two".into())).await;

        store.set_available(false);
        let reply = run(&state, Command::Send("1".into())).await;
        assert!(reply.starts_with("⚠️ Promo stopped early"), "{reply}");
        assert!(reply.contains("0/2"));
        assert!(reply.contains("@one, @two"));
        assert!(state.sessions.get(ADMIN).await.is_none());
        assert_eq!(transport.live_messages(), 0);
    }

    #[tokio::test]
    async fn unknown_template_falls_back_to_standard() {
        let state = state_with(Arc::new(RecordingTransport::new()), &[]);
        run(&state, Command::Campaign("tech".into())).await;
        run(&state, Command::Template("template6".into())).await;

        let reply = run(&state, Command::Template("template99".into())).await;
        assert!(reply.starts_with("Unknown template 'template99', using"), "{reply}");
        assert_eq!(state.sessions.get(ADMIN).await.unwrap().template, PromoTemplate::Standard);

        let listing = run(&state, Command::Template(String::new())).await;
        assert!(listing.starts_with("🎨 Available templates"));
    }

    #[tokio::test]
    async fn delete_then_details_reports_missing() {
        let transport = Arc::new(RecordingTransport::new());
        let state = state_with(transport, &[]);
        run(&state, Command::Campaign("forex".into())).await;
        run(&state, Command::Target("@fx".into())).await;
        run(&state, Command::Send("1".into())).await;

        let id = state.app.listing.page(0).await.unwrap().items[0].record.promo_id;
        let first = run(&state, Command::Deletepromo(id.to_string())).await;
        assert!(first.starts_with("✅ Promo"));
        let second = run(&state, Command::Deletepromo(id.to_string())).await;
        assert!(second.contains("not found"));
        let details = run(&state, Command::Promo(id.to_string())).await;
        assert!(details.contains("not found"));
    }

    #[tokio::test]
    async fn commands_without_session() {
        let state = state_with(Arc::new(RecordingTransport::new()), &[]);
        assert_eq!(run(&state, Command::Send("1".into())).await, render::NO_SESSION);
        assert_eq!(run(&state, Command::Target("@a".into())).await, render::NO_SESSION);
        assert_eq!(run(&state, Command::Cancel).await, "No campaign in progress.");
    }
}
