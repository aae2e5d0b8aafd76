//! 管理者向けの返信文（プレーンテキスト）
//!
//! core の構造化された結果から文字列を組み立てるだけの純粋関数。

use std::fmt::Write as _;

use crosspromo_core::app::PromoStats;
use crosspromo_core::domain::outcome::humanize_seconds;
use crosspromo_core::domain::{
    CampaignSelection, DispatchSummary, ManualDeleteOutcome, PromoPage, PromoRecord, PromoTemplate, PromoView,
    TransportDeletion,
};

pub const NOT_ADMIN: &str = "⛔ This command is for administrators only.";
pub const NO_SESSION: &str = "No campaign in progress. Start one with /campaign <category> [range].";

/// "2d 3h", "1h 05m", "4m", "expired"
pub fn remaining(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired".to_string();
    }
    let (days, rest) = (seconds / 86_400, seconds % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let minutes = rest / 60;
    match (days, hours) {
        (d, h) if d > 0 => format!("{d}d {h}h"),
        (_, h) if h > 0 => format!("{h}h {minutes:02}m"),
        _ if minutes > 0 => format!("{minutes}m"),
        _ => format!("{seconds}s"),
    }
}

pub fn selection(sel: &CampaignSelection) -> String {
    let mut text = format!("📣 Campaign: {}\n", sel.category.display_name());
    if let Some(range) = sel.subscriber_range {
        let _ = writeln!(text, "👥 Subscribers: {}", range.display_name());
    }
    let _ = writeln!(text, "🎨 Template: {} ({})", sel.template.name(), sel.template.id());
    if sel.targets.is_empty() {
        text.push_str("🎯 Targets: none yet. Add some with /target @channel ...\n");
    } else {
        let _ = writeln!(text, "🎯 Targets ({}):", sel.targets.len());
        for target in &sel.targets {
            let _ = writeln!(text, "  • {}", target.display_name());
        }
    }
    if sel.custom_content.is_some() {
        text.push_str("📝 Custom content attached.\n");
    }
    text.push_str("\nSend with /send <hours>, or reply to a message with /post <hours>.");
    text
}

pub fn templates(current: Option<PromoTemplate>) -> String {
    let mut text = String::from("🎨 Available templates:\n\n");
    for template in PromoTemplate::ALL {
        let marker = if Some(template) == current { "✅" } else { "▫️" };
        let _ = writeln!(
            text,
            "{marker} {} · {}\n    {}",
            template.id(),
            template.name(),
            template.description()
        );
    }
    text.push_str("\nChoose with /template <id>.");
    text
}

pub fn target_report(added: &[String], skipped: &[(String, String)], total: usize) -> String {
    let mut text = String::new();
    if !added.is_empty() {
        let _ = writeln!(text, "✅ Added: {}", added.join(", "));
    }
    for (name, reason) in skipped {
        let _ = writeln!(text, "⚠️ Skipped {name}: {reason}");
    }
    let _ = write!(text, "🎯 {total} target(s) selected.");
    text
}

pub fn promo_page(page: &PromoPage) -> String {
    if page.total == 0 {
        return "📭 No active promos.".to_string();
    }
    if page.items.is_empty() {
        return format!("No promos on page {}. There are {} page(s).", page.page + 1, page.total_pages);
    }

    let mut text = format!(
        "📋 Active promos ({} total), page {}/{}\n\n",
        page.total,
        page.page + 1,
        page.total_pages
    );
    for (i, view) in page.items.iter().enumerate() {
        let n = page.page * crosspromo_core::app::PAGE_SIZE + i + 1;
        let _ = writeln!(
            text,
            "{n}. {}\n   📍 {} · ⏰ {}",
            view.record.promo_id,
            view.record.target,
            remaining(view.remaining_seconds)
        );
    }
    if page.has_next() {
        let _ = write!(text, "\nNext: /listpromos {}", page.page + 2);
    }
    text
}

pub fn promo_details(view: &PromoView) -> String {
    let record = &view.record;
    let status = if view.expired {
        "⌛ Expired, awaiting cleanup"
    } else {
        "🟢 Active"
    };
    format!(
        "📋 {}\n\n📍 Channel: {}\n✉️ Message: {}\n🕐 Posted: {}\n⏳ Duration: {}\n⏰ Expires: {}\n⌛ Remaining: {}\n{status}",
        record.promo_id,
        record.target,
        record.message_ref,
        record.created_at.format("%Y-%m-%d %H:%M UTC"),
        humanize_seconds(record.duration_seconds),
        view.expires_at.format("%Y-%m-%d %H:%M UTC"),
        remaining(view.remaining_seconds),
    )
}

pub fn manual_delete(outcome: &ManualDeleteOutcome) -> String {
    match outcome {
        ManualDeleteOutcome::Deleted {
            promo_id,
            target,
            message_ref,
            transport,
        } => {
            let note = match transport {
                TransportDeletion::Deleted => String::new(),
                TransportDeletion::AlreadyGone => "\nℹ️ The message was already gone from the channel.".to_string(),
                TransportDeletion::Failed(reason) => {
                    format!("\n⚠️ Could not delete the channel message ({reason}); the record was removed anyway.")
                }
            };
            format!("✅ Promo {promo_id} deleted from {target} (message {message_ref}).{note}")
        }
        ManualDeleteOutcome::NotFound { promo_id } => {
            format!("❌ Promo {promo_id} not found. It may have already been deleted.")
        }
    }
}

pub fn stats(stats: &PromoStats, sessions: usize, admins: usize, auto_delete: bool) -> String {
    format!(
        "📊 Bot statistics\n\n📋 Live promos: {}\n⌛ Awaiting cleanup: {}\n📝 Campaigns in progress: {}\n👮 Admins: {}\n🗑 Auto-delete: {}",
        stats.live,
        stats.awaiting_expiry,
        sessions,
        admins,
        if auto_delete { "on" } else { "off" },
    )
}

/// Reply when the store failed partway through a campaign.
pub fn interrupted(summary: &DispatchSummary, heading: &str, reason: &str) -> String {
    let mut text = format!(
        "⚠️ {heading} stopped early: {reason}\n📤 Posted in {}/{} channels.\n",
        summary.success_count, summary.total_count
    );
    if !summary.created.is_empty() {
        let _ = writeln!(text, "⏰ Those posts still auto-delete after {}.", humanize_seconds(summary.duration_seconds));
    }
    if let Some(failed) = summary.failed_line() {
        let _ = write!(text, "❌ Not posted: {failed}");
    }
    text
}

pub fn expiry_notice(record: &PromoRecord) -> String {
    format!(
        "🗑 Promo expired and was removed.\n\n📋 {}\n📍 {}\n✉️ Message {}\n⏳ Ran for {}",
        record.promo_id,
        record.target,
        record.message_ref,
        humanize_seconds(record.duration_seconds),
    )
}
