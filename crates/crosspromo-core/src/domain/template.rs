//! Template - 組み込みの販促テンプレート（本文とボタン）
//!
//! 純粋な整形処理のみ。状態は持たない。

use std::fmt;
use std::str::FromStr;

use super::campaign::{CampaignTarget, Category, UnknownKey};
use super::content::{ButtonGrid, LinkButton};

const GRID_SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━";
const BUTTON_ICONS: [&str; 12] = [
    "📺", "📢", "🌟", "🔥", "💎", "🚀", "🎯", "📰", "🎬", "⚽", "💻", "💸",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromoTemplate {
    #[default]
    Standard,
    Viral,
    Premium,
    Direct,
    Community,
    Grid,
}

impl PromoTemplate {
    pub const ALL: [PromoTemplate; 6] = [
        PromoTemplate::Standard,
        PromoTemplate::Viral,
        PromoTemplate::Premium,
        PromoTemplate::Direct,
        PromoTemplate::Community,
        PromoTemplate::Grid,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PromoTemplate::Standard => "template1",
            PromoTemplate::Viral => "template2",
            PromoTemplate::Premium => "template3",
            PromoTemplate::Direct => "template4",
            PromoTemplate::Community => "template5",
            PromoTemplate::Grid => "template6",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PromoTemplate::Standard => "🚀 Standard Promo",
            PromoTemplate::Viral => "🔥 Viral Style",
            PromoTemplate::Premium => "💎 Premium Look",
            PromoTemplate::Direct => "🎯 Direct Call",
            PromoTemplate::Community => "🌟 Community Focus",
            PromoTemplate::Grid => "📱 Grid Style Promo",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PromoTemplate::Standard => "Clean and professional",
            PromoTemplate::Viral => "Eye-catching and engaging",
            PromoTemplate::Premium => "Elegant and sophisticated",
            PromoTemplate::Direct => "Action-oriented and direct",
            PromoTemplate::Community => "Friendly and community-driven",
            PromoTemplate::Grid => "Modern grid layout with channel pairs",
        }
    }

    /// Unknown ids fall back to Standard.
    pub fn from_id_or_default(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }

    pub fn render_text(self, channels: &[CampaignTarget], category: Option<Category>, bot_name: &str) -> String {
        let heading = category
            .map(|c| format!("{}\n\n", c.display_name()))
            .unwrap_or_default();
        let body = match self {
            PromoTemplate::Grid => return render_grid(channels, bot_name),
            PromoTemplate::Standard => {
                "🎯 JOIN THESE CHANNELS NOW! 🎯\n\n\
                 Stop scrolling and start engaging with these amazing communities!\n\n"
            }
            PromoTemplate::Viral => {
                "🔥 EVERYONE IS JOINING THESE! 🔥\n\n\
                 The channels people can't stop talking about, all in one place.\n\n"
            }
            PromoTemplate::Premium => {
                "💎 A Curated Selection 💎\n\n\
                 Hand-picked communities worth your time.\n\n"
            }
            PromoTemplate::Direct => {
                "👇 TAP. JOIN. DONE. 👇\n\n\
                 These channels are one click away.\n\n"
            }
            PromoTemplate::Community => {
                "🌟 Meet Our Community 🌟\n\n\
                 Friendly channels run by people who care about their readers.\n\n"
            }
        };
        format!(
            "{heading}{body}⏰ Limited time opportunity!\n🚀 Join these channels RIGHT NOW!\n\n💪 *Made by {bot_name}*"
        )
    }

    /// Link buttons for the post, always ending with an "Add Your Channel" row
    /// when the bot username is known. Channels without a public handle get no button.
    pub fn render_buttons(self, channels: &[CampaignTarget], bot_username: Option<&str>) -> Option<ButtonGrid> {
        let linkable = channels
            .iter()
            .filter_map(|c| c.target.handle().map(|h| (c, h)));

        let mut rows: ButtonGrid = match self {
            PromoTemplate::Grid => linkable
                .map(|(_, handle)| vec![LinkButton::new("@𝗝𝗼𝗶𝗻 𝗡𝗼𝘄", channel_url(handle))])
                .collect(),
            _ => {
                let buttons: Vec<LinkButton> = linkable
                    .enumerate()
                    .map(|(i, (channel, handle))| {
                        let icon = BUTTON_ICONS[i % BUTTON_ICONS.len()];
                        LinkButton::new(format!("{icon} {}", channel.display_name()), channel_url(handle))
                    })
                    .collect();
                buttons.chunks(2).map(|pair| pair.to_vec()).collect()
            }
        };

        if let Some(bot) = bot_username {
            rows.push(vec![LinkButton::new("➕ Add Your Channel", channel_url(bot))]);
        }

        if rows.is_empty() { None } else { Some(rows) }
    }
}

impl fmt::Display for PromoTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PromoTemplate {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromoTemplate::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKey {
                what: "template",
                value: s.to_string(),
            })
    }
}

fn channel_url(handle: &str) -> String {
    format!("https://t.me/{handle}")
}

fn shorten(title: &str) -> String {
    if title.chars().count() > 15 {
        let head: String = title.chars().take(12).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

fn render_grid(channels: &[CampaignTarget], bot_name: &str) -> String {
    let mut message = format!("📜 𝗔𝗽𝗽 𝗛𝗮𝗰𝗸𝗶𝗻𝗴  ✅ 𝗣𝗿𝗲𝗺𝗶𝘂𝗺 𝗠𝗼𝗱𝘀 📜\n{GRID_SEPARATOR}\n\n");
    for pair in channels.chunks(2) {
        match pair {
            [a, b] => {
                message.push_str(&format!(
                    "🆕️ {}    ⭐️ {}\n👉 @𝗝𝗼𝗶𝗻 𝗡𝗼𝘄            👉  @𝗝𝗼𝗶𝗻 𝗡𝗼𝘄 \n{GRID_SEPARATOR}\n\n",
                    shorten(&a.display_name()),
                    shorten(&b.display_name()),
                ));
            }
            [a] => {
                message.push_str(&format!(
                    "🆕️ {}\n👉 @𝗝𝗼𝗶𝗻 𝗡𝗼𝘄 \n{GRID_SEPARATOR}\n\n",
                    shorten(&a.display_name()),
                ));
            }
            _ => {}
        }
    }
    message.push_str(&format!("💪 *Made by {bot_name}*"));
    message
}
