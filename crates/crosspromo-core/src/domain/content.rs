//! Content - 販促投稿の中身と配信プラン
//!
//! PromoContent は「何を送るか」、DeliveryStep は「どの順で試すか」を表す。
//! Dispatcher は delivery_plan() を先頭から試し、最初に成功したものを採用する。

use serde::{Deserialize, Serialize};

use super::promo::{MessageRef, Target};

/// Text used when a forward has to fall back to a plain message.
pub const DEFAULT_FALLBACK_TEXT: &str = "🔗 Check out these channels:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

/// Reference to media the transport can resend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaRef {
    Url(String),
    /// Transport-specific file id of media already uploaded once.
    FileId(String),
}

/// A single message body the transport knows how to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Media {
        kind: MediaKind,
        media: MediaRef,
        caption: Option<String>,
    },
}

/// Existing message to forward verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chat: Target,
    pub message: MessageRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

impl LinkButton {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Rows of URL buttons attached under a post.
pub type ButtonGrid = Vec<Vec<LinkButton>>;

/// What a campaign delivers to every target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoContent {
    Post(MessageBody),
    Forward {
        source: SourceRef,
        fallback_text: Option<String>,
    },
}

/// One delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStep {
    Send { body: MessageBody, with_buttons: bool },
    Forward(SourceRef),
}

impl PromoContent {
    pub fn text(text: impl Into<String>) -> Self {
        PromoContent::Post(MessageBody::Text(text.into()))
    }

    pub fn media(kind: MediaKind, media: MediaRef, caption: Option<String>) -> Self {
        PromoContent::Post(MessageBody::Media {
            kind,
            media,
            caption,
        })
    }

    /// Ordered attempts: primary mode first, plain-text fallback after.
    ///
    /// - media → media + buttons, then caption as text + buttons
    /// - forward → forward (buttons cannot be attached), then fallback text
    /// - text → one attempt
    pub fn delivery_plan(&self) -> Vec<DeliveryStep> {
        match self {
            PromoContent::Post(MessageBody::Text(text)) => vec![DeliveryStep::Send {
                body: MessageBody::Text(text.clone()),
                with_buttons: true,
            }],
            PromoContent::Post(body @ MessageBody::Media { caption, .. }) => vec![
                DeliveryStep::Send {
                    body: body.clone(),
                    with_buttons: true,
                },
                DeliveryStep::Send {
                    body: MessageBody::Text(
                        caption
                            .clone()
                            .filter(|c| !c.trim().is_empty())
                            .unwrap_or_else(|| DEFAULT_FALLBACK_TEXT.to_string()),
                    ),
                    with_buttons: true,
                },
            ],
            PromoContent::Forward {
                source,
                fallback_text,
            } => vec![
                DeliveryStep::Forward(source.clone()),
                DeliveryStep::Send {
                    body: MessageBody::Text(
                        fallback_text
                            .clone()
                            .unwrap_or_else(|| DEFAULT_FALLBACK_TEXT.to_string()),
                    ),
                    with_buttons: false,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_has_single_step() {
        let plan = PromoContent::text("hi").delivery_plan();
        assert_eq!(
            plan,
            vec![DeliveryStep::Send {
                body: MessageBody::Text("hi".into()),
                with_buttons: true
            }]
        );
    }

    #[test]
    fn media_falls_back_to_caption_text() {
        let content = PromoContent::media(
            MediaKind::Photo,
            MediaRef::Url("https://example.com/a.jpg".into()),
            Some("join us".into()),
        );
        let plan = content.delivery_plan();
        assert_eq!(plan.len(), 2);
        assert!(matches!(
            &plan[0],
            DeliveryStep::Send { body: MessageBody::Media { kind: MediaKind::Photo, .. }, with_buttons: true }
        ));
        assert_eq!(
            plan[1],
            DeliveryStep::Send {
                body: MessageBody::Text("join us".into()),
                with_buttons: true
            }
        );
    }

    #[test]
    fn media_without_caption_falls_back_to_default_text() {
        let content = PromoContent::media(MediaKind::Video, MediaRef::FileId("f1".into()), None);
        let plan = content.delivery_plan();
        assert_eq!(
            plan[1],
            DeliveryStep::Send {
                body: MessageBody::Text(DEFAULT_FALLBACK_TEXT.into()),
                with_buttons: true
            }
        );
    }

    #[test]
    fn forward_fallback_has_no_buttons() {
        let source = SourceRef {
            chat: Target::Id(-100),
            message: MessageRef(7),
        };
        let content = PromoContent::Forward {
            source: source.clone(),
            fallback_text: None,
        };
        let plan = content.delivery_plan();
        assert_eq!(plan[0], DeliveryStep::Forward(source));
        assert!(matches!(&plan[1], DeliveryStep::Send { with_buttons: false, .. }));
    }
}
