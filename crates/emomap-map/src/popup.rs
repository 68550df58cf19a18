//! Popup content selection
//!
//! What a marker popup reveals depends on who is looking and on the record's
//! privacy. The decision is a pure function over a [`SessionContext`]; HTML is
//! only a projection of the resulting descriptor.

use chrono::{DateTime, Utc};
use emomap_core::{EmotionId, EmotionRecord, SessionContext};
use maud::{html, Markup};

use crate::marker::visual_for;

pub const LOGIN_PROMPT: &str = "🔒 请先登录后查看详细内容";
pub const PRIVATE_NOTICE: &str = "🔒 这是一条私密分享，仅在地图上显示位置";
pub const DETAIL_LABEL: &str = "查看详情";

/// Glyph, name and age shared by every popup variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupHeader {
    pub glyph: String,
    pub name: &'static str,
    pub relative_time: String,
}

/// Popup descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupContent {
    /// Anonymous viewer: header and a sign-in prompt
    LoginRequired { header: PopupHeader },
    /// Private record: header and the location-only notice
    Private { header: PopupHeader },
    /// Everything a signed-in viewer may see
    Full {
        header: PopupHeader,
        text: Option<String>,
        likes: u32,
        comments: u32,
        collections: u32,
        detail_url: String,
    },
}

impl PopupContent {
    pub fn header(&self) -> &PopupHeader {
        match self {
            Self::LoginRequired { header } | Self::Private { header } | Self::Full { header, .. } => {
                header
            }
        }
    }

    /// Record text shown, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Full { text, .. } => text.as_deref(),
            _ => None,
        }
    }

    pub fn reveals_details(&self) -> bool {
        matches!(self, Self::Full { .. })
    }

    /// HTML fragment for the popup; every dynamic value is escaped
    pub fn to_html(&self) -> String {
        self.markup().into_string()
    }

    pub fn markup(&self) -> Markup {
        let header = self.header();
        let class = match self {
            Self::LoginRequired { .. } => "emotion-popup login-required",
            Self::Private { .. } => "emotion-popup private",
            Self::Full { .. } => "emotion-popup",
        };

        html! {
            div class=(class) {
                div class="emotion-header" {
                    span class="emotion-emoji" { (header.glyph) }
                    div class="emotion-info" {
                        h3 { (header.name) }
                        p class="emotion-time" { (header.relative_time) }
                    }
                }
                @match self {
                    Self::LoginRequired { .. } => {
                        div class="login-prompt" { p { (LOGIN_PROMPT) } }
                    }
                    Self::Private { .. } => {
                        div class="private-message" { p { (PRIVATE_NOTICE) } }
                    }
                    Self::Full { text, likes, comments, collections, detail_url, .. } => {
                        @if let Some(text) = text {
                            div class="emotion-text" { (text) }
                        }
                        div class="emotion-stats" {
                            span class="stat" { "❤️ " (likes) }
                            span class="stat" { "💬 " (comments) }
                            span class="stat" { "⭐ " (collections) }
                        }
                        div class="popup-actions" {
                            a class="btn btn-sm" href=(detail_url) { (DETAIL_LABEL) }
                        }
                    }
                }
            }
        }
    }
}

/// Link to the detail page of an emotion
pub fn detail_url(id: EmotionId) -> String {
    format!("/emotion/{id}")
}

/// Decide what the popup of `record` shows to `session`
pub fn select_content(
    record: &EmotionRecord,
    session: &SessionContext,
    now: DateTime<Utc>,
) -> PopupContent {
    let visual = visual_for(&record.emotion_type, record.custom_emoji.as_deref());
    let header = PopupHeader {
        glyph: visual.glyph,
        name: visual.name,
        relative_time: record.created_at.relative_to(now),
    };

    if !session.is_authenticated() {
        return PopupContent::LoginRequired { header };
    }
    if !record.is_publicly_visible() {
        return PopupContent::Private { header };
    }

    PopupContent::Full {
        header,
        text: record.text().map(str::to_string),
        likes: record.likes_count,
        comments: record.comments_count,
        collections: record.collections_count,
        detail_url: detail_url(record.id),
    }
}
