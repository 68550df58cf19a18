//! Comment entity

use serde::{Deserialize, Serialize};

use crate::value_objects::{CommentId, Timestamp};

/// Nested author object the backend attaches to emotions and comments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Author {
    /// Display name, falling back to the login name
    pub fn name(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.username.as_deref())
    }
}

/// Comment on an emotion record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "user_avatar")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "content")]
    pub comment_text: String,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub user: Option<Author>,
}

impl Comment {
    /// Author name, looking into the nested author object as a fallback
    pub fn author(&self) -> &str {
        self.username
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(Author::name))
            .unwrap_or("匿名用户")
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar_url
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.avatar_url.as_deref()))
    }

    /// Reflect a confirmed like/unlike
    pub fn set_liked(&mut self, liked: bool) {
        if liked == self.is_liked {
            return;
        }
        self.is_liked = liked;
        self.likes_count = if liked {
            self.likes_count.saturating_add(1)
        } else {
            self.likes_count.saturating_sub(1)
        };
    }
}
