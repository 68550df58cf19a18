//! Viewer identity
//!
//! Passed explicitly to every operation whose output depends on who is looking.

use serde::{Deserialize, Serialize};

/// Signed-in user as known to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Viewer session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    user: Option<SessionUser>,
}

impl SessionContext {
    /// Anonymous viewer
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Signed-in viewer
    pub fn authenticated(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}
