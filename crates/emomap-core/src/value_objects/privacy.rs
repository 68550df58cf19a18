//! Visibility setting of an emotion record

use serde::{Deserialize, Serialize};

/// Who may read an emotion's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
}

impl Privacy {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Self::Public
        } else {
            Self::Private
        }
    }

    #[inline]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}
