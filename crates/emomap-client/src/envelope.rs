//! Response envelopes of the REST backend

use emomap_core::{Comment, EmotionAnalysis, EmotionRecord, Page, UserStats};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct EmotionList {
    #[serde(default)]
    pub emotions: Vec<EmotionRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmotionEnvelope {
    pub emotion: EmotionRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentList {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentEnvelope {
    pub comment: Comment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsEnvelope {
    #[serde(default)]
    pub stats: UserStats,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisEnvelope {
    #[serde(default)]
    pub analysis: EmotionAnalysis,
}

/// `{emotions|collections: [...], page, total_pages}`
#[derive(Debug, Deserialize)]
pub(crate) struct PagedList<T> {
    #[serde(alias = "emotions", alias = "collections")]
    pub items: Vec<T>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> PagedList<T> {
    pub fn into_page(self, requested: u32) -> Page<T> {
        Page::new(
            self.items,
            self.page.unwrap_or(requested),
            self.total_pages.unwrap_or(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emomap_core::CollectedEmotion;

    #[test]
    fn test_missing_list_is_empty() {
        let list: EmotionList = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(list.emotions.is_empty());
    }

    #[test]
    fn test_paged_collections() {
        let json = r#"{
            "collections": [{"collection_id": 1, "created_at": "2024-06-01T10:00:00", "emotion": {"id": 3}}],
            "total_pages": 4
        }"#;
        let list: PagedList<CollectedEmotion> = serde_json::from_str(json).unwrap();
        let page = list.into_page(2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 4);
    }
}
