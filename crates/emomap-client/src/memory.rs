//! In-process backend
//!
//! Behaves like the REST backend closely enough for page controllers and the
//! map to be driven without a network: ownership, privacy, per-viewer
//! like/collect state and paging all follow the HTTP contract.

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use emomap_core::{
    ApiResult, CollectedEmotion, Comment, CommentId, DomainError, EmotionAnalysis, EmotionApi,
    EmotionId, EmotionKind, EmotionRecord, EmotionUpdate, NewComment, NewEmotion, Page, Privacy,
    SessionUser, Timestamp, ToggleOutcome, UserStats,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
struct Store {
    emotions: Vec<EmotionRecord>,
    owned: HashSet<EmotionId>,
    liked: HashSet<EmotionId>,
    collected: Vec<(EmotionId, Timestamp)>,
    comments: HashMap<EmotionId, Vec<Comment>>,
    liked_comments: HashSet<CommentId>,
    next_emotion_id: i64,
    next_comment_id: i64,
    viewer: Option<SessionUser>,
}

impl Store {
    fn find(&self, id: EmotionId) -> ApiResult<&EmotionRecord> {
        self.emotions
            .iter()
            .find(|e| e.id == id)
            .ok_or(DomainError::EmotionNotFound(id))
    }

    fn find_mut(&mut self, id: EmotionId) -> ApiResult<&mut EmotionRecord> {
        self.emotions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DomainError::EmotionNotFound(id))
    }

    fn require_viewer(&self) -> ApiResult<&SessionUser> {
        self.viewer
            .as_ref()
            .ok_or_else(|| DomainError::Unauthorized("需要登录".to_string()))
    }

    fn readable(&self, id: EmotionId) -> ApiResult<&EmotionRecord> {
        let record = self.find(id)?;
        if !record.is_publicly_visible() && !self.owned.contains(&id) {
            return Err(DomainError::Forbidden("无权查看此情绪".to_string()));
        }
        Ok(record)
    }

    fn require_owner(&self, id: EmotionId) -> ApiResult<()> {
        self.require_viewer()?;
        self.find(id)?;
        if self.owned.contains(&id) {
            Ok(())
        } else {
            Err(DomainError::Forbidden("无权修改此情绪".to_string()))
        }
    }

    /// Record with viewer-relative flags filled in
    fn decorated(&self, record: &EmotionRecord) -> EmotionRecord {
        let mut copy = record.clone();
        copy.is_liked = self.liked.contains(&record.id);
        copy.is_collected = self.collected.iter().any(|(id, _)| *id == record.id);
        copy
    }

    fn mine(&self) -> Vec<&EmotionRecord> {
        let mut mine: Vec<&EmotionRecord> = self
            .emotions
            .iter()
            .filter(|e| self.owned.contains(&e.id))
            .collect();
        mine.sort_by(|a, b| b.created_at.parsed().cmp(&a.created_at.parsed()));
        mine
    }
}

/// `EmotionApi` backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryEmotionApi {
    store: Mutex<Store>,
    offline: AtomicBool,
    list_calls: AtomicUsize,
}

impl InMemoryEmotionApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with records owned by somebody else
    pub fn with_emotions(records: impl IntoIterator<Item = EmotionRecord>) -> Self {
        let api = Self::new();
        for record in records {
            api.insert(record, false);
        }
        api
    }

    /// Add a record; `owned` marks it as authored by the viewer
    pub fn insert(&self, record: EmotionRecord, owned: bool) {
        let mut store = self.store.lock();
        store.next_emotion_id = store.next_emotion_id.max(record.id.into_inner());
        if owned {
            store.owned.insert(record.id);
        }
        store.emotions.push(record);
    }

    /// Switch the signed-in viewer
    pub fn sign_in(&self, user: Option<SessionUser>) {
        self.store.lock().viewer = user;
    }

    /// Make every call fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `list_emotions` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn emotion_count(&self) -> usize {
        self.store.lock().emotions.len()
    }

    fn online(&self) -> ApiResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DomainError::Network("backend unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn set_like(&self, id: EmotionId, on: bool) -> ApiResult<ToggleOutcome> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_viewer()?;
        store.readable(id)?;
        let changed = if on {
            store.liked.insert(id)
        } else {
            store.liked.remove(&id)
        };
        let record = store.find_mut(id)?;
        if changed {
            record.likes_count = if on {
                record.likes_count.saturating_add(1)
            } else {
                record.likes_count.saturating_sub(1)
            };
        }
        Ok(ToggleOutcome {
            action: Some(if on { "liked" } else { "unliked" }.to_string()),
            count: Some(record.likes_count),
        })
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let limit = limit.max(1) as usize;
    let total_pages = items.len().div_ceil(limit).max(1) as u32;
    let page = page.max(1);
    let start = (page as usize - 1) * limit;
    let slice = items.iter().skip(start).take(limit).cloned().collect();
    Page::new(slice, page, total_pages)
}

#[async_trait]
impl EmotionApi for InMemoryEmotionApi {
    async fn list_emotions(&self) -> ApiResult<Vec<EmotionRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.online()?;
        let store = self.store.lock();
        Ok(store.emotions.iter().map(|e| store.decorated(e)).collect())
    }

    async fn get_emotion(&self, id: EmotionId) -> ApiResult<EmotionRecord> {
        self.online()?;
        let store = self.store.lock();
        let record = store.readable(id)?;
        Ok(store.decorated(record))
    }

    async fn create_emotion(&self, request: &NewEmotion) -> ApiResult<EmotionRecord> {
        self.online()?;
        let mut store = self.store.lock();
        let username = store.require_viewer()?.username.clone();
        store.next_emotion_id += 1;

        let mut record = EmotionRecord::new(
            EmotionId::new(store.next_emotion_id),
            request.emotion_type,
            Timestamp::from(Utc::now()),
        )
        .at(request.position());
        record.custom_emoji.clone_from(&request.custom_emoji);
        record.emotion_text = Some(request.emotion_text.clone()).filter(|t| !t.is_empty());
        record.intensity = Some(request.intensity);
        record.is_public = request.privacy_setting.is_public();
        record.privacy_setting = Some(request.privacy_setting);
        record.allow_collection = request.allow_collection;
        record.username = Some(username);

        debug!(id = %record.id, "Stored new emotion");
        store.owned.insert(record.id);
        store.emotions.push(record.clone());
        Ok(record)
    }

    async fn update_emotion(&self, id: EmotionId, update: &EmotionUpdate) -> ApiResult<()> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_owner(id)?;
        let record = store.find_mut(id)?;
        if let Some(kind) = update.emotion_type {
            record.emotion_type = EmotionKind::from(kind);
        }
        if let Some(text) = &update.emotion_text {
            record.emotion_text = Some(text.clone());
        }
        if let Some(privacy) = update.privacy_setting {
            record.privacy_setting = Some(privacy);
            record.is_public = privacy.is_public();
        }
        if let Some(allow) = update.allow_collection {
            record.allow_collection = allow;
        }
        if record.privacy_setting == Some(Privacy::Private) {
            record.allow_collection = false;
        }
        Ok(())
    }

    async fn delete_emotion(&self, id: EmotionId) -> ApiResult<()> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_owner(id)?;
        store.emotions.retain(|e| e.id != id);
        store.owned.remove(&id);
        store.collected.retain(|(cid, _)| *cid != id);
        store.comments.remove(&id);
        Ok(())
    }

    async fn like_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.set_like(id, true)
    }

    async fn unlike_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.set_like(id, false)
    }

    async fn collect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_viewer()?;
        if !store.readable(id)?.allow_collection {
            return Err(DomainError::Forbidden("无权收藏此情绪".to_string()));
        }
        let already = store.collected.iter().any(|(cid, _)| *cid == id);
        if !already {
            store.collected.push((id, Timestamp::from(Utc::now())));
        }
        let record = store.find_mut(id)?;
        if !already {
            record.collections_count = record.collections_count.saturating_add(1);
        }
        Ok(ToggleOutcome {
            action: Some("collected".to_string()),
            count: Some(record.collections_count),
        })
    }

    async fn uncollect_emotion(&self, id: EmotionId) -> ApiResult<ToggleOutcome> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_viewer()?;
        let before = store.collected.len();
        store.collected.retain(|(cid, _)| *cid != id);
        let removed = store.collected.len() != before;
        let count = match store.find_mut(id) {
            Ok(record) => {
                if removed {
                    record.collections_count = record.collections_count.saturating_sub(1);
                }
                Some(record.collections_count)
            }
            Err(_) => None,
        };
        Ok(ToggleOutcome {
            action: Some("uncollected".to_string()),
            count,
        })
    }

    async fn list_comments(&self, id: EmotionId) -> ApiResult<Vec<Comment>> {
        self.online()?;
        let store = self.store.lock();
        store.readable(id)?;
        let comments = store.comments.get(&id).cloned().unwrap_or_default();
        Ok(comments
            .into_iter()
            .map(|mut c| {
                c.is_liked = store.liked_comments.contains(&c.id);
                c
            })
            .collect())
    }

    async fn create_comment(&self, id: EmotionId, request: &NewComment) -> ApiResult<Comment> {
        self.online()?;
        let mut store = self.store.lock();
        let username = store.require_viewer()?.username.clone();
        store.readable(id)?;
        store.next_comment_id += 1;
        let comment = Comment {
            id: CommentId::new(store.next_comment_id),
            username: Some(username),
            avatar_url: None,
            comment_text: request.comment_text.clone(),
            created_at: Timestamp::from(Utc::now()),
            likes_count: 0,
            is_liked: false,
            user: None,
        };
        store.comments.entry(id).or_default().push(comment.clone());
        let record = store.find_mut(id)?;
        record.comments_count = record.comments_count.saturating_add(1);
        Ok(comment)
    }

    async fn like_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_viewer()?;
        let newly = store.liked_comments.insert(id);
        let comment = store
            .comments
            .values_mut()
            .flatten()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::NotFound("评论不存在".to_string()))?;
        if newly {
            comment.likes_count = comment.likes_count.saturating_add(1);
        }
        Ok(ToggleOutcome {
            action: Some("liked".to_string()),
            count: Some(comment.likes_count),
        })
    }

    async fn unlike_comment(&self, id: CommentId) -> ApiResult<ToggleOutcome> {
        self.online()?;
        let mut store = self.store.lock();
        store.require_viewer()?;
        let removed = store.liked_comments.remove(&id);
        let comment = store
            .comments
            .values_mut()
            .flatten()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::NotFound("评论不存在".to_string()))?;
        if removed {
            comment.likes_count = comment.likes_count.saturating_sub(1);
        }
        Ok(ToggleOutcome {
            action: Some("unliked".to_string()),
            count: Some(comment.likes_count),
        })
    }

    async fn user_stats(&self) -> ApiResult<UserStats> {
        self.online()?;
        let store = self.store.lock();
        store.require_viewer()?;
        let mine = store.mine();
        Ok(UserStats {
            emotions_count: mine.len() as u32,
            total_likes: mine.iter().map(|e| e.likes_count).sum(),
            total_collections: mine.iter().map(|e| e.collections_count).sum(),
        })
    }

    async fn user_emotions(&self, page: u32, limit: u32) -> ApiResult<Page<EmotionRecord>> {
        self.online()?;
        let store = self.store.lock();
        store.require_viewer()?;
        let mine: Vec<EmotionRecord> = store.mine().into_iter().map(|e| store.decorated(e)).collect();
        Ok(paginate(&mine, page, limit))
    }

    async fn user_collections(&self, page: u32, limit: u32) -> ApiResult<Page<CollectedEmotion>> {
        self.online()?;
        let store = self.store.lock();
        store.require_viewer()?;
        let items: Vec<CollectedEmotion> = store
            .collected
            .iter()
            .rev()
            .filter_map(|(id, at)| {
                let record = store.find(*id).ok()?;
                Some(CollectedEmotion {
                    collection_id: Some(id.into_inner()),
                    collected_at: at.clone(),
                    emotion: store.decorated(record),
                })
            })
            .collect();
        Ok(paginate(&items, page, limit))
    }

    async fn emotion_analysis(&self) -> ApiResult<EmotionAnalysis> {
        self.online()?;
        let store = self.store.lock();
        store.require_viewer()?;
        let mine = store.mine();
        if mine.is_empty() {
            return Ok(EmotionAnalysis::default());
        }

        let mut distribution: BTreeMap<String, u32> = BTreeMap::new();
        let mut hours = [0u32; 24];
        for record in &mine {
            *distribution
                .entry(record.emotion_type.as_str().to_string())
                .or_default() += 1;
            if let Some(at) = record.created_at.parsed() {
                hours[at.hour() as usize] += 1;
            }
        }

        let most_common_emotion = distribution
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(label, _)| EmotionKind::from(label.as_str()));
        let most_active_hour = hours
            .iter()
            .enumerate()
            .max_by_key(|(_, count)| **count)
            .map(|(hour, _)| hour as u8);

        let dates: Vec<_> = mine.iter().filter_map(|e| e.created_at.parsed()).collect();
        let span_days = match (dates.iter().min(), dates.iter().max()) {
            (Some(first), Some(last)) => (*last - *first).num_days() + 1,
            _ => 1,
        };

        Ok(EmotionAnalysis {
            emotion_distribution: distribution,
            most_common_emotion,
            most_active_hour,
            daily_average: Some(mine.len() as f64 / span_days as f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emomap_core::{EmotionType, LatLng};

    fn viewer() -> SessionUser {
        SessionUser {
            id: 1,
            username: "alice".to_string(),
        }
    }

    fn record(id: i64, kind: EmotionType) -> EmotionRecord {
        EmotionRecord::new(EmotionId::new(id), kind, Timestamp::from(Utc::now()))
            .at(LatLng::new(39.9, 116.4))
    }

    #[tokio::test]
    async fn test_create_requires_sign_in() {
        let api = InMemoryEmotionApi::new();
        let request = NewEmotion::new(EmotionType::Happy, LatLng::FALLBACK);
        let err = api.create_emotion(&request).await.unwrap_err();
        assert!(err.is_authorization());

        api.sign_in(Some(viewer()));
        let created = api.create_emotion(&request).await.unwrap();
        assert_eq!(created.username.as_deref(), Some("alice"));
        assert_eq!(api.emotion_count(), 1);
    }

    #[tokio::test]
    async fn test_new_ids_follow_seeded_ones() {
        let api = InMemoryEmotionApi::with_emotions([record(7, EmotionType::Sad)]);
        api.sign_in(Some(viewer()));
        let created = api
            .create_emotion(&NewEmotion::new(EmotionType::Calm, LatLng::FALLBACK))
            .await
            .unwrap();
        assert_eq!(created.id, EmotionId::new(8));
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let api = InMemoryEmotionApi::with_emotions([record(1, EmotionType::Happy)]);
        api.sign_in(Some(viewer()));
        api.like_emotion(EmotionId::new(1)).await.unwrap();
        let outcome = api.like_emotion(EmotionId::new(1)).await.unwrap();
        assert_eq!(outcome.count, Some(1));

        let fetched = api.get_emotion(EmotionId::new(1)).await.unwrap();
        assert!(fetched.is_liked);
    }

    #[tokio::test]
    async fn test_uncollect_missing_entry_succeeds() {
        let api = InMemoryEmotionApi::with_emotions([record(1, EmotionType::Happy)]);
        api.sign_in(Some(viewer()));
        let outcome = api.uncollect_emotion(EmotionId::new(1)).await.unwrap();
        assert_eq!(outcome.is_active(), Some(false));
        assert_eq!(outcome.count, Some(0));
    }

    #[tokio::test]
    async fn test_private_record_is_forbidden_to_others() {
        let mut private = record(2, EmotionType::Lonely);
        private.is_public = false;
        let api = InMemoryEmotionApi::with_emotions([private]);
        let err = api.get_emotion(EmotionId::new(2)).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_offline_mode() {
        let api = InMemoryEmotionApi::new();
        api.set_offline(true);
        let err = api.list_emotions().await.unwrap_err();
        assert!(matches!(err, DomainError::Network(_)));
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_profile_paging_and_analysis() {
        let api = InMemoryEmotionApi::new();
        api.sign_in(Some(viewer()));
        for _ in 0..12 {
            api.create_emotion(&NewEmotion::new(EmotionType::Happy, LatLng::FALLBACK))
                .await
                .unwrap();
        }
        api.create_emotion(&NewEmotion::new(EmotionType::Sad, LatLng::FALLBACK))
            .await
            .unwrap();

        let first = api.user_emotions(1, 10).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);
        let second = api.user_emotions(2, 10).await.unwrap();
        assert_eq!(second.items.len(), 3);

        let stats = api.user_stats().await.unwrap();
        assert_eq!(stats.emotions_count, 13);

        let analysis = api.emotion_analysis().await.unwrap();
        assert_eq!(
            analysis.most_common_emotion,
            Some(EmotionKind::Known(EmotionType::Happy))
        );
        assert_eq!(analysis.emotion_distribution.get("sad"), Some(&1));
    }
}
