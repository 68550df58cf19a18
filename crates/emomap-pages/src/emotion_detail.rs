//! Emotion detail page: reactions, comments and sharing

use emomap_core::{Comment, CommentId, DomainError, EmotionId, EmotionRecord, NewComment};
use emomap_map::detail_url;
use parking_lot::Mutex;
use reqwest::Url;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::context::PageContext;
use crate::error::{PageError, PageResult};
use crate::form::{CharCount, CharCounter, SubmitGuard};

pub const SHARE_TEXT: &str = "看看这个有趣的情绪分享！";
pub const COMMENT_POSTED_MESSAGE: &str = "评论发布成功";
pub const COLLECTED_MESSAGE: &str = "已添加到收藏";
pub const UNCOLLECTED_MESSAGE: &str = "已取消收藏";
const WECHAT_HINT: &str = "请复制链接手动分享到微信";

const WEIBO_SHARE_ENDPOINT: &str = "https://service.weibo.com/share/share.php";
const QQ_SHARE_ENDPOINT: &str = "https://connect.qq.com/widget/shareqq/index.html";

/// Share channels offered by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    Weibo,
    Wechat,
    Qq,
    CopyLink,
}

/// What the page does for a share choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareAction {
    /// Open a third-party share page
    Open(Url),
    /// Put the link on the clipboard, with an optional hint toast
    Copy { link: Url, hint: Option<&'static str> },
}

#[derive(Debug, Default)]
struct DetailState {
    record: Option<EmotionRecord>,
    comments: Vec<Comment>,
    comment_input: String,
    comment_error: Option<String>,
}

/// Controller of one emotion's detail page
pub struct EmotionDetail {
    ctx: PageContext,
    id: EmotionId,
    counter: CharCounter,
    state: Mutex<DetailState>,
    submitting: AtomicBool,
}

impl EmotionDetail {
    pub fn new(ctx: PageContext, id: EmotionId) -> Self {
        let counter = CharCounter::new(ctx.limits().max_comment_length);
        Self {
            ctx,
            id,
            counter,
            state: Mutex::new(DetailState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> EmotionId {
        self.id
    }

    /// Fetch the record and its comments together
    #[instrument(skip(self), fields(emotion_id = %self.id))]
    pub async fn load(&self) -> PageResult<()> {
        let api = self.ctx.api();
        let loaded = futures::try_join!(api.get_emotion(self.id), api.list_comments(self.id));
        match loaded {
            Ok((record, comments)) => {
                debug!(comments = comments.len(), "Detail loaded");
                let mut state = self.state.lock();
                state.record = Some(record);
                state.comments = comments;
                Ok(())
            }
            Err(e) => {
                let err = PageError::from(e);
                warn!(error = %err, "Failed to load emotion detail");
                self.ctx.notifier().error(&err.message_or("加载情绪数据失败"));
                Err(err)
            }
        }
    }

    pub fn record(&self) -> Option<EmotionRecord> {
        self.state.lock().record.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().comments.clone()
    }

    fn loaded_flag(&self, read: impl FnOnce(&EmotionRecord) -> bool) -> PageResult<bool> {
        self.state.lock().record.as_ref().map(read).ok_or(PageError::NotLoaded)
    }

    // === Reactions ===

    /// Like or unlike; the counter moves only after the backend agrees.
    ///
    /// Returns the new liked state.
    #[instrument(skip(self), fields(emotion_id = %self.id))]
    pub async fn toggle_like(&self) -> PageResult<bool> {
        let liked = self.loaded_flag(|r| r.is_liked)?;
        let result = if liked {
            self.ctx.api().unlike_emotion(self.id).await
        } else {
            self.ctx.api().like_emotion(self.id).await
        };

        match result {
            Ok(_) => {
                if let Some(record) = self.state.lock().record.as_mut() {
                    record.set_liked(!liked);
                }
                Ok(!liked)
            }
            Err(e) => Err(self.report(e.into(), "操作失败")),
        }
    }

    /// Collect or uncollect; returns the new collected state
    #[instrument(skip(self), fields(emotion_id = %self.id))]
    pub async fn toggle_collect(&self) -> PageResult<bool> {
        let collected = self.loaded_flag(|r| r.is_collected)?;
        let result = if collected {
            self.ctx.api().uncollect_emotion(self.id).await
        } else {
            self.ctx.api().collect_emotion(self.id).await
        };

        match result {
            Ok(_) => {
                if let Some(record) = self.state.lock().record.as_mut() {
                    record.set_collected(!collected);
                }
                let message = if collected {
                    UNCOLLECTED_MESSAGE
                } else {
                    COLLECTED_MESSAGE
                };
                self.ctx.notifier().success(message);
                Ok(!collected)
            }
            Err(e) => Err(self.report(e.into(), "操作失败")),
        }
    }

    // === Comments ===

    pub fn set_comment_input(&self, text: &str) -> CharCount {
        let mut state = self.state.lock();
        state.comment_input = text.to_string();
        state.comment_error = None;
        self.counter.measure(text)
    }

    pub fn comment_input(&self) -> String {
        self.state.lock().comment_input.clone()
    }

    pub fn comment_error(&self) -> Option<String> {
        self.state.lock().comment_error.clone()
    }

    /// Post the comment box content
    #[instrument(skip(self), fields(emotion_id = %self.id))]
    pub async fn submit_comment(&self) -> PageResult<Comment> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;

        let request = NewComment::new(self.comment_input());
        if let Err(e) = request.validate() {
            let err = PageError::from(e);
            self.state.lock().comment_error = Some(err.user_message());
            return Err(err);
        }

        let comment = match self.ctx.api().create_comment(self.id, &request).await {
            Ok(comment) => comment,
            Err(e) => return Err(self.report(e.into(), "评论发布失败")),
        };
        info!(comment_id = %comment.id, "Comment posted");

        {
            let mut state = self.state.lock();
            state.comment_input.clear();
            if let Some(record) = state.record.as_mut() {
                record.comments_count = record.comments_count.saturating_add(1);
            }
        }
        self.reload_comments().await;
        self.ctx.notifier().success(COMMENT_POSTED_MESSAGE);
        Ok(comment)
    }

    /// Like or unlike a comment, then refresh the list
    #[instrument(skip(self), fields(comment_id = %comment_id))]
    pub async fn toggle_comment_like(&self, comment_id: CommentId) -> PageResult<bool> {
        let liked = self
            .state
            .lock()
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.is_liked)
            .ok_or_else(|| PageError::Domain(DomainError::NotFound("评论不存在".to_string())))?;

        let result = if liked {
            self.ctx.api().unlike_comment(comment_id).await
        } else {
            self.ctx.api().like_comment(comment_id).await
        };
        if let Err(e) = result {
            return Err(self.report(e.into(), "操作失败"));
        }

        if !self.reload_comments().await {
            let mut state = self.state.lock();
            if let Some(comment) = state.comments.iter_mut().find(|c| c.id == comment_id) {
                comment.set_liked(!liked);
            }
        }
        Ok(!liked)
    }

    /// Refetch comments; the old list stays on failure
    async fn reload_comments(&self) -> bool {
        match self.ctx.api().list_comments(self.id).await {
            Ok(comments) => {
                self.state.lock().comments = comments;
                true
            }
            Err(e) => {
                debug!(error = %e, "Comment reload failed");
                false
            }
        }
    }

    // === Sharing ===

    /// Absolute link to this page under `origin`
    pub fn share_link(&self, origin: &str) -> PageResult<Url> {
        let base = Url::parse(origin).map_err(|e| PageError::setup(format!("invalid origin {origin}: {e}")))?;
        base.join(&detail_url(self.id))
            .map_err(|e| PageError::setup(format!("invalid share link: {e}")))
    }

    pub fn share(&self, target: ShareTarget, origin: &str) -> PageResult<ShareAction> {
        let link = self.share_link(origin)?;
        let params = [("url", link.as_str()), ("title", SHARE_TEXT)];
        let action = match target {
            ShareTarget::Weibo => ShareAction::Open(
                Url::parse_with_params(WEIBO_SHARE_ENDPOINT, params)
                    .map_err(|e| PageError::setup(e.to_string()))?,
            ),
            ShareTarget::Qq => ShareAction::Open(
                Url::parse_with_params(QQ_SHARE_ENDPOINT, params)
                    .map_err(|e| PageError::setup(e.to_string()))?,
            ),
            ShareTarget::Wechat => ShareAction::Copy {
                link,
                hint: Some(WECHAT_HINT),
            },
            ShareTarget::CopyLink => ShareAction::Copy { link, hint: None },
        };
        if let ShareAction::Copy { hint: Some(hint), .. } = &action {
            self.ctx.notifier().info(hint);
        }
        Ok(action)
    }

    fn report(&self, err: PageError, fallback: &str) -> PageError {
        warn!(code = err.code(), error = %err, "Detail action failed");
        self.ctx.notifier().error(&err.message_or(fallback));
        err
    }
}

impl std::fmt::Debug for EmotionDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionDetail")
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .finish()
    }
}
