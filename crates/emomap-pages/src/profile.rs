//! Profile page: statistics, the viewer's emotions and collections, and
//! the emotion analysis

use emomap_core::{
    CollectedEmotion, EmotionAnalysis, EmotionId, EmotionKind, EmotionRecord, EmotionType, Page,
    UserStats,
};
use emomap_map::visual_for;
use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::context::PageContext;
use crate::error::{PageError, PageResult};
use crate::form::{CharCount, CharCounter, EmotionForm, SubmitGuard};

/// Page numbers shown on each side of the current one
pub const PAGE_WINDOW: u32 = 2;

// ============================================================================
// Tabs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProfileTab {
    #[default]
    MyEmotions,
    MyCollections,
    Analysis,
}

impl ProfileTab {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MyEmotions => "my-emotions",
            Self::MyCollections => "my-collections",
            Self::Analysis => "analysis",
        }
    }

    /// Tabs listing records page by page
    pub fn is_paged(self) -> bool {
        !matches!(self, Self::Analysis)
    }
}

impl fmt::Display for ProfileTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileTab {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "my-emotions" => Ok(Self::MyEmotions),
            "my-collections" => Ok(Self::MyCollections),
            "analysis" => Ok(Self::Analysis),
            other => Err(PageError::field("tab", format!("unknown tab: {other}"))),
        }
    }
}

/// Analysis tab content
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub analysis: EmotionAnalysis,
    pub distribution: Vec<(EmotionKind, f64)>,
    pub insights: Vec<String>,
}

impl AnalysisView {
    pub fn new(analysis: EmotionAnalysis) -> Self {
        Self {
            distribution: analysis.distribution_percentages(),
            insights: insights(&analysis),
            analysis,
        }
    }

    /// "14:00 - 15:00"
    pub fn active_hours(&self) -> String {
        let hour = self.analysis.most_active_hour.unwrap_or(0);
        format!("{hour}:00 - {}:00", u32::from(hour) + 1)
    }

    /// "1.5 次"
    pub fn daily_average(&self) -> String {
        format!("{:.1} 次", self.analysis.daily_average.unwrap_or(0.0))
    }
}

/// Content of the selected tab
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Emotions(Vec<EmotionRecord>),
    Collections(Vec<CollectedEmotion>),
    Analysis(AnalysisView),
}

impl TabContent {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Emotions(items) => items.is_empty(),
            Self::Collections(items) => items.is_empty(),
            Self::Analysis(view) => view.analysis.is_empty(),
        }
    }
}

// ============================================================================
// Pagination and Insights
// ============================================================================

/// One button of the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Prev(u32),
    Number { page: u32, active: bool },
    Next(u32),
}

/// Pager buttons; nothing when everything fits on one page
pub fn pagination(current: u32, total_pages: u32) -> Vec<PageButton> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let mut buttons = Vec::new();
    if current > 1 {
        buttons.push(PageButton::Prev(current - 1));
    }
    let start = current.saturating_sub(PAGE_WINDOW).max(1);
    let end = current.saturating_add(PAGE_WINDOW).min(total_pages);
    for page in start..=end {
        buttons.push(PageButton::Number {
            page,
            active: page == current,
        });
    }
    if current < total_pages {
        buttons.push(PageButton::Next(current + 1));
    }
    buttons
}

fn time_of_day(hour: u8) -> &'static str {
    match hour {
        6..=11 => "上午",
        12..=17 => "下午",
        18..=23 => "晚上",
        _ => "深夜",
    }
}

/// Plain-language observations about the viewer's history
pub fn insights(analysis: &EmotionAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(kind) = &analysis.most_common_emotion {
        let name = visual_for(kind, None).name;
        out.push(format!("你最常分享的是{name}情绪，这反映了你的主要情感状态。"));
    }
    if let Some(hour) = analysis.most_active_hour {
        out.push(format!(
            "你在{}最活跃，这可能是你情感表达的黄金时段。",
            time_of_day(hour)
        ));
    }
    match analysis.daily_average {
        Some(avg) if avg > 1.0 => {
            out.push("你是一个善于表达情感的人，经常与他人分享内心感受。".to_string());
        }
        Some(avg) if avg > 0.0 && avg < 0.5 => {
            out.push("你比较内敛，偶尔分享情感，每次分享都很珍贵。".to_string());
        }
        _ => {}
    }
    if out.is_empty() {
        out.push("继续记录你的情绪，我们会为你提供更多有趣的洞察！".to_string());
    }
    out
}

// ============================================================================
// Profile Manager
// ============================================================================

/// Open edit dialog
#[derive(Debug, Clone, PartialEq)]
pub struct EditDialog {
    pub id: EmotionId,
    pub form: EmotionForm,
}

#[derive(Debug)]
struct ProfileState {
    stats: UserStats,
    tab: ProfileTab,
    page: u32,
    total_pages: u32,
    content: Option<TabContent>,
    edit: Option<EditDialog>,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            stats: UserStats::default(),
            tab: ProfileTab::default(),
            page: 1,
            total_pages: 1,
            content: None,
            edit: None,
        }
    }
}

/// Controller of the profile page
pub struct ProfileManager {
    ctx: PageContext,
    counter: CharCounter,
    state: Mutex<ProfileState>,
    submitting: AtomicBool,
}

impl ProfileManager {
    pub fn new(ctx: PageContext) -> Self {
        let counter = CharCounter::new(ctx.limits().max_emotion_length);
        Self {
            ctx,
            counter,
            state: Mutex::new(ProfileState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    // === Loading ===

    /// Load statistics and the first tab together
    #[instrument(skip(self))]
    pub async fn open(&self) -> PageResult<()> {
        let (tab, page) = self.position();
        match futures::try_join!(self.ctx.api().user_stats(), self.fetch(tab, page)) {
            Ok((stats, (content, total_pages))) => {
                let mut state = self.state.lock();
                state.stats = stats;
                Self::apply(&mut state, tab, page, content, total_pages);
                Ok(())
            }
            Err(e) => Err(self.report(e.into(), "加载失败")),
        }
    }

    pub async fn switch_tab(&self, tab: ProfileTab) -> PageResult<()> {
        {
            let mut state = self.state.lock();
            state.tab = tab;
            state.page = 1;
        }
        self.load_tab().await
    }

    /// Go to `page`; returns whether anything was loaded
    pub async fn change_page(&self, page: u32) -> PageResult<bool> {
        {
            let mut state = self.state.lock();
            if !state.tab.is_paged() || page < 1 || page > state.total_pages || page == state.page {
                return Ok(false);
            }
            state.page = page;
        }
        self.load_tab().await.map(|()| true)
    }

    /// Reload the selected tab; the previous content stays on failure
    #[instrument(skip(self))]
    pub async fn load_tab(&self) -> PageResult<()> {
        let (tab, page) = self.position();
        match self.fetch(tab, page).await {
            Ok((content, total_pages)) => {
                let mut state = self.state.lock();
                Self::apply(&mut state, tab, page, content, total_pages);
                Ok(())
            }
            Err(e) => Err(self.report(e.into(), "加载失败")),
        }
    }

    pub async fn reload_stats(&self) -> PageResult<UserStats> {
        let stats = self.ctx.api().user_stats().await?;
        self.state.lock().stats = stats;
        Ok(stats)
    }

    async fn fetch(&self, tab: ProfileTab, page: u32) -> emomap_core::ApiResult<(TabContent, u32)> {
        let limit = self.ctx.limits().page_size;
        let api = self.ctx.api();
        Ok(match tab {
            ProfileTab::MyEmotions => {
                let Page { items, total_pages, .. } = api.user_emotions(page, limit).await?;
                (TabContent::Emotions(items), total_pages)
            }
            ProfileTab::MyCollections => {
                let Page { items, total_pages, .. } = api.user_collections(page, limit).await?;
                (TabContent::Collections(items), total_pages)
            }
            ProfileTab::Analysis => {
                let analysis = api.emotion_analysis().await?;
                (TabContent::Analysis(AnalysisView::new(analysis)), 1)
            }
        })
    }

    fn position(&self) -> (ProfileTab, u32) {
        let state = self.state.lock();
        (state.tab, state.page)
    }

    fn apply(state: &mut ProfileState, tab: ProfileTab, page: u32, content: TabContent, total_pages: u32) {
        // A tab switch during the fetch makes this result stale
        if state.tab != tab || state.page != page {
            debug!(%tab, page, "Dropping stale tab content");
            return;
        }
        state.content = Some(content);
        state.total_pages = total_pages.max(1);
    }

    // === Accessors ===

    pub fn stats(&self) -> UserStats {
        self.state.lock().stats
    }

    pub fn tab(&self) -> ProfileTab {
        self.state.lock().tab
    }

    pub fn page(&self) -> u32 {
        self.state.lock().page
    }

    pub fn total_pages(&self) -> u32 {
        self.state.lock().total_pages
    }

    pub fn content(&self) -> Option<TabContent> {
        self.state.lock().content.clone()
    }

    pub fn pagination(&self) -> Vec<PageButton> {
        let state = self.state.lock();
        if state.tab.is_paged() {
            pagination(state.page, state.total_pages)
        } else {
            Vec::new()
        }
    }

    // === Editing ===

    #[instrument(skip(self), fields(emotion_id = %id))]
    pub async fn open_edit(&self, id: EmotionId) -> PageResult<()> {
        match self.ctx.api().get_emotion(id).await {
            Ok(record) => {
                self.state.lock().edit = Some(EditDialog {
                    id,
                    form: EmotionForm::from_record(&record),
                });
                Ok(())
            }
            Err(e) => Err(self.report(e.into(), "加载失败")),
        }
    }

    pub fn edit_dialog(&self) -> Option<EditDialog> {
        self.state.lock().edit.clone()
    }

    pub fn close_edit(&self) {
        self.state.lock().edit = None;
    }

    fn with_edit<T>(&self, change: impl FnOnce(&mut EmotionForm) -> T) -> PageResult<T> {
        let mut state = self.state.lock();
        let dialog = state.edit.as_mut().ok_or(PageError::NotLoaded)?;
        Ok(change(&mut dialog.form))
    }

    pub fn set_edit_type(&self, emotion_type: EmotionType) -> PageResult<()> {
        self.with_edit(|form| form.select(emotion_type))
    }

    pub fn set_edit_text(&self, text: &str) -> PageResult<CharCount> {
        self.with_edit(|form| form.text = text.to_string())?;
        Ok(self.counter.measure(text))
    }

    /// Making an emotion private also turns collection off
    pub fn set_edit_public(&self, is_public: bool) -> PageResult<()> {
        self.with_edit(|form| {
            form.is_public = is_public;
            if !is_public {
                form.allow_collection = false;
            }
        })
    }

    /// Ignored while the emotion is private
    pub fn set_edit_allow_collection(&self, allow: bool) -> PageResult<()> {
        self.with_edit(|form| form.allow_collection = form.is_public && allow)
    }

    #[instrument(skip(self))]
    pub async fn submit_edit(&self) -> PageResult<()> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;
        let dialog = self.edit_dialog().ok_or(PageError::NotLoaded)?;
        let update = dialog
            .form
            .to_update()
            .ok_or_else(|| PageError::field("emotion_type", "请选择一个情绪"))?;
        update.validate()?;

        if let Err(e) = self.ctx.api().update_emotion(dialog.id, &update).await {
            return Err(self.report(e.into(), "更新失败"));
        }
        info!(emotion_id = %dialog.id, "Emotion updated from profile");
        self.close_edit();
        self.refresh_quietly(false).await;
        self.ctx.notifier().success("情绪更新成功");
        Ok(())
    }

    // === Removal ===

    #[instrument(skip(self), fields(emotion_id = %id))]
    pub async fn delete(&self, id: EmotionId) -> PageResult<()> {
        if let Err(e) = self.ctx.api().delete_emotion(id).await {
            return Err(self.report(e.into(), "删除失败"));
        }
        info!("Emotion deleted from profile");
        self.refresh_quietly(true).await;
        self.ctx.notifier().success("情绪删除成功");
        Ok(())
    }

    #[instrument(skip(self), fields(emotion_id = %id))]
    pub async fn uncollect(&self, id: EmotionId) -> PageResult<()> {
        if let Err(e) = self.ctx.api().uncollect_emotion(id).await {
            return Err(self.report(e.into(), "操作失败"));
        }
        self.refresh_quietly(false).await;
        self.ctx.notifier().success("已取消收藏");
        Ok(())
    }

    /// Reload after a change; failures are only logged
    async fn refresh_quietly(&self, with_stats: bool) {
        let (tab, page) = self.position();
        let tab_result = if with_stats {
            let (content, stats) = futures::join!(self.fetch(tab, page), self.ctx.api().user_stats());
            match stats {
                Ok(stats) => self.state.lock().stats = stats,
                Err(e) => debug!(error = %e, "Stats reload failed"),
            }
            content
        } else {
            self.fetch(tab, page).await
        };

        match tab_result {
            Ok((content, total_pages)) => {
                Self::apply(&mut self.state.lock(), tab, page, content, total_pages);
            }
            Err(e) => debug!(error = %e, "Tab reload failed"),
        }
    }

    fn report(&self, err: PageError, fallback: &str) -> PageError {
        warn!(code = err.code(), error = %err, "Profile action failed");
        self.ctx.notifier().error(&err.message_or(fallback));
        err
    }
}

impl fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ProfileManager")
            .field("tab", &state.tab)
            .field("page", &state.page)
            .field("total_pages", &state.total_pages)
            .field("stats", &state.stats)
            .finish()
    }
}
