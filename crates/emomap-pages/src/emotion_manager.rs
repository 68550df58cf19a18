//! Share modal on the map page
//!
//! Creates new emotions, edits existing ones and deletes them. A created
//! record is handed to an [`EmotionSink`] so it shows up on the map without
//! a reload.

use emomap_core::{EmotionId, EmotionRecord, EmotionType, LatLng};
use emomap_map::{GeoError, PositionOptions};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::context::PageContext;
use crate::error::{FieldError, PageError, PageResult};
use crate::form::{CharCount, CharCounter, EmotionForm, SubmitGuard};
use crate::sink::EmotionSink;

pub const CREATE_TITLE: &str = "分享你的情绪";
pub const EDIT_TITLE: &str = "编辑情绪";
pub const SHARED_MESSAGE: &str = "情绪分享成功！";
pub const UPDATED_MESSAGE: &str = "情绪更新成功";
pub const DELETED_MESSAGE: &str = "删除成功";

/// Whether the modal creates or edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(EmotionId),
}

impl FormMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Create => CREATE_TITLE,
            Self::Edit(_) => EDIT_TITLE,
        }
    }
}

/// Status line under the location button
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocationStatus {
    #[default]
    Idle,
    Located,
    /// The fixed fallback is in use
    Fallback(&'static str),
}

impl LocationStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Located => "✓ 位置获取成功",
            Self::Fallback(reason) => *reason,
        }
    }
}

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(EmotionRecord),
    Updated(EmotionId),
}

#[derive(Debug, Default)]
struct ManagerState {
    mode: FormMode,
    form: EmotionForm,
    location: Option<LatLng>,
    location_status: LocationStatus,
    errors: Vec<FieldError>,
}

/// Controller of the share/edit modal
pub struct EmotionManager {
    ctx: PageContext,
    sink: Arc<dyn EmotionSink>,
    counter: CharCounter,
    state: Mutex<ManagerState>,
    submitting: AtomicBool,
}

impl EmotionManager {
    pub fn new(ctx: PageContext, sink: Arc<dyn EmotionSink>) -> Self {
        let counter = CharCounter::new(ctx.limits().max_emotion_length);
        Self {
            ctx,
            sink,
            counter,
            state: Mutex::new(ManagerState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    // === Form ===

    /// Open the modal for a new emotion with a clean form
    pub fn open_create(&self) {
        let mut state = self.state.lock();
        state.mode = FormMode::Create;
        state.form = EmotionForm::default();
        state.location_status = LocationStatus::Idle;
        state.errors.clear();
    }

    /// Load an emotion and open the modal in edit mode
    #[instrument(skip(self), fields(emotion_id = %id))]
    pub async fn edit(&self, id: EmotionId) -> PageResult<()> {
        let record = match self.ctx.api().get_emotion(id).await {
            Ok(record) => record,
            Err(e) => {
                let err = PageError::from(e);
                warn!(error = %err, "Failed to load emotion for editing");
                self.ctx.notifier().error("获取数据失败");
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        state.mode = FormMode::Edit(id);
        state.form = EmotionForm::from_record(&record);
        state.errors.clear();
        Ok(())
    }

    pub fn mode(&self) -> FormMode {
        self.state.lock().mode
    }

    pub fn title(&self) -> &'static str {
        self.mode().title()
    }

    pub fn form(&self) -> EmotionForm {
        self.state.lock().form.clone()
    }

    pub fn select_emotion(&self, emotion_type: EmotionType) {
        let mut state = self.state.lock();
        state.form.select(emotion_type);
        state.errors.retain(|e| e.field != "emotion_type");
    }

    /// Replace the text and return the counter reading
    pub fn set_text(&self, text: &str) -> CharCount {
        self.state.lock().form.text = text.to_string();
        self.counter.measure(text)
    }

    pub fn char_count(&self) -> CharCount {
        self.counter.measure(&self.state.lock().form.text)
    }

    pub fn set_public(&self, is_public: bool) {
        self.state.lock().form.is_public = is_public;
    }

    pub fn set_allow_collection(&self, allow: bool) {
        self.state.lock().form.allow_collection = allow;
    }

    /// Inline errors from the last submit attempt
    pub fn errors(&self) -> Vec<FieldError> {
        self.state.lock().errors.clone()
    }

    // === Location ===

    /// Ask for the current position; the fixed fallback stands in on failure
    pub async fn refresh_location(&self) -> LatLng {
        let result = self.ctx.geo().current_position(PositionOptions::standard()).await;
        let (location, status) = match result {
            Ok(position) => (position.coords, LocationStatus::Located),
            Err(GeoError::Unsupported) => {
                (LatLng::FALLBACK, LocationStatus::Fallback("浏览器不支持位置服务"))
            }
            Err(e) => {
                debug!(error = %e, "Using fallback location");
                (LatLng::FALLBACK, LocationStatus::Fallback("位置获取失败，将使用默认位置"))
            }
        };

        let mut state = self.state.lock();
        state.location = Some(location);
        state.location_status = status;
        location
    }

    pub fn location(&self) -> Option<LatLng> {
        self.state.lock().location
    }

    pub fn location_status(&self) -> LocationStatus {
        self.state.lock().location_status.clone()
    }

    // === Actions ===

    /// Validate and send the form.
    ///
    /// Only one submission runs at a time; a second call while one is in
    /// flight fails with [`PageError::Busy`].
    #[instrument(skip(self))]
    pub async fn submit(&self) -> PageResult<SubmitOutcome> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;

        let (mode, form, location) = {
            let state = self.state.lock();
            (state.mode, state.form.clone(), state.location)
        };

        let result = match mode {
            FormMode::Create => self.create(&form, location).await.map(SubmitOutcome::Created),
            FormMode::Edit(id) => self.update(id, &form).await.map(|()| SubmitOutcome::Updated(id)),
        };

        match &result {
            Ok(_) => {
                let mut state = self.state.lock();
                state.errors.clear();
                if mode == FormMode::Create {
                    state.form = EmotionForm::default();
                }
            }
            Err(e) if e.is_validation() => {
                self.state.lock().errors = e.field_errors();
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "Submit failed");
                self.ctx.notifier().error(&e.message_or("提交失败，请重试"));
            }
        }
        result
    }

    async fn create(&self, form: &EmotionForm, location: Option<LatLng>) -> PageResult<EmotionRecord> {
        if form.selected.is_none() {
            return Err(PageError::field("emotion_type", "请选择一个情绪"));
        }
        let location = location.ok_or_else(|| PageError::field("location", "正在获取位置信息，请稍后重试"))?;
        let request = form
            .to_new_emotion(location)
            .ok_or_else(|| PageError::field("emotion_type", "请选择一个情绪"))?;
        request.validate()?;

        let record = self.ctx.api().create_emotion(&request).await?;
        info!(emotion_id = %record.id, emotion_type = %record.emotion_type, "Emotion shared");
        self.ctx.notifier().success(SHARED_MESSAGE);

        // Stored already; a map failure does not fail the share
        if let Err(e) = self.sink.publish(record.clone(), self.ctx.session()).await {
            warn!(error = %e, "Shared emotion not shown on the map");
        }
        Ok(record)
    }

    async fn update(&self, id: EmotionId, form: &EmotionForm) -> PageResult<()> {
        let update = form
            .to_update()
            .ok_or_else(|| PageError::field("emotion_type", "请选择一个情绪"))?;
        update.validate()?;

        self.ctx.api().update_emotion(id, &update).await?;
        info!(emotion_id = %id, "Emotion updated");
        self.ctx.notifier().success(UPDATED_MESSAGE);
        Ok(())
    }

    /// Delete an emotion and take its marker off the map
    #[instrument(skip(self), fields(emotion_id = %id))]
    pub async fn delete(&self, id: EmotionId) -> PageResult<()> {
        if let Err(e) = self.ctx.api().delete_emotion(id).await {
            let err = PageError::from(e);
            warn!(error = %err, "Delete failed");
            self.ctx.notifier().error(&err.message_or("删除失败"));
            return Err(err);
        }
        self.sink.withdraw(id);
        self.ctx.notifier().success(DELETED_MESSAGE);
        Ok(())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for EmotionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionManager")
            .field("state", &*self.state.lock())
            .field("submitting", &self.is_submitting())
            .finish()
    }
}
