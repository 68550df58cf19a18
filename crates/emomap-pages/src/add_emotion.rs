//! Standalone "add emotion" page
//!
//! The user picks a type, an intensity and a spot on a small map. Problems
//! are reported next to the field they concern.

use emomap_core::{EmotionRecord, EmotionType, Intensity, LatLng, Privacy};
use emomap_map::PositionOptions;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, instrument, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::context::PageContext;
use crate::error::{PageError, PageResult};
use crate::form::{CharCount, CharCounter, EmotionForm, SubmitGuard};
use crate::{FIELD_EMOTION_TYPE, FIELD_LOCATION, FIELD_SUBMIT};

/// Zoom used after jumping to the user's position
pub const LOCATED_ZOOM: u8 = 15;
pub const LOCATION_HINT: &str = "点击地图选择位置，或使用上方按钮获取当前位置";
pub const PUBLISHED_MESSAGE: &str = "情绪发布成功！正在跳转到主页...";
/// Where the page navigates after publishing
pub const REDIRECT_TARGET: &str = "/";

/// Outcome line under the submit button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMessage {
    Success(String),
    Failure(String),
}

#[derive(Debug)]
struct PageState {
    form: EmotionForm,
    location: Option<LatLng>,
    location_info: String,
    view: Option<(LatLng, u8)>,
    errors: BTreeMap<&'static str, String>,
    submit_message: Option<SubmitMessage>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            form: EmotionForm::default(),
            location: None,
            location_info: LOCATION_HINT.to_string(),
            view: None,
            errors: BTreeMap::new(),
            submit_message: None,
        }
    }
}

/// Controller of the add-emotion page
pub struct AddEmotionPage {
    ctx: PageContext,
    counter: CharCounter,
    state: Mutex<PageState>,
    submitting: AtomicBool,
}

impl AddEmotionPage {
    pub fn new(ctx: PageContext) -> Self {
        let counter = CharCounter::new(ctx.limits().max_emotion_length);
        Self {
            ctx,
            counter,
            state: Mutex::new(PageState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    // === Emotion ===

    pub fn select_emotion_type(&self, emotion_type: EmotionType) {
        let mut state = self.state.lock();
        state.form.select(emotion_type);
        state.errors.remove(FIELD_EMOTION_TYPE);
    }

    pub fn select_custom_emoji(&self, emoji: &str) {
        self.state.lock().form.custom_emoji = Some(emoji.to_string());
    }

    /// Glyph shown on the "custom" tile
    pub fn custom_glyph(&self) -> Option<String> {
        self.state.lock().form.custom_emoji.clone()
    }

    pub fn set_intensity(&self, value: u8) -> PageResult<Intensity> {
        let intensity = Intensity::new(value)?;
        self.state.lock().form.intensity = intensity;
        Ok(intensity)
    }

    /// Slider caption, e.g. "中等 (5)"
    pub fn intensity_display(&self) -> String {
        let intensity = self.state.lock().form.intensity;
        format!("{} ({})", intensity.label(), intensity.value())
    }

    pub fn set_description(&self, text: &str) -> CharCount {
        self.state.lock().form.text = text.to_string();
        self.counter.measure(text)
    }

    pub fn set_privacy(&self, privacy: Privacy) {
        self.state.lock().form.is_public = privacy.is_public();
    }

    pub fn form(&self) -> EmotionForm {
        self.state.lock().form.clone()
    }

    // === Location ===

    /// Pick a spot on the map and describe it.
    ///
    /// The address lookup is best effort; the coordinates stand in when it
    /// fails or finds nothing.
    #[instrument(skip(self), fields(position = %position))]
    pub async fn set_location(&self, position: LatLng) -> String {
        {
            let mut state = self.state.lock();
            state.location = Some(position);
            state.errors.remove(FIELD_LOCATION);
            state.location_info = format!("已选择位置：{}", position.describe());
        }

        let info = match self.ctx.geocoder().reverse(position).await {
            Ok(Some(address)) => format!("已选择位置：{address}"),
            Ok(None) => format!("已选择位置：{}", position.describe()),
            Err(e) => {
                debug!(error = %e, "Reverse geocoding failed");
                format!("已选择位置：{}", position.describe())
            }
        };

        let mut state = self.state.lock();
        // A later pick wins over a slow lookup
        if state.location == Some(position) {
            state.location_info.clone_from(&info);
        }
        info
    }

    /// Jump to the user's position and select it
    pub async fn use_current_location(&self) -> PageResult<LatLng> {
        match self.ctx.geo().current_position(PositionOptions::standard()).await {
            Ok(position) => {
                self.state.lock().view = Some((position.coords, LOCATED_ZOOM));
                self.set_location(position.coords).await;
                Ok(position.coords)
            }
            Err(e) => {
                warn!(code = e.code(), "Current position unavailable");
                let mut state = self.state.lock();
                state.errors.insert(FIELD_LOCATION, e.to_string());
                state.location_info = LOCATION_HINT.to_string();
                Err(PageError::field(FIELD_LOCATION, e.to_string()))
            }
        }
    }

    pub fn location(&self) -> Option<LatLng> {
        self.state.lock().location
    }

    pub fn location_info(&self) -> String {
        self.state.lock().location_info.clone()
    }

    /// Center and zoom the map was last moved to
    pub fn view(&self) -> Option<(LatLng, u8)> {
        self.state.lock().view
    }

    // === Submit ===

    /// Inline message for `field`, if any
    pub fn error(&self, field: &str) -> Option<String> {
        self.state.lock().errors.get(field).cloned()
    }

    pub fn submit_message(&self) -> Option<SubmitMessage> {
        self.state.lock().submit_message.clone()
    }

    /// Check every field, recording a message per failing field
    pub fn validate(&self) -> PageResult<()> {
        let mut errors = ValidationErrors::new();
        {
            let state = self.state.lock();
            match state.form.selected {
                None => errors.add(FIELD_EMOTION_TYPE, required("请选择一个情绪类型")),
                Some(t) if t.is_custom() && state.form.custom_emoji.is_none() => {
                    errors.add(FIELD_EMOTION_TYPE, required("请选择一个自定义心情表情"));
                }
                Some(_) => {}
            }
            if state.location.is_none() {
                errors.add(FIELD_LOCATION, required("请选择一个位置"));
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        let err = PageError::Validation(errors);
        self.record_field_errors(&err);
        Err(err)
    }

    /// Publish the emotion
    #[instrument(skip(self))]
    pub async fn submit(&self) -> PageResult<EmotionRecord> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;
        self.validate()?;

        let request = {
            let state = self.state.lock();
            let location = state.location.ok_or(PageError::NotLoaded)?;
            state.form.to_new_emotion(location).ok_or(PageError::NotLoaded)?
        };
        if let Err(e) = request.validate() {
            let err = PageError::from(e);
            self.record_field_errors(&err);
            return Err(err);
        }

        match self.ctx.api().create_emotion(&request).await {
            Ok(record) => {
                info!(emotion_id = %record.id, "Emotion published");
                self.state.lock().submit_message =
                    Some(SubmitMessage::Success(PUBLISHED_MESSAGE.to_string()));
                Ok(record)
            }
            Err(e) => {
                let err = PageError::from(e);
                warn!(code = err.code(), error = %err, "Publish failed");
                let message = format!("发布失败: {}", err.message_or("发布失败"));
                self.state.lock().submit_message = Some(SubmitMessage::Failure(message));
                Err(err)
            }
        }
    }

    fn record_field_errors(&self, err: &PageError) {
        let mut state = self.state.lock();
        for field_error in err.field_errors() {
            let field = match field_error.field.as_str() {
                FIELD_EMOTION_TYPE | "custom_emoji" => FIELD_EMOTION_TYPE,
                FIELD_LOCATION => FIELD_LOCATION,
                _ => FIELD_SUBMIT,
            };
            state.errors.entry(field).or_insert(field_error.message);
        }
    }
}

fn required(message: &'static str) -> ValidationError {
    ValidationError::new("required").with_message(message.into())
}

impl std::fmt::Debug for AddEmotionPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddEmotionPage")
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PageContextBuilder;
    use async_trait::async_trait;
    use emomap_client::{DisabledGeocoder, InMemoryEmotionApi};
    use emomap_core::{ApiResult, DomainError, ReverseGeocoder, SessionUser};
    use emomap_map::{
        FixedLocator, GeoLocationProvider, GeoLocator, NotificationPresenter, UnsupportedLocator,
    };
    use std::sync::Arc;

    struct NamedPlace;

    #[async_trait]
    impl ReverseGeocoder for NamedPlace {
        async fn reverse(&self, _position: LatLng) -> ApiResult<Option<String>> {
            Ok(Some("天安门广场".to_string()))
        }
    }

    struct BrokenGeocoder;

    #[async_trait]
    impl ReverseGeocoder for BrokenGeocoder {
        async fn reverse(&self, _position: LatLng) -> ApiResult<Option<String>> {
            Err(DomainError::Network("timeout".to_string()))
        }
    }

    fn page_with(
        geocoder: Arc<dyn ReverseGeocoder>,
        locator: Arc<dyn GeoLocator>,
    ) -> (AddEmotionPage, Arc<InMemoryEmotionApi>) {
        let api = Arc::new(InMemoryEmotionApi::new());
        api.sign_in(Some(SessionUser {
            id: 1,
            username: "ann".to_string(),
        }));
        let ctx = PageContextBuilder::new()
            .api(api.clone())
            .geocoder(geocoder)
            .geo(Arc::new(GeoLocationProvider::new(locator)))
            .notifier(Arc::new(NotificationPresenter::default()))
            .build()
            .unwrap();
        (AddEmotionPage::new(ctx), api)
    }

    fn page() -> (AddEmotionPage, Arc<InMemoryEmotionApi>) {
        page_with(Arc::new(DisabledGeocoder), Arc::new(FixedLocator::new(LatLng::new(30.0, 120.0))))
    }

    #[test]
    fn test_intensity_display() {
        let (page, _) = page();
        assert_eq!(page.intensity_display(), "中等 (5)");
        page.set_intensity(2).unwrap();
        assert_eq!(page.intensity_display(), "轻微 (2)");
        page.set_intensity(8).unwrap();
        assert_eq!(page.intensity_display(), "强烈 (8)");
        assert!(page.set_intensity(11).is_err());
        assert_eq!(page.intensity_display(), "强烈 (8)");
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let (page, _) = page();
        let err = page.validate().unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(page.error(FIELD_EMOTION_TYPE).as_deref(), Some("请选择一个情绪类型"));
        assert_eq!(page.error(FIELD_LOCATION).as_deref(), Some("请选择一个位置"));
    }

    #[test]
    fn test_custom_type_needs_an_emoji() {
        let (page, _) = page();
        page.select_emotion_type(EmotionType::Custom);
        assert!(page.validate().is_err());
        assert_eq!(
            page.error(FIELD_EMOTION_TYPE).as_deref(),
            Some("请选择一个自定义心情表情")
        );

        page.select_custom_emoji("🥳");
        page.select_emotion_type(EmotionType::Custom);
        assert_eq!(page.error(FIELD_EMOTION_TYPE), None);
        assert_eq!(page.custom_glyph().as_deref(), Some("🥳"));

        page.select_emotion_type(EmotionType::Calm);
        assert_eq!(page.custom_glyph(), None);
    }

    #[tokio::test]
    async fn test_location_uses_address_when_found() {
        let (page, _) = page_with(Arc::new(NamedPlace), Arc::new(UnsupportedLocator));
        let info = page.set_location(LatLng::new(39.9087, 116.3975)).await;
        assert_eq!(info, "已选择位置：天安门广场");
        assert_eq!(page.location_info(), info);
    }

    #[tokio::test]
    async fn test_location_falls_back_to_coordinates() {
        let (page, _) = page_with(Arc::new(BrokenGeocoder), Arc::new(UnsupportedLocator));
        let info = page.set_location(LatLng::new(39.9087, 116.3975)).await;
        assert_eq!(info, "已选择位置：纬度 39.908700, 经度 116.397500");
    }

    #[tokio::test]
    async fn test_current_location_moves_the_map() {
        let (page, _) = page();
        let position = page.use_current_location().await.unwrap();
        assert_eq!(position, LatLng::new(30.0, 120.0));
        assert_eq!(page.view(), Some((position, LOCATED_ZOOM)));
        assert_eq!(page.location(), Some(position));
    }

    #[tokio::test]
    async fn test_current_location_error_is_inline() {
        let (page, _) = page_with(Arc::new(DisabledGeocoder), Arc::new(UnsupportedLocator));
        let err = page.use_current_location().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(page.error(FIELD_LOCATION).as_deref(), Some("浏览器不支持定位功能"));
        assert_eq!(page.location_info(), LOCATION_HINT);
    }

    #[tokio::test]
    async fn test_submit_publishes() {
        let (page, api) = page();
        page.select_emotion_type(EmotionType::Excited);
        page.set_intensity(9).unwrap();
        page.set_description("  出发旅行  ");
        page.set_privacy(Privacy::Private);
        page.set_location(LatLng::new(30.0, 120.0)).await;

        let record = page.submit().await.unwrap();
        assert_eq!(record.text(), Some("出发旅行"));
        assert_eq!(record.intensity.map(Intensity::value), Some(9));
        assert!(!record.is_publicly_visible());
        assert!(!record.allow_collection);
        assert_eq!(api.emotion_count(), 1);
        assert_eq!(
            page.submit_message(),
            Some(SubmitMessage::Success(PUBLISHED_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let (page, api) = page();
        page.set_location(LatLng::new(30.0, 120.0)).await;
        assert!(page.submit().await.is_err());
        assert_eq!(api.emotion_count(), 0);
        assert!(page.submit_message().is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_message() {
        let (page, api) = page();
        api.sign_in(None);
        page.select_emotion_type(EmotionType::Happy);
        page.set_location(LatLng::new(30.0, 120.0)).await;

        let err = page.submit().await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert_eq!(
            page.submit_message(),
            Some(SubmitMessage::Failure("发布失败: 需要登录".to_string()))
        );
    }
}
