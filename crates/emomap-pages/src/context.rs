//! Page context - dependency container for page controllers
//!
//! Holds the backend ports, the geolocation provider, the notifier and the
//! viewer session shared by every page.

use std::sync::Arc;

use emomap_common::LimitsConfig;
use emomap_core::{EmotionApi, ReverseGeocoder, SessionContext};
use emomap_map::{GeoLocationProvider, Notifier};

use crate::error::{PageError, PageResult};

/// Dependencies shared by the page controllers
#[derive(Clone)]
pub struct PageContext {
    // Backend ports
    api: Arc<dyn EmotionApi>,
    geocoder: Arc<dyn ReverseGeocoder>,

    // Browser capabilities
    geo: Arc<GeoLocationProvider>,
    notifier: Arc<dyn Notifier>,

    session: SessionContext,
    limits: LimitsConfig,
}

impl PageContext {
    pub fn new(
        api: Arc<dyn EmotionApi>,
        geocoder: Arc<dyn ReverseGeocoder>,
        geo: Arc<GeoLocationProvider>,
        notifier: Arc<dyn Notifier>,
        session: SessionContext,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            api,
            geocoder,
            geo,
            notifier,
            session,
            limits,
        }
    }

    // === Backend ===

    pub fn api(&self) -> &dyn EmotionApi {
        self.api.as_ref()
    }

    pub fn geocoder(&self) -> &dyn ReverseGeocoder {
        self.geocoder.as_ref()
    }

    // === Capabilities ===

    pub fn geo(&self) -> &GeoLocationProvider {
        self.geo.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    // === Viewer ===

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Same dependencies for another viewer
    pub fn with_session(&self, session: SessionContext) -> Self {
        Self {
            session,
            ..self.clone()
        }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("api", &"dyn EmotionApi")
            .field("geocoder", &"dyn ReverseGeocoder")
            .field("geo", &self.geo)
            .field("session", &self.session)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Builder for [`PageContext`]
#[derive(Default)]
pub struct PageContextBuilder {
    api: Option<Arc<dyn EmotionApi>>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    geo: Option<Arc<GeoLocationProvider>>,
    notifier: Option<Arc<dyn Notifier>>,
    session: SessionContext,
    limits: LimitsConfig,
}

impl PageContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api(mut self, api: Arc<dyn EmotionApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn geo(mut self, geo: Arc<GeoLocationProvider>) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Build the context
    ///
    /// # Errors
    /// Returns `PageError::Setup` if a required dependency is missing
    pub fn build(self) -> PageResult<PageContext> {
        Ok(PageContext::new(
            self.api.ok_or_else(|| PageError::setup("api is required"))?,
            self.geocoder.ok_or_else(|| PageError::setup("geocoder is required"))?,
            self.geo.ok_or_else(|| PageError::setup("geo is required"))?,
            self.notifier.ok_or_else(|| PageError::setup("notifier is required"))?,
            self.session,
            self.limits,
        ))
    }
}
