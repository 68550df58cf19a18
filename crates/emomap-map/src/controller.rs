//! Map controller
//!
//! Sole owner of the map surface, the marker set, the visible subset, the
//! user-location marker and the current filter. Every mutation goes through
//! one mutex which is never held across an `.await`; backend loads carry a
//! generation number so that only the latest response is applied.

use chrono::{DateTime, Utc};
use emomap_common::{GeolocationConfig, MapConfig};
use emomap_core::{EmotionApi, EmotionId, EmotionRecord, FilterState, LatLng, SessionContext};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{MapError, MapResult};
use crate::filter::visible_markers;
use crate::geo::{GeoLocationProvider, Position, PositionOptions};
use crate::marker::{ingest, MarkerEntry};
use crate::notify::Notifier;
use crate::popup::PopupContent;
use crate::surface::MapSurface;

/// Pause between centering on a new marker and opening its popup
pub const POPUP_SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const USER_MARKER_LABEL: &str = "📍 我的位置";
pub const MAP_UNAVAILABLE_MESSAGE: &str = "地图服务暂时不可用，请刷新页面重试";
pub const RELOAD_ACTION: &str = "重新加载";
pub const REFRESH_OK_MESSAGE: &str = "地图数据已刷新";
pub const REFRESH_FAILED_MESSAGE: &str = "刷新失败，请检查网络连接";

// ============================================================================
// Settings & status
// ============================================================================

/// Controller settings
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub container: String,
    pub center: LatLng,
    pub zoom: u8,
    pub cluster_radius: u32,
    pub focus_zoom: u8,
    pub startup_zoom: u8,
    pub popup_delay: Duration,
    pub geo_timeout: Duration,
    pub locate_max_age: Duration,
    pub standard_max_age: Duration,
}

impl MapSettings {
    pub fn from_config(map: &MapConfig, geo: &GeolocationConfig) -> Self {
        Self {
            container: map.container.clone(),
            center: map.center,
            zoom: map.zoom,
            cluster_radius: map.cluster_radius,
            focus_zoom: map.focus_zoom,
            startup_zoom: map.startup_zoom,
            popup_delay: POPUP_SETTLE_DELAY,
            geo_timeout: geo.timeout(),
            locate_max_age: Duration::from_secs(geo.locate_max_age_secs),
            standard_max_age: Duration::from_secs(geo.standard_max_age_secs),
        }
    }

    fn locate_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: self.geo_timeout,
            maximum_age: self.locate_max_age,
            ..PositionOptions::locate()
        }
    }

    fn standard_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: self.geo_timeout,
            maximum_age: self.standard_max_age,
            ..PositionOptions::standard()
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        let config = emomap_common::AppConfig::default();
        Self::from_config(&config.map, &config.geolocation)
    }
}

/// Lifecycle of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStatus {
    Uninitialized,
    Ready,
    /// Mounting failed; the error panel is showing
    Unavailable,
    Destroyed,
}

/// Result of a backend load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied; number of markers now held
    Applied(usize),
    /// A newer load was issued meanwhile; the response was discarded
    Stale,
}

// ============================================================================
// State
// ============================================================================

struct MapState {
    status: MapStatus,
    surface: Box<dyn MapSurface>,
    markers: Vec<MarkerEntry>,
    visible: HashSet<EmotionId>,
    filter: FilterState,
    user_location: Option<Position>,
}

impl MapState {
    fn ensure_ready(&self) -> MapResult<()> {
        match self.status {
            MapStatus::Ready => Ok(()),
            MapStatus::Uninitialized => Err(MapError::NotInitialized),
            MapStatus::Unavailable => Err(MapError::MapUnavailable(MAP_UNAVAILABLE_MESSAGE.to_string())),
            MapStatus::Destroyed => Err(MapError::Destroyed),
        }
    }

    fn entry(&self, id: EmotionId) -> Option<&MarkerEntry> {
        self.markers.iter().find(|e| e.id() == id)
    }

    /// Bring the cluster layer in line with the filter, touching only changed markers
    fn sync_visible(&mut self, now: DateTime<Utc>) -> (usize, usize) {
        let wanted: HashSet<EmotionId> = visible_markers(&self.markers, &self.filter, now)
            .into_iter()
            .map(MarkerEntry::id)
            .collect();

        let mut shown = 0;
        let mut hidden = 0;
        for entry in &self.markers {
            let id = entry.id();
            match (self.visible.contains(&id), wanted.contains(&id)) {
                (false, true) => {
                    self.surface.add_to_cluster(&entry.handle);
                    shown += 1;
                }
                (true, false) => {
                    self.surface.remove_from_cluster(id);
                    hidden += 1;
                }
                _ => {}
            }
        }
        self.visible = wanted;
        (shown, hidden)
    }

    fn replace_markers(&mut self, records: Vec<EmotionRecord>, now: DateTime<Utc>) -> usize {
        self.surface.clear_cluster();
        self.visible.clear();
        self.markers = ingest(records);
        self.sync_visible(now);
        self.markers.len()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owner of the emotion map
pub struct MapController {
    settings: MapSettings,
    api: Arc<dyn EmotionApi>,
    geo: Arc<GeoLocationProvider>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<MapState>,
    generation: AtomicU64,
}

impl MapController {
    pub fn new(
        settings: MapSettings,
        surface: Box<dyn MapSurface>,
        api: Arc<dyn EmotionApi>,
        geo: Arc<GeoLocationProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            api,
            geo,
            notifier,
            state: Mutex::new(MapState {
                status: MapStatus::Uninitialized,
                surface,
                markers: Vec::new(),
                visible: HashSet::new(),
                filter: FilterState::default(),
                user_location: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Mount the map with the configured container, center and zoom
    pub fn initialize_default(&self) -> MapResult<()> {
        let container = self.settings.container.clone();
        self.initialize(&container, self.settings.center, self.settings.zoom)
    }

    /// Mount the map.
    ///
    /// When the mapping library is unavailable an error panel with a reload
    /// action replaces the map and `MapUnavailable` is returned.
    #[instrument(skip(self))]
    pub fn initialize(&self, container: &str, center: LatLng, zoom: u8) -> MapResult<()> {
        let mut state = self.state.lock();
        match state.status {
            MapStatus::Ready => {
                debug!("Map already initialized");
                return Ok(());
            }
            MapStatus::Destroyed => return Err(MapError::Destroyed),
            MapStatus::Uninitialized | MapStatus::Unavailable => {}
        }

        if let Err(e) = state
            .surface
            .mount(container, center, zoom, self.settings.cluster_radius)
        {
            error!(error = %e, container, "Map initialization failed");
            state.surface.show_error_panel(MAP_UNAVAILABLE_MESSAGE, RELOAD_ACTION);
            state.status = MapStatus::Unavailable;
            return Err(e);
        }

        state.status = MapStatus::Ready;
        info!(container, center = %center, zoom, "Map initialized");
        Ok(())
    }

    /// Fetch all emotions and rebuild the marker set.
    ///
    /// Failures leave the current markers untouched.
    #[instrument(skip(self))]
    pub async fn load_emotions(&self) -> MapResult<LoadOutcome> {
        self.state.lock().ensure_ready()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let records = match self.api.list_emotions().await {
            Ok(records) => records,
            Err(e) if self.generation.load(Ordering::SeqCst) != generation => {
                debug!(generation, error = %e, "Discarding stale emotion load failure");
                return Ok(LoadOutcome::Stale);
            }
            Err(e) => {
                warn!(generation, code = e.code(), error = %e, "Failed to load emotions");
                return Err(e.into());
            }
        };

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding stale emotion load");
            return Ok(LoadOutcome::Stale);
        }
        state.ensure_ready()?;

        let fetched = records.len();
        let count = state.replace_markers(records, Utc::now());
        info!(generation, fetched, markers = count, visible = state.visible.len(), "Emotions loaded");
        Ok(LoadOutcome::Applied(count))
    }

    /// Show a freshly created emotion, center on it and open its popup.
    ///
    /// The marker is shown even when the active filter would hide it; the next
    /// `apply_filters` brings the two back in line.
    #[instrument(skip(self, record, session), fields(emotion_id = %record.id))]
    pub async fn add_emotion(&self, record: EmotionRecord, session: &SessionContext) -> MapResult<()> {
        let id = record.id;
        {
            let mut state = self.state.lock();
            state.ensure_ready()?;
            let entry = MarkerEntry::from_record(record).ok_or(MapError::MissingCoordinates(id))?;
            let position = entry.handle.position;

            if let Some(slot) = state.markers.iter().position(|e| e.id() == id) {
                state.surface.remove_from_cluster(id);
                state.markers[slot] = entry.clone();
            } else {
                state.markers.push(entry.clone());
            }
            state.surface.add_to_cluster(&entry.handle);
            state.visible.insert(id);
            state.surface.set_view(position, self.settings.focus_zoom);
            debug!(markers = state.markers.len(), "Marker added");
        }

        tokio::time::sleep(self.settings.popup_delay).await;

        let mut state = self.state.lock();
        if state.ensure_ready().is_err() || !state.visible.contains(&id) {
            debug!("Marker gone before its popup opened");
            return Ok(());
        }
        let content = state.entry(id).map(|e| e.handle.click(session, Utc::now()));
        if let Some(content) = content {
            state.surface.open_popup(id, &content);
        }
        Ok(())
    }

    /// Drop the marker of a deleted emotion
    pub fn remove_emotion(&self, id: EmotionId) -> bool {
        let mut state = self.state.lock();
        let before = state.markers.len();
        state.markers.retain(|e| e.id() != id);
        if state.visible.remove(&id) {
            state.surface.remove_from_cluster(id);
        }
        before != state.markers.len()
    }

    /// Apply a filter; returns the number of visible markers
    pub fn apply_filters(&self, filter: FilterState) -> MapResult<usize> {
        self.apply_filters_at(filter, Utc::now())
    }

    /// Apply a filter relative to `now`
    #[instrument(skip(self, filter), fields(filter = %filter))]
    pub fn apply_filters_at(&self, filter: FilterState, now: DateTime<Utc>) -> MapResult<usize> {
        let mut state = self.state.lock();
        state.ensure_ready()?;
        state.filter = filter;
        let (shown, hidden) = state.sync_visible(now);
        debug!(shown, hidden, visible = state.visible.len(), "Filters applied");
        Ok(state.visible.len())
    }

    /// Reset the filters and reload everything from the backend
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> MapResult<LoadOutcome> {
        {
            let mut state = self.state.lock();
            state.ensure_ready()?;
            state.filter = FilterState::default();
            state.sync_visible(Utc::now());
        }

        match self.load_emotions().await {
            Ok(LoadOutcome::Applied(count)) => {
                self.notifier.success(REFRESH_OK_MESSAGE);
                Ok(LoadOutcome::Applied(count))
            }
            Ok(LoadOutcome::Stale) => Ok(LoadOutcome::Stale),
            Err(e) => {
                self.notifier.error(REFRESH_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    /// Center on the user's position and mark it
    #[instrument(skip(self))]
    pub async fn locate_user(&self) -> MapResult<Position> {
        self.state.lock().ensure_ready()?;

        let fix = match self.geo.current_position(self.settings.locate_options()).await {
            Ok(fix) => fix,
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let mut state = self.state.lock();
        state.ensure_ready()?;
        state.surface.set_view(fix.coords, self.settings.focus_zoom);
        state.surface.remove_user_marker();
        state.surface.place_user_marker(fix.coords, USER_MARKER_LABEL);
        state.user_location = Some(fix);
        info!(position = %fix.coords, "User located");
        Ok(fix)
    }

    /// Start-up centering; failures are only logged
    #[instrument(skip(self))]
    pub async fn center_on_user(&self) -> Option<LatLng> {
        let fix = match self.geo.current_position(self.settings.standard_options()).await {
            Ok(fix) => fix,
            Err(e) => {
                debug!(reason = %e, "Keeping default map center");
                return None;
            }
        };

        let mut state = self.state.lock();
        if state.ensure_ready().is_err() {
            return None;
        }
        state.surface.set_view(fix.coords, self.settings.startup_zoom);
        Some(fix.coords)
    }

    /// Open the popup of a visible marker as seen by `session`
    pub fn click_marker(&self, id: EmotionId, session: &SessionContext) -> MapResult<PopupContent> {
        let mut state = self.state.lock();
        state.ensure_ready()?;
        if !state.visible.contains(&id) {
            return Err(MapError::UnknownMarker(id));
        }
        let content = state
            .entry(id)
            .map(|e| e.handle.click(session, Utc::now()))
            .ok_or(MapError::UnknownMarker(id))?;
        state.surface.open_popup(id, &content);
        Ok(content)
    }

    /// Release the surface and every marker. Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        if state.status == MapStatus::Destroyed {
            return;
        }
        // In-flight loads must not repopulate a destroyed map
        self.generation.fetch_add(1, Ordering::SeqCst);
        if state.status == MapStatus::Ready {
            state.surface.remove();
        }
        state.markers.clear();
        state.visible.clear();
        state.user_location = None;
        state.status = MapStatus::Destroyed;
        info!("Map destroyed");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn status(&self) -> MapStatus {
        self.state.lock().status
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().markers.len()
    }

    /// Ids of visible markers, in marker order
    pub fn visible_ids(&self) -> Vec<EmotionId> {
        let state = self.state.lock();
        state
            .markers
            .iter()
            .map(MarkerEntry::id)
            .filter(|id| state.visible.contains(id))
            .collect()
    }

    pub fn filter_state(&self) -> FilterState {
        self.state.lock().filter
    }

    pub fn user_location(&self) -> Option<Position> {
        self.state.lock().user_location
    }

    pub fn record(&self, id: EmotionId) -> Option<EmotionRecord> {
        self.state.lock().entry(id).map(|e| e.record.clone())
    }
}

impl fmt::Debug for MapController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MapController")
            .field("status", &state.status)
            .field("markers", &state.markers.len())
            .field("visible", &state.visible.len())
            .field("filter", &state.filter)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}
