//! Map surface port
//!
//! The mapping library (tiles, cluster layer, popups) sits behind
//! [`MapSurface`]. [`HeadlessSurface`] records every call, which is all the
//! command-line client and the tests need.

use emomap_core::{EmotionId, LatLng};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{MapError, MapResult};
use crate::marker::MarkerHandle;
use crate::popup::PopupContent;

/// Rendering backend of the map
pub trait MapSurface: Send {
    /// Attach to `container`; fails when the mapping library is missing
    fn mount(&mut self, container: &str, center: LatLng, zoom: u8, cluster_radius: u32) -> MapResult<()>;

    fn set_view(&mut self, center: LatLng, zoom: u8);

    fn add_to_cluster(&mut self, marker: &MarkerHandle);

    fn remove_from_cluster(&mut self, id: EmotionId);

    fn clear_cluster(&mut self);

    fn place_user_marker(&mut self, position: LatLng, label: &str);

    fn remove_user_marker(&mut self);

    fn open_popup(&mut self, id: EmotionId, content: &PopupContent);

    /// Replace the map with an error message and a single action button
    fn show_error_panel(&mut self, message: &str, action: &str);

    /// Tear down the map and everything on it
    fn remove(&mut self);
}

/// Inline error shown in place of the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub message: String,
    pub action: String,
}

/// Everything a [`HeadlessSurface`] has been told to draw
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    pub container: Option<String>,
    pub mounted: bool,
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub cluster_radius: u32,
    /// Marker ids on the cluster layer, in insertion order
    pub clustered: Vec<EmotionId>,
    pub user_marker: Option<(LatLng, String)>,
    pub open_popup: Option<(EmotionId, PopupContent)>,
    pub popups_opened: usize,
    pub error_panel: Option<ErrorPanel>,
    pub removed: bool,
}

/// Surface without a display
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    available: bool,
    state: Arc<Mutex<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            available: true,
            state: Arc::new(Mutex::new(SurfaceState::default())),
        }
    }

    /// A surface whose mapping library failed to load
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Copy of the current drawing state; clones share it
    pub fn snapshot(&self) -> SurfaceState {
        self.state.lock().clone()
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface for HeadlessSurface {
    fn mount(&mut self, container: &str, center: LatLng, zoom: u8, cluster_radius: u32) -> MapResult<()> {
        if !self.available {
            return Err(MapError::MapUnavailable("mapping library not loaded".to_string()));
        }
        let mut state = self.state.lock();
        state.container = Some(container.to_string());
        state.mounted = true;
        state.removed = false;
        state.center = Some(center);
        state.zoom = Some(zoom);
        state.cluster_radius = cluster_radius;
        Ok(())
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        let mut state = self.state.lock();
        state.center = Some(center);
        state.zoom = Some(zoom);
    }

    fn add_to_cluster(&mut self, marker: &MarkerHandle) {
        let mut state = self.state.lock();
        if !state.clustered.contains(&marker.id) {
            state.clustered.push(marker.id);
        }
    }

    fn remove_from_cluster(&mut self, id: EmotionId) {
        let mut state = self.state.lock();
        state.clustered.retain(|c| *c != id);
        if state.open_popup.as_ref().is_some_and(|(open, _)| *open == id) {
            state.open_popup = None;
        }
    }

    fn clear_cluster(&mut self) {
        let mut state = self.state.lock();
        state.clustered.clear();
        state.open_popup = None;
    }

    fn place_user_marker(&mut self, position: LatLng, label: &str) {
        self.state.lock().user_marker = Some((position, label.to_string()));
    }

    fn remove_user_marker(&mut self) {
        self.state.lock().user_marker = None;
    }

    fn open_popup(&mut self, id: EmotionId, content: &PopupContent) {
        let mut state = self.state.lock();
        state.open_popup = Some((id, content.clone()));
        state.popups_opened += 1;
    }

    fn show_error_panel(&mut self, message: &str, action: &str) {
        self.state.lock().error_panel = Some(ErrorPanel {
            message: message.to_string(),
            action: action.to_string(),
        });
    }

    fn remove(&mut self) {
        let mut state = self.state.lock();
        state.mounted = false;
        state.removed = true;
        state.clustered.clear();
        state.user_marker = None;
        state.open_popup = None;
    }
}
