//! Geolocation
//!
//! [`GeoLocator`] is the platform capability (a browser, a GPS daemon, a fixed
//! test position). [`GeoLocationProvider`] puts the request policy on top:
//! single-shot requests, a hard timeout and reuse of a recent fix.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emomap_core::{ErrorCategory, LatLng};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Geolocation failure, displayed as the user-facing reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("用户拒绝了定位请求")]
    PermissionDenied,

    #[error("位置信息不可用")]
    PositionUnavailable,

    #[error("定位请求超时")]
    Timeout,

    #[error("浏览器不支持定位功能")]
    Unsupported,
}

impl GeoError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "GEO_PERMISSION_DENIED",
            Self::PositionUnavailable => "GEO_POSITION_UNAVAILABLE",
            Self::Timeout => "GEO_TIMEOUT",
            Self::Unsupported => "GEO_UNSUPPORTED",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied => ErrorCategory::PermissionDenied,
            Self::Unsupported => ErrorCategory::CapabilityAbsent,
            Self::PositionUnavailable | Self::Timeout => ErrorCategory::Network,
        }
    }
}

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: LatLng,
    /// Accuracy radius in meters, when known
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(coords: LatLng) -> Self {
        Self {
            coords,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }
}

/// Options of a single position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// The explicit "locate me" button
    pub const fn locate() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }

    /// Start-up centering and form pre-fill
    pub const fn standard() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Platform geolocation capability
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, options: &PositionOptions) -> Result<Position, GeoError>;
}

/// Geolocation with timeout and fix caching
pub struct GeoLocationProvider {
    locator: Arc<dyn GeoLocator>,
    last_fix: Mutex<Option<Position>>,
}

impl GeoLocationProvider {
    pub fn new(locator: Arc<dyn GeoLocator>) -> Self {
        Self {
            locator,
            last_fix: Mutex::new(None),
        }
    }

    /// Resolve the current position once
    #[instrument(skip(self, options), fields(timeout_ms = options.timeout.as_millis() as u64))]
    pub async fn current_position(&self, options: PositionOptions) -> Result<Position, GeoError> {
        if let Some(cached) = self.cached(options.maximum_age, Utc::now()) {
            debug!(position = %cached.coords, "Reusing cached position");
            return Ok(cached);
        }

        let fix = tokio::time::timeout(options.timeout, self.locator.locate(&options))
            .await
            .map_err(|_| GeoError::Timeout)?
            .inspect_err(|e| warn!(code = e.code(), reason = %e, "Geolocation failed"))?;

        *self.last_fix.lock() = Some(fix);
        debug!(position = %fix.coords, "Position resolved");
        Ok(fix)
    }

    /// Resolve the current position, substituting `fallback` on any failure
    pub async fn current_position_or(&self, options: PositionOptions, fallback: LatLng) -> LatLng {
        match self.current_position(options).await {
            Ok(fix) => fix.coords,
            Err(_) => fallback,
        }
    }

    /// Most recent successful fix
    pub fn last_known(&self) -> Option<Position> {
        *self.last_fix.lock()
    }

    fn cached(&self, maximum_age: Duration, now: DateTime<Utc>) -> Option<Position> {
        if maximum_age.is_zero() {
            return None;
        }
        let fix = (*self.last_fix.lock())?;
        // A fix stamped in the future counts as brand new
        let age = (now - fix.timestamp).to_std().unwrap_or_default();
        (age <= maximum_age).then_some(fix)
    }
}

impl std::fmt::Debug for GeoLocationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoLocationProvider")
            .field("last_fix", &self.last_known())
            .finish()
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Always reports the same position
#[derive(Debug)]
pub struct FixedLocator {
    position: LatLng,
    accuracy: Option<f64>,
    calls: AtomicUsize,
}

impl FixedLocator {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            accuracy: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    /// Number of fixes handed out
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn locate(&self, _options: &PositionOptions) -> Result<Position, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Position {
            coords: self.position,
            accuracy: self.accuracy,
            timestamp: Utc::now(),
        })
    }
}

/// Platform without any geolocation support
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocator;

#[async_trait]
impl GeoLocator for UnsupportedLocator {
    async fn locate(&self, _options: &PositionOptions) -> Result<Position, GeoError> {
        Err(GeoError::Unsupported)
    }
}
