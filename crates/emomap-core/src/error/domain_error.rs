//! Domain errors - error types for the domain layer and the backend ports

use thiserror::Error;

use crate::value_objects::EmotionId;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Emotion not found: {0}")]
    EmotionNotFound(EmotionId),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown emotion type: {0}")]
    InvalidEmotionType(String),

    #[error("Unknown time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Invalid coordinates: ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Emotion {0} has no coordinates")]
    MissingCoordinates(EmotionId),

    #[error("Custom emotion requires an emoji")]
    MissingCustomEmoji,

    #[error("Intensity must be between 1 and 10, got {0}")]
    InvalidIntensity(u8),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Content must not be empty")]
    EmptyContent,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Login required: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Capability Errors
    // =========================================================================
    #[error("Map service unavailable: {0}")]
    MapUnavailable(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Failure class, used to decide how an error reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A platform capability is missing (map library, geolocation)
    CapabilityAbsent,
    /// The user or the backend refused the operation
    PermissionDenied,
    /// Transport failure or non-2xx response
    Network,
    /// Client-side validation failed before any network call
    Validation,
}

/// Where an error is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// Next to the affected widget or field
    Inline,
    /// As a transient notification
    Toast,
}

impl ErrorCategory {
    pub fn surface(self) -> ErrorSurface {
        match self {
            Self::CapabilityAbsent | Self::Validation => ErrorSurface::Inline,
            Self::PermissionDenied | Self::Network => ErrorSurface::Toast,
        }
    }
}

impl DomainError {
    /// Get an error code string for logs and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::EmotionNotFound(_) => "UNKNOWN_EMOTION",
            Self::NotFound(_) => "NOT_FOUND",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmotionType(_) => "INVALID_EMOTION_TYPE",
            Self::InvalidTimeWindow(_) => "INVALID_TIME_WINDOW",
            Self::InvalidCoordinates { .. } => "INVALID_COORDINATES",
            Self::MissingCoordinates(_) => "MISSING_COORDINATES",
            Self::MissingCustomEmoji => "MISSING_CUSTOM_EMOJI",
            Self::InvalidIntensity(_) => "INVALID_INTENSITY",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::EmptyContent => "EMPTY_CONTENT",

            // Authorization
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",

            // Capability
            Self::MapUnavailable(_) => "MAP_UNAVAILABLE",

            // Infrastructure
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EmotionNotFound(_) | Self::NotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmotionType(_)
                | Self::InvalidTimeWindow(_)
                | Self::InvalidCoordinates { .. }
                | Self::MissingCoordinates(_)
                | Self::MissingCustomEmoji
                | Self::InvalidIntensity(_)
                | Self::ContentTooLong { .. }
                | Self::EmptyContent
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }

    /// Classify the error for presentation
    pub fn category(&self) -> ErrorCategory {
        if self.is_validation() {
            ErrorCategory::Validation
        } else if self.is_authorization() {
            ErrorCategory::PermissionDenied
        } else if matches!(self, Self::MapUnavailable(_)) {
            ErrorCategory::CapabilityAbsent
        } else {
            ErrorCategory::Network
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Backend-supplied text wins over the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. }
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::ValidationError(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            Self::Network(_) => "网络错误，请重试".to_string(),
            Self::MapUnavailable(_) => "地图服务暂时不可用，请刷新页面重试".to_string(),
            Self::ContentTooLong { max } => format!("内容不能超过{max}个字符"),
            Self::MissingCustomEmoji => "请选择一个自定义表情".to_string(),
            Self::MissingCoordinates(_) | Self::InvalidCoordinates { .. } => {
                "请选择一个有效的位置".to_string()
            }
            Self::EmptyContent => "内容不能为空".to_string(),
            _ => "操作失败".to_string(),
        }
    }
}
