//! Page controller error types
//!
//! One error type for every page operation. Validation failures keep the
//! per-field detail so forms can show messages next to the offending input.

use emomap_common::AppError;
use emomap_core::{DomainError, ErrorCategory};
use emomap_map::{GeoError, MapError};
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Schema-level errors are reported under this key by `validator`
const SCHEMA_KEY: &str = "__all__";

/// Toast shown when the backend cannot be reached
pub const NETWORK_ERROR_MESSAGE: &str = "网络错误，请重试";

/// A validation message bound to one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Page layer error type
#[derive(Debug)]
pub enum PageError {
    /// Backend or domain rule failure
    Domain(DomainError),

    /// Map controller failure
    Map(MapError),

    /// Geolocation failure
    Geo(GeoError),

    /// Form input rejected before any network call
    Validation(ValidationErrors),

    /// A single field rejected by page logic
    Field(FieldError),

    /// A submission is already in flight
    Busy,

    /// The page has not loaded its data yet
    NotLoaded,

    /// Page wiring is incomplete
    Setup(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::Map(e) => write!(f, "{e}"),
            Self::Geo(e) => write!(f, "{e}"),
            Self::Validation(e) => write!(f, "Validation error: {e}"),
            Self::Field(e) => write!(f, "Validation error: {}: {}", e.field, e.message),
            Self::Busy => write!(f, "A submission is already in progress"),
            Self::NotLoaded => write!(f, "Page data is not loaded"),
            Self::Setup(msg) => write!(f, "Page setup error: {msg}"),
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Map(e) => Some(e),
            Self::Geo(e) => Some(e),
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl PageError {
    /// Create a single-field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field(FieldError {
            field: field.into(),
            message: message.into(),
        })
    }

    /// Create a setup error
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Get the error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Map(e) => e.code(),
            Self::Geo(e) => e.code(),
            Self::Validation(_) | Self::Field(_) => "VALIDATION_ERROR",
            Self::Busy => "SUBMISSION_IN_PROGRESS",
            Self::NotLoaded => "NOT_LOADED",
            Self::Setup(_) => "SETUP_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Map(e) => e.category(),
            Self::Geo(e) => e.category(),
            Self::Validation(_) | Self::Field(_) | Self::Busy | Self::NotLoaded => {
                ErrorCategory::Validation
            }
            Self::Setup(_) => ErrorCategory::CapabilityAbsent,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Field(_))
    }

    /// Field-level messages, sorted by field name.
    ///
    /// Cross-field rules carry their target field as the error code.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation(errors) => {
                let mut out = Vec::new();
                collect_field_errors(errors, &mut out);
                out.sort_by(|a, b| a.field.cmp(&b.field));
                out
            }
            Self::Field(e) => vec![e.clone()],
            _ => Vec::new(),
        }
    }

    /// Message for a toast or an inline hint
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(e) => e.user_message(),
            Self::Map(MapError::Domain(e)) => e.user_message(),
            Self::Map(e) => e.to_string(),
            Self::Geo(e) => e.to_string(),
            Self::Validation(_) | Self::Field(_) => self
                .field_errors()
                .into_iter()
                .next()
                .map_or_else(|| "输入内容无效".to_string(), |e| e.message),
            Self::Busy => "正在提交，请稍候".to_string(),
            Self::NotLoaded => "数据尚未加载".to_string(),
            Self::Setup(_) => "页面初始化失败".to_string(),
        }
    }
}

impl PageError {
    /// Toast text for a failed backend call.
    ///
    /// A message sent by the backend wins; other failures fall back to
    /// `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Domain(
                DomainError::Backend { message, .. }
                | DomainError::Unauthorized(message)
                | DomainError::Forbidden(message)
                | DomainError::NotFound(message)
                | DomainError::ValidationError(message),
            ) if !message.is_empty() => message.clone(),
            Self::Domain(DomainError::Network(_)) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Domain(_) => fallback.to_string(),
            _ => self.user_message(),
        }
    }
}

fn collect_field_errors(errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field: &str = field.as_ref();
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let target = if field == SCHEMA_KEY {
                        error.code.to_string()
                    } else {
                        field.to_string()
                    };
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string);
                    out.push(FieldError {
                        field: target,
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_field_errors(nested, out);
                }
            }
        }
    }
}

impl From<DomainError> for PageError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<MapError> for PageError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::Domain(e) => Self::Domain(e),
            MapError::Geo(e) => Self::Geo(e),
            other => Self::Map(other),
        }
    }
}

impl From<GeoError> for PageError {
    fn from(err: GeoError) -> Self {
        Self::Geo(err)
    }
}

impl From<ValidationErrors> for PageError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Domain(e) => AppError::Domain(e),
            PageError::Validation(_) | PageError::Field(_) => {
                AppError::invalid_input(err.user_message())
            }
            PageError::Map(e) => AppError::ExternalService(e.to_string()),
            PageError::Geo(e) => AppError::ExternalService(e.to_string()),
            PageError::Busy | PageError::NotLoaded => AppError::invalid_input(err),
            PageError::Setup(msg) => AppError::internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for page operations
pub type PageResult<T> = Result<T, PageError>;
