//! Transient notifications

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long a toast stays on screen
pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

const HISTORY_LIMIT: usize = 50;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Success => "#10b981",
            Self::Error => "#ef4444",
            Self::Warning => "#f59e0b",
            Self::Info => "#3b82f6",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A shown notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn expires_at(&self) -> Instant {
        self.shown_at + TOAST_LIFETIME
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at()
    }
}

/// Whether new toasts stack or replace the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastMode {
    /// Toasts pile up until each expires (map page)
    #[default]
    Stacked,
    /// A new toast removes the one on screen (form pages)
    Replace,
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NotificationKind::Error, message);
    }

    fn warning(&self, message: &str) {
        self.notify(NotificationKind::Warning, message);
    }

    fn info(&self, message: &str) {
        self.notify(NotificationKind::Info, message);
    }
}

#[derive(Debug, Default)]
struct PresenterState {
    active: Vec<Toast>,
    history: VecDeque<Toast>,
}

/// In-process toast presenter
#[derive(Debug, Default)]
pub struct NotificationPresenter {
    mode: ToastMode,
    state: Mutex<PresenterState>,
}

impl NotificationPresenter {
    pub fn new(mode: ToastMode) -> Self {
        Self {
            mode,
            state: Mutex::new(PresenterState::default()),
        }
    }

    pub fn mode(&self) -> ToastMode {
        self.mode
    }

    pub fn show(&self, kind: NotificationKind, message: &str) -> Toast {
        self.show_at(kind, message, Instant::now())
    }

    /// Show a toast as if displayed at `at`
    pub fn show_at(&self, kind: NotificationKind, message: &str, at: Instant) -> Toast {
        match kind {
            NotificationKind::Error | NotificationKind::Warning => {
                warn!(kind = kind.as_str(), text = message, "Notification shown");
            }
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = kind.as_str(), text = message, "Notification shown");
            }
        }

        let toast = Toast {
            kind,
            message: message.to_string(),
            shown_at: at,
        };

        let mut state = self.state.lock();
        state.active.retain(|t| t.is_active(at));
        if self.mode == ToastMode::Replace {
            state.active.clear();
        }
        state.active.push(toast.clone());

        if state.history.len() == HISTORY_LIMIT {
            state.history.pop_front();
        }
        state.history.push_back(toast.clone());
        toast
    }

    /// Toasts still on screen at `now`
    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut state = self.state.lock();
        state.active.retain(|t| t.is_active(now));
        state.active.clone()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    /// Every toast shown, oldest first, up to a bounded number
    pub fn history(&self) -> Vec<Toast> {
        self.state.lock().history.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Toast> {
        self.state.lock().history.back().cloned()
    }

    pub fn clear(&self) {
        self.state.lock().active.clear();
    }
}

impl Notifier for NotificationPresenter {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.show(kind, message);
    }
}
