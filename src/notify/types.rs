//! Notification Types
//!
//! The stored notification record and the caller-facing [`Notice`] builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued user-visible notification.
///
/// `id` and `timestamp` are assigned by the center at insertion and are
/// stable for the notification's lifetime. `read` is mutated only through
/// [`NotificationCenter::mark_read`](super::NotificationCenter::mark_read).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    /// Persistent notifications are excluded from automatic timed removal.
    pub persistent: bool,
}

/// Caller input for a new notification.
///
/// Errors default to persistent (they do not auto-dismiss unless
/// explicitly overridden); the other kinds default to auto-dismiss.
#[derive(Debug, Clone)]
pub struct Notice {
    pub(super) kind: NotificationKind,
    pub(super) message: String,
    pub(super) details: Option<String>,
    pub(super) persistent: Option<bool>,
}

impl Notice {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            persistent: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    /// Attach a longer explanation shown alongside the message.
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Override the kind's default dismissal behavior.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = Some(persistent);
        self
    }

    /// Effective persistence: the explicit override, or the kind default.
    pub(super) fn is_persistent(&self) -> bool {
        self.persistent
            .unwrap_or(self.kind == NotificationKind::Error)
    }
}
