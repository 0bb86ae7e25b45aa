//! User-facing notifications.

use serde::Serialize;
use std::fmt;

/// Severity of a notification. Each kind is an independent stack in the message bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A request or validation failed.
    Error,
    /// Something completed and the analyst should know.
    Info,
    /// A request was about to be sent.
    Debug,
    /// Something looks wrong but nothing failed.
    Warning,
}

impl NotificationKind {
    /// Every kind, in display order.
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Error,
        NotificationKind::Warning,
        NotificationKind::Info,
        NotificationKind::Debug,
    ];

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::Debug => "debug",
            NotificationKind::Warning => "warning",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message shown to the analyst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Which stack it lives in.
    pub kind: NotificationKind,
    /// Human-readable text.
    pub text: String,
}

impl Notification {
    /// Build a notification.
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}
