//! Message bus for user-facing notifications.
//!
//! One bounded stack per [`NotificationKind`]. Within a kind entries keep strict append
//! order and the newest entry is the "last message"; there is no ordering across kinds.

use crate::model::{Notification, NotificationKind};
use std::collections::VecDeque;

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;

/// Default number of messages retained per kind.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1000;

/// A single message with the time it was appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// When the message was appended
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// The message text
    pub text: String,
}

/// Bounded per-kind log of notifications.
///
/// When a kind is at capacity the oldest message of that kind is dropped before the new
/// one is appended. Duplicates are kept.
#[derive(Debug, Clone)]
pub struct MessageBus {
    error: VecDeque<MessageEntry>,
    info: VecDeque<MessageEntry>,
    debug: VecDeque<MessageEntry>,
    warning: VecDeque<MessageEntry>,
    /// Maximum entries to retain per kind
    capacity: usize,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_CAPACITY)
    }
}

impl MessageBus {
    /// Create an empty bus retaining at most `capacity` messages per kind.
    ///
    /// A capacity of zero discards everything.
    pub fn new(capacity: usize) -> Self {
        Self {
            error: VecDeque::new(),
            info: VecDeque::new(),
            debug: VecDeque::new(),
            warning: VecDeque::new(),
            capacity,
        }
    }

    fn stack(&self, kind: NotificationKind) -> &VecDeque<MessageEntry> {
        match kind {
            NotificationKind::Error => &self.error,
            NotificationKind::Info => &self.info,
            NotificationKind::Debug => &self.debug,
            NotificationKind::Warning => &self.warning,
        }
    }

    fn stack_mut(&mut self, kind: NotificationKind) -> &mut VecDeque<MessageEntry> {
        match kind {
            NotificationKind::Error => &mut self.error,
            NotificationKind::Info => &mut self.info,
            NotificationKind::Debug => &mut self.debug,
            NotificationKind::Warning => &mut self.warning,
        }
    }

    /// Append a message to the `kind` stack.
    pub fn append(&mut self, kind: NotificationKind, text: impl Into<String>) {
        let capacity = self.capacity;
        if capacity == 0 {
            return;
        }
        let stack = self.stack_mut(kind);
        if stack.len() >= capacity {
            stack.pop_front();
        }
        stack.push_back(MessageEntry {
            timestamp: chrono::Utc::now(),
            text: text.into(),
        });
    }

    /// Append a prepared notification.
    pub fn push(&mut self, notification: Notification) {
        self.append(notification.kind, notification.text);
    }

    /// Remove and return the newest message of `kind`.
    pub fn pop_last(&mut self, kind: NotificationKind) -> Option<String> {
        self.stack_mut(kind).pop_back().map(|entry| entry.text)
    }

    /// The newest message of `kind`, if any.
    pub fn peek_last(&self, kind: NotificationKind) -> Option<&str> {
        self.stack(kind).back().map(|entry| entry.text.as_str())
    }

    /// Drop every message of every kind.
    pub fn clear_all(&mut self) {
        for kind in NotificationKind::ALL {
            self.stack_mut(kind).clear();
        }
    }

    /// True when any kind holds at least one message.
    pub fn has_any(&self) -> bool {
        NotificationKind::ALL
            .into_iter()
            .any(|kind| !self.stack(kind).is_empty())
    }

    /// Messages of `kind`, oldest first.
    pub fn iter(&self, kind: NotificationKind) -> impl Iterator<Item = &MessageEntry> {
        self.stack(kind).iter()
    }

    /// Number of messages of `kind`.
    pub fn len(&self, kind: NotificationKind) -> usize {
        self.stack(kind).len()
    }

    /// Take every message out of the bus, grouped by kind in [`NotificationKind::ALL`] order.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        for kind in NotificationKind::ALL {
            drained.extend(
                self.stack_mut(kind)
                    .drain(..)
                    .map(|entry| Notification::new(kind, entry.text)),
            );
        }
        drained
    }
}
