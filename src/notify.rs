//! User-visible notifications.
//!
//! The engine never talks to a toast library directly; it hands every
//! user-facing message to a [`NotificationSink`]. The embedding application
//! decides how (and whether) to present them.

use async_trait::async_trait;

/// A user-visible message emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(String),
    Error(String),
}

impl Notification {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Info(m) | Self::Error(m) => m,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(m) => write!(f, "info: {m}"),
            Self::Error(m) => write!(f, "error: {m}"),
        }
    }
}

/// Sink for user-visible messages.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Default sink: forwards notifications to the `tracing` subscriber.
///
/// Useful for headless embedders and tests that don't care about
/// presentation.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, notification: Notification) {
        match &notification {
            Notification::Info(m) => tracing::info!(message = %m, "notification"),
            Notification::Error(m) => tracing::warn!(message = %m, "notification"),
        }
    }
}
