//! Public types for the sync engine.

use thiserror::Error;

/// Sync-status state machine.
///
/// `Success` and `Error` are display states: they revert to `Idle` after the
/// configured display window unless a newer status change supersedes them.
/// Use [`super::SyncEngine::status()`] to check the current status or
/// [`super::SyncEngine::status_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing in flight
    Idle,
    /// A mutation's remote call is in flight
    Syncing,
    /// Last mutation reconciled successfully
    Success,
    /// Last mutation failed and was rolled back
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Syncing => write!(f, "Syncing"),
            Self::Success => write!(f, "Success"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// The only error an engine operation propagates to its caller.
///
/// Remote and persistence failures never surface here; they are resolved
/// inside the engine as rollback + notification (or a logged degradation).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No basket selected")]
    NoBasketSelected,
}
