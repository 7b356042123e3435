use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus};
use crate::gateway::UserId;

/// A moderator's verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub const fn terminal_status(self) -> ApplicationStatus {
        match self {
            Decision::Accept => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// Session store for in-flight applications, keyed by applicant id.
///
/// Handlers look records up here instead of carrying applicant state in
/// their own identity, so records stay inspectable and the store can
/// enforce at-most-one active application per user. Nothing outlives the
/// process; implementations are expected to be in-memory.
pub trait ApplicationStore: Send + Sync {
    /// Store a fresh record. Fails with [`StoreError::Conflict`] when the
    /// applicant already has an active application.
    fn insert(&self, application: Application) -> Result<Application, StoreError>;

    fn update(&self, application: Application) -> Result<(), StoreError>;

    fn fetch(&self, applicant: &UserId) -> Result<Option<Application>, StoreError>;

    /// Atomically settle a pending application: check-and-set from
    /// `PendingReview` to the decision's terminal status and record the
    /// moderator. The first caller wins; later callers get
    /// [`StoreError::AlreadyDecided`].
    fn resolve(
        &self,
        applicant: &UserId,
        decision: Decision,
        moderator: UserId,
    ) -> Result<Application, StoreError>;

    /// Drop a record that reached a terminal state.
    fn discard(&self, applicant: &UserId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an active application already exists for this user")]
    Conflict,
    #[error("no application found for this user")]
    NotFound,
    #[error("application was already decided")]
    AlreadyDecided,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
