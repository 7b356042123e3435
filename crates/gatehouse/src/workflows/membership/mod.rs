//! Membership application lifecycle: form intake, timed follow-up
//! interview, and moderation decision with side effects.

pub mod domain;
pub mod interview;
pub mod moderation;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationStatus, FormResponses, InterviewAnswer, LifecycleError,
};
pub use interview::{FollowUpInterview, InterviewConfig, InterviewOutcome, InterviewQuestion};
pub use moderation::{DecisionReport, ModerationConfig, ModerationError, ModerationQueue};
pub use service::{EntryGate, MembershipConfig, MembershipError, MembershipService};
pub use store::{ApplicationStore, Decision, StoreError};
