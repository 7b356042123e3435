use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{MessageId, UserId};

/// The five structured fields captured verbatim from the intake form.
///
/// The platform enforces that every field is filled before submission; this
/// crate only re-checks presence so a malformed event cannot create an
/// empty record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponses {
    pub nickname: String,
    pub age: String,
    pub prior_server_experience: String,
    pub self_rated_adequacy: String,
    pub plans: String,
}

impl FormResponses {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.nickname.trim().is_empty() {
            missing.push("nickname");
        }
        if self.age.trim().is_empty() {
            missing.push("age");
        }
        if self.prior_server_experience.trim().is_empty() {
            missing.push("prior_server_experience");
        }
        if self.self_rated_adequacy.trim().is_empty() {
            missing.push("self_rated_adequacy");
        }
        if self.plans.trim().is_empty() {
            missing.push("plans");
        }
        missing
    }
}

/// Outcome of one interview question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewAnswer {
    /// Applicant replied before the deadline; text kept verbatim.
    Answered(String),
    /// Deadline expired without a reply.
    NoResponse,
    /// Delivery or capture failed mid-question.
    ErrorDuringCapture,
}

impl InterviewAnswer {
    /// Staff-facing rendering of the answer.
    pub fn display(&self) -> &str {
        match self {
            InterviewAnswer::Answered(text) => text,
            InterviewAnswer::NoResponse => "(no response before the deadline)",
            InterviewAnswer::ErrorDuringCapture => "(could not be captured)",
        }
    }
}

/// Lifecycle status of an application. Transitions are monotonic forward;
/// see [`ApplicationStatus::can_advance_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Submitted,
    AwaitingInterview,
    InterviewTimedOut,
    InterviewFailed,
    PendingReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::AwaitingInterview => "awaiting_interview",
            ApplicationStatus::InterviewTimedOut => "interview_timed_out",
            ApplicationStatus::InterviewFailed => "interview_failed",
            ApplicationStatus::PendingReview => "pending_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::InterviewTimedOut
                | ApplicationStatus::InterviewFailed
                | ApplicationStatus::Approved
                | ApplicationStatus::Rejected
        )
    }

    pub const fn can_advance_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Submitted, ApplicationStatus::AwaitingInterview)
                | (
                    ApplicationStatus::AwaitingInterview,
                    ApplicationStatus::InterviewTimedOut
                        | ApplicationStatus::InterviewFailed
                        | ApplicationStatus::PendingReview,
                )
                | (
                    ApplicationStatus::PendingReview,
                    ApplicationStatus::Approved | ApplicationStatus::Rejected,
                )
        )
    }
}

/// A candidate's in-progress or decided membership request, keyed by the
/// applicant's platform user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub applicant: UserId,
    pub form: FormResponses,
    pub griefing_stance: Option<InterviewAnswer>,
    pub discovery_source: Option<InterviewAnswer>,
    pub status: ApplicationStatus,
    /// Set only when the application reaches `Approved` or `Rejected`.
    pub decided_by: Option<UserId>,
    /// Staff-channel message carrying the Accept/Reject controls, once
    /// the application reaches moderation.
    pub staff_post: Option<MessageId>,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    pub fn new(applicant: UserId, form: FormResponses) -> Self {
        Self {
            applicant,
            form,
            griefing_stance: None,
            discovery_source: None,
            status: ApplicationStatus::Submitted,
            decided_by: None,
            staff_post: None,
            submitted_at: Utc::now(),
        }
    }

    /// Move the lifecycle forward, rejecting any non-monotonic transition.
    pub fn advance(&mut self, next: ApplicationStatus) -> Result<(), LifecycleError> {
        if !self.status.can_advance_to(next) {
            return Err(LifecycleError {
                from: self.status.label(),
                to: next.label(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Staff-channel rendering of the completed application. No field is
    /// added here after the record reaches moderation; the terminal
    /// annotation is appended by the moderation queue on decision.
    pub fn staff_summary(&self) -> String {
        let griefing = self
            .griefing_stance
            .as_ref()
            .map(InterviewAnswer::display)
            .unwrap_or("(not asked)");
        let discovery = self
            .discovery_source
            .as_ref()
            .map(InterviewAnswer::display)
            .unwrap_or("(not asked)");
        format!(
            "New application from {nickname}\n\
             Applicant: {mention}\n\
             Nickname: {nickname}\n\
             Age: {age}\n\
             Prior server experience: {experience}\n\
             Self-rated adequacy: {adequacy}\n\
             Plans: {plans}\n\
             Attitude toward griefing: {griefing}\n\
             Heard about us via: {discovery}\n\
             Submitted at: {submitted}",
            nickname = self.form.nickname,
            mention = self.applicant.mention(),
            age = self.form.age,
            experience = self.form.prior_server_experience,
            adequacy = self.form.self_rated_adequacy,
            plans = self.form.plans,
            griefing = griefing,
            discovery = discovery,
            submitted = self.submitted_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

/// Raised when a handler tries to move an application backwards or across
/// a skipped state.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct LifecycleError {
    pub from: &'static str,
    pub to: &'static str,
}
