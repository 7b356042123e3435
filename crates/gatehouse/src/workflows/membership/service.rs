use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Application, FormResponses, LifecycleError};
use super::interview::{FollowUpInterview, InterviewConfig, InterviewOutcome};
use super::moderation::{DecisionReport, ModerationConfig, ModerationError, ModerationQueue};
use super::store::{ApplicationStore, Decision, StoreError};
use crate::gateway::{
    ChannelId, ChannelOps, Directory, GatewayError, Notifier, RoleId, UserId,
};

/// Wiring for the whole membership pipeline.
#[derive(Debug, Clone)]
pub struct MembershipConfig {
    pub staff_channel: ChannelId,
    pub announcements_channel: ChannelId,
    pub member_role: RoleId,
    pub server_address: String,
    pub interview: InterviewConfig,
}

const ALREADY_MEMBER_NOTICE: &str =
    "You already hold the member role, so there is nothing to apply for.";
const IN_PROGRESS_NOTICE: &str = "You already have an application in progress.";
const SUBMIT_ACK: &str =
    "Your application has been received! Check your private messages for two follow-up questions.";
const HANDOFF_FAILURE_NOTICE: &str =
    "Something went wrong while passing your application to the moderators. Please apply again.";

/// Verdict of the entry-point gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryGate {
    /// Show the intake form.
    Open,
    /// The user already holds the granted role; no record was created.
    AlreadyMember,
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("application form incomplete: missing {0:?}")]
    IncompleteForm(Vec<&'static str>),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Moderation(#[from] ModerationError),
}

/// Facade composing the entry gate, form intake, follow-up interview, and
/// moderation queue over a shared session store.
pub struct MembershipService {
    store: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn Directory>,
    interview: FollowUpInterview,
    moderation: ModerationQueue,
    member_role: RoleId,
}

impl MembershipService {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
        channels: Arc<dyn ChannelOps>,
        directory: Arc<dyn Directory>,
        config: MembershipConfig,
    ) -> Self {
        let interview = FollowUpInterview::new(notifier.clone(), config.interview.clone());
        let moderation = ModerationQueue::new(
            store.clone(),
            notifier.clone(),
            channels,
            directory.clone(),
            ModerationConfig {
                staff_channel: config.staff_channel,
                announcements_channel: config.announcements_channel,
                member_role: config.member_role,
                server_address: config.server_address.clone(),
            },
        );
        Self {
            store,
            notifier,
            directory,
            interview,
            moderation,
            member_role: config.member_role,
        }
    }

    /// Entry-point button guard: existing members get a private notice and
    /// no application record.
    pub async fn gate(&self, user: UserId) -> Result<EntryGate, MembershipError> {
        if self
            .directory
            .member_has_role(user, self.member_role)
            .await?
        {
            self.quiet_ephemeral(user, ALREADY_MEMBER_NOTICE).await;
            return Ok(EntryGate::AlreadyMember);
        }
        Ok(EntryGate::Open)
    }

    /// Accept a one-shot form submission and create the `Submitted` record.
    /// Nothing staff-visible happens yet.
    pub async fn submit(
        &self,
        user: UserId,
        form: FormResponses,
    ) -> Result<Application, MembershipError> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(MembershipError::IncompleteForm(missing));
        }

        let application = match self.store.insert(Application::new(user, form)) {
            Ok(application) => application,
            Err(StoreError::Conflict) => {
                self.quiet_ephemeral(user, IN_PROGRESS_NOTICE).await;
                return Err(StoreError::Conflict.into());
            }
            Err(other) => return Err(other.into()),
        };

        self.quiet_ephemeral(user, SUBMIT_ACK).await;
        info!(applicant = %user, "application submitted");
        Ok(application)
    }

    /// Run the follow-up interview for a submitted application. Completed
    /// interviews are handed to moderation; short-circuited ones are
    /// discarded and never reach staff.
    pub async fn run_interview(&self, user: UserId) -> Result<InterviewOutcome, MembershipError> {
        let mut application = self.store.fetch(&user)?.ok_or(StoreError::NotFound)?;

        let outcome = self.interview.conduct(&mut application).await?;
        match outcome {
            InterviewOutcome::Completed => {
                // A failed staff hand-off must not strand the record: the
                // applicant is told and freed to apply again.
                if let Err(err) = self.moderation.publish(&mut application).await {
                    warn!(applicant = %user, error = %err, "staff hand-off failed");
                    self.quiet_ephemeral(user, HANDOFF_FAILURE_NOTICE).await;
                    self.store.discard(&user)?;
                    return Err(err.into());
                }
                self.store.update(application)?;
            }
            InterviewOutcome::TimedOut { .. } | InterviewOutcome::Failed => {
                self.store.discard(&user)?;
            }
        }
        Ok(outcome)
    }

    /// Apply a moderator's verdict to a pending application.
    pub async fn decide(
        &self,
        applicant: UserId,
        moderator: UserId,
        decision: Decision,
    ) -> Result<DecisionReport, MembershipError> {
        Ok(self.moderation.decide(applicant, moderator, decision).await?)
    }

    async fn quiet_ephemeral(&self, user: UserId, text: &str) {
        if let Err(err) = self.notifier.send_ephemeral(user, text).await {
            warn!(%user, error = %err, "ephemeral notice not delivered");
        }
    }
}
