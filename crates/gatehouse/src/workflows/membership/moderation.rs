use std::sync::Arc;

use tracing::{error, info, warn};

use super::domain::Application;
use super::store::{ApplicationStore, Decision, StoreError};
use crate::gateway::{
    Capability, ChannelId, ChannelOps, Control, Directory, GatewayError, MessageId, Notifier,
    OutboundMessage, RoleId, UserId,
};

/// Channels and identifiers the moderation queue acts on.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub staff_channel: ChannelId,
    pub announcements_channel: ChannelId,
    pub member_role: RoleId,
    /// Connection address included in the post-approval welcome notice.
    pub server_address: String,
}

const DENIAL_NOTICE: &str = "Only moderators can decide applications.";
const ALREADY_DECIDED_NOTICE: &str = "This application has already been decided.";
const APPLICANT_GONE_NOTICE: &str =
    "The applicant is no longer a member of the community; nothing was changed.";
const REJECTION_NOTICE: &str =
    "Your application was reviewed and declined. You are welcome to apply again later.";
const GRANT_FAILURE_NOTICE: &str =
    "The member role could not be granted, so the application was closed without taking \
     effect. The applicant may apply again.";
const GRANT_FAILURE_APPLICANT_NOTICE: &str =
    "Something went wrong while finalizing your application. Please apply again.";

/// What came of a moderator pressing Accept or Reject.
#[derive(Debug)]
pub enum DecisionReport {
    /// Invoker lacks the moderator capability; nothing changed.
    Denied,
    /// Another moderator settled this application first, or its record is
    /// already gone.
    AlreadyDecided,
    /// Accept only: the applicant left the community before the decision.
    ApplicantGone,
    /// Accept only: the role grant failed, so the application was closed
    /// without membership. The applicant may re-apply.
    GrantFailed,
    /// The application reached its terminal state.
    Decided {
        application: Application,
        /// Whether the private notice to the applicant went through.
        notice_delivered: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Posts completed applications for staff review and applies the side
/// effects of the eventual decision.
pub struct ModerationQueue {
    store: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
    channels: Arc<dyn ChannelOps>,
    directory: Arc<dyn Directory>,
    config: ModerationConfig,
}

impl ModerationQueue {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
        channels: Arc<dyn ChannelOps>,
        directory: Arc<dyn Directory>,
        config: ModerationConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            channels,
            directory,
            config,
        }
    }

    /// Post the completed application to the staff channel with its two
    /// controls, recording the message handle on the record.
    pub async fn publish(&self, application: &mut Application) -> Result<MessageId, GatewayError> {
        let message = OutboundMessage::with_controls(
            application.staff_summary(),
            vec![Control::Accept, Control::Reject],
        );
        let post = self.channels.post(self.config.staff_channel, message).await?;
        application.staff_post = Some(post);
        info!(applicant = %application.applicant, "application posted for review");
        Ok(post)
    }

    /// Settle a pending application. Both verdicts require the moderator
    /// capability; the first decision wins and later clicks are told the
    /// application was already decided.
    pub async fn decide(
        &self,
        applicant: UserId,
        moderator: UserId,
        decision: Decision,
    ) -> Result<DecisionReport, ModerationError> {
        if !self
            .directory
            .has_capability(moderator, Capability::Moderator)
            .await?
        {
            self.quiet_ephemeral(moderator, DENIAL_NOTICE).await;
            return Ok(DecisionReport::Denied);
        }

        // Re-fetch before touching any state: an applicant who left must
        // not be approved into a role grant that cannot land.
        if decision == Decision::Accept
            && self.directory.fetch_member(applicant).await?.is_none()
        {
            self.quiet_ephemeral(moderator, APPLICANT_GONE_NOTICE).await;
            return Ok(DecisionReport::ApplicantGone);
        }

        let application = match self.store.resolve(&applicant, decision, moderator) {
            Ok(application) => application,
            Err(StoreError::AlreadyDecided) | Err(StoreError::NotFound) => {
                self.quiet_ephemeral(moderator, ALREADY_DECIDED_NOTICE).await;
                return Ok(DecisionReport::AlreadyDecided);
            }
            Err(other) => return Err(other.into()),
        };

        let notice_delivered = match decision {
            Decision::Accept => match self.apply_acceptance(&application, moderator).await {
                Ok(delivered) => delivered,
                Err(err) => {
                    error!(%applicant, %moderator, error = %err, "acceptance not applied");
                    return self.settle_failed_grant(&application, moderator).await;
                }
            },
            Decision::Reject => {
                let delivered = self
                    .notifier
                    .send_private(applicant, OutboundMessage::text(REJECTION_NOTICE))
                    .await
                    .is_ok();
                if !delivered {
                    warn!(%applicant, "rejection notice not delivered");
                }
                delivered
            }
        };

        self.retire_staff_post(&application, moderator, decision).await;
        self.store.discard(&applicant)?;
        info!(%applicant, %moderator, status = application.status.label(), "application decided");

        Ok(DecisionReport::Decided {
            application,
            notice_delivered,
        })
    }

    /// Side effects of acceptance: role grant first, then the public
    /// summary and the welcome notice. Notification failures are reported
    /// but never revert the grant.
    async fn apply_acceptance(
        &self,
        application: &Application,
        moderator: UserId,
    ) -> Result<bool, ModerationError> {
        let applicant = application.applicant;

        self.directory
            .grant_role(applicant, self.config.member_role, "application approved")
            .await?;

        let summary = format!(
            "{nickname} ({age}) has been approved by {moderator}. Welcome aboard!",
            nickname = application.form.nickname,
            age = application.form.age,
            moderator = moderator.mention(),
        );
        if let Err(err) = self
            .channels
            .post(
                self.config.announcements_channel,
                OutboundMessage::text(summary),
            )
            .await
        {
            warn!(%applicant, error = %err, "approval summary not posted");
        }

        let welcome = format!(
            "Your application was approved! Connect at {} to get started.",
            self.config.server_address,
        );
        match self
            .notifier
            .send_private(applicant, OutboundMessage::text(welcome))
            .await
        {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(%applicant, error = %err, "welcome notice not delivered");
                Ok(false)
            }
        }
    }

    /// A won decision whose role grant failed is closed out rather than
    /// left half-applied: both parties are told, the staff post loses its
    /// controls, and the record is dropped so the applicant can re-apply.
    async fn settle_failed_grant(
        &self,
        application: &Application,
        moderator: UserId,
    ) -> Result<DecisionReport, ModerationError> {
        let applicant = application.applicant;
        self.quiet_ephemeral(moderator, GRANT_FAILURE_NOTICE).await;
        if let Err(err) = self
            .notifier
            .send_private(
                applicant,
                OutboundMessage::text(GRANT_FAILURE_APPLICANT_NOTICE),
            )
            .await
        {
            warn!(%applicant, error = %err, "grant failure notice not delivered");
        }
        let line = format!(
            "Approval by {} failed: the member role could not be granted.",
            moderator.mention(),
        );
        self.annotate_staff_post(application, line).await;
        self.store.discard(&applicant)?;
        Ok(DecisionReport::GrantFailed)
    }

    /// Mutate the staff post into its terminal, non-actionable form. With
    /// the controls gone, the application cannot be re-decided.
    async fn retire_staff_post(
        &self,
        application: &Application,
        moderator: UserId,
        decision: Decision,
    ) {
        let verdict = match decision {
            Decision::Accept => "Approved",
            Decision::Reject => "Rejected",
        };
        let line = format!("{verdict} by {}", moderator.mention());
        self.annotate_staff_post(application, line).await;
    }

    async fn annotate_staff_post(&self, application: &Application, line: String) {
        let Some(post) = application.staff_post else {
            return;
        };
        let body = format!("{}\n\n{line}", application.staff_summary());
        if let Err(err) = self
            .channels
            .edit(self.config.staff_channel, post, OutboundMessage::text(body))
            .await
        {
            warn!(applicant = %application.applicant, error = %err, "staff post not retired");
        }
    }

    async fn quiet_ephemeral(&self, user: UserId, text: &str) {
        if let Err(err) = self.notifier.send_ephemeral(user, text).await {
            warn!(%user, error = %err, "ephemeral notice not delivered");
        }
    }
}
