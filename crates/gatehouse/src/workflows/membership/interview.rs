use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::domain::{Application, ApplicationStatus, InterviewAnswer, LifecycleError};
use crate::gateway::{GatewayError, Notifier, OutboundMessage, ReplyOutcome, UserId};

/// Timing knobs for the follow-up interview.
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// How long the applicant has to answer each question.
    pub reply_deadline: Duration,
    /// Pause between questions, as rate-limiting courtesy.
    pub question_grace: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            reply_deadline: Duration::from_secs(600),
            question_grace: Duration::from_secs(1),
        }
    }
}

/// The fixed, ordered interview script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewQuestion {
    Griefing,
    Discovery,
}

impl InterviewQuestion {
    pub const fn prompt(self) -> &'static str {
        match self {
            InterviewQuestion::Griefing => "What is your attitude toward griefing?",
            InterviewQuestion::Discovery => "How did you hear about our community?",
        }
    }
}

const INTRO: &str = "Thanks for applying! Please answer a couple of follow-up questions here.";
const CLOSING_ACK: &str =
    "Thanks for your answers! Your application has been passed on to the moderators.";
const TIMEOUT_NOTICE: &str =
    "You did not answer in time, so this application was closed. You are welcome to apply again.";
const FAILURE_NOTICE: &str =
    "We could not reach you in private messages, so your application could not proceed. \
     Please allow direct messages and apply again.";

/// How an interview session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewOutcome {
    /// Both answers captured; the application is ready for moderation.
    Completed,
    /// The named question went unanswered past the deadline.
    TimedOut { question: InterviewQuestion },
    /// Private delivery was refused or broke mid-interview.
    Failed,
}

/// Runs the timed, strictly sequential private interview. Question two is
/// never sent before question one resolves, and a reply arriving after the
/// deadline belongs to no session.
pub struct FollowUpInterview {
    notifier: Arc<dyn Notifier>,
    config: InterviewConfig,
}

impl FollowUpInterview {
    pub fn new(notifier: Arc<dyn Notifier>, config: InterviewConfig) -> Self {
        Self { notifier, config }
    }

    /// Conduct the interview for a freshly submitted application, mutating
    /// its answers and status in place. The caller persists (or discards)
    /// the record according to the returned outcome.
    pub async fn conduct(
        &self,
        application: &mut Application,
    ) -> Result<InterviewOutcome, LifecycleError> {
        let applicant = application.applicant;
        application.advance(ApplicationStatus::AwaitingInterview)?;

        if let Err(err) = self
            .notifier
            .send_private(applicant, OutboundMessage::text(INTRO))
            .await
        {
            return self.abort(application, InterviewQuestion::Griefing, err).await;
        }

        let griefing = match self.ask(applicant, InterviewQuestion::Griefing).await {
            Ok(ReplyOutcome::Answered(text)) => InterviewAnswer::Answered(text),
            Ok(ReplyOutcome::TimedOut) => {
                return self.expire(application, InterviewQuestion::Griefing).await;
            }
            Err(err) => {
                return self
                    .abort(application, InterviewQuestion::Griefing, err)
                    .await;
            }
        };
        application.griefing_stance = Some(griefing);

        tokio::time::sleep(self.config.question_grace).await;

        let discovery = match self.ask(applicant, InterviewQuestion::Discovery).await {
            Ok(ReplyOutcome::Answered(text)) => InterviewAnswer::Answered(text),
            Ok(ReplyOutcome::TimedOut) => {
                return self.expire(application, InterviewQuestion::Discovery).await;
            }
            Err(err) => {
                return self
                    .abort(application, InterviewQuestion::Discovery, err)
                    .await;
            }
        };
        application.discovery_source = Some(discovery);

        // Best effort: a lost closing ack must not abort a completed interview.
        if let Err(err) = self
            .notifier
            .send_private(applicant, OutboundMessage::text(CLOSING_ACK))
            .await
        {
            warn!(%applicant, error = %err, "closing acknowledgment not delivered");
        }

        application.advance(ApplicationStatus::PendingReview)?;
        info!(%applicant, "interview completed, application pending review");
        Ok(InterviewOutcome::Completed)
    }

    async fn ask(
        &self,
        applicant: UserId,
        question: InterviewQuestion,
    ) -> Result<ReplyOutcome, GatewayError> {
        self.notifier
            .send_private(applicant, OutboundMessage::text(question.prompt()))
            .await?;
        self.notifier
            .await_private_reply(applicant, self.config.reply_deadline)
            .await
    }

    fn record_miss(
        application: &mut Application,
        question: InterviewQuestion,
        answer: InterviewAnswer,
    ) {
        match question {
            InterviewQuestion::Griefing => application.griefing_stance = Some(answer),
            InterviewQuestion::Discovery => application.discovery_source = Some(answer),
        }
    }

    /// Deadline expiry: terminal, no moderation post will ever exist.
    async fn expire(
        &self,
        application: &mut Application,
        question: InterviewQuestion,
    ) -> Result<InterviewOutcome, LifecycleError> {
        Self::record_miss(application, question, InterviewAnswer::NoResponse);
        application.advance(ApplicationStatus::InterviewTimedOut)?;
        let applicant = application.applicant;
        info!(%applicant, ?question, "interview question timed out");

        if let Err(err) = self
            .notifier
            .send_private(applicant, OutboundMessage::text(TIMEOUT_NOTICE))
            .await
        {
            warn!(%applicant, error = %err, "timeout notice not delivered");
        }

        Ok(InterviewOutcome::TimedOut { question })
    }

    /// Delivery failure: terminal before anything reaches moderation.
    async fn abort(
        &self,
        application: &mut Application,
        question: InterviewQuestion,
        err: GatewayError,
    ) -> Result<InterviewOutcome, LifecycleError> {
        Self::record_miss(application, question, InterviewAnswer::ErrorDuringCapture);
        application.advance(ApplicationStatus::InterviewFailed)?;
        let applicant = application.applicant;
        warn!(%applicant, ?question, error = %err, "interview aborted");

        if let Err(err) = self.notifier.send_ephemeral(applicant, FAILURE_NOTICE).await {
            warn!(%applicant, error = %err, "failure notice not delivered");
        }

        Ok(InterviewOutcome::Failed)
    }
}
