//! Single consumer of the platform event stream.
//!
//! Every actionable event is handled in its own spawned task, so one
//! applicant waiting on an interview deadline never blocks another user's
//! button press. Handler failures are logged and reported at the narrowest
//! scope; nothing that happens inside a handler brings the loop down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use gatehouse::gateway::{Capability, ChannelId, Control, Directory, Notifier, UserId};
use gatehouse::workflows::announce::{AnnouncementPublisher, EntryPoint};
use gatehouse::workflows::membership::{Decision, FormResponses, MembershipService};
use gatehouse::workflows::support::{TicketChannelManager, TicketKind};

/// Inbound platform interactions, already decoded from the SDK's shapes.
#[derive(Debug)]
pub(crate) enum PlatformEvent {
    /// A user pressed one of the public entry-point controls.
    EntryPressed { user: UserId, control: Control },
    /// A completed intake form arrived.
    FormSubmitted {
        user: UserId,
        responses: FormResponses,
    },
    /// A moderator pressed Accept or Reject on a staff post.
    DecisionPressed {
        applicant: UserId,
        moderator: UserId,
        decision: Decision,
    },
    /// Someone pressed the Close control inside a ticket channel.
    ClosePressed { channel: ChannelId, invoker: UserId },
    /// Administrative request to re-publish the entry-point messages.
    RepublishRequested { invoker: UserId },
    Connected,
    Disconnected,
    Resumed,
}

const REPUBLISH_DENIAL: &str = "Only administrators can re-publish the entry-point messages.";

pub(crate) struct Dispatcher {
    membership: Arc<MembershipService>,
    tickets: Arc<TicketChannelManager>,
    publisher: Arc<AnnouncementPublisher>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn Directory>,
    entry_points: Vec<EntryPoint>,
}

impl Dispatcher {
    pub(crate) fn new(
        membership: Arc<MembershipService>,
        tickets: Arc<TicketChannelManager>,
        publisher: Arc<AnnouncementPublisher>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn Directory>,
        entry_points: Vec<EntryPoint>,
    ) -> Self {
        Self {
            membership,
            tickets,
            publisher,
            notifier,
            directory,
            entry_points,
        }
    }

    /// Consume events until the sending side closes, then wait for every
    /// in-flight handler to finish. Entry-point messages are ensured once
    /// on startup.
    pub(crate) async fn run(self: Arc<Self>, mut events: mpsc::Receiver<PlatformEvent>) {
        self.publisher.refresh(&self.entry_points).await;

        let mut handlers = JoinSet::new();
        while let Some(event) = events.recv().await {
            match event {
                PlatformEvent::Connected => info!("platform connection established"),
                PlatformEvent::Disconnected => warn!("platform connection lost"),
                PlatformEvent::Resumed => info!("platform connection resumed"),
                actionable => {
                    let dispatcher = self.clone();
                    handlers.spawn(async move { dispatcher.handle(actionable).await });
                }
            }
        }
        while handlers.join_next().await.is_some() {}
    }

    async fn handle(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::EntryPressed { user, control } => {
                self.entry_pressed(user, control).await;
            }
            PlatformEvent::FormSubmitted { user, responses } => {
                self.form_submitted(user, responses).await;
            }
            PlatformEvent::DecisionPressed {
                applicant,
                moderator,
                decision,
            } => {
                if let Err(err) = self.membership.decide(applicant, moderator, decision).await {
                    warn!(%applicant, %moderator, error = %err, "decision handling failed");
                }
            }
            PlatformEvent::ClosePressed { channel, invoker } => {
                if let Err(err) = self.tickets.close(channel, invoker).await {
                    warn!(%channel, %invoker, error = %err, "ticket close failed");
                }
            }
            PlatformEvent::RepublishRequested { invoker } => {
                self.republish(invoker).await;
            }
            PlatformEvent::Connected | PlatformEvent::Disconnected | PlatformEvent::Resumed => {}
        }
    }

    async fn entry_pressed(&self, user: UserId, control: Control) {
        let kind = match control {
            Control::Apply => {
                if let Err(err) = self.membership.gate(user).await {
                    warn!(%user, error = %err, "entry gate check failed");
                }
                return;
            }
            Control::ReportPlayer => TicketKind::PlayerReport,
            Control::ReportBug => TicketKind::Bug,
            Control::ReportIssue => TicketKind::Issue,
            other => {
                warn!(%user, control = ?other, "control pressed outside its surface");
                return;
            }
        };
        if let Err(err) = self.tickets.open(kind, user).await {
            warn!(%user, kind = kind.label(), error = %err, "ticket open failed");
        }
    }

    /// Form intake and the follow-up interview run back to back in the
    /// submitting user's own task.
    async fn form_submitted(&self, user: UserId, responses: FormResponses) {
        if let Err(err) = self.membership.submit(user, responses).await {
            warn!(%user, error = %err, "submission rejected");
            return;
        }
        if let Err(err) = self.membership.run_interview(user).await {
            warn!(%user, error = %err, "interview failed");
        }
    }

    async fn republish(&self, invoker: UserId) {
        match self
            .directory
            .has_capability(invoker, Capability::Administrator)
            .await
        {
            Ok(true) => {
                self.publisher.refresh(&self.entry_points).await;
                info!(%invoker, "entry-point messages re-published");
            }
            Ok(false) => {
                if let Err(err) = self.notifier.send_ephemeral(invoker, REPUBLISH_DENIAL).await {
                    warn!(%invoker, error = %err, "denial notice not delivered");
                }
            }
            Err(err) => {
                warn!(%invoker, error = %err, "capability check failed");
            }
        }
    }
}
