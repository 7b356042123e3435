use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::domain::{channel_name, seed_template, Ticket, TicketKind};
use super::ledger::{LedgerError, TicketLedger};
use crate::gateway::{
    Capability, ChannelId, ChannelOps, ChannelVisibility, Control, Directory, GatewayError,
    Notifier, OutboundMessage, UserId,
};

/// Tunables for ticket channel provisioning and teardown.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Category under which ticket channels are grouped.
    pub category_name: String,
    /// Visibility delay between the closing notice and channel deletion.
    pub close_delay: Duration,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            category_name: "support".to_string(),
            close_delay: Duration::from_secs(3),
        }
    }
}

const OPEN_ACK: &str = "Setting up your ticket...";
const OPEN_FAILURE: &str =
    "Something went wrong while creating your ticket. Please try again or contact staff directly.";
const CLOSE_DENIAL: &str = "Only administrators can close tickets.";
const CLOSING_NOTICE: &str = "This ticket has been resolved and will be removed shortly.";
const DELETE_FAILURE_NOTICE: &str =
    "The channel could not be removed automatically; staff will clean it up manually.";

/// What came of a Close control press.
#[derive(Debug)]
pub enum CloseReport {
    /// Invoker lacks the administrative capability; nothing changed.
    Denied,
    Closed(Ticket),
    /// Deletion failed; the channel was left in place.
    DeletionFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("no ticket is associated with this channel")]
    UnknownChannel,
}

/// Provisions scoped private support channels and tears them down on
/// resolution.
pub struct TicketChannelManager {
    channels: Arc<dyn ChannelOps>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn TicketLedger>,
    config: TicketConfig,
}

impl TicketChannelManager {
    pub fn new(
        channels: Arc<dyn ChannelOps>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn Directory>,
        ledger: Arc<dyn TicketLedger>,
        config: TicketConfig,
    ) -> Self {
        Self {
            channels,
            notifier,
            directory,
            ledger,
            config,
        }
    }

    /// Open a ticket: dedicated category, private channel visible only to
    /// the requester and administrators, kind-specific template with a
    /// Close control. Any provisioning failure is reported to the
    /// requester as a generic failure; creation is atomic from this
    /// component's perspective.
    pub async fn open(&self, kind: TicketKind, requester: UserId) -> Result<Ticket, TicketError> {
        self.quiet_ephemeral(requester, OPEN_ACK).await;

        match self.provision(kind, requester).await {
            Ok(ticket) => {
                let reference = format!(
                    "Your {} ticket is ready: see channel #{} ({}).",
                    kind.title().to_ascii_lowercase(),
                    ticket.name,
                    ticket.channel,
                );
                self.quiet_ephemeral(requester, &reference).await;
                info!(%requester, kind = kind.label(), channel = %ticket.channel, "ticket opened");
                Ok(ticket)
            }
            Err(err) => {
                error!(%requester, kind = kind.label(), error = %err, "ticket provisioning failed");
                self.quiet_ephemeral(requester, OPEN_FAILURE).await;
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        kind: TicketKind,
        requester: UserId,
    ) -> Result<Ticket, TicketError> {
        let category = self
            .channels
            .find_or_create_category(&self.config.category_name)
            .await?;
        let name = channel_name(kind, requester);
        let channel = self
            .channels
            .create_private_channel(
                category,
                &name,
                ChannelVisibility {
                    allow_users: vec![requester],
                    allow_capability: Capability::Administrator,
                },
            )
            .await?;
        self.channels
            .post(
                channel,
                OutboundMessage::with_controls(
                    seed_template(kind, requester),
                    vec![Control::CloseTicket],
                ),
            )
            .await?;

        let ticket = self.ledger.record(Ticket {
            name,
            kind,
            requester,
            channel,
            open: true,
        })?;
        Ok(ticket)
    }

    /// Close a ticket: administrative capability required; the channel is
    /// deleted after a short visibility delay. A failed deletion leaves the
    /// channel in place rather than retrying.
    pub async fn close(
        &self,
        channel: ChannelId,
        invoker: UserId,
    ) -> Result<CloseReport, TicketError> {
        if !self
            .directory
            .has_capability(invoker, Capability::Administrator)
            .await?
        {
            self.quiet_ephemeral(invoker, CLOSE_DENIAL).await;
            return Ok(CloseReport::Denied);
        }

        if self.ledger.find_by_channel(channel)?.is_none() {
            return Err(TicketError::UnknownChannel);
        }

        if let Err(err) = self
            .channels
            .post(channel, OutboundMessage::text(CLOSING_NOTICE))
            .await
        {
            warn!(%channel, error = %err, "closing notice not posted");
        }

        tokio::time::sleep(self.config.close_delay).await;

        if let Err(err) = self.channels.delete_channel(channel).await {
            error!(%channel, error = %err, "ticket channel deletion failed");
            if let Err(err) = self
                .channels
                .post(channel, OutboundMessage::text(DELETE_FAILURE_NOTICE))
                .await
            {
                warn!(%channel, error = %err, "deletion failure notice not posted");
            }
            return Ok(CloseReport::DeletionFailed);
        }

        let ticket = self.ledger.mark_closed(channel)?;
        info!(%channel, %invoker, "ticket closed");
        Ok(CloseReport::Closed(ticket))
    }

    async fn quiet_ephemeral(&self, user: UserId, text: &str) {
        if let Err(err) = self.notifier.send_ephemeral(user, text).await {
            warn!(%user, error = %err, "ephemeral notice not delivered");
        }
    }
}
