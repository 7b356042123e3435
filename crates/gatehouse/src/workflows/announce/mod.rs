//! Idempotent maintenance of the public entry-point messages.
//!
//! There is no stored message id: every publish re-derives "the" live
//! message by scanning a bounded window of recent channel history, so the
//! operation stays stateless across restarts.

pub mod content;

use std::sync::Arc;

use tracing::{info, warn};

use crate::gateway::{ChannelId, ChannelOps, GatewayError, MessageId, OutboundMessage};

/// What the publisher did to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// No prior message found; a new one was sent.
    Created(MessageId),
    /// A prior message was found and updated in place.
    Updated(MessageId),
    /// The channel could not be refreshed; nothing was sent, so no
    /// duplicate can exist.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// One designated channel plus the message it must carry.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub channel: ChannelId,
    pub message: OutboundMessage,
}

/// Guarantees each designated public channel carries exactly one current,
/// interactive message owned by this system.
pub struct AnnouncementPublisher {
    channels: Arc<dyn ChannelOps>,
    scan_window: usize,
}

impl AnnouncementPublisher {
    pub fn new(channels: Arc<dyn ChannelOps>, scan_window: usize) -> Self {
        Self {
            channels,
            scan_window,
        }
    }

    /// Scan-and-update-or-create for a single channel. Running this twice
    /// in a row yields exactly one live message, never two; errors
    /// propagate without a fallback send so a failed edit cannot produce
    /// a duplicate.
    pub async fn ensure(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<PublishAction, PublishError> {
        let window = self.channels.scan_recent(channel, self.scan_window).await?;
        // Control presence identifies the message: the designated channels
        // carry no other self-authored posts of the same shape.
        let wants_controls = message.has_controls();
        let existing = window
            .iter()
            .find(|scanned| scanned.authored_by_self && scanned.has_controls == wants_controls);

        match existing {
            Some(prior) => {
                self.channels.edit(channel, prior.id, message).await?;
                info!(%channel, "entry-point message updated in place");
                Ok(PublishAction::Updated(prior.id))
            }
            None => {
                let id = self.channels.post(channel, message).await?;
                info!(%channel, "entry-point message created");
                Ok(PublishAction::Created(id))
            }
        }
    }

    /// Refresh every entry point, skipping (and logging) channels that
    /// cannot be refreshed so one bad channel never blocks the others.
    pub async fn refresh(&self, entry_points: &[EntryPoint]) -> Vec<(ChannelId, PublishAction)> {
        let mut actions = Vec::with_capacity(entry_points.len());
        for entry in entry_points {
            let action = match self.ensure(entry.channel, entry.message.clone()).await {
                Ok(action) => action,
                Err(err) => {
                    warn!(channel = %entry.channel, error = %err, "entry point skipped");
                    PublishAction::Skipped
                }
            };
            actions.push((entry.channel, action));
        }
        actions
    }
}
