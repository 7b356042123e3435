//! Capability ports for the hosting chat platform.
//!
//! The workflows never talk to the platform SDK directly; they consume the
//! traits defined here so that tests and the CLI demo can substitute
//! in-memory fakes. Connection management, credential loading, and command
//! registration live entirely behind these seams.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Render the platform mention syntax for this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Platform role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub u64);

/// Permission classes the workflows care about. Membership in either class
/// is decided by the platform, not by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// May decide membership applications.
    Moderator,
    /// May close tickets and manage entry-point messages.
    Administrator,
}

/// Interactive controls attached to outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Apply,
    ReportPlayer,
    ReportBug,
    ReportIssue,
    Accept,
    Reject,
    CloseTicket,
}

impl Control {
    pub const fn label(self) -> &'static str {
        match self {
            Control::Apply => "Apply to join",
            Control::ReportPlayer => "Report a player",
            Control::ReportBug => "Report a bug",
            Control::ReportIssue => "Other issue",
            Control::Accept => "Accept",
            Control::Reject => "Reject",
            Control::CloseTicket => "Close ticket",
        }
    }
}

/// Message content handed to the platform for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    pub controls: Vec<Control>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_controls(text: impl Into<String>, controls: Vec<Control>) -> Self {
        Self {
            text: text.into(),
            controls,
        }
    }

    pub fn has_controls(&self) -> bool {
        !self.controls.is_empty()
    }
}

/// Minimal view of a message returned by a history scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedMessage {
    pub id: MessageId,
    pub authored_by_self: bool,
    pub has_controls: bool,
}

/// Result of waiting for a user's next private message.
///
/// Deadline expiry is a value, not a failure: timing out is an ordinary
/// branch of the interview, while [`GatewayError`] covers delivery problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Answered(String),
    TimedOut,
}

/// Visibility rules for a freshly provisioned private channel. Default
/// visibility denies everyone not named here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVisibility {
    pub allow_users: Vec<UserId>,
    pub allow_capability: Capability,
}

/// Current community member as re-fetched from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub display_name: String,
}

/// Failures surfaced by the platform boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("recipient does not accept private messages")]
    RecipientUnreachable,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("platform transport failure: {0}")]
    Transport(String),
}

/// Private delivery to a single user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a direct message. Fails with
    /// [`GatewayError::RecipientUnreachable`] when the user's privacy
    /// settings forbid contact.
    async fn send_private(&self, user: UserId, message: OutboundMessage)
        -> Result<(), GatewayError>;

    /// Wait for the user's next private reply, up to `deadline`.
    async fn await_private_reply(
        &self,
        user: UserId,
        deadline: Duration,
    ) -> Result<ReplyOutcome, GatewayError>;

    /// Short-lived acknowledgment visible only to the interacting user.
    async fn send_ephemeral(&self, user: UserId, text: &str) -> Result<(), GatewayError>;
}

/// Channel and message manipulation.
#[async_trait]
pub trait ChannelOps: Send + Sync {
    async fn post(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, GatewayError>;

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        replacement: OutboundMessage,
    ) -> Result<(), GatewayError>;

    /// Bounded history scan, most recent first.
    async fn scan_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ScannedMessage>, GatewayError>;

    async fn find_or_create_category(&self, name: &str) -> Result<ChannelId, GatewayError>;

    async fn create_private_channel(
        &self,
        category: ChannelId,
        name: &str,
        visibility: ChannelVisibility,
    ) -> Result<ChannelId, GatewayError>;

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError>;
}

/// Member lookup, role management, and permission checks.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn fetch_member(&self, user: UserId) -> Result<Option<Member>, GatewayError>;

    async fn member_has_role(&self, user: UserId, role: RoleId) -> Result<bool, GatewayError>;

    async fn grant_role(
        &self,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    async fn has_capability(
        &self,
        user: UserId,
        capability: Capability,
    ) -> Result<bool, GatewayError>;
}
