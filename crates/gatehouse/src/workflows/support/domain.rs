use serde::{Deserialize, Serialize};

use crate::gateway::{ChannelId, UserId};

/// The three supported ticket categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketKind {
    PlayerReport,
    Bug,
    Issue,
}

impl TicketKind {
    pub const fn label(self) -> &'static str {
        match self {
            TicketKind::PlayerReport => "player-report",
            TicketKind::Bug => "bug",
            TicketKind::Issue => "issue",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            TicketKind::PlayerReport => "Player report",
            TicketKind::Bug => "Bug report",
            TicketKind::Issue => "Issue",
        }
    }
}

/// A scoped private support channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Generated from the kind and the requester, e.g. `bug-42`.
    pub name: String,
    pub kind: TicketKind,
    pub requester: UserId,
    pub channel: ChannelId,
    pub open: bool,
}

/// Deterministic channel name for a requester's ticket.
pub fn channel_name(kind: TicketKind, requester: UserId) -> String {
    format!("{}-{}", kind.label(), requester.0)
}

/// Kind-specific template seeded into a fresh ticket channel. The requester
/// fills the placeholders in; staff read the result.
pub fn seed_template(kind: TicketKind, requester: UserId) -> String {
    let reporter = requester.mention();
    match kind {
        TicketKind::PlayerReport => format!(
            "**Player report** opened by {reporter}\n\
             Reported player's nickname:\n\
             Which rule was broken:\n\
             What happened:\n\
             Evidence (screenshots, coordinates, logs):",
        ),
        TicketKind::Bug => format!(
            "**Bug report** opened by {reporter}\n\
             What happened:\n\
             Evidence (screenshots, steps to reproduce):",
        ),
        TicketKind::Issue => format!(
            "**Issue** opened by {reporter}\n\
             Describe the problem:",
        ),
    }
}
