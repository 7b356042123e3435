use super::domain::Ticket;
use crate::gateway::ChannelId;

/// Bookkeeping for open tickets so a Close control press can be mapped
/// back to the ticket it belongs to. In-memory; tickets do not outlive
/// the process (the channels themselves are the durable state).
pub trait TicketLedger: Send + Sync {
    fn record(&self, ticket: Ticket) -> Result<Ticket, LedgerError>;

    fn find_by_channel(&self, channel: ChannelId) -> Result<Option<Ticket>, LedgerError>;

    /// Flip the open flag once the backing channel is gone.
    fn mark_closed(&self, channel: ChannelId) -> Result<Ticket, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("no ticket recorded for this channel")]
    NotFound,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
