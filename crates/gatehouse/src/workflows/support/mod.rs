//! Support tickets: scoped private channels for player reports, bugs, and
//! general issues.

pub mod domain;
pub mod ledger;
pub mod tickets;

#[cfg(test)]
mod tests;

pub use domain::{channel_name, seed_template, Ticket, TicketKind};
pub use ledger::{LedgerError, TicketLedger};
pub use tickets::{CloseReport, TicketChannelManager, TicketConfig, TicketError};
