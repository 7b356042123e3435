use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::announce::PublishError;
use crate::workflows::membership::MembershipError;
use crate::workflows::support::TicketError;

/// Top-level error for service startup and command execution.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("membership workflow error: {0}")]
    Membership(#[from] MembershipError),
    #[error("ticket workflow error: {0}")]
    Ticket(#[from] TicketError),
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}
