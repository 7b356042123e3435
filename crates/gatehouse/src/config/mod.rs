use std::env;
use std::time::Duration;

use crate::gateway::{ChannelId, RoleId};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub channels: ChannelMap,
    pub membership: MembershipSettings,
    pub tickets: TicketSettings,
    pub publisher: PublisherSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            channels: ChannelMap {
                applications: ChannelId(id_var("APP_APPLICATIONS_CHANNEL", 1)?),
                reports: ChannelId(id_var("APP_REPORTS_CHANNEL", 2)?),
                info: ChannelId(id_var("APP_INFO_CHANNEL", 3)?),
                staff: ChannelId(id_var("APP_STAFF_CHANNEL", 4)?),
                announcements: ChannelId(id_var("APP_ANNOUNCEMENTS_CHANNEL", 5)?),
            },
            membership: MembershipSettings {
                member_role: RoleId(id_var("APP_MEMBER_ROLE", 100)?),
                server_address: env::var("APP_SERVER_ADDRESS")
                    .unwrap_or_else(|_| "play.example.net".to_string()),
                reply_deadline: Duration::from_secs(id_var("APP_INTERVIEW_DEADLINE_SECS", 600)?),
                question_grace: Duration::from_secs(id_var("APP_INTERVIEW_GRACE_SECS", 1)?),
            },
            tickets: TicketSettings {
                category_name: env::var("APP_TICKET_CATEGORY")
                    .unwrap_or_else(|_| "support".to_string()),
                close_delay: Duration::from_secs(id_var("APP_TICKET_CLOSE_DELAY_SECS", 3)?),
            },
            publisher: PublisherSettings {
                scan_window: id_var("APP_PUBLISH_SCAN_WINDOW", 20)? as usize,
            },
        })
    }
}

fn id_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var: name }),
        Err(_) => Ok(default),
    }
}

/// The channels the service publishes to or reads from.
#[derive(Debug, Clone)]
pub struct ChannelMap {
    /// Public entry point carrying the application call-to-action.
    pub applications: ChannelId,
    /// Public entry point carrying the report call-to-action.
    pub reports: ChannelId,
    /// Informational channel maintained by the publisher.
    pub info: ChannelId,
    /// Staff-only channel receiving completed applications.
    pub staff: ChannelId,
    /// Public channel receiving approval summaries.
    pub announcements: ChannelId,
}

/// Tunables for the application lifecycle.
#[derive(Debug, Clone)]
pub struct MembershipSettings {
    pub member_role: RoleId,
    /// Connection address included in the post-approval welcome notice.
    pub server_address: String,
    /// How long an applicant has to answer each interview question.
    pub reply_deadline: Duration,
    /// Pause between interview questions, as rate-limiting courtesy.
    pub question_grace: Duration,
}

/// Tunables for support ticket channels.
#[derive(Debug, Clone)]
pub struct TicketSettings {
    pub category_name: String,
    /// Visibility delay between the closing notice and channel deletion.
    pub close_delay: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the entry-point message publisher.
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    /// How many recent messages to inspect when looking for a prior
    /// call-to-action.
    pub scan_window: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid unsigned integer")]
    InvalidNumber { var: &'static str },
}
