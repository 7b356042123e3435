//! Long-running service loop: the dispatcher consuming a line-delimited
//! JSON feed on standard input, standing in for the platform SDK
//! connection. Blank lines and `#` comments are ignored; lines that do not
//! parse are logged and skipped.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use gatehouse::config::AppConfig;
use gatehouse::error::AppError;
use gatehouse::gateway::{ChannelId, Control, ReplyOutcome, UserId};
use gatehouse::workflows::membership::{Decision, FormResponses};
use gatehouse::workflows::support::TicketKind;

use crate::dispatch::{Dispatcher, PlatformEvent};
use crate::infra::{self, ScriptedGateway};

/// One line of the inbound feed: either a scripting directive for the
/// in-memory gateway or a platform event for the dispatcher.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum FeedCommand {
    AddMember { user: u64 },
    AddModerator { user: u64 },
    AddAdmin { user: u64 },
    QueueReply { text: String },
    Apply { user: u64 },
    Report { user: u64, kind: TicketKind },
    Submit { user: u64, form: FormResponses },
    Decide {
        applicant: u64,
        moderator: u64,
        decision: Decision,
    },
    Close { channel: u64, invoker: u64 },
    Republish { invoker: u64 },
    Quit,
}

pub(crate) async fn run_serve(config: AppConfig) -> Result<(), AppError> {
    let services = infra::build_services(&config, false);
    let gateway = services.gateway.clone();

    let (events, inbox) = mpsc::channel(64);
    let dispatcher = Arc::new(Dispatcher::new(
        services.membership,
        services.tickets,
        services.publisher,
        gateway.clone(),
        gateway.clone(),
        services.entry_points,
    ));
    let loop_handle = tokio::spawn(dispatcher.run(inbox));

    info!("event feed open on standard input");
    feed(BufReader::new(tokio::io::stdin()), &gateway, events).await?;

    if let Err(err) = loop_handle.await {
        warn!(error = %err, "dispatcher task ended abnormally");
    }
    info!("feed closed, all handlers finished");
    Ok(())
}

/// Translate feed lines into dispatcher events until the reader ends, a
/// `quit` line arrives, or the dispatcher goes away.
async fn feed<R>(
    reader: R,
    gateway: &ScriptedGateway,
    events: mpsc::Sender<PlatformEvent>,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match serde_json::from_str::<FeedCommand>(line) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, "feed line not understood");
                continue;
            }
        };
        let event = match command {
            FeedCommand::AddMember { user } => {
                gateway.add_member(UserId(user));
                continue;
            }
            FeedCommand::AddModerator { user } => {
                gateway.add_moderator(UserId(user));
                continue;
            }
            FeedCommand::AddAdmin { user } => {
                gateway.add_admin(UserId(user));
                continue;
            }
            FeedCommand::QueueReply { text } => {
                gateway.queue_reply(ReplyOutcome::Answered(text));
                continue;
            }
            FeedCommand::Quit => break,
            FeedCommand::Apply { user } => PlatformEvent::EntryPressed {
                user: UserId(user),
                control: Control::Apply,
            },
            FeedCommand::Report { user, kind } => PlatformEvent::EntryPressed {
                user: UserId(user),
                control: match kind {
                    TicketKind::PlayerReport => Control::ReportPlayer,
                    TicketKind::Bug => Control::ReportBug,
                    TicketKind::Issue => Control::ReportIssue,
                },
            },
            FeedCommand::Submit { user, form } => PlatformEvent::FormSubmitted {
                user: UserId(user),
                responses: form,
            },
            FeedCommand::Decide {
                applicant,
                moderator,
                decision,
            } => PlatformEvent::DecisionPressed {
                applicant: UserId(applicant),
                moderator: UserId(moderator),
                decision,
            },
            FeedCommand::Close { channel, invoker } => PlatformEvent::ClosePressed {
                channel: ChannelId(channel),
                invoker: UserId(invoker),
            },
            FeedCommand::Republish { invoker } => PlatformEvent::RepublishRequested {
                invoker: UserId(invoker),
            },
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
    Ok(())
}
