//! Scripted end-to-end walkthrough of the workflows against the in-memory
//! gateway, for stakeholder demos and smoke checks.

use std::sync::Arc;

use clap::Args;

use gatehouse::config::AppConfig;
use gatehouse::error::AppError;
use gatehouse::gateway::{ReplyOutcome, UserId};
use gatehouse::workflows::announce::{AnnouncementPublisher, EntryPoint, PublishAction};
use gatehouse::workflows::membership::{
    Decision, DecisionReport, FormResponses, InterviewOutcome, MembershipService,
};
use gatehouse::workflows::support::{CloseReport, TicketChannelManager, TicketKind};

use crate::infra::{self, ScriptedGateway};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the support ticket portion of the demo.
    #[arg(long)]
    pub(crate) skip_tickets: bool,
    /// Run with zero grace and close delays instead of the configured ones.
    #[arg(long)]
    pub(crate) fast: bool,
}

pub(crate) async fn run_demo(args: DemoArgs, config: AppConfig) -> Result<(), AppError> {
    let services = infra::build_services(&config, args.fast);
    let gateway = services.gateway.clone();

    println!("Gatehouse workflow demo");

    demo_entry_points(&services.publisher, &services.entry_points).await;
    demo_accept_path(&services.membership, &gateway).await?;
    demo_interview_timeout(&services.membership, &gateway).await?;
    demo_unauthorized_decision(&services.membership, &gateway).await?;
    if !args.skip_tickets {
        demo_ticket_lifecycle(&services.tickets, &gateway).await?;
    }

    Ok(())
}

/// Publish every entry point twice to show the idempotence guarantee.
async fn demo_entry_points(publisher: &AnnouncementPublisher, entry_points: &[EntryPoint]) {
    println!("\nEntry-point publishing (run twice)");
    for pass in 1..=2 {
        for (channel, action) in publisher.refresh(entry_points).await {
            let verb = match action {
                PublishAction::Created(_) => "created",
                PublishAction::Updated(_) => "updated in place",
                PublishAction::Skipped => "skipped",
            };
            println!("  pass {pass}: channel {channel} -> {verb}");
        }
    }
}

/// Scenario: complete application, both questions answered, accepted by a
/// moderator.
async fn demo_accept_path(
    membership: &MembershipService,
    gateway: &Arc<ScriptedGateway>,
) -> Result<(), AppError> {
    println!("\nMembership: accepted application");
    let applicant = UserId(1001);
    let moderator = UserId(2001);
    gateway.add_member(applicant);
    gateway.add_moderator(moderator);
    gateway.queue_reply(ReplyOutcome::Answered(
        "Griefing ruins it for everyone; I report it.".to_string(),
    ));
    gateway.queue_reply(ReplyOutcome::Answered(
        "A friend who already plays here.".to_string(),
    ));

    membership
        .submit(
            applicant,
            FormResponses {
                nickname: "Aster".to_string(),
                age: "22".to_string(),
                prior_server_experience: "two years on a survival server".to_string(),
                self_rated_adequacy: "8".to_string(),
                plans: "community builds".to_string(),
            },
        )
        .await?;
    println!("  form submitted, interview starting");

    let outcome = membership.run_interview(applicant).await?;
    println!("  interview outcome: {outcome:?}");

    let report = membership
        .decide(applicant, moderator, Decision::Accept)
        .await?;
    if let DecisionReport::Decided {
        application,
        notice_delivered,
    } = report
    {
        println!("  decision: {}", application.status.label());
        println!("  welcome notice delivered: {notice_delivered}");
        match serde_json::to_string_pretty(&application) {
            Ok(json) => println!("  decided record:\n{json}"),
            Err(err) => println!("  decided record unavailable: {err}"),
        }
    }
    println!(
        "  roles granted: {:?}",
        gateway.granted.lock().expect("gateway poisoned").as_slice()
    );
    Ok(())
}

/// Scenario: the applicant never answers the first question.
async fn demo_interview_timeout(
    membership: &MembershipService,
    gateway: &Arc<ScriptedGateway>,
) -> Result<(), AppError> {
    println!("\nMembership: interview timeout");
    let applicant = UserId(1002);
    gateway.add_member(applicant);
    // No reply queued: the wait falls through to the deadline.

    membership
        .submit(
            applicant,
            FormResponses {
                nickname: "Birch".to_string(),
                age: "30".to_string(),
                prior_server_experience: "creative servers only".to_string(),
                self_rated_adequacy: "5".to_string(),
                plans: "mostly lurking".to_string(),
            },
        )
        .await?;

    let outcome = membership.run_interview(applicant).await?;
    match outcome {
        InterviewOutcome::TimedOut { question } => {
            println!("  timed out on question {question:?}; application closed");
        }
        other => println!("  unexpected outcome: {other:?}"),
    }
    println!(
        "  private notices to applicant: {}",
        gateway.privates_to(applicant).len()
    );
    Ok(())
}

/// Scenario: a user without the moderator capability presses Accept.
async fn demo_unauthorized_decision(
    membership: &MembershipService,
    gateway: &Arc<ScriptedGateway>,
) -> Result<(), AppError> {
    println!("\nMembership: unauthorized decision");
    let bystander = UserId(3001);
    let report = membership
        .decide(UserId(1001), bystander, Decision::Accept)
        .await?;
    println!("  report: {report:?}");
    let denial = gateway
        .ephemerals
        .lock()
        .expect("gateway poisoned")
        .iter()
        .rev()
        .find(|(user, _)| *user == bystander)
        .map(|(_, text)| text.clone());
    println!("  denial notice: {denial:?}");
    Ok(())
}

/// Scenario: bug ticket opened by a player, closed by an administrator.
async fn demo_ticket_lifecycle(
    tickets: &TicketChannelManager,
    gateway: &Arc<ScriptedGateway>,
) -> Result<(), AppError> {
    println!("\nSupport: bug ticket lifecycle");
    let requester = UserId(1003);
    let admin = UserId(2002);
    gateway.add_admin(admin);

    let ticket = tickets.open(TicketKind::Bug, requester).await?;
    println!(
        "  opened {} in channel {} for user {}",
        ticket.name, ticket.channel, ticket.requester
    );

    let report = tickets.close(ticket.channel, admin).await?;
    match report {
        CloseReport::Closed(closed) => {
            println!("  closed {}; channel removed", closed.name);
        }
        other => println!("  unexpected close report: {other:?}"),
    }
    Ok(())
}
