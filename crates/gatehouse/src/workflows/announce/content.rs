//! Static copy for the entry-point messages.

use crate::gateway::{Control, OutboundMessage};

/// Call-to-action inviting candidates to apply for membership.
pub fn application_call_to_action() -> OutboundMessage {
    OutboundMessage::with_controls(
        "Want to join the server? Press the button below to submit an application.",
        vec![Control::Apply],
    )
}

/// Call-to-action offering the three support ticket types.
pub fn report_call_to_action() -> OutboundMessage {
    OutboundMessage::with_controls(
        "Need help? Open a private ticket with the staff using one of the buttons below.",
        vec![
            Control::ReportPlayer,
            Control::ReportBug,
            Control::ReportIssue,
        ],
    )
}

/// Standing informational notice; carries no controls.
pub fn informational() -> OutboundMessage {
    OutboundMessage::text(
        "Applications are reviewed by the moderators after a short private interview. \
         Support tickets are private between you and the staff.",
    )
}
