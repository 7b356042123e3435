//! Workflow tree: membership intake/interview/moderation, support tickets,
//! and entry-point announcement publishing.

pub mod announce;
pub mod membership;
pub mod support;
