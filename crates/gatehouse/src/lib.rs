//! Gatehouse: membership application intake and support ticket workflows
//! for a community chat platform.
//!
//! The crate owns the application/ticket lifecycle state machines and the
//! idempotent entry-point publisher; everything platform-specific sits
//! behind the capability traits in [`gateway`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod telemetry;
pub mod workflows;
