//! Fluent matcher for asserting what a role may do to a controller-like
//! resource.
//!
//! The matcher decides *which* actions to ask about (directly or through a
//! `permit-behavior` helper name) and how to reduce the answers; the actual
//! permission question is delegated to a [`RuleEngine`] collaborator.

mod allowed;
mod check;

pub use allowed::{allowed_to, AllowedTo};
pub use check::{CheckReport, CheckRequest, EngineError, ResourceCheck, RuleEngine, Verdict};
