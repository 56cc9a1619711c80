//! AIVAN orchestrator - capability dispatch and conversation state
//!
//! This crate decides, for each user intent:
//! - which capability mode is active and what it asks of the backend
//! - which generative service call(s) serve a submission
//! - how results fold back into the append-only conversation log
//! - when a capability ends, and how failures are reported to the user

pub mod capabilities;
pub mod handlers;
pub mod orchestrator;
pub mod outcome;
pub mod prompts;
pub mod request;
pub mod suggestions;

#[cfg(test)]
mod testing;

pub use capabilities::CapabilityRegistry;
pub use handlers::{CapabilityHandler, DispatchTable};
pub use orchestrator::Orchestrator;
pub use outcome::{
    ActivationError, AttachError, AttachOutcome, ModelError, RejectReason, SubmitOutcome,
};
