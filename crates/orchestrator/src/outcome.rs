//! Results of user intents that can be refused.

use shared::capability::CapabilityId;
use thiserror::Error;

/// Why a submission was refused. Nothing is appended in any of these cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("a request is already in progress")]
    Busy,
    #[error("nothing to send")]
    Empty,
    #[error("waiting for an image upload")]
    AwaitingAttachment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Settled; `model_turn` tells whether a model turn was appended
    Completed { model_turn: bool },
    /// A dispatch path failed and the failure turn was appended
    Failed { error: String },
    Rejected(RejectReason),
    /// The session was reset while the call was in flight; result dropped
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    ImageStaged,
    DocumentStaged,
    /// The image was the whole request and went out right away
    Submitted(SubmitOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("unsupported file type: {mime_type}")]
    Unsupported { mime_type: String },
    #[error("file is empty: {name}")]
    Empty { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("unknown capability: {0}")]
    Unknown(CapabilityId),
    #[error("a request is already in progress")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown model: {0}")]
    Unknown(String),
    #[error("a request is already in progress")]
    Busy,
}
