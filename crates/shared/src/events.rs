//! Session events for incremental re-rendering.

use serde::Serialize;

use crate::capability::CapabilityId;
use crate::conversation::Timestamp;

/// Change notification emitted by the orchestrator after each state mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// A turn was appended to the log
    TurnAppended { created_at: Timestamp },
    /// A transient placeholder turn was removed
    TurnRetracted { created_at: Timestamp },
    /// The log was cut down to `len` turns
    LogTruncated { len: usize },
    /// A submission started or settled
    LoadingChanged { is_loading: bool },
    /// The active capability changed
    CapabilityChanged { active: Option<CapabilityId> },
    /// Another model was selected
    ModelChanged { name: String },
    /// Log and state were cleared
    SessionReset,
}
