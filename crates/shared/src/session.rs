//! Per-session mutable context that conditions dispatch decisions, and the
//! read-only snapshot handed to a presentation layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::CapabilityId;
use crate::conversation::{Part, Turn};

/// Entry in the model catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOption {
    pub id: String,
    pub name: String,
}

impl ModelOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Image waiting to go out with the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Text document waiting to go out with the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAttachment {
    pub name: String,
    pub text_content: String,
}

impl DocumentAttachment {
    /// The document as sent to the backend. It never appears in the log.
    pub fn to_part(&self) -> Part {
        Part::text(format!(
            "\n\n--- Document Content: {} ---\n\n{}",
            self.name, self.text_content
        ))
    }
}

/// A file picked by the user, before it is classified as image or document
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_text_document(&self) -> bool {
        matches!(self.mime_type.as_str(), "text/plain" | "text/markdown")
    }
}

/// What the pending request is producing, for the loading indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentAction {
    #[default]
    Chat,
    Image,
    Video,
}

/// Capability session state. Owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub active_capability: Option<CapabilityId>,
    pub is_awaiting_required_attachment: bool,
    pub adopted_persona: Option<String>,
    pub selected_model: ModelOption,
    pub pending_image: Option<ImageAttachment>,
    pub pending_document: Option<DocumentAttachment>,
}

impl SessionState {
    pub fn new(default_model: ModelOption) -> Self {
        Self {
            active_capability: None,
            is_awaiting_required_attachment: false,
            adopted_persona: None,
            selected_model: default_model,
            pending_image: None,
            pending_document: None,
        }
    }

    pub fn selected_model_id(&self) -> &str {
        &self.selected_model.id
    }

    pub fn clear_attachments(&mut self) {
        self.pending_image = None;
        self.pending_document = None;
    }
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub turns: Vec<Turn>,
    pub is_loading: bool,
    pub current_action: CurrentAction,
    pub active_capability: Option<CapabilityId>,
    pub is_awaiting_required_attachment: bool,
    pub adopted_persona: Option<String>,
    pub selected_model: ModelOption,
    pub pending_image_mime: Option<String>,
    pub pending_document_name: Option<String>,
    pub input_hint: String,
}

impl SessionSnapshot {
    /// Whether the input field should accept a send right now.
    pub fn can_send(&self) -> bool {
        !self.is_loading && !self.is_awaiting_required_attachment
    }
}
