//! Capability descriptors.
//!
//! A capability is a named conversation mode that fixes the dispatch target
//! and/or the system instruction for the next submissions. The catalog
//! itself lives in the orchestrator's registry; this module only defines the
//! shapes.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::conversation::InteractiveElement;

/// Identifier of a capability (snake_case, stable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityId(&'static str);

impl CapabilityId {
    pub const VISUAL_STORY: CapabilityId = CapabilityId("visual_story");
    pub const CREATE_IMAGE: CapabilityId = CapabilityId("create_image");
    pub const CREATE_VIDEO: CapabilityId = CapabilityId("create_video");
    pub const EDIT_IMAGE: CapabilityId = CapabilityId("edit_image");
    pub const DESCRIBE_IMAGE: CapabilityId = CapabilityId("describe_image");
    pub const WEB_SEARCH: CapabilityId = CapabilityId("web_search");
    pub const PROGRAMMING_ASSISTANT: CapabilityId = CapabilityId("programming_assistant");
    pub const RECIPE_GENERATOR: CapabilityId = CapabilityId("recipe_generator");
    pub const WORKOUT_PLANNER: CapabilityId = CapabilityId("workout_planner");
    pub const TRIP_PLANNER: CapabilityId = CapabilityId("trip_planner");
    pub const SPEECH_WRITER: CapabilityId = CapabilityId("speech_writer");
    pub const RESUME_ASSISTANT: CapabilityId = CapabilityId("resume_assistant");
    pub const LANGUAGE_TUTOR: CapabilityId = CapabilityId("language_tutor");
    pub const COLOR_PALETTE: CapabilityId = CapabilityId("color_palette");
    pub const DREAM_INTERPRETER: CapabilityId = CapabilityId("dream_interpreter");
    pub const CREATE_CHART: CapabilityId = CapabilityId("create_chart");
    pub const ANALYZE_DOCUMENT: CapabilityId = CapabilityId("analyze_document");
    pub const INTERACTIVE_STORY: CapabilityId = CapabilityId("interactive_story");
    pub const PERSONALITY_MODE: CapabilityId = CapabilityId("personality_mode");

    /// Build an id for a registry entry. Ids are compared by value, so an
    /// id made here equals the matching constant.
    pub const fn new(id: &'static str) -> Self {
        CapabilityId(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for CapabilityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Interactive control offered with a capability's activation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractiveAffordance {
    RequestUpload,
    OfferRandomStart,
}

impl InteractiveAffordance {
    pub fn element(&self) -> InteractiveElement {
        match self {
            InteractiveAffordance::RequestUpload => InteractiveElement::UploadImage,
            InteractiveAffordance::OfferRandomStart => InteractiveElement::SurpriseMeStory,
        }
    }
}

/// Whether a capability survives the submission that used it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Cleared once a submission under it settles
    OneShot,
    /// Stays active until explicitly cancelled
    Sticky,
}

/// How `activate` announces a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    /// Append the banner and the activation prompt
    Announced,
    /// Change state only, no turns
    Silent,
}

/// Static description of one capability
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitySpec {
    pub id: CapabilityId,
    pub display_label: &'static str,
    pub activation_prompt: Option<&'static str>,
    pub system_instruction_override: Option<&'static str>,
    pub interactive_affordance: Option<InteractiveAffordance>,
    pub requires_attachment_before_text: bool,
    pub lifecycle: Lifecycle,
    /// Placeholder for the input field while the capability is active
    pub input_hint: &'static str,
}

impl CapabilitySpec {
    pub fn is_sticky(&self) -> bool {
        self.lifecycle == Lifecycle::Sticky
    }
}
