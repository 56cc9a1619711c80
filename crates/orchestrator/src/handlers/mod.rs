//! Capability handlers and the dispatch table.
//!
//! Each dispatch path is one [`CapabilityHandler`]. The table maps a
//! capability id to its handler; ids without an entry fall back to the
//! instructed chat, so a capability that only needs its own system
//! instruction is a registry entry and nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use providers::{GenerativeService, ServiceResult};
use shared::capability::CapabilityId;
use shared::conversation::{
    non_empty_parts, Citations, InlineData, InteractiveElement, Part, StoryGraph, StoryPage, Turn,
};
use shared::session::CurrentAction;
use tokio_util::sync::CancellationToken;

use crate::request::ComposedRequest;

pub mod chat;
pub mod intent;
pub mod media;
pub mod story;

pub use chat::{DescribeImage, InstructedChat, PersonaMode, WebSearch};
pub use intent::IntentRouter;
pub use media::{ChartSynthesis, ImageEdit, ImageGeneration, VideoGeneration};
pub use story::{InteractiveStory, VisualStory};

/// Everything a handler may read for one submission
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Capability active when the submission was made
    pub capability: Option<CapabilityId>,
    pub text: String,
    pub image: Option<InlineData>,
    /// Parts sent to the backend for this submission
    pub submission: Vec<Part>,
    /// Log as it was before this submission's user turn
    pub history: Vec<Turn>,
    pub model_id: String,
    pub persona: Option<String>,
    /// Resolved instruction: capability override, else persona-aware default
    pub system_instruction: String,
}

impl DispatchRequest {
    pub fn new(
        composed: &ComposedRequest,
        capability: Option<CapabilityId>,
        history: Vec<Turn>,
        model_id: impl Into<String>,
        persona: Option<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            text: composed.text.clone(),
            image: composed.image.clone(),
            submission: composed.submission.clone(),
            history,
            model_id: model_id.into(),
            persona,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Prior history plus the full submission as the newest user turn.
    pub fn history_with_submission(&self) -> Vec<Turn> {
        let mut history = self.history.clone();
        history.push(Turn::user(self.submission.clone()));
        history
    }
}

/// State change a handler asks for instead of (or besides) a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    AdoptPersona(String),
    /// Act as if the user had picked this capability
    Activate(CapabilityId),
}

/// Normalized outcome of a dispatch path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerReply {
    pub parts: Vec<Part>,
    pub grounding: Option<Citations>,
    pub story: Option<StoryGraph>,
    pub story_pages: Option<Vec<StoryPage>>,
    pub interactive: Option<InteractiveElement>,
    pub effect: Option<SessionEffect>,
}

impl HandlerReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::parts(vec![Part::text(text)])
    }

    pub fn parts(parts: Vec<Part>) -> Self {
        Self {
            parts,
            ..Self::default()
        }
    }

    /// No model turn, only a state change.
    pub fn effect_only(effect: SessionEffect) -> Self {
        Self {
            effect: Some(effect),
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, effect: SessionEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Whether the reply lands in the log as a model turn.
    pub fn produces_turn(&self) -> bool {
        self.parts.iter().any(|p| !p.is_empty())
            || self.story_pages.as_ref().is_some_and(|pages| !pages.is_empty())
    }

    /// Split into the model turn to append and the requested effect.
    pub fn into_turn(self) -> (Option<Turn>, Option<SessionEffect>) {
        if !self.produces_turn() {
            return (None, self.effect);
        }
        let turn = Turn::model(non_empty_parts(self.parts))
            .with_grounding(self.grounding.filter(|c| !c.is_empty()))
            .with_story(self.story)
            .with_story_pages(self.story_pages)
            .with_interactive(self.interactive);
        (Some(turn), self.effect)
    }
}

/// Hooks a handler uses to report progress while its call is pending
pub trait DispatchProgress: Send + Sync {
    /// Show a transient "working" turn. It is removed in the same step that
    /// appends the handler's result.
    fn working(&self, text: &str);

    /// Update what the loading indicator shows.
    fn action(&self, action: CurrentAction);
}

pub struct DispatchContext<'a> {
    pub service: &'a dyn GenerativeService,
    pub cancel: &'a CancellationToken,
    pub progress: &'a dyn DispatchProgress,
}

/// One dispatch path
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply>;
}

/// Capability id to handler mapping plus the paths used when no capability
/// is active.
pub struct DispatchTable {
    by_capability: HashMap<CapabilityId, Arc<dyn CapabilityHandler>>,
    instructed_chat: Arc<dyn CapabilityHandler>,
    image_edit: Arc<dyn CapabilityHandler>,
    intent: Arc<dyn CapabilityHandler>,
}

impl DispatchTable {
    /// Empty table: every capability falls back to the instructed chat.
    pub fn new() -> Self {
        Self {
            by_capability: HashMap::new(),
            instructed_chat: Arc::new(InstructedChat),
            image_edit: Arc::new(ImageEdit),
            intent: Arc::new(IntentRouter),
        }
    }

    /// The built-in mapping
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(CapabilityId::CREATE_IMAGE, Arc::new(ImageGeneration));
        table.register(CapabilityId::CREATE_VIDEO, Arc::new(VideoGeneration));
        table.register(CapabilityId::WEB_SEARCH, Arc::new(WebSearch));
        table.register(CapabilityId::CREATE_CHART, Arc::new(ChartSynthesis));
        table.register(CapabilityId::INTERACTIVE_STORY, Arc::new(InteractiveStory));
        table.register(CapabilityId::VISUAL_STORY, Arc::new(VisualStory));
        table.register(CapabilityId::DESCRIBE_IMAGE, Arc::new(DescribeImage));
        table.register(CapabilityId::PERSONALITY_MODE, Arc::new(PersonaMode));
        table
    }

    pub fn register(&mut self, id: CapabilityId, handler: Arc<dyn CapabilityHandler>) {
        self.by_capability.insert(id, handler);
    }

    pub fn for_capability(&self, id: CapabilityId) -> &Arc<dyn CapabilityHandler> {
        self.by_capability.get(&id).unwrap_or(&self.instructed_chat)
    }

    /// Pick the dispatch path, in priority order: active capability, image
    /// with text, bare text (classified first), anything else as chat.
    pub fn select(
        &self,
        active: Option<CapabilityId>,
        request: &ComposedRequest,
    ) -> &Arc<dyn CapabilityHandler> {
        match active {
            Some(id) => self.for_capability(id),
            None if request.is_image_with_text() => &self.image_edit,
            None if request.is_plain_text() => &self.intent,
            None => &self.instructed_chat,
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::session::ImageAttachment;

    fn composed(text: &str, with_image: bool) -> ComposedRequest {
        let image = ImageAttachment {
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg".into(),
        };
        ComposedRequest::compose(text, with_image.then_some(&image), None).unwrap()
    }

    #[test]
    fn test_select_priority() {
        let table = DispatchTable::standard();
        let text = composed("hello", false);
        let image_and_text = composed("make it red", true);
        let image_only = composed("", true);

        assert_eq!(
            table.select(Some(CapabilityId::CREATE_IMAGE), &image_and_text).name(),
            "image_generation"
        );
        assert_eq!(table.select(None, &image_and_text).name(), "image_edit");
        assert_eq!(table.select(None, &text).name(), "intent_router");
        assert_eq!(table.select(None, &image_only).name(), "instructed_chat");
    }

    #[test]
    fn test_unmapped_capability_uses_instructed_chat() {
        let table = DispatchTable::standard();
        assert_eq!(
            table.for_capability(CapabilityId::RECIPE_GENERATOR).name(),
            "instructed_chat"
        );
        assert_eq!(
            table.for_capability(CapabilityId::ANALYZE_DOCUMENT).name(),
            "instructed_chat"
        );
        assert_eq!(
            table.for_capability(CapabilityId::EDIT_IMAGE).name(),
            "instructed_chat"
        );
        assert_eq!(
            table.for_capability(CapabilityId::VISUAL_STORY).name(),
            "visual_story"
        );
    }

    #[test]
    fn test_reply_without_parts_is_silent() {
        let reply = HandlerReply::effect_only(SessionEffect::Activate(CapabilityId::CREATE_VIDEO));
        let (turn, effect) = reply.into_turn();
        assert!(turn.is_none());
        assert_eq!(
            effect,
            Some(SessionEffect::Activate(CapabilityId::CREATE_VIDEO))
        );

        let (turn, _) = HandlerReply::parts(vec![Part::text("")]).into_turn();
        assert!(turn.is_none());
    }

    #[test]
    fn test_reply_drops_empty_citations() {
        let reply = HandlerReply {
            grounding: Some(Citations::default()),
            ..HandlerReply::text("answer")
        };
        let (turn, _) = reply.into_turn();
        let turn = turn.unwrap();
        assert!(turn.grounding.is_none());
        assert_eq!(turn.text_content(), "answer");
    }
}
