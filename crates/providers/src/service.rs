//! The generative service facade consumed by the orchestrator.
//!
//! One asynchronous operation per capability. Every operation reports
//! failure through [`ServiceError`] rather than returning empty data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::conversation::{Citations, InlineData, Part, StoryGraph, StoryPage, Turn};
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};

/// Default persona instruction for the assistant
pub const ASSISTANT_INSTRUCTION: &str = "You are a helpful assistant named AIVAN. Do not refer to yourself as Gemini, a large language model, or any other AI model. Your name is AIVAN.";

/// Answer from a web-grounded chat
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedReply {
    pub text: String,
    pub citations: Option<Citations>,
}

/// Post-hoc edit applied to an existing turn's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAction {
    Shorten,
    Summarize,
}

impl TextAction {
    pub fn prompt(&self, text: &str) -> String {
        match self {
            TextAction::Shorten => format!("Please shorten the following text:\n\n\"{}\"", text),
            TextAction::Summarize => {
                format!("Please summarize the following text:\n\n\"{}\"", text)
            }
        }
    }
}

/// What the user meant by a bare text prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentDecision {
    Chat,
    DirectImageGeneration,
    QueryImageGenerationCapability,
    DirectVideoGeneration,
    QueryVideoGenerationCapability,
}

impl IntentDecision {
    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "chat" => Ok(IntentDecision::Chat),
            "direct_image_generation" => Ok(IntentDecision::DirectImageGeneration),
            "query_image_generation_capability" => {
                Ok(IntentDecision::QueryImageGenerationCapability)
            }
            "direct_video_generation" => Ok(IntentDecision::DirectVideoGeneration),
            "query_video_generation_capability" => {
                Ok(IntentDecision::QueryVideoGenerationCapability)
            }
            other => Err(ServiceError::schema(format!(
                "unknown intent decision: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedIntent {
    pub decision: IntentDecision,
    /// Direct answer, present when the decision is `Chat`
    pub response: Option<String>,
}

#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Plain chat. The last turn of `history` is the message being answered.
    async fn chat(
        &self,
        history: &[Turn],
        model_id: &str,
        system_instruction: &str,
    ) -> ServiceResult<String>;

    /// Chat grounded on web search results
    async fn grounded_chat(&self, history: &[Turn], model_id: &str)
        -> ServiceResult<GroundedReply>;

    /// Inline image parts
    async fn generate_image(&self, prompt: &str) -> ServiceResult<Vec<Part>>;

    /// Text and/or inline image parts
    async fn edit_image(&self, image: &InlineData, instruction: &str) -> ServiceResult<Vec<Part>>;

    /// Long-running; polls until done, `cancel` is tripped or the
    /// configured timeout elapses.
    async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<Part>>;

    /// A single inline SVG part
    async fn synthesize_chart(&self, prompt: &str, model_id: &str) -> ServiceResult<Vec<Part>>;

    async fn story_step(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<StoryGraph>;

    /// Script plus one illustration per page; every returned page is resolved.
    async fn illustrated_story(&self, prompt: &str, model_id: &str)
        -> ServiceResult<Vec<StoryPage>>;

    async fn transform_text(
        &self,
        text: &str,
        model_id: &str,
        action: TextAction,
    ) -> ServiceResult<String>;

    async fn classify_intent(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<ClassifiedIntent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse() {
        assert_eq!(
            IntentDecision::parse("query_video_generation_capability").unwrap(),
            IntentDecision::QueryVideoGenerationCapability
        );
        assert!(matches!(
            IntentDecision::parse("dance"),
            Err(ServiceError::Schema(_))
        ));
    }

    #[test]
    fn test_text_action_prompt() {
        assert_eq!(
            TextAction::Shorten.prompt("long text"),
            "Please shorten the following text:\n\n\"long text\""
        );
        assert!(TextAction::Summarize.prompt("x").starts_with("Please summarize"));
    }
}
