//! Storytelling dispatch paths.

use async_trait::async_trait;
use providers::{ServiceError, ServiceResult};
use shared::conversation::{InteractiveElement, Turn};

use super::{CapabilityHandler, DispatchContext, DispatchRequest, HandlerReply};
use crate::prompts::{STORY_READY_TEXT, STORY_WORKING_TEXT};

/// One choose-your-own-adventure step: a passage plus the next choices.
pub struct InteractiveStory;

#[async_trait]
impl CapabilityHandler for InteractiveStory {
    fn name(&self) -> &'static str {
        "interactive_story"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        // Banners and activation prompts are not part of the story so far
        let story_so_far: Vec<Turn> = request
            .history
            .iter()
            .filter(|turn| !turn.is_capability_activation)
            .cloned()
            .collect();
        let story = ctx
            .service
            .story_step(&request.text, &story_so_far, &request.model_id)
            .await?;
        Ok(HandlerReply {
            interactive: Some(InteractiveElement::StoryChoice),
            story: Some(story.clone()),
            ..HandlerReply::text(story.text)
        })
    }
}

/// Whole illustrated story in one go, behind a working turn.
pub struct VisualStory;

#[async_trait]
impl CapabilityHandler for VisualStory {
    fn name(&self) -> &'static str {
        "visual_story"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        ctx.progress.working(STORY_WORKING_TEXT);
        let pages = ctx
            .service
            .illustrated_story(&request.text, &request.model_id)
            .await?;
        if pages.is_empty() || !pages.iter().all(|page| page.is_resolved()) {
            return Err(ServiceError::empty("story has unillustrated pages"));
        }
        Ok(HandlerReply {
            story_pages: Some(pages),
            ..HandlerReply::text(STORY_READY_TEXT)
        })
    }
}
