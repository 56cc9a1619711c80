//! Chat-backed dispatch paths.

use async_trait::async_trait;
use providers::{ServiceResult, ASSISTANT_INSTRUCTION};
use shared::conversation::{Part, Turn};
use tracing::debug;

use super::{CapabilityHandler, DispatchContext, DispatchRequest, HandlerReply, SessionEffect};
use crate::prompts::{persona_adopted, DESCRIBE_IMAGE_REQUEST, DESCRIBE_WITHOUT_IMAGE_TEXT};

/// Chat over the full history with the resolved system instruction. Also
/// the fallback for capabilities without a dedicated handler.
pub struct InstructedChat;

#[async_trait]
impl CapabilityHandler for InstructedChat {
    fn name(&self) -> &'static str {
        "instructed_chat"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        let text = ctx
            .service
            .chat(
                &request.history_with_submission(),
                &request.model_id,
                &request.system_instruction,
            )
            .await?;
        Ok(HandlerReply::text(text))
    }
}

/// Web-grounded chat; keeps the citations with the answer.
pub struct WebSearch;

#[async_trait]
impl CapabilityHandler for WebSearch {
    fn name(&self) -> &'static str {
        "web_search"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        let reply = ctx
            .service
            .grounded_chat(&request.history_with_submission(), &request.model_id)
            .await?;
        Ok(HandlerReply {
            grounding: reply.citations,
            ..HandlerReply::text(reply.text)
        })
    }
}

/// Describes the attached image. Without one, asks for it instead of
/// calling the service.
pub struct DescribeImage;

#[async_trait]
impl CapabilityHandler for DescribeImage {
    fn name(&self) -> &'static str {
        "describe_image"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        let Some(image) = &request.image else {
            return Ok(HandlerReply::text(DESCRIBE_WITHOUT_IMAGE_TEXT));
        };

        let mut history = request.history.clone();
        history.push(Turn::user(vec![
            Part::InlineData(image.clone()),
            Part::text(DESCRIBE_IMAGE_REQUEST),
        ]));
        let text = ctx
            .service
            .chat(&history, &request.model_id, ASSISTANT_INSTRUCTION)
            .await?;
        Ok(HandlerReply::text(text))
    }
}

/// First turn names the persona (no service call); later turns chat in
/// character.
pub struct PersonaMode;

#[async_trait]
impl CapabilityHandler for PersonaMode {
    fn name(&self) -> &'static str {
        "persona_mode"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        if request.persona.is_none() && request.has_text() {
            debug!("adopting persona {:?}", request.text);
            return Ok(HandlerReply::text(persona_adopted(&request.text))
                .with_effect(SessionEffect::AdoptPersona(request.text.clone())));
        }
        InstructedChat.handle(request, ctx).await
    }
}
