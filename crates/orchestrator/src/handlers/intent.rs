//! Bare-text path: classify first, then answer, generate or redirect.

use async_trait::async_trait;
use providers::{IntentDecision, ServiceResult, ASSISTANT_INSTRUCTION};
use shared::capability::CapabilityId;
use tracing::{debug, warn};

use super::{
    CapabilityHandler, DispatchContext, DispatchRequest, HandlerReply, ImageGeneration,
    SessionEffect, VideoGeneration,
};
use crate::prompts::{CLASSIFICATION_APOLOGY_TEXT, NO_RESPONSE_TEXT};

pub struct IntentRouter;

impl IntentRouter {
    /// Classification failed in some way; answer as a direct chat, and if
    /// that fails too, apologise. Never an error.
    async fn fallback(request: &DispatchRequest, ctx: &DispatchContext<'_>) -> HandlerReply {
        match ctx
            .service
            .chat(
                &request.history_with_submission(),
                &request.model_id,
                ASSISTANT_INSTRUCTION,
            )
            .await
        {
            Ok(text) => HandlerReply::text(text),
            Err(e) => {
                warn!("fallback chat failed: {}", e);
                HandlerReply::text(CLASSIFICATION_APOLOGY_TEXT)
            }
        }
    }
}

#[async_trait]
impl CapabilityHandler for IntentRouter {
    fn name(&self) -> &'static str {
        "intent_router"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        let intent = match ctx
            .service
            .classify_intent(&request.text, &request.history, &request.model_id)
            .await
        {
            Ok(intent) => intent,
            Err(e) => {
                warn!("intent classification failed, falling back to chat: {}", e);
                return Ok(Self::fallback(request, ctx).await);
            }
        };

        debug!("classified as {:?}", intent.decision);
        match intent.decision {
            IntentDecision::Chat => Ok(HandlerReply::text(
                intent
                    .response
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()),
            )),
            IntentDecision::DirectImageGeneration => {
                ImageGeneration::generate(&request.text, ctx).await
            }
            IntentDecision::DirectVideoGeneration => {
                VideoGeneration::generate(&request.text, ctx).await
            }
            IntentDecision::QueryImageGenerationCapability => Ok(HandlerReply::effect_only(
                SessionEffect::Activate(CapabilityId::CREATE_IMAGE),
            )),
            IntentDecision::QueryVideoGenerationCapability => Ok(HandlerReply::effect_only(
                SessionEffect::Activate(CapabilityId::CREATE_VIDEO),
            )),
        }
    }
}
