//! Image, video and chart dispatch paths.

use async_trait::async_trait;
use providers::ServiceResult;
use shared::session::CurrentAction;
use tracing::debug;

use super::{CapabilityHandler, DispatchContext, DispatchRequest, HandlerReply, InstructedChat};
use crate::prompts::VIDEO_WORKING_TEXT;

pub struct ImageGeneration;

impl ImageGeneration {
    pub(crate) async fn generate(
        prompt: &str,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        ctx.progress.action(CurrentAction::Image);
        let parts = ctx.service.generate_image(prompt).await?;
        Ok(HandlerReply::parts(parts))
    }
}

#[async_trait]
impl CapabilityHandler for ImageGeneration {
    fn name(&self) -> &'static str {
        "image_generation"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        Self::generate(&request.text, ctx).await
    }
}

/// Long-running; shows a working turn until the video is ready.
pub struct VideoGeneration;

impl VideoGeneration {
    pub(crate) async fn generate(
        prompt: &str,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        ctx.progress.action(CurrentAction::Video);
        ctx.progress.working(VIDEO_WORKING_TEXT);
        let parts = ctx.service.generate_video(prompt, ctx.cancel).await?;
        Ok(HandlerReply::parts(parts))
    }
}

#[async_trait]
impl CapabilityHandler for VideoGeneration {
    fn name(&self) -> &'static str {
        "video_generation"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        Self::generate(&request.text, ctx).await
    }
}

/// Applies the text as an edit instruction to the attached image. Serves
/// image-with-text submissions made outside any capability.
pub struct ImageEdit;

#[async_trait]
impl CapabilityHandler for ImageEdit {
    fn name(&self) -> &'static str {
        "image_edit"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        match &request.image {
            Some(image) if request.has_text() => {
                ctx.progress.action(CurrentAction::Image);
                let parts = ctx.service.edit_image(image, &request.text).await?;
                Ok(HandlerReply::parts(parts))
            }
            _ => {
                debug!("image edit without image and text, answering as chat");
                InstructedChat.handle(request, ctx).await
            }
        }
    }
}

pub struct ChartSynthesis;

#[async_trait]
impl CapabilityHandler for ChartSynthesis {
    fn name(&self) -> &'static str {
        "chart_synthesis"
    }

    async fn handle(
        &self,
        request: &DispatchRequest,
        ctx: &DispatchContext<'_>,
    ) -> ServiceResult<HandlerReply> {
        let parts = ctx
            .service
            .synthesize_chart(&request.text, &request.model_id)
            .await?;
        Ok(HandlerReply::parts(parts))
    }
}
