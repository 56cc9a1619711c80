//! Scripted service double for orchestrator tests. Records every call and
//! answers with canned results, or with a scripted failure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use providers::{
    ClassifiedIntent, GenerativeService, GroundedReply, IntentDecision, ServiceError,
    ServiceResult, TextAction,
};
use shared::conversation::{Citations, InlineData, Part, StoryGraph, StoryPage, Turn, WebSource};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub const IMAGE_DATA: &str = "aW1hZ2U=";
pub const VIDEO_URI: &str = "https://media.example/video.mp4";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub prompt: String,
    pub model_id: String,
    pub instruction: Option<String>,
    pub history: Vec<Turn>,
}

impl Call {
    fn new(op: &'static str, prompt: impl Into<String>) -> Self {
        Self {
            op,
            prompt: prompt.into(),
            model_id: String::new(),
            instruction: None,
            history: Vec::new(),
        }
    }

    fn model(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }

    fn history(mut self, history: &[Turn]) -> Self {
        self.history = history.to_vec();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Http,
    Schema,
    Empty,
    /// Wait for the cancellation token, then report `Cancelled`
    Stall,
}

impl Failure {
    fn error(self) -> ServiceError {
        match self {
            Failure::Http => ServiceError::Http {
                status: 503,
                body: "unavailable".into(),
            },
            Failure::Schema => ServiceError::schema("unexpected shape"),
            Failure::Empty => ServiceError::empty("nothing came back"),
            Failure::Stall => ServiceError::Cancelled,
        }
    }
}

#[derive(Default)]
pub struct ScriptedService {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    intent: Mutex<Option<ClassifiedIntent>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pages: Mutex<Option<Vec<StoryPage>>>,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.failures.lock().insert(op, failure);
    }

    pub fn classify_as(&self, decision: IntentDecision, response: Option<&str>) {
        *self.intent.lock() = Some(ClassifiedIntent {
            decision,
            response: response.map(str::to_string),
        });
    }

    /// Pages the next illustrated story comes back with
    pub fn story_pages(&self, pages: Vec<StoryPage>) {
        *self.pages.lock() = Some(pages);
    }

    /// The next call blocks until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(|c| c.op).collect()
    }

    pub fn last(&self, op: &str) -> Option<Call> {
        self.calls.lock().iter().rev().find(|c| c.op == op).cloned()
    }

    async fn record(&self, call: Call, cancel: Option<&CancellationToken>) -> ServiceResult<()> {
        let op = call.op;
        self.calls.lock().push(call);

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self.failures.lock().get(op).copied();
        match failure {
            None => Ok(()),
            Some(Failure::Stall) => {
                if let Some(cancel) = cancel {
                    cancel.cancelled().await;
                }
                Err(ServiceError::Cancelled)
            }
            Some(failure) => Err(failure.error()),
        }
    }
}

fn last_text(history: &[Turn]) -> String {
    history.last().map(Turn::text_content).unwrap_or_default()
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn chat(
        &self,
        history: &[Turn],
        model_id: &str,
        system_instruction: &str,
    ) -> ServiceResult<String> {
        let prompt = last_text(history);
        let mut call = Call::new("chat", prompt.clone())
            .model(model_id)
            .history(history);
        call.instruction = Some(system_instruction.to_string());
        self.record(call, None).await?;
        Ok(format!("reply to: {}", prompt))
    }

    async fn grounded_chat(
        &self,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<GroundedReply> {
        let call = Call::new("grounded_chat", last_text(history))
            .model(model_id)
            .history(history);
        self.record(call, None).await?;
        Ok(GroundedReply {
            text: "grounded answer".into(),
            citations: Some(Citations {
                sources: vec![WebSource {
                    uri: "https://example.com/source".into(),
                    title: "Example".into(),
                }],
            }),
        })
    }

    async fn generate_image(&self, prompt: &str) -> ServiceResult<Vec<Part>> {
        self.record(Call::new("generate_image", prompt), None).await?;
        Ok(vec![Part::inline("image/png", IMAGE_DATA)])
    }

    async fn edit_image(&self, image: &InlineData, instruction: &str) -> ServiceResult<Vec<Part>> {
        let mut call = Call::new("edit_image", instruction);
        call.instruction = Some(image.mime_type.clone());
        self.record(call, None).await?;
        Ok(vec![
            Part::text("Here is the edited image"),
            Part::inline("image/png", IMAGE_DATA),
        ])
    }

    async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<Part>> {
        self.record(Call::new("generate_video", prompt), Some(cancel))
            .await?;
        Ok(vec![Part::video(VIDEO_URI)])
    }

    async fn synthesize_chart(&self, prompt: &str, model_id: &str) -> ServiceResult<Vec<Part>> {
        self.record(Call::new("synthesize_chart", prompt).model(model_id), None)
            .await?;
        Ok(vec![Part::inline("image/svg+xml", "PHN2Zy8+")])
    }

    async fn story_step(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<StoryGraph> {
        let call = Call::new("story_step", prompt)
            .model(model_id)
            .history(history);
        self.record(call, None).await?;
        Ok(StoryGraph {
            text: "The door creaks open.".into(),
            choices: vec!["Step inside".into(), "Run away".into(), "Knock".into()],
        })
    }

    async fn illustrated_story(
        &self,
        prompt: &str,
        model_id: &str,
    ) -> ServiceResult<Vec<StoryPage>> {
        self.record(Call::new("illustrated_story", prompt).model(model_id), None)
            .await?;
        if let Some(pages) = self.pages.lock().take() {
            return Ok(pages);
        }
        Ok(vec![
            StoryPage {
                text: "Page one".into(),
                image_data: Some(IMAGE_DATA.into()),
            },
            StoryPage {
                text: "Page two".into(),
                image_data: Some(IMAGE_DATA.into()),
            },
        ])
    }

    async fn transform_text(
        &self,
        text: &str,
        model_id: &str,
        action: TextAction,
    ) -> ServiceResult<String> {
        self.record(Call::new("transform_text", text).model(model_id), None)
            .await?;
        Ok(match action {
            TextAction::Shorten => format!("short: {}", text),
            TextAction::Summarize => format!("summary: {}", text),
        })
    }

    async fn classify_intent(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<ClassifiedIntent> {
        let call = Call::new("classify_intent", prompt)
            .model(model_id)
            .history(history);
        self.record(call, None).await?;
        Ok(self.intent.lock().clone().unwrap_or(ClassifiedIntent {
            decision: IntentDecision::Chat,
            response: Some("classified reply".into()),
        }))
    }
}
