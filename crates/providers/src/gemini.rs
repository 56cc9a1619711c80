use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::conversation::{
    Citations, InlineData, Part, StoryGraph, StoryPage, Turn, WebSource,
};
use shared::settings::AppSettings;
use std::env;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{ServiceError, ServiceResult};
use crate::history::to_contents;
use crate::service::{
    ClassifiedIntent, GenerativeService, GroundedReply, IntentDecision, TextAction,
    ASSISTANT_INSTRUCTION,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const STORY_PAGES: usize = 3;
const STORY_CHOICES: usize = 3;
/// Illustrations generated at once for an illustrated story
const IMAGE_CONCURRENCY: usize = 3;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9+.-]*\s*\n?(.*?)\n?\s*```\s*$").expect("valid regex")
});

const CHART_INSTRUCTION: &str =
    "You are an expert data visualization assistant that only outputs SVG code. Your name is AIVAN.";

const STORY_INSTRUCTION: &str = "You are an interactive storyteller named AIVAN.
- Start a story based on the user's prompt.
- End your response with a paragraph describing the situation.
- Then, provide exactly 3 distinct choices for the user to continue the story.
- Your response MUST be a JSON object.
- Example: {\"text\": \"You stand at a crossroads...\", \"choices\": [\"Go left\", \"Go right\", \"Wait\"]}";

const SCRIPT_INSTRUCTION: &str = "You are a children's story writer. Your name is AIVAN.";

const INTENT_INSTRUCTION: &str = "You are an intent detection agent. Analyze the user's latest prompt to determine their intent.
Your response MUST be a JSON object with a 'decision' property.

Possible values for 'decision':
- 'chat': For general conversation, questions, or requests not covered by other categories.
- 'direct_image_generation': If the user explicitly asks to create, generate, or draw an image, and provides a clear description. e.g., \"create a picture of a cat\", \"draw a robot\".
- 'query_image_generation_capability': If the user asks IF you can create an image, but doesn't provide a prompt. e.g., \"can you make images?\".
- 'direct_video_generation': If the user explicitly asks to create or generate a video and provides a description. e.g., \"make a video of a sunset\".
- 'query_video_generation_capability': If the user asks IF you can create a video. e.g., \"can you generate videos?\".

If the decision is 'chat', also include a 'response' property with a direct, helpful answer to the user's prompt, as if you were AIVAN the assistant.
Do not add any other text or explanation outside of the JSON object.";

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiInlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<GeminiInlineData>,
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Video references and empty parts are not sent.
    pub fn from_part(part: &Part) -> Option<Self> {
        if part.is_empty() {
            return None;
        }
        match part {
            Part::Text(text) => Some(Self::text(text.clone())),
            Part::InlineData(inline) => Some(Self {
                text: None,
                inline_data: Some(GeminiInlineData {
                    mime_type: inline.mime_type.clone(),
                    data: inline.data.clone(),
                }),
            }),
            Part::VideoRef(_) => None,
        }
    }

    /// Parts with neither field populated are dropped.
    fn into_part(self) -> Option<Part> {
        if let Some(inline) = self.inline_data.filter(|i| !i.data.is_empty()) {
            let mime = if inline.mime_type.is_empty() {
                "image/png".to_string()
            } else {
                inline.mime_type
            };
            return Some(Part::inline(mime, inline.data));
        }
        self.text.filter(|t| !t.is_empty()).map(Part::Text)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(parts: Vec<GeminiPart>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![GeminiPart::text(text)],
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

impl GenerationConfig {
    fn json(schema: Option<serde_json::Value>) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: schema,
            response_modalities: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn new(contents: Vec<GeminiContent>, system_instruction: Option<&str>) -> Self {
        Self {
            contents,
            system_instruction: system_instruction.map(GeminiContent::instruction),
            tools: None,
            generation_config: None,
        }
    }

    fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebChunk {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoFile {
    uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeneratedSample {
    video: Option<VideoFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoOperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoOperation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<VideoOperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct RawStory {
    text: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    decision: Option<String>,
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScriptPage {
    text: Option<String>,
    image_prompt: Option<String>,
}

// ── Response parsing ─────────────────────────────────────────────────

fn first_content(
    response: GenerateContentResponse,
) -> ServiceResult<(GeminiContent, Option<GroundingMetadata>)> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::empty("no candidates in response"))?;
    let content = candidate
        .content
        .ok_or_else(|| ServiceError::empty("no content in candidate"))?;
    Ok((content, candidate.grounding_metadata))
}

fn extract_text(response: GenerateContentResponse) -> ServiceResult<String> {
    let (content, _) = first_content(response)?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(ServiceError::empty("no text in response"));
    }
    Ok(text)
}

fn extract_parts(response: GenerateContentResponse) -> ServiceResult<Vec<Part>> {
    let (content, _) = first_content(response)?;
    let parts: Vec<Part> = content
        .parts
        .into_iter()
        .filter_map(GeminiPart::into_part)
        .collect();
    if parts.is_empty() {
        return Err(ServiceError::empty("no usable parts in response"));
    }
    Ok(parts)
}

fn extract_grounded(response: GenerateContentResponse) -> ServiceResult<GroundedReply> {
    let (content, metadata) = first_content(response)?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(ServiceError::empty("no text in grounded response"));
    }
    let citations = metadata.map(|m| Citations {
        sources: m
            .grounding_chunks
            .into_iter()
            .filter_map(|c| c.web)
            .filter(|w| !w.uri.is_empty())
            .map(|w| WebSource {
                uri: w.uri,
                title: w.title,
            })
            .collect(),
    });
    Ok(GroundedReply { text, citations })
}

fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

fn parse_story_graph(text: &str) -> ServiceResult<StoryGraph> {
    let raw: RawStory = serde_json::from_str(strip_code_fence(text))?;
    let story_text = raw
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ServiceError::schema("story step has no text"))?;
    let choices: Vec<String> = raw
        .choices
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if choices.len() != STORY_CHOICES {
        return Err(ServiceError::schema(format!(
            "story step needs {} choices, got {}",
            STORY_CHOICES,
            choices.len()
        )));
    }
    Ok(StoryGraph {
        text: story_text,
        choices,
    })
}

fn parse_intent(text: &str) -> ServiceResult<ClassifiedIntent> {
    let raw: RawIntent = serde_json::from_str(strip_code_fence(text))?;
    let decision = raw
        .decision
        .ok_or_else(|| ServiceError::schema("classification has no decision"))?;
    Ok(ClassifiedIntent {
        decision: IntentDecision::parse(decision.trim())?,
        response: raw.response.filter(|r| !r.trim().is_empty()),
    })
}

/// Script entries missing either field are skipped.
fn parse_story_script(text: &str) -> ServiceResult<Vec<(String, String)>> {
    let pages: Vec<ScriptPage> = serde_json::from_str(strip_code_fence(text))?;
    Ok(pages
        .into_iter()
        .filter_map(|p| match (p.text, p.image_prompt) {
            (Some(text), Some(prompt)) if !text.trim().is_empty() && !prompt.trim().is_empty() => {
                Some((text, prompt))
            }
            _ => None,
        })
        .collect())
}

fn extract_svg(text: &str) -> ServiceResult<String> {
    let body = strip_code_fence(text);
    let start = body
        .find("<svg")
        .ok_or_else(|| ServiceError::schema("chart output is not SVG"))?;
    let end = body
        .rfind("</svg>")
        .ok_or_else(|| ServiceError::schema("chart SVG is not closed"))?;
    if end < start {
        return Err(ServiceError::schema("chart SVG is malformed"));
    }
    Ok(body[start..end + "</svg>".len()].to_string())
}

fn video_uri(operation: VideoOperation) -> ServiceResult<String> {
    if let Some(error) = operation.error {
        return Err(ServiceError::schema(format!(
            "video operation failed: {}",
            error.message
        )));
    }
    operation
        .response
        .and_then(|r| r.generate_video_response)
        .and_then(|r| r.generated_samples.into_iter().next())
        .and_then(|s| s.video)
        .and_then(|v| v.uri)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| ServiceError::empty("video operation finished without a video"))
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() > 800 {
        format!("{}...", body.chars().take(800).collect::<String>())
    } else {
        body.to_string()
    }
}

// ── Client ───────────────────────────────────────────────────────────

pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    image_edit_model: String,
    video_model: String,
    poll_interval: Duration,
    video_timeout: Duration,
}

impl GeminiClient {
    /// Build a client from settings, falling back to `GEMINI_API_KEY`.
    pub fn from_settings(settings: &AppSettings) -> ServiceResult<Self> {
        let api_key = match &settings.gemini_auth.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => env::var("GEMINI_API_KEY")
                .map_err(|_| ServiceError::Config("no Gemini API key configured".into()))?,
        };

        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: settings.image_model.clone(),
            image_edit_model: settings.image_edit_model.clone(),
            video_model: settings.video_model.clone(),
            poll_interval: Duration::from_secs(settings.video_poll_interval_secs.max(1)),
            video_timeout: Duration::from_secs(settings.video_timeout_secs),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> ServiceResult<T> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| ServiceError::schema(format!("{}", e)))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ServiceResult<T> {
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ServiceResult<T> {
        let resp = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> ServiceResult<GenerateContentResponse> {
        tracing::debug!(model, contents = request.contents.len(), "generateContent");
        self.post_json(&self.model_url(model, "generateContent"), request)
            .await
    }

    /// One base64 PNG, or `None` if the backend returned no image.
    async fn imagen(&self, prompt: &str) -> ServiceResult<Option<String>> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "outputMimeType": "image/png" },
        });
        let resp: PredictResponse = self
            .post_json(&self.model_url(&self.image_model, "predict"), &body)
            .await?;
        Ok(resp
            .predictions
            .into_iter()
            .next()
            .and_then(|p| p.bytes_base64_encoded)
            .filter(|b| !b.is_empty()))
    }

    async fn poll_video(
        &self,
        mut operation: VideoOperation,
        cancel: &CancellationToken,
    ) -> ServiceResult<String> {
        let url = format!("{}/{}", self.base_url, operation.name);
        let poll = async {
            while !operation.done {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ServiceError::Cancelled),
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                tracing::debug!(operation = %operation.name, "polling video operation");
                operation = self.get_json(&url).await?;
            }
            video_uri(operation)
        };

        match tokio::time::timeout(self.video_timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout {
                secs: self.video_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn chat(
        &self,
        history: &[Turn],
        model_id: &str,
        system_instruction: &str,
    ) -> ServiceResult<String> {
        let request = GenerateContentRequest::new(to_contents(history), Some(system_instruction));
        extract_text(self.generate_content(model_id, &request).await?)
    }

    async fn grounded_chat(
        &self,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<GroundedReply> {
        let mut request =
            GenerateContentRequest::new(to_contents(history), Some(ASSISTANT_INSTRUCTION));
        request.tools = Some(vec![json!({ "google_search": {} })]);
        extract_grounded(self.generate_content(model_id, &request).await?)
    }

    async fn generate_image(&self, prompt: &str) -> ServiceResult<Vec<Part>> {
        match self.imagen(prompt).await? {
            Some(data) => Ok(vec![Part::inline("image/png", data)]),
            None => Err(ServiceError::empty("no image generated")),
        }
    }

    async fn edit_image(&self, image: &InlineData, instruction: &str) -> ServiceResult<Vec<Part>> {
        let content = GeminiContent::user(vec![
            GeminiPart {
                text: None,
                inline_data: Some(GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            },
            GeminiPart::text(instruction),
        ]);
        let request = GenerateContentRequest::new(vec![content], None).with_config(GenerationConfig {
            response_modalities: Some(vec!["IMAGE".into(), "TEXT".into()]),
            ..Default::default()
        });
        extract_parts(self.generate_content(&self.image_edit_model, &request).await?)
    }

    async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<Part>> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        });
        let url = self.model_url(&self.video_model, "predictLongRunning");
        let operation: VideoOperation = tokio::select! {
            _ = cancel.cancelled() => return Err(ServiceError::Cancelled),
            op = self.post_json::<_, VideoOperation>(&url, &body) => op?,
        };
        tracing::info!(operation = %operation.name, "video generation started");
        let uri = self.poll_video(operation, cancel).await?;
        Ok(vec![Part::video(uri)])
    }

    async fn synthesize_chart(&self, prompt: &str, model_id: &str) -> ServiceResult<Vec<Part>> {
        let ask = format!(
            "Based on the following user request, generate a valid SVG string for a chart. \
             The SVG should be well-formed, visually appealing, and accurately represent the data. \
             Do not include any explanation, just the SVG code itself. Request: \"{}\"",
            prompt
        );
        let request = GenerateContentRequest::new(
            vec![GeminiContent::user(vec![GeminiPart::text(ask)])],
            Some(CHART_INSTRUCTION),
        );
        let svg = extract_svg(&extract_text(
            self.generate_content(model_id, &request).await?,
        )?)?;
        Ok(vec![Part::inline("image/svg+xml", BASE64.encode(svg))])
    }

    async fn story_step(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<StoryGraph> {
        let mut turns = history.to_vec();
        turns.push(Turn::user(vec![Part::text(prompt)]));
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "text": { "type": "STRING" },
                "choices": { "type": "ARRAY", "items": { "type": "STRING" } },
            },
        });
        let request = GenerateContentRequest::new(to_contents(&turns), Some(STORY_INSTRUCTION))
            .with_config(GenerationConfig::json(Some(schema)));
        parse_story_graph(&extract_text(
            self.generate_content(model_id, &request).await?,
        )?)
    }

    async fn illustrated_story(
        &self,
        prompt: &str,
        model_id: &str,
    ) -> ServiceResult<Vec<StoryPage>> {
        let ask = format!(
            "Create a short children's story based on the prompt: \"{}\". The story should have {} pages. \
             For each page, provide a short paragraph of text (2-3 sentences) and a simple, clear visual \
             description for an illustration.\n\n\
             Format your response as a JSON array, where each object has \"text\" and \"image_prompt\" keys.",
            prompt, STORY_PAGES
        );
        let request = GenerateContentRequest::new(
            vec![GeminiContent::user(vec![GeminiPart::text(ask)])],
            Some(SCRIPT_INSTRUCTION),
        )
        .with_config(GenerationConfig::json(None));
        let script = parse_story_script(&extract_text(
            self.generate_content(model_id, &request).await?,
        )?)?;

        let mut pages: Vec<StoryPage> = script
            .iter()
            .map(|(text, _)| StoryPage::pending(text.clone()))
            .collect();
        let prompts: Vec<String> = script.into_iter().map(|(_, prompt)| prompt).collect();
        let images: Vec<ServiceResult<Option<String>>> = stream::iter(prompts)
            .map(|image_prompt| async move { self.imagen(&image_prompt).await })
            .buffered(IMAGE_CONCURRENCY)
            .collect()
            .await;
        for (page, image) in pages.iter_mut().zip(images) {
            page.image_data = image?;
        }

        let pages: Vec<StoryPage> = pages.into_iter().filter(StoryPage::is_resolved).collect();
        if pages.is_empty() {
            return Err(ServiceError::empty("story has no illustrated pages"));
        }
        Ok(pages)
    }

    async fn transform_text(
        &self,
        text: &str,
        model_id: &str,
        action: TextAction,
    ) -> ServiceResult<String> {
        let request = GenerateContentRequest::new(
            vec![GeminiContent::user(vec![GeminiPart::text(action.prompt(text))])],
            Some(ASSISTANT_INSTRUCTION),
        );
        extract_text(self.generate_content(model_id, &request).await?)
    }

    async fn classify_intent(
        &self,
        prompt: &str,
        history: &[Turn],
        model_id: &str,
    ) -> ServiceResult<ClassifiedIntent> {
        let mut turns = history.to_vec();
        turns.push(Turn::user(vec![Part::text(prompt)]));
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "decision": { "type": "STRING", "description": "The determined intent." },
                "response": { "type": "STRING", "description": "The chat response, if decision is 'chat'." },
            },
        });
        let request = GenerateContentRequest::new(to_contents(&turns), Some(INTENT_INSTRUCTION))
            .with_config(GenerationConfig::json(Some(schema)));
        parse_intent(&extract_text(
            self.generate_content(model_id, &request).await?,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = response(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "there" }] } }]
        }));
        assert_eq!(extract_text(resp).unwrap(), "Hello there");
    }

    #[test]
    fn test_no_candidates_is_empty_result() {
        let resp = response(json!({ "candidates": [] }));
        assert!(matches!(extract_text(resp), Err(ServiceError::EmptyResult(_))));
    }

    #[test]
    fn test_extract_parts_drops_unpopulated() {
        let resp = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here you go" },
                {},
                { "inlineData": { "data": "iVBOR" } }
            ] } }]
        }));
        let parts = extract_parts(resp).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].as_text(), Some("Here you go"));
        assert_eq!(parts[1].as_inline().unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_extract_grounded_citations() {
        let resp = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "It is sunny." }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://weather.example", "title": "Weather" } },
                    { "retrievedContext": {} }
                ] }
            }]
        }));
        let reply = extract_grounded(resp).unwrap();
        assert_eq!(reply.text, "It is sunny.");
        let citations = reply.citations.unwrap();
        assert_eq!(citations.sources.len(), 1);
        assert_eq!(citations.sources[0].title, "Weather");
    }

    #[test]
    fn test_parse_story_graph() {
        let story = parse_story_graph(
            "```json\n{\"text\": \"A door creaks.\", \"choices\": [\" Open\", \"Run \", \"Wait\"]}\n```",
        )
        .unwrap();
        assert_eq!(story.text, "A door creaks.");
        assert_eq!(story.choices, vec!["Open", "Run", "Wait"]);
    }

    #[test]
    fn test_parse_story_graph_needs_exactly_three_choices() {
        for choices in [
            r#"["Open"]"#,
            r#"["Open", "Run"]"#,
            r#"["Open", "Run", "Wait", "Shout"]"#,
            r#"["Open", "Run", "  "]"#,
        ] {
            let text = format!(r#"{{"text": "A door.", "choices": {}}}"#, choices);
            assert!(
                matches!(parse_story_graph(&text), Err(ServiceError::Schema(_))),
                "{}",
                choices
            );
        }
    }

    #[test]
    fn test_parse_story_graph_rejects_missing_choices() {
        assert!(matches!(
            parse_story_graph("{\"text\": \"A door creaks.\", \"choices\": []}"),
            Err(ServiceError::Schema(_))
        ));
        assert!(matches!(
            parse_story_graph("not json"),
            Err(ServiceError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_intent() {
        let intent = parse_intent("{\"decision\": \"chat\", \"response\": \"Hi!\"}").unwrap();
        assert_eq!(intent.decision, IntentDecision::Chat);
        assert_eq!(intent.response.as_deref(), Some("Hi!"));

        let intent = parse_intent("{\"decision\": \"direct_video_generation\"}").unwrap();
        assert_eq!(intent.decision, IntentDecision::DirectVideoGeneration);
        assert!(intent.response.is_none());

        assert!(parse_intent("{\"response\": \"Hi\"}").is_err());
    }

    #[test]
    fn test_parse_story_script_skips_incomplete() {
        let script = parse_story_script(
            r#"[{"text": "Page one", "image_prompt": "a robot"},
                {"text": "No picture"},
                {"text": "Page three", "image_prompt": "an owl"}]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[1].1, "an owl");
    }

    #[test]
    fn test_extract_svg() {
        let svg = extract_svg("```svg\n<?xml version=\"1.0\"?>\n<svg width=\"10\"></svg>\n```").unwrap();
        assert_eq!(svg, "<svg width=\"10\"></svg>");
        assert!(extract_svg("Here is your chart!").is_err());
    }

    #[test]
    fn test_video_uri() {
        let op: VideoOperation = serde_json::from_value(json!({
            "name": "models/veo/operations/1",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://files.example/video.mp4" } }
            ] } }
        }))
        .unwrap();
        assert_eq!(video_uri(op).unwrap(), "https://files.example/video.mp4");

        let failed: VideoOperation = serde_json::from_value(json!({
            "name": "op", "done": true, "error": { "code": 3, "message": "blocked" }
        }))
        .unwrap();
        assert!(matches!(video_uri(failed), Err(ServiceError::Schema(_))));

        let empty: VideoOperation =
            serde_json::from_value(json!({ "name": "op", "done": true })).unwrap();
        assert!(matches!(video_uri(empty), Err(ServiceError::EmptyResult(_))));
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(900);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 803);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest::new(
            vec![GeminiContent::user(vec![GeminiPart::text("hi")])],
            Some("be nice"),
        )
        .with_config(GenerationConfig::json(None));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be nice");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_poll_stops_on_cancel() {
        let settings = AppSettings {
            gemini_auth: shared::settings::ProviderAuth {
                api_key: Some("test".into()),
            },
            video_poll_interval_secs: 60,
            ..AppSettings::default()
        };
        let client = GeminiClient::from_settings(&settings)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let pending = VideoOperation {
            name: "models/veo/operations/1".into(),
            ..VideoOperation::default()
        };
        let result = client.poll_video(pending, &cancel).await;
        assert!(matches!(result, Err(ServiceError::Cancelled)));
    }
}
