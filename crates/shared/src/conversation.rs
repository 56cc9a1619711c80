//! Conversation data model: turns, parts and the structured payloads a
//! model turn can carry (citations, story graphs, illustrated pages).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text substituted for a turn whose parts would otherwise be empty.
pub const PLACEHOLDER_TEXT: &str = "...";

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// Base64 encoded binary payload with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One atomic content unit within a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
    /// Opaque reference to a generated video
    VideoRef(String),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData(InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    pub fn video(uri: impl Into<String>) -> Self {
        Part::VideoRef(uri.into())
    }

    /// A part carrying no content. Empty parts are never sent to a service.
    pub fn is_empty(&self) -> bool {
        match self {
            Part::Text(text) => text.is_empty(),
            Part::InlineData(inline) => inline.data.is_empty(),
            Part::VideoRef(uri) => uri.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_inline(&self) -> Option<&InlineData> {
        match self {
            Part::InlineData(inline) => Some(inline),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Part::InlineData(inline) if inline.mime_type.starts_with("image/"))
    }
}

/// Drop empty parts, keeping the order of the rest.
pub fn non_empty_parts(parts: impl IntoIterator<Item = Part>) -> Vec<Part> {
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// A web source backing a grounded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

/// Grounding citations attached to a web-search answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    pub sources: Vec<WebSource>,
}

impl Citations {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// One step of an interactive story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGraph {
    pub text: String,
    pub choices: Vec<String>,
}

/// A page of an illustrated story. `image_data` is `None` while the
/// illustration is still being generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPage {
    pub text: String,
    pub image_data: Option<String>,
}

impl StoryPage {
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_data: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.image_data.is_some()
    }
}

/// Interactive control a presentation layer should render under a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractiveElement {
    UploadImage,
    StoryChoice,
    SurpriseMeStory,
}

/// Monotonic creation time in milliseconds; unique within a session and
/// used as the turn's identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing timestamps, even when the wall clock stalls
/// or goes backwards.
#[derive(Debug, Clone, Default)]
pub struct TurnClock {
    last: i64,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> Timestamp {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        Timestamp(self.last)
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Assigned by the message store on append
    pub created_at: Timestamp,
    #[serde(default)]
    pub is_capability_activation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_element: Option<InteractiveElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<Citations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<StoryGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_pages: Option<Vec<StoryPage>>,
    /// Working placeholder, removed once the real result lands
    #[serde(default)]
    pub is_transient: bool,
}

impl Turn {
    fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            created_at: Timestamp::default(),
            is_capability_activation: false,
            interactive_element: None,
            grounding: None,
            story: None,
            story_pages: None,
            is_transient: false,
        }
    }

    pub fn user(parts: Vec<Part>) -> Self {
        Self::new(Role::User, parts)
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self::new(Role::Model, parts)
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::model(vec![Part::text(text)])
    }

    /// "working..." placeholder shown while a slow call is pending
    pub fn transient(text: impl Into<String>) -> Self {
        let mut turn = Self::model_text(text);
        turn.is_transient = true;
        turn
    }

    /// Synthetic banner announcing a mode or model change
    pub fn banner(text: impl Into<String>) -> Self {
        let mut turn = Self::model_text(text);
        turn.is_capability_activation = true;
        turn
    }

    pub fn with_interactive(mut self, element: Option<InteractiveElement>) -> Self {
        self.interactive_element = element;
        self
    }

    pub fn with_grounding(mut self, grounding: Option<Citations>) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_story(mut self, story: Option<StoryGraph>) -> Self {
        self.story = story;
        self
    }

    pub fn with_story_pages(mut self, pages: Option<Vec<StoryPage>>) -> Self {
        self.story_pages = pages;
        self
    }

    /// All text parts joined by newlines.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
