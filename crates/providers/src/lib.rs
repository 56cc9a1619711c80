//! Generative service facade and its Gemini implementation.

pub mod error;
pub mod gemini;
mod history;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use gemini::GeminiClient;
pub use service::{
    ClassifiedIntent, GenerativeService, GroundedReply, IntentDecision, TextAction,
    ASSISTANT_INSTRUCTION,
};
