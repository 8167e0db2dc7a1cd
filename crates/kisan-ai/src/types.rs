//! Request and response types shared by every provider adapter

use serde::{Deserialize, Serialize};

/// Chat roles understood by the chat-completion style providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role/content pair sent as conversation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A search-result reference attached to a search-augmented answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// An attached image, base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInput {
    pub data: String,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Plain text generation request
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub user_text: String,
    /// Prior turns, oldest first, alternating roles
    pub history: Vec<ChatMessage>,
    /// English name of the reply language (e.g. "Hindi")
    pub language_name: String,
}

/// Image analysis request
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub user_text: String,
    pub image: ImageInput,
    /// BCP-47 code of the reply language (e.g. "hi-IN")
    pub language_code: String,
    pub language_name: String,
}

/// Search-augmented generation request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub messages: Vec<ChatMessage>,
    pub parameters: SearchParameters,
}

/// Model parameters for search-augmented generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub search_mode: String,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            model: "sonar".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            top_p: 0.9,
            search_mode: "web".to_string(),
        }
    }
}

/// Deep-reasoning request
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub parameters: ReasoningParameters,
}

/// Model parameters for deep reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningParameters {
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
}

impl Default for ReasoningParameters {
    fn default() -> Self {
        Self {
            model: "qwen/qwen3-32b".to_string(),
            temperature: 0.6,
            max_completion_tokens: 4096,
            top_p: 0.95,
        }
    }
}

/// Speech synthesis request. `text` is expected to be already cleaned.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language_code: String,
}

/// Synthesized audio returned by a speech provider
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Speech transcription request
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    pub language_code: String,
}
