//! Groq chat completions (OpenAI-compatible) provider
//!
//! Serves two capabilities: streamed plain-text answers and non-streamed deep
//! reasoning, whose `<think>` block is split out of the reply.

use async_trait::async_trait;
use reqwest_eventsource::EventSource;
use serde::{Deserialize, Serialize};

use super::{ReasoningGenerator, TextGenerator, get_api_key};
use crate::{
    ChatMessage, FragmentStream, ReasoningAnswer, ReasoningRequest, TextRequest,
    error::{Error, Result, error_from_response},
    prompts,
    stream::fragments_from_sse,
};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq API client
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
}

impl GroqProvider {
    /// Create a new Groq provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }

    /// Create from a configured key, falling back to `GROQ_API_KEY`
    pub fn from_env(provided: Option<&str>) -> Result<Self> {
        Ok(Self::new(get_api_key(provided, &["GROQ_API_KEY"])?))
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model used for plain text answers
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_text_request(model: &str, request: &TextRequest) -> CompletionRequest {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(ChatMessage::system(prompts::assistant_prompt(
        &request.language_name,
    )));
    messages.extend(request.history.iter().cloned());
    messages.push(ChatMessage::user(request.user_text.clone()));

    CompletionRequest {
        model: model.to_string(),
        messages,
        stream: true,
        temperature: 0.6,
        top_p: 0.95,
        max_completion_tokens: 4096,
        reasoning_format: None,
    }
}

fn build_reasoning_request(request: &ReasoningRequest) -> CompletionRequest {
    CompletionRequest {
        model: request.parameters.model.clone(),
        messages: vec![ChatMessage::user(request.prompt.clone())],
        stream: false,
        temperature: request.parameters.temperature,
        top_p: request.parameters.top_p,
        max_completion_tokens: request.parameters.max_completion_tokens,
        reasoning_format: Some("raw".to_string()),
    }
}

/// Extract the text delta from one streamed chunk
fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: StreamChunk = serde_json::from_str(data)?;
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    Ok(if text.is_empty() { None } else { Some(text) })
}

#[async_trait]
impl TextGenerator for GroqProvider {
    async fn generate(&self, request: TextRequest) -> Result<FragmentStream> {
        let body = build_text_request(&self.text_model, &request);
        tracing::debug!(
            model = %body.model,
            history = request.history.len(),
            "groq text request"
        );

        let builder = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body);

        let event_source = EventSource::new(builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(fragments_from_sse(event_source, parse_chunk))
    }
}

#[async_trait]
impl ReasoningGenerator for GroqProvider {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningAnswer> {
        let body = build_reasoning_request(&request);
        tracing::debug!(model = %body.model, "groq reasoning request");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let completion: Completion = response.json().await?;
        let raw = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::UnexpectedResponse("completion has no choices".into()))?;

        Ok(ReasoningAnswer::from_raw(&raw))
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    top_p: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReasoningParameters, Role};

    #[test]
    fn test_parse_chunk_content() {
        let data = r#"{"id":"x","choices":[{"index":0,"delta":{"content":"Sow "}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), Some("Sow ".to_string()));
    }

    #[test]
    fn test_parse_chunk_role_only() {
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_usage_only() {
        let data = r#"{"choices":[],"x_groq":{"usage":{"prompt_tokens":10}}}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_malformed() {
        assert!(matches!(parse_chunk("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_text_request_layout() {
        let request = TextRequest {
            user_text: "Best crops for summer?".into(),
            history: vec![
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Namaste!"),
            ],
            language_name: "Hindi".into(),
        };
        let body = build_text_request(DEFAULT_TEXT_MODEL, &request);
        assert!(body.stream);
        assert_eq!(body.messages.len(), 4);
        assert_eq!(body.messages[0].role, Role::System);
        assert!(body.messages[0].content.contains("Respond in Hindi."));
        assert_eq!(body.messages[3], ChatMessage::user("Best crops for summer?"));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json.get("reasoning_format").is_none());
    }

    #[test]
    fn test_reasoning_request_layout() {
        let request = ReasoningRequest {
            prompt: "Why is my soil hard?".into(),
            parameters: ReasoningParameters::default(),
        };
        let body = build_reasoning_request(&request);
        assert!(!body.stream);
        assert_eq!(body.model, "qwen/qwen3-32b");
        assert_eq!(body.max_completion_tokens, 4096);
        assert_eq!(body.messages, vec![ChatMessage::user("Why is my soil hard?")]);
    }
}
