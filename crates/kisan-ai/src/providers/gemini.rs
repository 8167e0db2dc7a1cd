//! Google Generative AI (Gemini) vision provider

use async_trait::async_trait;
use reqwest_eventsource::EventSource;
use serde::{Deserialize, Serialize};

use super::{ImageAnalyzer, get_api_key};
use crate::{
    FragmentStream, ImageRequest,
    error::{Error, Result},
    prompts,
    stream::fragments_from_sse,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini client used for image analysis
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from a configured key, falling back to `GEMINI_API_KEY` / `GOOGLE_API_KEY`
    pub fn from_env(provided: Option<&str>) -> Result<Self> {
        Ok(Self::new(get_api_key(
            provided,
            &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        )?))
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the vision model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn build_request(request: &ImageRequest) -> GeminiRequest {
    let prompt = if request.user_text.trim().is_empty() {
        "Analyze this farming image and describe what you see.".to_string()
    } else {
        request.user_text.clone()
    };

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![
                GeminiPart::Text { text: prompt },
                GeminiPart::InlineData {
                    inline_data: GeminiBlob {
                        mime_type: request.image.mime_type.clone(),
                        data: request.image.data.clone(),
                    },
                },
            ],
        }],
        system_instruction: Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text {
                text: prompts::vision_prompt(&request.language_name),
            }],
        }),
    }
}

/// Extract the text carried by one streamed response
fn parse_chunk(data: &str) -> Result<Option<String>> {
    if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(data) {
        return Err(Error::api(
            error_response.error.code.unwrap_or(500),
            error_response.error.message,
        ));
    }

    let response: GeminiStreamResponse = serde_json::from_str(data)?;

    let text: String = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    Ok(if text.is_empty() { None } else { Some(text) })
}

#[async_trait]
impl ImageAnalyzer for GeminiProvider {
    async fn analyze(&self, request: ImageRequest) -> Result<FragmentStream> {
        tracing::debug!(
            model = %self.model,
            mime_type = %request.image.mime_type,
            language = %request.language_code,
            "gemini vision request"
        );

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(&request));

        let event_source = EventSource::new(builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(fragments_from_sse(event_source, parse_chunk))
    }
}

// Request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

// Response types

#[derive(Debug, Deserialize)]
struct GeminiStreamResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    code: Option<u16>,
    message: String,
}
