//! Perplexity search-augmented chat completions provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchGenerator, get_api_key};
use crate::{
    ChatMessage, Citation, SearchAnswer, SearchRequest,
    error::{Error, Result, error_from_response},
};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Perplexity API client
pub struct PerplexityProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PerplexityProvider {
    /// Create a new Perplexity provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from a configured key, falling back to `PERPLEXITY_API_KEY`
    pub fn from_env(provided: Option<&str>) -> Result<Self> {
        Ok(Self::new(get_api_key(provided, &["PERPLEXITY_API_KEY"])?))
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn build_request(request: &SearchRequest) -> PerplexityRequest {
    let p = &request.parameters;
    PerplexityRequest {
        model: p.model.clone(),
        messages: request.messages.clone(),
        temperature: p.temperature,
        max_tokens: p.max_tokens,
        top_p: p.top_p,
        search_mode: p.search_mode.clone(),
        stream: false,
        return_images: false,
        return_related_questions: false,
        web_search_options: WebSearchOptions {
            search_context_size: "low".to_string(),
        },
    }
}

/// Normalize a completion body into text plus citations
fn into_answer(response: PerplexityResponse) -> Result<SearchAnswer> {
    let text = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| Error::UnexpectedResponse("search response has no choices".into()))?;

    let citations = response
        .search_results
        .into_iter()
        .map(|r| Citation {
            title: r.title,
            url: r.url,
            snippet: r.snippet,
            date: r.date.or(r.last_updated),
        })
        .collect();

    Ok(SearchAnswer { text, citations })
}

#[async_trait]
impl SearchGenerator for PerplexityProvider {
    async fn search(&self, request: SearchRequest) -> Result<SearchAnswer> {
        let body = build_request(&request);
        tracing::debug!(model = %body.model, messages = body.messages.len(), "perplexity request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        into_answer(response.json().await?)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct PerplexityRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    search_mode: String,
    stream: bool,
    return_images: bool,
    return_related_questions: bool,
    web_search_options: WebSearchOptions,
}

#[derive(Debug, Serialize)]
struct WebSearchOptions {
    search_context_size: String,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
    date: Option<String>,
    last_updated: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchParameters;

    #[test]
    fn test_answer_with_citations() {
        let body = r#"{
            "id": "r1",
            "model": "sonar",
            "choices": [{"index": 0, "finish_reason": "stop",
                         "message": {"role": "assistant", "content": "Sow in June. >> When to irrigate?"}}],
            "search_results": [{"title": "Govt advisory", "url": "https://x", "snippet": "..."}]
        }"#;
        let answer = into_answer(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(answer.text, "Sow in June. >> When to irrigate?");
        assert_eq!(
            answer.citations,
            vec![Citation {
                title: "Govt advisory".into(),
                url: "https://x".into(),
                snippet: "...".into(),
                date: None,
            }]
        );
    }

    #[test]
    fn test_citation_date_falls_back_to_last_updated() {
        let body = r#"{
            "choices": [{"message": {"content": "ok"}}],
            "search_results": [{"title": "t", "url": "u", "snippet": "s", "last_updated": "2025-06-01"}]
        }"#;
        let answer = into_answer(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(answer.citations[0].date.as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_no_choices_is_unexpected() {
        let body = r#"{"choices": [], "search_results": []}"#;
        let err = into_answer(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = SearchRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("Mandi price of onion?")],
            parameters: SearchParameters::default(),
        };
        let json = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(json["model"], "sonar");
        assert_eq!(json["stream"], false);
        assert_eq!(json["search_mode"], "web");
        assert_eq!(json["messages"][1]["content"], "Mandi price of onion?");
        assert_eq!(json["web_search_options"]["search_context_size"], "low");
    }
}
