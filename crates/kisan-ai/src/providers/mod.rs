//! Upstream provider traits and their hosted implementations

pub mod gemini;
pub mod google_speech;
pub mod groq;
pub mod perplexity;

use crate::{
    Error, FragmentStream, ImageRequest, ReasoningAnswer, ReasoningRequest, Result, SearchAnswer,
    SearchRequest, SpeechRequest, SynthesizedAudio, TextRequest, TranscriptionRequest,
};
use async_trait::async_trait;

/// Plain text generation, streamed token by token
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: TextRequest) -> Result<FragmentStream>;
}

/// Vision analysis of an attached image, streamed token by token
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, request: ImageRequest) -> Result<FragmentStream>;
}

/// Web-search-augmented generation, answered in one object
#[async_trait]
pub trait SearchGenerator: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<SearchAnswer>;
}

/// Deep-reasoning generation, answered in one object
#[async_trait]
pub trait ReasoningGenerator: Send + Sync {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningAnswer>;
}

/// Text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SynthesizedAudio>;
}

/// Speech-to-text. An empty transcript means no speech was detected.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String>;
}

/// Get an API key from a provided value or the first set environment variable
pub fn get_api_key(provided: Option<&str>, env_vars: &[&'static str]) -> Result<String> {
    if let Some(key) = provided.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    env_vars
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .ok_or(Error::MissingApiKey(env_vars.first().copied().unwrap_or("API key")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_key_wins() {
        let key = get_api_key(Some("abc"), &["KISAN_TEST_UNSET_VAR"]).unwrap();
        assert_eq!(key, "abc");
    }

    #[test]
    fn test_missing_key_names_first_var() {
        let err = get_api_key(None, &["KISAN_TEST_UNSET_VAR_1", "KISAN_TEST_UNSET_VAR_2"])
            .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey("KISAN_TEST_UNSET_VAR_1")));
    }

    #[test]
    fn test_empty_provided_key_ignored() {
        assert!(get_api_key(Some(""), &["KISAN_TEST_UNSET_VAR_3"]).is_err());
    }
}
