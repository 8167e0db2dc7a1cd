//! Provider wiring from config and environment

use async_trait::async_trait;
use kisan_ai::{
    Error, FragmentStream, ImageRequest, ReasoningAnswer, ReasoningRequest, Result, SearchAnswer,
    SearchRequest, SpeechRequest, SynthesizedAudio, TextRequest, TranscriptionRequest,
    providers::{
        ImageAnalyzer, ReasoningGenerator, SearchGenerator, SpeechSynthesizer, SpeechTranscriber,
        TextGenerator,
        gemini::GeminiProvider,
        google_speech::GoogleSpeechProvider,
        groq::GroqProvider,
        perplexity::PerplexityProvider,
    },
};
use kisan_chat::{AppContext, AudioPlayer, KeyValueStore, language::language_codes};
use std::sync::Arc;

use crate::config::Config;

/// Stands in for a provider whose API key is not configured. Every call
/// fails with [`Error::MissingApiKey`], so only the features that need the
/// key are affected.
pub struct MissingKey(pub &'static str);

#[async_trait]
impl TextGenerator for MissingKey {
    async fn generate(&self, _request: TextRequest) -> Result<FragmentStream> {
        Err(Error::MissingApiKey(self.0))
    }
}

#[async_trait]
impl ImageAnalyzer for MissingKey {
    async fn analyze(&self, _request: ImageRequest) -> Result<FragmentStream> {
        Err(Error::MissingApiKey(self.0))
    }
}

#[async_trait]
impl SearchGenerator for MissingKey {
    async fn search(&self, _request: SearchRequest) -> Result<SearchAnswer> {
        Err(Error::MissingApiKey(self.0))
    }
}

#[async_trait]
impl ReasoningGenerator for MissingKey {
    async fn reason(&self, _request: ReasoningRequest) -> Result<ReasoningAnswer> {
        Err(Error::MissingApiKey(self.0))
    }
}

#[async_trait]
impl SpeechSynthesizer for MissingKey {
    async fn synthesize(&self, _request: SpeechRequest) -> Result<SynthesizedAudio> {
        Err(Error::MissingApiKey(self.0))
    }
}

#[async_trait]
impl SpeechTranscriber for MissingKey {
    async fn transcribe(&self, _request: TranscriptionRequest) -> Result<String> {
        Err(Error::MissingApiKey(self.0))
    }
}

/// Build the session context. Providers without a key are replaced by
/// [`MissingKey`]; the names of their variables are returned for a warning.
pub fn build_context(
    cfg: &Config,
    store: Arc<dyn KeyValueStore>,
    player: Arc<dyn AudioPlayer>,
) -> (AppContext, Vec<&'static str>) {
    let mut missing = Vec::new();
    let mut note = |var: &'static str, e: Error| {
        tracing::debug!("{} unavailable: {}", var, e);
        missing.push(var);
        Arc::new(MissingKey(var))
    };

    let (text, reasoning): (Arc<dyn TextGenerator>, Arc<dyn ReasoningGenerator>) =
        match GroqProvider::from_env(cfg.api_keys.groq.as_deref()) {
            Ok(groq) => {
                let groq = Arc::new(groq);
                (groq.clone(), groq)
            }
            Err(e) => {
                let stub = note("GROQ_API_KEY", e);
                (stub.clone(), stub)
            }
        };

    let vision: Arc<dyn ImageAnalyzer> =
        match GeminiProvider::from_env(cfg.api_keys.gemini.as_deref()) {
            Ok(gemini) => Arc::new(gemini),
            Err(e) => note("GEMINI_API_KEY", e),
        };

    let search: Arc<dyn SearchGenerator> =
        match PerplexityProvider::from_env(cfg.api_keys.perplexity.as_deref()) {
            Ok(perplexity) => Arc::new(perplexity),
            Err(e) => note("PERPLEXITY_API_KEY", e),
        };

    let (synthesizer, transcriber): (Arc<dyn SpeechSynthesizer>, Arc<dyn SpeechTranscriber>) =
        match GoogleSpeechProvider::from_env(cfg.api_keys.google_cloud.as_deref()) {
            Ok(speech) => {
                let speech = Arc::new(speech.with_alternative_languages(language_codes()));
                (speech.clone(), speech)
            }
            Err(e) => {
                let stub = note("GOOGLE_CLOUD_API_KEY", e);
                (stub.clone(), stub)
            }
        };

    let context = AppContext {
        text,
        vision,
        search,
        reasoning,
        synthesizer,
        transcriber,
        store,
        player,
    };
    (context, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_each_call() {
        let stub = MissingKey("PERPLEXITY_API_KEY");
        let err = stub
            .search(SearchRequest {
                messages: vec![],
                parameters: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Missing API key: set PERPLEXITY_API_KEY");
    }
}
