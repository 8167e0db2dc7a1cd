//! Google Cloud Text-to-Speech and Speech-to-Text provider

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::{SpeechSynthesizer, SpeechTranscriber, get_api_key};
use crate::{
    SpeechRequest, SynthesizedAudio, TranscriptionRequest,
    error::{Error, Result, error_from_response},
};

pub const TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
pub const STT_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Google Speech-to-Text accepts at most this many alternative languages
const MAX_ALTERNATIVE_LANGUAGES: usize = 3;

/// Google Cloud speech client
pub struct GoogleSpeechProvider {
    client: reqwest::Client,
    api_key: String,
    tts_url: String,
    stt_url: String,
    alternative_languages: Vec<String>,
}

impl GoogleSpeechProvider {
    /// Create a new speech provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            tts_url: TTS_URL.to_string(),
            stt_url: STT_URL.to_string(),
            alternative_languages: Vec::new(),
        }
    }

    /// Create from a configured key, falling back to `GOOGLE_CLOUD_API_KEY` / `GOOGLE_API_KEY`
    pub fn from_env(provided: Option<&str>) -> Result<Self> {
        Ok(Self::new(get_api_key(
            provided,
            &["GOOGLE_CLOUD_API_KEY", "GOOGLE_API_KEY"],
        )?))
    }

    /// Languages the recognizer may fall back to besides the requested one
    pub fn with_alternative_languages(mut self, codes: Vec<String>) -> Self {
        self.alternative_languages = codes;
        self
    }

    /// Override both endpoints (for proxies)
    pub fn with_urls(mut self, tts_url: impl Into<String>, stt_url: impl Into<String>) -> Self {
        self.tts_url = tts_url.into();
        self.stt_url = stt_url.into();
        self
    }
}

/// Pick the voice for a language
fn voice_name(language_code: &str) -> String {
    if language_code == "en-US" {
        "en-US-Studio-O".to_string()
    } else {
        format!("{}-Standard-A", language_code)
    }
}

fn build_synthesis_request(request: &SpeechRequest) -> SynthesisRequest {
    SynthesisRequest {
        input: SynthesisInput {
            text: request.text.clone(),
        },
        voice: VoiceSelection {
            language_code: request.language_code.clone(),
            name: voice_name(&request.language_code),
        },
        audio_config: AudioConfig {
            audio_encoding: "MP3".to_string(),
        },
    }
}

fn build_recognition_request(
    request: &TranscriptionRequest,
    alternatives: &[String],
) -> RecognitionRequest {
    let alternative_language_codes = alternatives
        .iter()
        .filter(|code| **code != request.language_code)
        .take(MAX_ALTERNATIVE_LANGUAGES)
        .cloned()
        .collect();

    RecognitionRequest {
        config: RecognitionConfig {
            encoding: "WEBM_OPUS".to_string(),
            sample_rate_hertz: 48000,
            language_code: request.language_code.clone(),
            alternative_language_codes,
        },
        audio: RecognitionAudio {
            content: STANDARD.encode(&request.audio),
        },
    }
}

/// Join the best alternative of each result into one transcript
fn into_transcript(response: RecognitionResponse) -> String {
    response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeechProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SynthesizedAudio> {
        tracing::debug!(
            language = %request.language_code,
            bytes = request.text.len(),
            "tts request"
        );

        let response = self
            .client
            .post(&self.tts_url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_synthesis_request(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: SynthesisResponse = response.json().await?;
        let data = STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| Error::UnexpectedResponse(format!("invalid audio content: {}", e)))?;

        Ok(SynthesizedAudio {
            data,
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

#[async_trait]
impl SpeechTranscriber for GoogleSpeechProvider {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String> {
        tracing::debug!(
            language = %request.language_code,
            bytes = request.audio.len(),
            "stt request"
        );

        let response = self
            .client
            .post(&self.stt_url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_recognition_request(&request, &self.alternative_languages))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(into_transcript(response.json().await?))
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest {
    input: SynthesisInput,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: String,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    audio_content: String,
}

#[derive(Debug, Serialize)]
struct RecognitionRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: String,
    sample_rate_hertz: u32,
    language_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternative_language_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognitionResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}
