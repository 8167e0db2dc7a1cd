//! Collaborators a chat session talks to

use kisan_ai::providers::{
    ImageAnalyzer, ReasoningGenerator, SearchGenerator, SpeechSynthesizer, SpeechTranscriber,
    TextGenerator,
};
use std::sync::Arc;

use crate::{media::AudioPlayer, persistence::KeyValueStore};

/// Provider clients, persistence and audio output owned by a session.
///
/// Built once by the front-end; tests build one from fakes.
#[derive(Clone)]
pub struct AppContext {
    pub text: Arc<dyn TextGenerator>,
    pub vision: Arc<dyn ImageAnalyzer>,
    pub search: Arc<dyn SearchGenerator>,
    pub reasoning: Arc<dyn ReasoningGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub store: Arc<dyn KeyValueStore>,
    pub player: Arc<dyn AudioPlayer>,
}
