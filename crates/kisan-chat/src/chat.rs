//! Chat session state and the submit pipeline

use futures::StreamExt;
use kisan_ai::{
    ChatMessage, ImageInput, ImageRequest, ReasoningParameters, ReasoningRequest, Role,
    SearchParameters, SearchRequest, SpeechRequest, TextRequest, TranscriptionRequest,
    UpstreamResponse, prompts,
};
use std::sync::atomic::Ordering;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    aggregator::{StreamUpdate, UpdateStream, aggregate},
    banner::ErrorBanner,
    context::AppContext,
    conversation::{
        ConversationStore, EMPTY_RESPONSE_MESSAGE, FAILURE_MESSAGE, Turn, TurnPatch,
    },
    error::{Error, Result},
    events::ChatEvent,
    handle::ChatHandle,
    language::{Language, find_language, language_or_default},
    media::MediaSlot,
    router::{ResponseMode, Toggle, Toggles},
    speech::prepare_for_speech,
    suggestions::extract_suggestions,
    validation::{image_from_bytes, validate_submission},
};

/// Result of a speak request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Started,
    /// The turn was already playing and has been stopped
    Stopped,
}

/// Result of transcribing a voice recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    /// The input box text with the transcript appended
    Text(String),
    NoSpeech,
}

/// How a response stream ended
enum Completion {
    Finished(StreamUpdate),
    Failed(Error),
    Aborted,
}

/// One request to exactly one upstream capability
enum UpstreamCall {
    Text(TextRequest),
    Image(ImageRequest),
    Search(SearchRequest),
    Reasoning(ReasoningRequest),
}

/// A conversation with the assistant, in one language.
///
/// All mutation goes through `&mut self`, so submissions are serialized.
/// Front-ends observe progress through [`ChatSession::subscribe`].
pub struct ChatSession {
    context: AppContext,
    language: &'static Language,
    toggles: Toggles,
    conversation: ConversationStore,
    attached_image: Option<ImageInput>,
    banner: ErrorBanner,
    media: MediaSlot,
    event_tx: broadcast::Sender<ChatEvent>,
    handle: ChatHandle,
}

impl ChatSession {
    /// Create a session. Unknown language codes fall back to English.
    pub fn new(context: AppContext, language_code: &str) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let conversation = ConversationStore::with_persistence(context.store.clone());
        Self {
            context,
            language: language_or_default(language_code),
            toggles: Toggles::default(),
            conversation,
            attached_image: None,
            banner: ErrorBanner::new(),
            media: MediaSlot::new(),
            event_tx,
            handle: ChatHandle::new(),
        }
    }

    /// Subscribe to chat events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for aborting from another task
    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn set_toggle(&mut self, toggle: Toggle, on: bool) {
        self.toggles.set(toggle, on);
    }

    /// Flip a toggle, returning its new state
    pub fn flip_toggle(&mut self, toggle: Toggle) -> bool {
        self.toggles.flip(toggle)
    }

    pub fn turns(&self) -> &[Turn] {
        self.conversation.turns()
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.conversation.snapshot()
    }

    pub fn attached_image(&self) -> Option<&ImageInput> {
        self.attached_image.as_ref()
    }

    /// Current banner text, if not expired
    pub fn banner(&self) -> Option<&str> {
        self.banner.message()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner.dismiss();
    }

    /// Load the conversation saved by an earlier run of this session.
    ///
    /// Failures are logged and leave the conversation empty.
    pub fn restore(&mut self) -> usize {
        match self.conversation.restore() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to restore conversation: {}", e);
                0
            }
        }
    }

    /// Switch reply language. A different language starts a new conversation.
    pub fn set_language(&mut self, code: &str) -> Result<&'static Language> {
        let Some(language) = find_language(code) else {
            let err = Error::invalid_input(format!("Unsupported language: {}", code));
            self.banner.show(err.to_string());
            return Err(err);
        };
        if language.code != self.language.code {
            self.language = language;
            self.clear();
        }
        Ok(language)
    }

    /// Validate and attach an image to the next submission
    pub fn attach_image(&mut self, bytes: &[u8], mime_type: &str) -> Result<()> {
        match image_from_bytes(bytes, mime_type) {
            Ok(image) => {
                self.attached_image = Some(image);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    pub fn detach_image(&mut self) {
        self.attached_image = None;
    }

    /// Empty the conversation, the attachment and the banner, and stop audio
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.attached_image = None;
        self.banner.dismiss();
        self.media.release();
        let _ = self.event_tx.send(ChatEvent::Cleared);
    }

    /// Tear the session down, dropping the persisted conversation
    pub fn end(&mut self) {
        self.media.release();
        self.conversation.clear();
    }

    /// Submit user text (and the attached image, if any) and wait for the
    /// assistant's answer.
    ///
    /// Upstream failures do not surface as `Err`: the returned turn carries
    /// the failure message and the banner shows the cause. `Err` means the
    /// submission was rejected before any turn was created.
    pub async fn submit(&mut self, text: &str) -> Result<Turn> {
        if self.conversation.in_progress().is_some() || self.handle.is_streaming() {
            return Err(Error::Busy);
        }
        if let Err(e) = validate_submission(text, self.attached_image.as_ref()) {
            self.fail(&e);
            return Err(e);
        }

        let text = text.trim().to_string();
        let image = self.attached_image.take();
        let mode = self.toggles.route(image.is_some());
        let history = self.conversation.history();

        // Aborts from here on land on this request's token
        let cancel = self.handle.reset();
        self.handle.is_streaming.store(true, Ordering::Release);

        let user = Turn::user(text.clone(), image.clone());
        let assistant = Turn::assistant_placeholder();
        let id = assistant.id.clone();
        self.conversation.append(user.clone());
        self.conversation.append(assistant.clone());
        self.banner.dismiss();
        let _ = self.event_tx.send(ChatEvent::TurnStart {
            mode,
            user,
            assistant,
        });

        tracing::debug!(mode = mode.label(), language = self.language.code, "submitting");

        let call = self.build_call(mode, text, image, history);
        let completion = match self.call_upstream(call, &cancel).await {
            Ok(response) => self.stream_into_turn(&id, aggregate(response), &cancel).await,
            Err(e) if e.is_aborted() => Completion::Aborted,
            Err(e) => Completion::Failed(e.into()),
        };

        self.finalize(&id, mode, completion);
        self.handle.is_streaming.store(false, Ordering::Release);

        let turn = self
            .conversation
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::Persistence(format!("turn {} vanished", id)))?;
        let _ = self.event_tx.send(ChatEvent::TurnEnd { turn: turn.clone() });
        Ok(turn)
    }

    fn build_call(
        &self,
        mode: ResponseMode,
        text: String,
        image: Option<ImageInput>,
        history: Vec<ChatMessage>,
    ) -> UpstreamCall {
        let language = self.language;
        match (mode, image) {
            (ResponseMode::ImageAnalysis, Some(image)) => UpstreamCall::Image(ImageRequest {
                user_text: text,
                image,
                language_code: language.code.to_string(),
                language_name: language.name.to_string(),
            }),
            (ResponseMode::SearchAugmented, _) => {
                let mut messages = vec![ChatMessage::system(prompts::search_prompt(language.name))];
                messages.extend(history);
                messages.push(ChatMessage::user(text));
                UpstreamCall::Search(SearchRequest {
                    messages,
                    parameters: SearchParameters::default(),
                })
            }
            (ResponseMode::DeepReasoning, _) => UpstreamCall::Reasoning(ReasoningRequest {
                prompt: prompts::reasoning_prompt(language.name, &text, &format_history(&history)),
                parameters: ReasoningParameters::default(),
            }),
            _ => UpstreamCall::Text(TextRequest {
                user_text: text,
                history,
                language_name: language.name.to_string(),
            }),
        }
    }

    async fn call_upstream(
        &self,
        call: UpstreamCall,
        cancel: &CancellationToken,
    ) -> kisan_ai::Result<UpstreamResponse> {
        let ctx = &self.context;
        let request = async move {
            Ok::<_, kisan_ai::Error>(match call {
                UpstreamCall::Text(r) => UpstreamResponse::Tokens(ctx.text.generate(r).await?),
                UpstreamCall::Image(r) => UpstreamResponse::Tokens(ctx.vision.analyze(r).await?),
                UpstreamCall::Search(r) => UpstreamResponse::Search(ctx.search.search(r).await?),
                UpstreamCall::Reasoning(r) => {
                    UpstreamResponse::Reasoning(ctx.reasoning.reason(r).await?)
                }
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(kisan_ai::Error::Aborted),
            response = request => response,
        }
    }

    /// Apply updates to the in-progress turn until the stream ends
    async fn stream_into_turn(
        &mut self,
        id: &str,
        mut updates: UpdateStream,
        cancel: &CancellationToken,
    ) -> Completion {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Completion::Aborted,
                next = updates.next() => next,
            };

            match next {
                Some(Ok(update)) if update.is_final => return Completion::Finished(update),
                Some(Ok(update)) => {
                    self.conversation.update(id, TurnPatch::text(update.text.clone()));
                    let _ = self.event_tx.send(ChatEvent::TurnUpdate {
                        id: id.to_string(),
                        text: update.text,
                    });
                }
                Some(Err(e)) => return Completion::Failed(e),
                // A stream that ends without a final update was cut short
                None => {
                    return Completion::Failed(Error::Ai(kisan_ai::Error::Sse(
                        "response stream ended unexpectedly".to_string(),
                    )));
                }
            }
        }
    }

    fn finalize(&mut self, id: &str, mode: ResponseMode, completion: Completion) {
        let patch = match completion {
            Completion::Finished(update) if update.text.trim().is_empty() => {
                TurnPatch::text(EMPTY_RESPONSE_MESSAGE)
            }
            Completion::Finished(update) => {
                let (text, suggestions) = if mode.extracts_suggestions() {
                    let extracted = extract_suggestions(&update.text);
                    (extracted.text, extracted.suggestions)
                } else {
                    (update.text, Vec::new())
                };
                TurnPatch {
                    text: Some(text),
                    suggestions: Some(suggestions),
                    citations: update.citations,
                    reasoning_trace: update.reasoning_trace,
                    finalize: false,
                }
            }
            Completion::Failed(e) => {
                tracing::error!(mode = mode.label(), "upstream call failed: {}", e);
                self.fail(&e);
                TurnPatch::text(FAILURE_MESSAGE)
            }
            Completion::Aborted => {
                tracing::debug!("request aborted");
                let partial = self
                    .conversation
                    .get(id)
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                if partial.trim().is_empty() {
                    TurnPatch::text(FAILURE_MESSAGE)
                } else {
                    TurnPatch::default()
                }
            }
        };
        self.conversation.update(id, patch.finalized());
    }

    /// Speak a turn aloud, or stop it if it is the one already playing
    pub async fn speak(&mut self, turn_id: &str) -> Result<SpeakOutcome> {
        if self.media.playing_turn() == Some(turn_id) {
            self.media.release();
            let _ = self.event_tx.send(ChatEvent::Playback {
                turn_id: turn_id.to_string(),
                playing: false,
            });
            return Ok(SpeakOutcome::Stopped);
        }

        let Some(text) = self
            .conversation
            .get(turn_id)
            .filter(|t| t.is_terminal())
            .map(|t| prepare_for_speech(&t.text))
        else {
            return Err(Error::invalid_input("Nothing to play for that message."));
        };
        if text.is_empty() {
            return Err(Error::invalid_input("Nothing to play for that message."));
        }

        self.media.release();
        let request = SpeechRequest {
            text,
            language_code: self.language.code.to_string(),
        };
        let played = match self.context.synthesizer.synthesize(request).await {
            Ok(audio) => self.context.player.play(&audio),
            Err(e) => Err(e.into()),
        };

        match played {
            Ok(playback) => {
                self.media.start_playback(turn_id, playback);
                let _ = self.event_tx.send(ChatEvent::Playback {
                    turn_id: turn_id.to_string(),
                    playing: true,
                });
                Ok(SpeakOutcome::Started)
            }
            Err(e) => {
                tracing::warn!("playback failed: {}", e);
                self.show_error(format!("Audio playback failed: {}", e));
                Err(e)
            }
        }
    }

    /// Stop any audio playback
    pub fn stop_audio(&mut self) {
        if let Some(turn_id) = self.media.playing_turn().map(str::to_string) {
            self.media.release();
            let _ = self.event_tx.send(ChatEvent::Playback {
                turn_id,
                playing: false,
            });
        }
    }

    /// Transcribe a voice recording and append it to `current_input`
    pub async fn transcribe(
        &mut self,
        audio: Vec<u8>,
        current_input: &str,
    ) -> Result<TranscriptOutcome> {
        self.media.start_capture();
        let request = TranscriptionRequest {
            audio,
            language_code: self.language.code.to_string(),
        };
        let result = self.context.transcriber.transcribe(request).await;
        self.media.finish_capture();

        match result {
            Ok(transcript) if transcript.trim().is_empty() => {
                self.show_error("Could not detect any speech.");
                Ok(TranscriptOutcome::NoSpeech)
            }
            Ok(transcript) => Ok(TranscriptOutcome::Text(
                format!("{} {}", current_input, transcript.trim())
                    .trim()
                    .to_string(),
            )),
            Err(e) => {
                tracing::warn!("transcription failed: {}", e);
                self.show_error(format!("Transcription failed: {}", e));
                Err(e.into())
            }
        }
    }

    fn fail(&mut self, error: &Error) {
        self.show_error(error.to_string());
    }

    fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.banner.show(message.clone());
        let _ = self.event_tx.send(ChatEvent::Error { message });
    }
}

/// Render prior turns as a transcript for single-prompt models
fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "User",
                _ => "Assistant",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
