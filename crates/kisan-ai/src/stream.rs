//! Upstream response shapes and streaming utilities

use crate::{
    error::{Error, Result, error_from_response},
    types::Citation,
};
use async_stream::stream;
use futures::StreamExt;
use regex::Regex;
use reqwest_eventsource::{Event, EventSource};
use std::{pin::Pin, sync::LazyLock};
use tokio_stream::Stream;

/// A stream of text fragments, in delivery order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Answer from a search-augmented provider: final text plus its sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Answer from a deep-reasoning provider, with the reasoning block split out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasoningAnswer {
    pub answer: String,
    pub thoughts: String,
}

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").unwrap());

impl ReasoningAnswer {
    /// Split raw model output into the `<think>` block and the visible answer.
    ///
    /// Only the first block is extracted. If stripping it leaves nothing, the
    /// raw text is used as the answer.
    pub fn from_raw(raw: &str) -> Self {
        let thoughts = THINK_BLOCK
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let stripped = THINK_BLOCK.replace(raw, "");
        let answer = stripped.trim();
        let answer = if answer.is_empty() {
            raw.trim().to_string()
        } else {
            answer.to_string()
        };

        Self { answer, thoughts }
    }
}

/// The three shapes an upstream call can answer with
pub enum UpstreamResponse {
    /// Token-streamed text (text generation, image analysis)
    Tokens(FragmentStream),
    /// One JSON object with the answer and a citation list
    Search(SearchAnswer),
    /// One object with separate reasoning and answer fields
    Reasoning(ReasoningAnswer),
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamResponse::Tokens(_) => f.write_str("Tokens(..)"),
            UpstreamResponse::Search(answer) => f.debug_tuple("Search").field(answer).finish(),
            UpstreamResponse::Reasoning(answer) => {
                f.debug_tuple("Reasoning").field(answer).finish()
            }
        }
    }
}

/// Build a fragment stream from already-known fragments.
pub fn fragments<I>(items: I) -> FragmentStream
where
    I: IntoIterator<Item = Result<String>>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures::stream::iter(items))
}

/// Turn an SSE connection into a fragment stream.
///
/// `parse` maps each `data:` payload to the text it carries (if any). A
/// `[DONE]` payload or the end of the connection finishes the stream; a
/// transport or parse error is yielded once and ends it.
pub(crate) fn fragments_from_sse<F>(mut event_source: EventSource, parse: F) -> FragmentStream
where
    F: Fn(&str) -> Result<Option<String>> + Send + 'static,
{
    Box::pin(stream! {
        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    if msg.data.is_empty() {
                        continue;
                    }
                    if msg.data == "[DONE]" {
                        break;
                    }
                    match parse(&msg.data) {
                        Ok(Some(fragment)) if !fragment.is_empty() => yield Ok(fragment),
                        Ok(_) => {}
                        Err(e) => {
                            event_source.close();
                            yield Err(e);
                            return;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(_, response)) => {
                    event_source.close();
                    yield Err(error_from_response(response).await);
                    return;
                }
                Err(e) => {
                    event_source.close();
                    yield Err(Error::Sse(e.to_string()));
                    return;
                }
            }
        }
        event_source.close();
    })
}
