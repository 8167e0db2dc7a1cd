//! Normalizes the three upstream response shapes into [`StreamUpdate`]s

use async_stream::stream;
use futures::StreamExt;
use kisan_ai::{Citation, UpstreamResponse};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

use crate::error::Result;

/// One incremental update to the in-progress assistant turn.
///
/// `text` is cumulative, so consumers replace rather than append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUpdate {
    pub text: String,
    pub is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl StreamUpdate {
    fn partial(text: String) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    fn last(text: String) -> Self {
        Self {
            text,
            is_final: true,
            ..Default::default()
        }
    }
}

pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<StreamUpdate>> + Send>>;

/// Turn an upstream response into a stream of updates.
///
/// A token stream yields one update per fragment and a closing final update
/// with the full text. Search and reasoning answers yield a single final
/// update. A fragment error is yielded once and ends the stream without a
/// final update.
pub fn aggregate(response: UpstreamResponse) -> UpdateStream {
    match response {
        UpstreamResponse::Tokens(mut fragments) => Box::pin(stream! {
            let mut text = String::new();
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(fragment) => {
                        text.push_str(&fragment);
                        yield Ok(StreamUpdate::partial(text.clone()));
                    }
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                }
            }
            yield Ok(StreamUpdate::last(text));
        }),
        UpstreamResponse::Search(answer) => Box::pin(futures::stream::once(async move {
            Ok(StreamUpdate {
                citations: Some(answer.citations),
                ..StreamUpdate::last(answer.text)
            })
        })),
        UpstreamResponse::Reasoning(answer) => Box::pin(futures::stream::once(async move {
            let trace = (!answer.thoughts.is_empty()).then_some(answer.thoughts);
            Ok(StreamUpdate {
                reasoning_trace: trace,
                ..StreamUpdate::last(answer.answer)
            })
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kisan_ai::{ReasoningAnswer, SearchAnswer, stream::fragments};

    async fn collect(response: UpstreamResponse) -> Vec<Result<StreamUpdate>> {
        aggregate(response).collect().await
    }

    #[tokio::test]
    async fn test_token_stream_is_cumulative() {
        let parts = ["Millet ", "suits ", "dry ", "summers."];
        let response =
            UpstreamResponse::Tokens(fragments(parts.iter().map(|s| Ok(s.to_string())).collect::<Vec<_>>()));
        let updates: Vec<StreamUpdate> = collect(response)
            .await
            .into_iter()
            .map(|u| u.unwrap())
            .collect();

        assert_eq!(updates.len(), parts.len() + 1);
        let mut previous = String::new();
        for update in &updates {
            assert!(update.text.starts_with(&previous));
            previous = update.text.clone();
        }
        let last = updates.last().unwrap();
        assert!(last.is_final);
        assert_eq!(last.text, parts.concat());
        assert!(updates[..parts.len()].iter().all(|u| !u.is_final));
    }

    #[tokio::test]
    async fn test_empty_token_stream_still_finalizes() {
        let updates = collect(UpstreamResponse::Tokens(fragments(Vec::new()))).await;
        assert_eq!(updates.len(), 1);
        let update = updates[0].as_ref().unwrap();
        assert!(update.is_final);
        assert_eq!(update.text, "");
    }

    #[tokio::test]
    async fn test_token_error_ends_stream() {
        let response = UpstreamResponse::Tokens(fragments(vec![
            Ok("partial".to_string()),
            Err(kisan_ai::Error::Sse("connection reset".into())),
            Ok("never seen".to_string()),
        ]));
        let updates = collect(response).await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].as_ref().unwrap().text, "partial");
        assert!(updates[1].is_err());
    }

    #[tokio::test]
    async fn test_search_answer_single_update() {
        let citation = Citation {
            title: "Kharif sowing advisory".into(),
            url: "https://example.org/advisory".into(),
            snippet: "Sow after the first monsoon rains.".into(),
            date: None,
        };
        let response = UpstreamResponse::Search(SearchAnswer {
            text: "Sow in June. >> When to irrigate?".into(),
            citations: vec![citation.clone()],
        });
        let updates = collect(response).await;
        assert_eq!(updates.len(), 1);
        let update = updates[0].as_ref().unwrap();
        assert!(update.is_final);
        assert_eq!(update.text, "Sow in June. >> When to irrigate?");
        assert_eq!(update.citations, Some(vec![citation]));
        assert!(update.reasoning_trace.is_none());
    }

    #[tokio::test]
    async fn test_reasoning_answer_single_update() {
        let response = UpstreamResponse::Reasoning(ReasoningAnswer::from_raw(
            "<think>soil analysis</think>Groundnut is ideal.",
        ));
        let updates = collect(response).await;
        assert_eq!(updates.len(), 1);
        let update = updates[0].as_ref().unwrap();
        assert!(update.is_final);
        assert_eq!(update.text, "Groundnut is ideal.");
        assert_eq!(update.reasoning_trace.as_deref(), Some("soil analysis"));
    }

    #[tokio::test]
    async fn test_reasoning_without_thoughts_has_no_trace() {
        let response = UpstreamResponse::Reasoning(ReasoningAnswer::from_raw("Just the answer."));
        let updates = collect(response).await;
        assert!(updates[0].as_ref().unwrap().reasoning_trace.is_none());
    }
}
