//! Conversation state: the ordered turn log and its persisted snapshot.

use kisan_ai::{ChatMessage, Citation, ImageInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::Result,
    persistence::{KeyValueStore, SESSION_KEY},
};

/// Shown in place of an answer when the upstream call fails
pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

/// Shown when the upstream call succeeds with no text
pub const EMPTY_RESPONSE_MESSAGE: &str = "Sorry, I could not get a response.";

/// Stands in for the text of a question asked with only an image
pub const IMAGE_ONLY_QUESTION: &str = "[image]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    InProgress,
    Terminal,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub author: Author,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<String>,
    /// Unix millis
    pub created_at: i64,
    pub status: TurnStatus,
}

impl Turn {
    fn new(author: Author, text: String, status: TurnStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            text,
            image: None,
            suggestions: Vec::new(),
            citations: Vec::new(),
            reasoning_trace: None,
            created_at: chrono::Utc::now().timestamp_millis(),
            status,
        }
    }

    /// A finished user turn
    pub fn user(text: impl Into<String>, image: Option<ImageInput>) -> Self {
        Self {
            image,
            ..Self::new(Author::User, text.into(), TurnStatus::Terminal)
        }
    }

    /// An empty assistant turn awaiting its response
    pub fn assistant_placeholder() -> Self {
        Self::new(Author::Assistant, String::new(), TurnStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        self.status == TurnStatus::Terminal
    }
}

/// Partial update to a turn. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnPatch {
    pub text: Option<String>,
    pub suggestions: Option<Vec<String>>,
    pub citations: Option<Vec<Citation>>,
    pub reasoning_trace: Option<String>,
    /// Mark the turn terminal after applying the other fields
    pub finalize: bool,
}

impl TurnPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn finalized(mut self) -> Self {
        self.finalize = true;
        self
    }
}

/// Ordered, append-only turn log with an optional persisted copy.
///
/// At most one turn is in progress at a time. Appending a second one, or
/// patching a terminal turn, is a programming error and panics.
#[derive(Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    persistence: Option<Arc<dyn KeyValueStore>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that writes its snapshot to `store` after every mutation
    pub fn with_persistence(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            turns: Vec::new(),
            persistence: Some(store),
        }
    }

    pub fn append(&mut self, turn: Turn) {
        if turn.status == TurnStatus::InProgress {
            if let Some(open) = self.in_progress() {
                panic!(
                    "cannot append turn {}: turn {} is still in progress",
                    turn.id, open.id
                );
            }
        }
        self.turns.push(turn);
        self.persist();
    }

    /// Apply `patch` to the turn with `id`. Returns false if no such turn.
    pub fn update(&mut self, id: &str, patch: TurnPatch) -> bool {
        let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        assert!(
            turn.status == TurnStatus::InProgress,
            "cannot update turn {}: it is already terminal",
            id
        );

        if let Some(text) = patch.text {
            turn.text = text;
        }
        if let Some(suggestions) = patch.suggestions {
            turn.suggestions = suggestions;
        }
        if let Some(citations) = patch.citations {
            turn.citations = citations;
        }
        if let Some(trace) = patch.reasoning_trace {
            turn.reasoning_trace = Some(trace);
        }
        if patch.finalize {
            turn.status = TurnStatus::Terminal;
        }

        self.persist();
        true
    }

    /// Drop every turn and the persisted copy
    pub fn clear(&mut self) {
        self.turns.clear();
        if let Some(store) = &self.persistence {
            if let Err(e) = store.remove(SESSION_KEY) {
                tracing::warn!("Failed to remove saved conversation: {}", e);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: &str) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    pub fn in_progress(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .find(|t| t.status == TurnStatus::InProgress)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Load the saved snapshot, replacing the current turns.
    ///
    /// Turns saved mid-stream come back terminal. Returns the number of
    /// turns restored; zero when nothing was saved.
    pub fn restore(&mut self) -> Result<usize> {
        let Some(store) = &self.persistence else {
            return Ok(0);
        };
        let Some(saved) = store.get(SESSION_KEY)? else {
            return Ok(0);
        };

        let mut turns: Vec<Turn> = serde_json::from_str(&saved)?;
        for turn in turns.iter_mut().filter(|t| !t.is_terminal()) {
            tracing::debug!(id = %turn.id, "finalizing turn saved mid-stream");
            if turn.text.trim().is_empty() {
                turn.text = FAILURE_MESSAGE.to_string();
            }
            turn.status = TurnStatus::Terminal;
        }

        self.turns = turns;
        Ok(self.turns.len())
    }

    /// Prior terminal turns as role/content pairs, oldest first. Roles
    /// alternate: an image-only question is sent as [`IMAGE_ONLY_QUESTION`].
    pub fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .filter(|t| t.is_terminal())
            .filter_map(|t| match t.author {
                Author::User if t.text.trim().is_empty() => {
                    Some(ChatMessage::user(IMAGE_ONLY_QUESTION))
                }
                Author::User => Some(ChatMessage::user(t.text.clone())),
                Author::Assistant if t.text.trim().is_empty() => None,
                Author::Assistant => Some(ChatMessage::assistant(t.text.clone())),
            })
            .collect()
    }

    fn persist(&self) {
        let Some(store) = &self.persistence else {
            return;
        };
        let saved = serde_json::to_string(&self.turns)
            .map_err(crate::error::Error::from)
            .and_then(|json| store.set(SESSION_KEY, &json));
        if let Err(e) = saved {
            tracing::warn!("Failed to save conversation: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_append_and_snapshot_order() {
        let mut store = ConversationStore::new();
        let first = Turn::user("Best crops for summer?", None);
        let second = Turn::assistant_placeholder();
        store.append(first.clone());
        store.append(second.clone());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, first.id);
        assert_eq!(snapshot[1].id, second.id);
        assert_eq!(store.in_progress().map(|t| t.id.as_str()), Some(second.id.as_str()));
    }

    #[test]
    fn test_user_turns_are_terminal() {
        let turn = Turn::user("hello", None);
        assert!(turn.is_terminal());
        assert!(!Turn::assistant_placeholder().is_terminal());
    }

    #[test]
    #[should_panic(expected = "still in progress")]
    fn test_second_in_progress_panics() {
        let mut store = ConversationStore::new();
        store.append(Turn::assistant_placeholder());
        store.append(Turn::assistant_placeholder());
    }

    #[test]
    fn test_append_after_finalize() {
        let mut store = ConversationStore::new();
        let turn = Turn::assistant_placeholder();
        let id = turn.id.clone();
        store.append(turn);
        store.update(&id, TurnPatch::text("done").finalized());
        store.append(Turn::assistant_placeholder());
        assert_eq!(store.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already terminal")]
    fn test_update_terminal_panics() {
        let mut store = ConversationStore::new();
        let turn = Turn::user("hi", None);
        let id = turn.id.clone();
        store.append(turn);
        store.update(&id, TurnPatch::text("changed"));
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("hi", None));
        let before = store.snapshot();
        assert!(!store.update("missing", TurnPatch::text("x")));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_update_applies_fields() {
        let mut store = ConversationStore::new();
        let turn = Turn::assistant_placeholder();
        let id = turn.id.clone();
        store.append(turn);

        store.update(
            &id,
            TurnPatch {
                text: Some("Groundnut is ideal.".into()),
                reasoning_trace: Some("soil analysis".into()),
                suggestions: Some(vec!["When to sow?".into()]),
                ..Default::default()
            }
            .finalized(),
        );

        let turn = store.get(&id).unwrap();
        assert_eq!(turn.text, "Groundnut is ideal.");
        assert_eq!(turn.reasoning_trace.as_deref(), Some("soil analysis"));
        assert_eq!(turn.suggestions, vec!["When to sow?"]);
        assert!(turn.is_terminal());
        assert!(store.in_progress().is_none());
    }

    #[test]
    fn test_clear_empties_and_drops_saved_copy() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = ConversationStore::with_persistence(kv.clone());
        store.append(Turn::user("hi", None));
        assert!(kv.get(SESSION_KEY).unwrap().is_some());

        store.clear();
        assert!(store.snapshot().is_empty());
        assert!(kv.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_persist_then_restore_identical() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = ConversationStore::with_persistence(kv.clone());
        store.append(Turn::user(
            "What is wrong with this leaf?",
            Some(ImageInput::new("aGVsbG8=", "image/png")),
        ));
        let reply = Turn::assistant_placeholder();
        let id = reply.id.clone();
        store.append(reply);
        store.update(
            &id,
            TurnPatch {
                text: Some("Sow in June.".into()),
                citations: Some(vec![Citation {
                    title: "Advisory".into(),
                    url: "https://example.org".into(),
                    snippet: String::new(),
                    date: Some("2024-06-01".into()),
                }]),
                ..Default::default()
            }
            .finalized(),
        );

        let mut restored = ConversationStore::with_persistence(kv);
        assert_eq!(restored.restore().unwrap(), 2);
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn test_restore_finalizes_mid_stream_turns() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = ConversationStore::with_persistence(kv.clone());
        store.append(Turn::user("q", None));
        store.append(Turn::assistant_placeholder());

        let mut restored = ConversationStore::with_persistence(kv);
        restored.restore().unwrap();
        let last = restored.turns().last().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.text, FAILURE_MESSAGE);
        assert!(restored.in_progress().is_none());
    }

    #[test]
    fn test_restore_without_saved_copy() {
        let mut store = ConversationStore::with_persistence(Arc::new(MemoryStore::new()));
        assert_eq!(store.restore().unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_keeps_image_only_question() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("", Some(ImageInput::new("aW1n", "image/png"))));
        let reply = Turn::assistant_placeholder();
        let id = reply.id.clone();
        store.append(reply);
        store.update(&id, TurnPatch::text("Leaf rust.").finalized());

        assert_eq!(
            store.history(),
            vec![
                ChatMessage::user(IMAGE_ONLY_QUESTION),
                ChatMessage::assistant("Leaf rust."),
            ]
        );
    }

    #[test]
    fn test_history_skips_in_progress() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("q1", None));
        let reply = Turn::assistant_placeholder();
        let id = reply.id.clone();
        store.append(reply);
        store.update(&id, TurnPatch::text("a1").finalized());
        store.append(Turn::user("q2", None));
        store.append(Turn::assistant_placeholder());

        assert_eq!(
            store.history(),
            vec![
                ChatMessage::user("q1"),
                ChatMessage::assistant("a1"),
                ChatMessage::user("q2"),
            ]
        );
    }

    #[test]
    fn test_single_in_progress_under_interleaving() {
        let mut store = ConversationStore::new();
        for round in 0..5 {
            store.append(Turn::user(format!("q{}", round), None));
            let reply = Turn::assistant_placeholder();
            let id = reply.id.clone();
            store.append(reply);
            for i in 0..3 {
                store.update(&id, TurnPatch::text(format!("a{}", i)));
                let open = store
                    .turns()
                    .iter()
                    .filter(|t| t.status == TurnStatus::InProgress)
                    .count();
                assert_eq!(open, 1);
            }
            store.update(&id, TurnPatch::default().finalized());
            assert!(store.in_progress().is_none());
        }
    }
}
