//! Chat event types

use serde::{Deserialize, Serialize};

use crate::{conversation::Turn, router::ResponseMode};

/// Events emitted while a session handles user actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A submission was routed and its turns appended
    TurnStart {
        mode: ResponseMode,
        user: Turn,
        assistant: Turn,
    },

    /// The in-progress turn's text changed (cumulative)
    TurnUpdate { id: String, text: String },

    /// The assistant turn reached its final state
    TurnEnd { turn: Turn },

    /// The conversation was emptied
    Cleared,

    /// Playback of a turn's audio started or stopped
    Playback { turn_id: String, playing: bool },

    /// Something went wrong; shown in the banner
    Error { message: String },
}
