//! kisan-chat: conversation orchestration for the KisanSaathi assistant
//!
//! Routes each submission to one upstream capability, folds the provider's
//! response into a single in-progress turn, and keeps the turn log, error
//! banner and media slot consistent while it does.

pub mod aggregator;
pub mod banner;
pub mod chat;
pub mod context;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod language;
pub mod media;
pub mod persistence;
pub mod router;
pub mod speech;
pub mod suggestions;
pub mod validation;

pub use aggregator::{StreamUpdate, aggregate};
pub use chat::{ChatSession, SpeakOutcome, TranscriptOutcome};
pub use context::AppContext;
pub use conversation::{Author, ConversationStore, Turn, TurnPatch, TurnStatus};
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use handle::ChatHandle;
pub use language::{Language, SUPPORTED_LANGUAGES};
pub use media::{AudioPlayer, MediaSlot, Playback};
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use router::{ResponseMode, Toggle, Toggles, select_mode};
