//! kisan-ai: provider adapters for the KisanSaathi assistant
//!
//! Each upstream capability (text generation, image analysis, search-augmented
//! generation, deep reasoning, speech synthesis and transcription) is exposed as
//! a trait in [`providers`], with one adapter per hosted service. All of them
//! converge on [`UpstreamResponse`] so the chat core never branches on
//! provider-specific payloads.

pub mod error;
pub mod prompts;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use stream::{FragmentStream, ReasoningAnswer, SearchAnswer, UpstreamResponse};
pub use types::*;
