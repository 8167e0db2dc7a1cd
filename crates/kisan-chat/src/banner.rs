//! Transient error banner

use std::time::Duration;
use tokio::time::Instant;

/// How long a banner stays up unless dismissed
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(4);

/// A single transient error message. Showing a new one replaces the old.
#[derive(Debug, Default)]
pub struct ErrorBanner {
    current: Option<(String, Instant)>,
}

impl ErrorBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.current = Some((message.into(), Instant::now()));
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// The visible message, if any and not yet expired
    pub fn message(&self) -> Option<&str> {
        match &self.current {
            Some((message, shown_at)) if shown_at.elapsed() < BANNER_TIMEOUT => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}
