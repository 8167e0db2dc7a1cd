//! Single media slot shared by audio playback and microphone capture

use kisan_ai::SynthesizedAudio;

use crate::error::Result;

/// A running playback started by an [`AudioPlayer`]
pub trait Playback: Send {
    fn stop(&mut self);
    fn is_finished(&mut self) -> bool;
}

/// Plays synthesized audio on some output device
pub trait AudioPlayer: Send + Sync {
    fn play(&self, audio: &SynthesizedAudio) -> Result<Box<dyn Playback>>;
}

enum Holder {
    Idle,
    Playing {
        turn_id: String,
        handle: Box<dyn Playback>,
    },
    Capturing,
}

/// Owns at most one of {playback, capture}. A new request preempts the
/// current holder.
pub struct MediaSlot {
    holder: Holder,
}

impl Default for MediaSlot {
    fn default() -> Self {
        Self {
            holder: Holder::Idle,
        }
    }
}

impl MediaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn whose audio is currently playing
    pub fn playing_turn(&mut self) -> Option<&str> {
        let finished = match &mut self.holder {
            Holder::Playing { handle, .. } => handle.is_finished(),
            _ => false,
        };
        if finished {
            self.holder = Holder::Idle;
        }
        match &self.holder {
            Holder::Playing { turn_id, .. } => Some(turn_id),
            _ => None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.holder, Holder::Capturing)
    }

    /// Install a new playback, stopping whatever held the slot
    pub fn start_playback(&mut self, turn_id: impl Into<String>, handle: Box<dyn Playback>) {
        self.release();
        self.holder = Holder::Playing {
            turn_id: turn_id.into(),
            handle,
        };
    }

    /// Claim the slot for capture, stopping any playback
    pub fn start_capture(&mut self) {
        self.release();
        self.holder = Holder::Capturing;
    }

    /// End a capture. No effect if the slot was taken over meanwhile.
    pub fn finish_capture(&mut self) {
        if self.is_capturing() {
            self.holder = Holder::Idle;
        }
    }

    /// Stop playback and release capture
    pub fn release(&mut self) {
        match std::mem::replace(&mut self.holder, Holder::Idle) {
            Holder::Playing { turn_id, mut handle } => {
                tracing::debug!(turn = %turn_id, "stopping playback");
                handle.stop();
            }
            Holder::Capturing => tracing::debug!("releasing capture"),
            Holder::Idle => {}
        }
    }
}

impl Drop for MediaSlot {
    fn drop(&mut self) {
        self.release();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakePlayback;
    use super::*;
    use parking_lot::Mutex;
    use std::sync::{Arc, atomic::Ordering};

    #[test]
    fn test_playback_preempts_playback() {
        let stopped = Arc::new(Mutex::new(Vec::new()));
        let mut slot = MediaSlot::new();
        slot.start_playback("a", Box::new(FakePlayback::new(0, stopped.clone())));
        slot.start_playback("b", Box::new(FakePlayback::new(1, stopped.clone())));
        assert_eq!(*stopped.lock(), vec![0]);
        assert_eq!(slot.playing_turn(), Some("b"));
    }

    #[test]
    fn test_capture_stops_playback() {
        let stopped = Arc::new(Mutex::new(Vec::new()));
        let mut slot = MediaSlot::new();
        slot.start_playback("a", Box::new(FakePlayback::new(0, stopped.clone())));
        slot.start_capture();
        assert_eq!(*stopped.lock(), vec![0]);
        assert!(slot.is_capturing());
        assert_eq!(slot.playing_turn(), None);
    }

    #[test]
    fn test_playback_releases_capture() {
        let stopped = Arc::new(Mutex::new(Vec::new()));
        let mut slot = MediaSlot::new();
        slot.start_capture();
        slot.start_playback("a", Box::new(FakePlayback::new(0, stopped)));
        assert!(!slot.is_capturing());
        // A late finish_capture must not kill the playback
        slot.finish_capture();
        assert_eq!(slot.playing_turn(), Some("a"));
    }

    #[test]
    fn test_finished_playback_frees_slot() {
        let stopped = Arc::new(Mutex::new(Vec::new()));
        let playback = FakePlayback::new(0, stopped.clone());
        let finished = playback.finished.clone();
        let mut slot = MediaSlot::new();
        slot.start_playback("a", Box::new(playback));
        finished.store(true, Ordering::Release);
        assert_eq!(slot.playing_turn(), None);
        assert!(stopped.lock().is_empty());
    }

    #[test]
    fn test_drop_stops_playback() {
        let stopped = Arc::new(Mutex::new(Vec::new()));
        {
            let mut slot = MediaSlot::new();
            slot.start_playback("a", Box::new(FakePlayback::new(0, stopped.clone())));
        }
        assert_eq!(*stopped.lock(), vec![0]);
    }
}
