//! Audio playback through an external command

use kisan_ai::SynthesizedAudio;
use kisan_chat::{AudioPlayer, Error, Playback, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Writes audio to a file and hands it to a player program
pub struct CommandPlayer {
    command: Vec<String>,
    dir: PathBuf,
}

impl CommandPlayer {
    pub fn new(command: Vec<String>, dir: PathBuf) -> Self {
        Self { command, dir }
    }
}

struct ChildPlayback {
    child: Child,
}

impl Playback for ChildPlayback {
    fn stop(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!("player already exited: {}", e);
        }
        let _ = self.child.wait();
    }

    fn is_finished(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, audio: &SynthesizedAudio) -> Result<Box<dyn Playback>> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(Error::Media("no audio player configured".to_string()));
        };

        let extension = if audio.mime_type == "audio/mpeg" { "mp3" } else { "audio" };
        let path = self.dir.join(format!("speech.{}", extension));
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&path, &audio.data))
            .map_err(|e| Error::Media(format!("could not write {}: {}", path.display(), e)))?;

        tracing::debug!(player = %program, path = %path.display(), "starting playback");
        let child = Command::new(program)
            .args(args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Media(format!("could not start '{}': {}", program, e)))?;

        Ok(Box::new(ChildPlayback { child }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> SynthesizedAudio {
        SynthesizedAudio {
            data: b"ID3".to_vec(),
            mime_type: "audio/mpeg".into(),
        }
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let player = CommandPlayer::new(Vec::new(), std::env::temp_dir());
        assert!(matches!(player.play(&audio()), Err(Error::Media(_))));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let player = CommandPlayer::new(
            vec!["kisan-no-such-player".into()],
            std::env::temp_dir().join("kisan-player-test"),
        );
        let err = player.play(&audio()).err().unwrap();
        assert!(err.to_string().contains("kisan-no-such-player"));
    }

    #[cfg(unix)]
    #[test]
    fn test_playback_stop() {
        let dir = std::env::temp_dir().join("kisan-player-stop");
        let player = CommandPlayer::new(vec!["sleep".into(), "5".into()], dir.clone());
        // `sleep 5 <path>` fails fast on most systems; either way stop must not hang
        let mut playback = player.play(&audio()).unwrap();
        playback.stop();
        assert!(playback.is_finished());
        assert!(dir.join("speech.mp3").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
