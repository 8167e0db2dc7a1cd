//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for kisan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default reply language code (e.g. "hi-IN")
    pub language: Option<String>,
    /// Command used to play synthesized MP3 audio; the file path is appended
    pub audio_player: Option<String>,
    /// Directory for the saved conversation and audio files
    pub data_dir: Option<String>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub groq: Option<String>,
    pub gemini: Option<String>,
    pub perplexity: Option<String>,
    pub google_cloud: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kisan")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("KISAN_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Write the example config if no config file exists yet
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }

    /// Directory holding the saved conversation and speech files
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("kisan"),
        }
    }

    /// The audio player command split into program and arguments
    pub fn audio_player_command(&self) -> Vec<String> {
        let command = self
            .audio_player
            .as_deref()
            .unwrap_or(DEFAULT_AUDIO_PLAYER);
        command.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(target_os = "macos")]
const DEFAULT_AUDIO_PLAYER: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const DEFAULT_AUDIO_PLAYER: &str = "mpg123 -q";

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# kisan configuration file
# Place at ~/.config/kisan/config.toml (Linux/Mac) or %APPDATA%\kisan\config.toml (Windows)

# Reply language: en-US, hi-IN, ta-IN, te-IN, kn-IN, ml-IN, mr-IN, gu-IN
language = "en-US"

# Command that plays an MP3 file (the file path is appended)
# audio_player = "mpg123 -q"

# Where the current conversation is kept while kisan runs
# data_dir = "~/.local/share/kisan"

# API keys (optional - can also use environment variables)
# GROQ_API_KEY, GEMINI_API_KEY, PERPLEXITY_API_KEY, GOOGLE_CLOUD_API_KEY
[api_keys]
# groq = "gsk_..."
# gemini = "..."
# perplexity = "pplx-..."
# google_cloud = "..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.language.as_deref(), Some("en-US"));
        assert!(config.api_keys.groq.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
audio_player = "mpv --no-video"

[api_keys]
perplexity = "pplx-test"
"#,
        )
        .unwrap();
        assert!(config.language.is_none());
        assert_eq!(config.api_keys.perplexity.as_deref(), Some("pplx-test"));
        assert_eq!(config.audio_player_command(), vec!["mpv", "--no-video"]);
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some("/tmp/kisan-data".into()),
            ..Default::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/kisan-data"));
    }
}
