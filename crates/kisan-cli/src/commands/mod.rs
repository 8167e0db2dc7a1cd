//! Slash commands for interactive mode

mod language;

pub use language::LanguageCommand;

use kisan_chat::ChatSession;
use std::path::PathBuf;

/// Result of executing a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Switch reply language
    SetLanguage(String),
    /// Flip web search on or off
    ToggleSearch,
    /// Flip deep reasoning on or off
    ToggleReasoning,
    /// Attach an image to the next message
    AttachImage(PathBuf),
    /// Transcribe a voice recording and send it
    Voice(PathBuf),
    /// Read an answer aloud (1-based among answers; latest if absent)
    Speak(Option<usize>),
    /// Stop audio playback
    Stop,
    /// Print the conversation
    History,
    /// Show a message to the user (not sent to the assistant)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &ChatSession) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "lang" | "language" | "l" => LanguageCommand::execute(args, session.language()),

        "search" | "s" => CommandResult::ToggleSearch,

        "think" | "t" => CommandResult::ToggleReasoning,

        "image" | "i" => match args {
            "" => CommandResult::Message("Usage: /image <path>".to_string()),
            path => CommandResult::AttachImage(PathBuf::from(path)),
        },

        "voice" | "v" => match args {
            "" => CommandResult::Message("Usage: /voice <path to .webm recording>".to_string()),
            path => CommandResult::Voice(PathBuf::from(path)),
        },

        "speak" | "say" => match args {
            "" => CommandResult::Speak(None),
            n => match n.parse::<usize>() {
                Ok(n) if n > 0 => CommandResult::Speak(Some(n)),
                _ => CommandResult::Message(format!("Not an answer number: '{}'", n)),
            },
        },

        "stop" => CommandResult::Stop,

        "history" => CommandResult::History,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?         Show this help message
  /lang, /l [code]      List languages or switch reply language
  /search, /s           Toggle web search (turns reasoning off)
  /think, /t            Toggle deep reasoning (turns search off)
  /image, /i <path>     Attach a crop photo to your next message
  /voice, /v <path>     Transcribe a .webm voice recording and send it
  /speak [n]            Read the latest (or n-th) answer aloud; again to stop
  /stop                 Stop audio playback
  /history              Show the conversation
  /clear, /c            Start a fresh conversation
  /quit, /exit, /q      Exit kisan

Press Ctrl-C while an answer is streaming to stop it.

Examples:
  /lang hi-IN           Answer in Hindi
  /image leaf.jpg       Then ask: "What disease is this?"
  /speak 2              Read the second answer aloud"#
        .to_string()
}
