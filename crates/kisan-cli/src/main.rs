//! kisan - multilingual farming assistant in the terminal

mod commands;
mod config;
mod player;
mod providers;
mod utils;

use clap::Parser;
use kisan_chat::{
    ChatEvent, ChatSession, FileStore, SpeakOutcome, Toggle, TranscriptOutcome, Turn,
    language::language_or_default, validation::image_mime_type,
};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// kisan - KisanSaathi farming assistant
#[derive(Parser, Debug)]
#[command(name = "kisan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in non-interactive mode with a single question
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Reply language code (e.g. hi-IN)
    #[arg(short, long)]
    language: Option<String>,

    /// Answer with live web search
    #[arg(long)]
    search: bool,

    /// Answer with deep reasoning (wins over --search)
    #[arg(long)]
    think: bool,

    /// Attach an image to the first question
    #[arg(long)]
    image: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("kisan=debug,kisan_ai=debug,kisan_chat=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // CLI takes precedence over config
    let language = args
        .language
        .or(cfg.language.clone())
        .unwrap_or_else(|| kisan_chat::language::DEFAULT_LANGUAGE.to_string());

    let data_dir = cfg.data_dir();
    let store = Arc::new(FileStore::open(&data_dir)?);
    let player = Arc::new(player::CommandPlayer::new(
        cfg.audio_player_command(),
        data_dir.clone(),
    ));
    let (context, missing) = providers::build_context(&cfg, store, player);

    if missing.contains(&"GROQ_API_KEY") {
        eprintln!("Error: No API key found for text answers");
        eprintln!();
        eprintln!("Set your API key with: export GROQ_API_KEY=your-key");
        eprintln!("Or add it to config file: kisan --init-config");
        std::process::exit(1);
    }
    for var in &missing {
        tracing::warn!("{} not set; features needing it are disabled", var);
    }

    let mut session = ChatSession::new(context, &language);
    if language_or_default(&language).code != language {
        eprintln!("Unknown language '{}', using English", language);
    }
    if args.think {
        session.set_toggle(Toggle::Reasoning, true);
    } else if args.search {
        session.set_toggle(Toggle::Search, true);
    }
    if let Some(ref path) = args.image {
        if attach_image(&mut session, Path::new(path)).is_err() {
            std::process::exit(1);
        }
    }

    let result = match args.command {
        Some(command) => run_command(&mut session, &command).await,
        None => run_interactive(&mut session).await,
    };

    // The saved conversation only lives as long as the session
    session.end();
    result
}

async fn run_command(session: &mut ChatSession, command: &str) -> anyhow::Result<()> {
    println!("kisan> {}", command);
    println!();

    match stream_submit(session, command).await {
        Ok(turn) => {
            print!("{}", utils::format_extras(&turn));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_interactive(session: &mut ChatSession) -> anyhow::Result<()> {
    let restored = session.restore();

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let language = session.language();
        eprintln!("KisanSaathi ({})", language.native_name);
        if restored > 0 {
            eprintln!("Restored {} messages. /clear to start over.", restored);
        } else {
            eprintln!("{}", language.welcome);
            eprintln!("Try: {}", language.starters.join(" | "));
        }
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("{}", prompt_label(session));
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if input.starts_with('/') {
            if let Some(result) = commands::execute_command(input, session) {
                if !handle_command(session, result).await {
                    break;
                }
                println!();
                continue;
            }
        }

        println!();
        if let Ok(turn) = stream_submit(session, input).await {
            print!("{}", utils::format_extras(&turn));
        }
        println!();
    }

    Ok(())
}

/// Run one slash command. Returns false when the REPL should exit.
async fn handle_command(session: &mut ChatSession, result: commands::CommandResult) -> bool {
    use commands::CommandResult;

    match result {
        CommandResult::Clear => {
            session.clear();
            println!("Cleared conversation.");
        }
        CommandResult::Exit => return false,
        CommandResult::Message(msg) => println!("{}", msg),
        CommandResult::Unknown(cmd) => {
            println!("Unknown command: /{}", cmd);
            println!("Type /help for available commands.");
        }
        CommandResult::SetLanguage(code) => match session.set_language(&code) {
            Ok(language) => {
                println!("Answering in {} ({}).", language.name, language.native_name);
                println!("{}", language.welcome);
            }
            Err(e) => println!("{}", e),
        },
        CommandResult::ToggleSearch => {
            let on = session.flip_toggle(Toggle::Search);
            println!("Web search {}.", if on { "on (reasoning off)" } else { "off" });
        }
        CommandResult::ToggleReasoning => {
            let on = session.flip_toggle(Toggle::Reasoning);
            println!("Deep reasoning {}.", if on { "on (search off)" } else { "off" });
        }
        CommandResult::AttachImage(path) => {
            if attach_image(session, &path).is_ok() {
                println!("Attached {}. It goes with your next message.", path.display());
            }
        }
        CommandResult::Voice(path) => {
            let audio = match std::fs::read(&path) {
                Ok(audio) => audio,
                Err(e) => {
                    println!("Could not read {}: {}", path.display(), e);
                    return true;
                }
            };
            match session.transcribe(audio, "").await {
                Ok(TranscriptOutcome::Text(text)) => {
                    println!("You said: {}", text);
                    println!();
                    if let Ok(turn) = stream_submit(session, &text).await {
                        print!("{}", utils::format_extras(&turn));
                    }
                }
                Ok(TranscriptOutcome::NoSpeech) => println!("Could not detect any speech."),
                Err(e) => println!("Transcription failed: {}", e),
            }
        }
        CommandResult::Speak(index) => {
            let Some(turn_id) = answer_id(session.turns(), index) else {
                println!("No such answer. See /history.");
                return true;
            };
            match session.speak(&turn_id).await {
                Ok(SpeakOutcome::Started) => println!("Playing... (/speak again or /stop to stop)"),
                Ok(SpeakOutcome::Stopped) => println!("Stopped."),
                Err(e) => println!("Audio playback failed: {}", e),
            }
        }
        CommandResult::Stop => {
            session.stop_audio();
            println!("Stopped.");
        }
        CommandResult::History => println!("{}", utils::format_history(session.turns())),
    }
    true
}

/// Id of the n-th assistant answer (1-based), or the latest one
fn answer_id(turns: &[Turn], index: Option<usize>) -> Option<String> {
    let mut answers = turns
        .iter()
        .filter(|t| t.author == kisan_chat::Author::Assistant);
    let turn = match index {
        Some(n) => answers.nth(n.checked_sub(1)?),
        None => answers.last(),
    };
    turn.map(|t| t.id.clone())
}

fn prompt_label(session: &ChatSession) -> String {
    let toggles = session.toggles();
    let mode = if toggles.reasoning() {
        "think"
    } else if toggles.search() {
        "search"
    } else {
        ""
    };
    let image = if session.attached_image().is_some() { "+img" } else { "" };
    match (mode, image) {
        ("", "") => "> ".to_string(),
        _ => format!("[{}{}]> ", mode, image),
    }
}

fn attach_image(session: &mut ChatSession, path: &Path) -> Result<(), ()> {
    let name = path.to_string_lossy();
    let Some(mime_type) = image_mime_type(&name) else {
        eprintln!("Please select a valid image file.");
        return Err(());
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read image file: {}", e);
            return Err(());
        }
    };
    session.attach_image(&bytes, mime_type).map_err(|e| {
        eprintln!("{}", e);
    })
}

/// Submit and print the answer as it streams. Ctrl-C stops the answer.
async fn stream_submit(session: &mut ChatSession, text: &str) -> kisan_chat::Result<Turn> {
    let mut events = session.subscribe();
    let handle = session.handle();
    let mut printed = String::new();
    let mut aborted = false;

    let submit = session.submit(text);
    tokio::pin!(submit);

    let result = loop {
        tokio::select! {
            result = &mut submit => break result,
            event = events.recv() => {
                if let Ok(event) = event {
                    print_event(event, &mut printed);
                }
            }
            _ = tokio::signal::ctrl_c(), if !aborted => {
                aborted = true;
                handle.abort();
            }
        }
    };

    // Events sent after the last poll
    while let Ok(event) = events.try_recv() {
        print_event(event, &mut printed);
    }

    if let Err(ref e) = result {
        if !matches!(e, kisan_chat::Error::InvalidInput(_)) {
            eprintln!("Error: {}", e);
        }
    }
    result
}

fn print_event(event: ChatEvent, printed: &mut String) {
    match event {
        ChatEvent::TurnUpdate { text, .. } => {
            if let Some(new_text) = text.strip_prefix(printed.as_str()) {
                print!("{}", new_text);
                io::stdout().flush().ok();
                *printed = text;
            }
        }
        ChatEvent::TurnEnd { turn } => {
            print!("{}", final_output(printed, utils::display_text(&turn)));
            println!();
            printed.clear();
        }
        ChatEvent::Error { message } => eprintln!("\n! {}", message),
        _ => {}
    }
}

/// What to print once an answer is final, given the partial text already shown
fn final_output(printed: &str, display: &str) -> String {
    if let Some(rest) = display.strip_prefix(printed) {
        // Search and reasoning answers arrive whole
        rest.to_string()
    } else if printed.starts_with(display) {
        // Only suggestion lines were stripped
        String::new()
    } else {
        // Failure message or sentinel replaces what streamed
        format!("\n{}", display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_id() {
        let turns = vec![
            Turn::user("q1", None),
            Turn::assistant_placeholder(),
            Turn::user("q2", None),
            Turn::assistant_placeholder(),
        ];
        assert_eq!(answer_id(&turns, None), Some(turns[3].id.clone()));
        assert_eq!(answer_id(&turns, Some(1)), Some(turns[1].id.clone()));
        assert_eq!(answer_id(&turns, Some(3)), None);
        assert_eq!(answer_id(&[], None), None);
    }

    #[test]
    fn test_final_output() {
        assert_eq!(final_output("", "Sow in June."), "Sow in June.");
        assert_eq!(final_output("Sow in", "Sow in June."), " June.");
        assert_eq!(final_output("Millet.\n>> How much water?", "Millet."), "");
        assert_eq!(
            final_output("Half an ans", kisan_chat::conversation::FAILURE_MESSAGE),
            format!("\n{}", kisan_chat::conversation::FAILURE_MESSAGE)
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["kisan", "-l", "hi-IN", "--think", "-c", "When to sow wheat?"]);
        assert_eq!(args.language.as_deref(), Some("hi-IN"));
        assert!(args.think);
        assert_eq!(args.command.as_deref(), Some("When to sow wheat?"));
    }
}
