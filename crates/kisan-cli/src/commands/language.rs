//! /lang command - show and set the reply language

use super::CommandResult;
use kisan_chat::{Language, SUPPORTED_LANGUAGES, language::find_language};

pub struct LanguageCommand;

impl LanguageCommand {
    pub fn execute(args: &str, current: &Language) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(show_languages(current));
        }
        match resolve(args) {
            Some(language) => CommandResult::SetLanguage(language.code.to_string()),
            None => CommandResult::Message(format!(
                "Unknown language: '{}'\nType /lang to see the choices",
                args
            )),
        }
    }
}

/// Accept a full code ("ta-IN"), its prefix ("ta") or the English name
fn resolve(input: &str) -> Option<&'static Language> {
    find_language(input).or_else(|| {
        SUPPORTED_LANGUAGES.iter().find(|l| {
            l.name.eq_ignore_ascii_case(input)
                || l.code
                    .split('-')
                    .next()
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(input))
        })
    })
}

fn show_languages(current: &Language) -> String {
    let mut output = String::from("Languages:\n\n");
    for language in SUPPORTED_LANGUAGES {
        let marker = if language.code == current.code { " *" } else { "" };
        output.push_str(&format!(
            "  {:<7} {:<10} {}{}\n",
            language.code, language.name, language.native_name, marker
        ));
    }
    output.push_str("\nSwitching language starts a new conversation.\nSet with: /lang <code>");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use kisan_chat::language::language_or_default;

    #[test]
    fn test_resolve_forms() {
        assert_eq!(resolve("ta-IN").map(|l| l.code), Some("ta-IN"));
        assert_eq!(resolve("ml").map(|l| l.code), Some("ml-IN"));
        assert_eq!(resolve("marathi").map(|l| l.code), Some("mr-IN"));
        assert!(resolve("fr").is_none());
    }

    #[test]
    fn test_list_marks_current() {
        let current = language_or_default("kn-IN");
        match LanguageCommand::execute("", current) {
            CommandResult::Message(text) => {
                assert!(text.contains("kn-IN"));
                assert!(text.lines().any(|l| l.contains("Kannada") && l.ends_with('*')));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
