//! Follow-up suggestion extraction

use kisan_ai::prompts::SUGGESTION_MARKER;

/// Text with trailing suggestion lines split out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub suggestions: Vec<String>,
}

/// Split trailing `>> ` lines off `text`.
///
/// Blank lines inside the trailing block are skipped. When no marker line is
/// found the text is returned untouched; otherwise the remainder is trimmed.
pub fn extract_suggestions(text: &str) -> Extracted {
    let lines: Vec<&str> = text.lines().collect();
    let mut suggestions = Vec::new();
    let mut keep = lines.len();

    while keep > 0 {
        let line = lines[keep - 1];
        if line.trim().is_empty() {
            keep -= 1;
            continue;
        }
        match marker_content(line) {
            Some(suggestion) => {
                suggestions.push(suggestion.to_string());
                keep -= 1;
            }
            None => break,
        }
    }

    if suggestions.is_empty() {
        return Extracted {
            text: text.to_string(),
            suggestions,
        };
    }

    suggestions.reverse();
    Extracted {
        text: lines[..keep].join("\n").trim().to_string(),
        suggestions,
    }
}

fn marker_content(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(SUGGESTION_MARKER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
