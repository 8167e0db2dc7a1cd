//! Shared utilities

use kisan_ai::prompts::NOT_AGRICULTURAL_IMAGE;
use kisan_chat::{Author, Turn};

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Text to print for an assistant answer
pub fn display_text(turn: &Turn) -> &str {
    if turn.author == Author::Assistant && turn.text.trim() == NOT_AGRICULTURAL_IMAGE {
        "That image does not look like a crop, plant, soil or pest. Please share a farming photo."
    } else {
        &turn.text
    }
}

/// Reasoning, sources and follow-ups printed under a finished answer
pub fn format_extras(turn: &Turn) -> String {
    let mut out = String::new();

    if let Some(trace) = turn.reasoning_trace.as_deref() {
        out.push_str(&format!(
            "\n[Reasoning: {}]\n",
            truncate_chars(&trace.replace('\n', " "), 200)
        ));
    }

    if !turn.citations.is_empty() {
        out.push_str("\nSources:\n");
        for (i, citation) in turn.citations.iter().enumerate() {
            let title = if citation.title.is_empty() {
                citation.url.as_str()
            } else {
                citation.title.as_str()
            };
            out.push_str(&format!("  [{}] {}", i + 1, title));
            if let Some(date) = &citation.date {
                out.push_str(&format!(" ({})", date));
            }
            out.push_str(&format!("\n      {}\n", citation.url));
        }
    }

    if !turn.suggestions.is_empty() {
        out.push_str("\nYou could ask:\n");
        for suggestion in &turn.suggestions {
            out.push_str(&format!("  > {}\n", suggestion));
        }
    }

    out
}

/// One line per turn for /history
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "No messages yet.".to_string();
    }
    let mut answer = 0;
    turns
        .iter()
        .map(|turn| {
            let time = chrono::DateTime::from_timestamp_millis(turn.created_at)
                .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
                .unwrap_or_default();
            let label = match turn.author {
                Author::User => "you".to_string(),
                Author::Assistant => {
                    answer += 1;
                    format!("#{}", answer)
                }
            };
            let image = if turn.image.is_some() { " [image]" } else { "" };
            format!(
                "  {} {:>4}{} {}",
                time,
                label,
                image,
                truncate_chars(&display_text(turn).replace('\n', " "), 70)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
