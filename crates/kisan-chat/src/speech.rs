//! Text preparation for speech synthesis

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Google TTS rejects inputs above this many bytes
pub const MAX_SPEECH_BYTES: usize = 5000;

/// Sentence terminators, including the Devanagari danda
const SENTENCE_ENDS: &[char] = &['.', '!', '?', '।'];

/// Strip markdown so the synthesizer reads prose, not syntax.
///
/// Link and emphasis text is kept, URLs and images are dropped, and every
/// block element ends up on its own line.
pub fn clean_for_speech(text: &str) -> String {
    let mut out = String::new();
    let mut image_depth = 0usize;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            Event::Start(Tag::Item) | Event::Start(Tag::Heading { .. }) => newline(&mut out),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => newline(&mut out),
            Event::Text(t) | Event::Code(t) if image_depth == 0 => out.push_str(&t),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak | Event::Rule => newline(&mut out),
            _ => {}
        }
    }

    out.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Cap `text` at `max_bytes`, preferring to cut after a sentence, then at a
/// word boundary, then anywhere on a char boundary. A sentence cut must keep
/// at least half of the allowed bytes.
pub fn truncate_for_speech(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];

    let sentence_end = head
        .char_indices()
        .rev()
        .find(|(_, c)| SENTENCE_ENDS.contains(c))
        .map(|(i, c)| i + c.len_utf8());
    if let Some(cut) = sentence_end.filter(|&cut| cut >= end / 2) {
        return &head[..cut];
    }
    if let Some(i) = head.rfind(char::is_whitespace) {
        if i > 0 {
            return head[..i].trim_end();
        }
    }
    head
}

/// Full preparation: clean, then cap
pub fn prepare_for_speech(text: &str) -> String {
    let cleaned = clean_for_speech(text);
    truncate_for_speech(&cleaned, MAX_SPEECH_BYTES).to_string()
}
