//! Shared text normalization pipeline applied to every extracted transcript
use regex::Regex;
use std::sync::LazyLock;

/// Matches timestamp shapes like `0:05`, `12:34` and `1:02:03`
pub static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{0,2}:?\d{1,2}:\d{2}\b").expect("TIMESTAMP regex")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

/// Anything shorter is treated as noise rather than a real transcript
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

/// Sentences grouped into each output paragraph
pub const SENTENCES_PER_PARAGRAPH: usize = 5;

/// Remove every timestamp-shaped substring, then trim the ends.
///
/// Surrounding spaces are left in place; `clean_text` collapses them.
pub fn remove_timestamps(text: &str) -> String {
    TIMESTAMP.replace_all(text, "").trim().to_string()
}

/// Collapse runs of whitespace and newlines into single spaces
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Split text into sentences at whitespace that follows `.`, `!` or `?`.
///
/// Empty sentences are dropped. The terminating punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            sentences.push(&text[start..idx]);
            // Swallow the rest of the whitespace run
            let mut next_start = idx + ch.len_utf8();
            while let Some(&(next_idx, next_ch)) = chars.peek() {
                if !next_ch.is_whitespace() {
                    break;
                }
                next_start = next_idx + next_ch.len_utf8();
                chars.next();
            }
            start = next_start;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

/// Group sentences into paragraphs separated by a blank line
pub fn format_paragraphs(text: &str, sentences_per_paragraph: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return text.to_string();
    }

    sentences
        .chunks(sentences_per_paragraph.max(1))
        .map(|group| group.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run the full pipeline: timestamps out, whitespace collapsed, re-paragraphed.
///
/// Returns `None` when the result is too short to be a real transcript.
pub fn normalize(raw: &str) -> Option<String> {
    let cleaned = clean_text(&remove_timestamps(raw));
    let formatted = format_paragraphs(&cleaned, SENTENCES_PER_PARAGRAPH);

    if formatted.chars().count() < MIN_TRANSCRIPT_CHARS {
        return None;
    }

    Some(formatted)
}
