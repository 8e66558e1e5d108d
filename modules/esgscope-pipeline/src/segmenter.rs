//! Sentence segmentation over extracted document text.
//!
//! Operates on one document at a time — documents are never concatenated
//! before splitting, so a sentence can never straddle two uploads.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse whitespace runs to single spaces, trim, and split into sentences.
/// A sentence ends at `.`, `!`, or `?` followed by whitespace; the terminal
/// punctuation stays attached to its sentence. Empty fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let collapsed = WHITESPACE_RE.replace_all(text.trim(), " ");
    if collapsed.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = collapsed.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_idx, ' ')) = chars.peek() {
                let part = collapsed[start..next_idx].trim();
                if !part.is_empty() {
                    sentences.push(part.to_string());
                }
                start = next_idx + 1;
            }
        }
    }
    let tail = collapsed[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
