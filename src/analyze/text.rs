// src/analyze/text.rs
//! Sanitization and tokenization shared by every text-analytic component.
//!
//! Two token views exist:
//! - `raw_tokens`: whitespace split, punctuation stripped, case preserved (POS, NER).
//! - `content_tokens`: `raw_tokens` lowercased, minus short tokens and stopwords
//!   (frequency tables, collocations, topics).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::warn;

use crate::error::{AnalysisError, Result};

/// Function words, contractions and filler words. Stored with straight apostrophes;
/// tokens are folded to straight apostrophes before lookup.
const STOPWORDS: &[&str] = &[
    "the", "and", "is", "in", "it", "of", "to", "on", "that", "this", "for", "with", "as",
    "was", "at", "by", "from", "which", "an", "be", "or", "are", "but", "if", "then", "so",
    "such", "there", "has", "have", "had", "a", "he", "she", "they", "we", "you", "your",
    "our", "my", "their", "its", "out", "not", "well", "don't", "where", "never", "you're",
    "gonna", "going", "could", "about", "can't", "yeah", "right", "every", "little",
    "ain't", "i'm", "it's", "i'll", "i've", "i'd", "you'll", "you've", "we're", "they're",
    "won't", "didn't", "doesn't", "isn't", "wasn't", "couldn't", "wouldn't", "shouldn't",
    "that's", "there's", "what's", "let's", "she's", "he's", "gotta", "wanna", "oh", "ooh",
    "whoa", "hey", "la", "na", "uh", "huh", "just", "like", "know", "when", "what", "will",
    "would", "should", "them", "they", "these", "those", "than", "into", "some", "been",
    "were", "here", "said", "come", "came", "back", "over", "down", "only", "more", "much",
    "very", "also", "again", "still", "because", "while", "through", "before", "after",
    "cause", "'cause", "cuz", "till", "until", "each", "make", "made", "want", "take",
    "gets", "goes", "ever", "even", "what", "who", "whom", "how", "why", "all", "any",
    "both", "being", "does", "done", "doing", "upon", "yours", "mine", "ours", "theirs",
    "myself", "yourself", "nothing", "something", "anything", "everything", "thing",
    "things", "really", "maybe", "okay",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

/// `[Chorus]`, `[Verse 2: Freddie]` and similar section markers.
static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]\n]{0,64}\]").expect("section marker regex"));

pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Clean one lyric before analysis.
///
/// Decodes HTML entities, removes section markers, and replaces emoji, symbols and
/// control characters with spaces. Fails only when the text cannot be analyzed at
/// all (oversized, NUL bytes, mostly undecodable characters).
pub fn sanitize(text: &str, max_bytes: usize) -> Result<String> {
    if text.len() > max_bytes {
        return Err(AnalysisError::malformed(format!(
            "lyrics exceed {max_bytes} bytes ({} bytes)",
            text.len()
        )));
    }
    if text.contains('\0') {
        return Err(AnalysisError::malformed("lyrics contain NUL bytes"));
    }
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    let replacement = text.chars().filter(|c| *c == '\u{FFFD}').count();
    if replacement > 0 && replacement * 10 > visible {
        return Err(AnalysisError::malformed(format!(
            "{replacement} undecodable characters out of {visible}"
        )));
    }

    let decoded = html_escape::decode_html_entities(text);
    let unmarked = SECTION_MARKER.replace_all(&decoded, " ");

    let mut out = String::with_capacity(unmarked.len());
    for ch in unmarked.chars() {
        let mapped = match ch {
            '\n' => '\n',
            '\u{2018}' | '\u{2019}' | '`' => '\'',
            c if c.is_whitespace() => ' ',
            c if c.is_alphanumeric() => c,
            '\'' | '-' | ',' | '.' | '!' | '?' | ';' | ':' | '"' | '(' | ')' | '&' => ch,
            _ => ' ',
        };
        out.push(mapped);
    }
    Ok(out)
}

/// Strip punctuation from one whitespace-delimited word, keeping inner apostrophes.
/// Returns `None` when nothing alphanumeric is left.
pub fn strip_token(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '`' => '\'',
            other => other,
        })
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .collect();
    let trimmed = kept.trim_matches('\'');
    if trimmed.chars().any(char::is_alphanumeric) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Case-preserving tokens, one `Vec` per line (line starts matter to the NER and POS
/// heuristics).
pub fn raw_token_lines(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.split_whitespace().filter_map(strip_token).collect::<Vec<_>>())
        .filter(|toks| !toks.is_empty())
        .collect()
}

/// Lowercased tokens, at least `min_len` chars, no stopwords.
pub fn content_tokens(text: &str, min_len: usize) -> Vec<String> {
    text.split_whitespace()
        .filter_map(strip_token)
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= min_len && !is_stopword(t))
        .collect()
}

/// Short anonymized id for log lines; raw lyrics are never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    crate::corpus::to_hex(&digest[..6])
}

/// Log + count a skipped document.
pub(crate) fn note_malformed(component: &'static str, title: &str, err: &AnalysisError) {
    metrics::counter!("lyrics_malformed_documents_total", "component" => component).increment(1);
    warn!(
        target: "analyze",
        component,
        id = %anon_hash(title),
        error = %err,
        "skipping malformed lyrics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_token_keeps_inner_apostrophes() {
        assert_eq!(strip_token("Don't,").as_deref(), Some("Don't"));
        assert_eq!(strip_token("'cause").as_deref(), Some("cause"));
        assert_eq!(strip_token("love!!!").as_deref(), Some("love"));
        assert_eq!(strip_token("ain\u{2019}t").as_deref(), Some("ain't"));
        assert_eq!(strip_token("...").as_deref(), None);
    }

    #[test]
    fn content_tokens_filters_short_and_stopwords() {
        let toks = content_tokens("Love, LOVE me do! Yeah, you're gonna love tonight", 4);
        assert_eq!(toks, vec!["love", "love", "love", "tonight"]);
    }

    #[test]
    fn sanitize_strips_emoji_and_entities() {
        let s = sanitize("Rock &amp; roll \u{1F3B8}\u{1F525} [Chorus]\nWe\u{2019}re here", 1000).unwrap();
        assert!(s.contains("Rock & roll"));
        assert!(!s.contains("Chorus"));
        assert!(s.contains("We're here"));
        assert!(!s.contains('\u{1F3B8}'));
    }

    #[test]
    fn sanitize_rejects_binary_noise() {
        assert!(sanitize("abc\0def", 1000).is_err());
        assert!(sanitize("\u{FFFD}\u{FFFD}\u{FFFD} a", 1000).is_err());
        assert!(sanitize(&"x".repeat(50), 10).is_err());
    }

    #[test]
    fn raw_lines_drop_empty_lines() {
        let lines = raw_token_lines("Hello Mary\n\n  \nGoodbye, Tokyo!");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], vec!["Goodbye", "Tokyo"]);
    }
}
