// src/analyze/pos.rs
//! Rule-based part-of-speech tagger (Universal tag set).
//!
//! Order of rules: numerals, closed-class lexicon, capitalization (mid-line proper
//! nouns), a small open-class lexicon, context (word after a pronoun/auxiliary reads
//! as a verb), suffixes, and finally NOUN.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::analyze::text::raw_token_lines;
use crate::analyze::{prepare_documents, Document, TextOptions};
use crate::corpus::Corpus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Noun,
    Propn,
    Verb,
    Aux,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Conj,
    Part,
    Intj,
    Num,
}

impl PosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::Propn => "PROPN",
            PosTag::Verb => "VERB",
            PosTag::Aux => "AUX",
            PosTag::Adj => "ADJ",
            PosTag::Adv => "ADV",
            PosTag::Pron => "PRON",
            PosTag::Det => "DET",
            PosTag::Adp => "ADP",
            PosTag::Conj => "CONJ",
            PosTag::Part => "PART",
            PosTag::Intj => "INTJ",
            PosTag::Num => "NUM",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CLOSED_CLASS: Lazy<HashMap<&'static str, PosTag>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let groups: &[(PosTag, &[&str])] = &[
        (
            PosTag::Pron,
            &[
                "i", "me", "you", "he", "she", "it", "we", "they", "him", "her", "us", "them",
                "my", "your", "his", "its", "our", "their", "mine", "yours", "myself",
                "yourself", "who", "whom", "somebody", "nobody", "everybody", "someone",
                "anyone", "everyone", "nothing", "something", "everything", "anything",
                "i'm", "you're", "we're", "they're", "it's", "i'll", "you'll", "i've", "i'd",
                "she's", "he's", "ya", "y'all",
            ],
        ),
        (
            PosTag::Det,
            &[
                "the", "a", "an", "this", "that", "these", "those", "every", "each", "some",
                "any", "all", "another", "no",
            ],
        ),
        (
            PosTag::Adp,
            &[
                "in", "on", "at", "by", "for", "with", "from", "to", "of", "into", "over",
                "under", "through", "about", "across", "behind", "beyond", "inside",
                "outside", "around", "between", "without", "till", "until", "after",
                "before", "like", "upon", "near", "against", "along",
            ],
        ),
        (
            PosTag::Conj,
            &[
                "and", "or", "but", "nor", "yet", "because", "cause", "if", "when", "while",
                "though", "although", "than", "whether", "unless", "since", "so",
            ],
        ),
        (
            PosTag::Aux,
            &[
                "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
                "do", "does", "did", "will", "would", "shall", "should", "can", "could", "may",
                "might", "must", "gonna", "wanna", "gotta", "can't", "won't", "don't",
                "ain't", "isn't", "wasn't", "aren't", "didn't", "doesn't", "couldn't",
                "wouldn't", "shouldn't", "cannot",
            ],
        ),
        (PosTag::Part, &["not", "up", "out", "off", "away"]),
        (
            PosTag::Intj,
            &[
                "oh", "ooh", "yeah", "hey", "whoa", "woah", "la", "na", "uh", "ah", "ha",
                "mmm", "yo", "wow", "hallelujah", "alright",
            ],
        ),
        (
            PosTag::Adv,
            &[
                "never", "always", "now", "then", "here", "there", "again", "still", "just",
                "only", "very", "really", "too", "ever", "forever", "soon", "maybe", "once",
                "tonight", "today", "tomorrow", "yesterday", "home", "where", "how", "why",
                "what", "back", "down",
            ],
        ),
    ];
    for (tag, words) in groups {
        for w in *words {
            m.insert(*w, *tag);
        }
    }
    m
});

static OPEN_CLASS: Lazy<HashMap<&'static str, PosTag>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for w in [
        "good", "bad", "new", "old", "young", "little", "big", "long", "high", "low", "cold",
        "hot", "sweet", "sad", "happy", "lonely", "wild", "free", "blue", "black", "white",
        "red", "dark", "bright", "beautiful", "true", "real", "wrong", "crazy", "alone",
        "alive", "dead", "strong", "slow", "fast", "easy", "hard", "last", "only", "lost",
        "broken", "golden",
    ] {
        m.insert(w, PosTag::Adj);
    }
    for w in [
        "go", "come", "know", "see", "say", "get", "make", "take", "give", "feel", "want",
        "need", "let", "run", "fly", "cry", "die", "live", "believe", "hold", "tell", "think",
        "find", "leave", "stay", "rock", "roll", "dance", "sing", "play", "walk", "talk",
        "fall", "burn", "touch", "kiss", "hear", "break", "shine", "stand", "wait", "turn",
        "keep", "call", "look", "try", "said", "came", "went", "got", "made", "took", "gave",
    ] {
        m.insert(w, PosTag::Verb);
    }
    m
});

/// Tag one case-preserved token. `prev` is the tag of the previous token on the same
/// line; `line_start` marks the first token of a line.
pub fn tag_token(token: &str, prev: Option<PosTag>, line_start: bool) -> PosTag {
    let lower = token.to_lowercase();
    let w = lower.as_str();

    if w.chars().all(|c| c.is_ascii_digit())
        || matches!(
            w,
            "one" | "two" | "three" | "four" | "five" | "six" | "seven" | "eight" | "nine"
                | "ten" | "hundred" | "thousand" | "million"
        )
    {
        return PosTag::Num;
    }
    if let Some(tag) = CLOSED_CLASS.get(w) {
        return *tag;
    }
    let capitalized = token.chars().next().is_some_and(char::is_uppercase);
    if capitalized && !line_start {
        return PosTag::Propn;
    }
    if matches!(prev, Some(PosTag::Pron) | Some(PosTag::Aux) | Some(PosTag::Part)) {
        if let Some(PosTag::Verb) | None = OPEN_CLASS.get(w) {
            if !w.ends_with("ly") {
                return PosTag::Verb;
            }
        }
    }
    if let Some(tag) = OPEN_CLASS.get(w) {
        return *tag;
    }
    if w.ends_with("n't") {
        return PosTag::Aux;
    }
    if w.len() > 4 && w.ends_with("ly") {
        return PosTag::Adv;
    }
    if w.len() > 4 && (w.ends_with("ing") || w.ends_with("in'") || w.ends_with("ed")) {
        return PosTag::Verb;
    }
    const NOUN_SUFFIXES: &[&str] = &["ness", "tion", "sion", "ment", "ity", "ship", "hood", "ism"];
    if w.len() > 5 && NOUN_SUFFIXES.iter().any(|s| w.ends_with(s)) {
        return PosTag::Noun;
    }
    const ADJ_SUFFIXES: &[&str] = &["ful", "ous", "ive", "able", "ible", "less", "ish", "est"];
    if w.len() > 5 && ADJ_SUFFIXES.iter().any(|s| w.ends_with(s)) {
        return PosTag::Adj;
    }
    PosTag::Noun
}

/// Tag counts over a slice, most frequent first; ties keep first appearance.
pub fn part_of_speech_distribution(slice: &Corpus, top_n: usize, opts: &TextOptions) -> Vec<(PosTag, usize)> {
    let docs = prepare_documents(slice, opts, "pos");
    pos_distribution_in(&docs.docs, top_n)
}

pub(crate) fn pos_distribution_in(docs: &[Document<'_>], top_n: usize) -> Vec<(PosTag, usize)> {
    let mut counts: HashMap<PosTag, (usize, usize)> = HashMap::new();
    let mut seen = 0usize;
    for doc in docs {
        for line in raw_token_lines(&doc.text) {
            let mut prev = None;
            for (i, tok) in line.iter().enumerate() {
                let tag = tag_token(tok, prev, i == 0);
                let entry = counts.entry(tag).or_insert((0, seen));
                entry.0 += 1;
                seen += 1;
                prev = Some(tag);
            }
        }
    }
    let mut rows: Vec<(PosTag, usize, usize)> =
        counts.into_iter().map(|(t, (c, first))| (t, c, first)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    rows.into_iter().take(top_n).map(|(t, c, _)| (t, c)).collect()
}
