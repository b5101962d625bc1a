// src/analyze/emotion.rs
//! Emotion shares from a word → emotion lexicon (the eight basic emotions).
//!
//! Each document's lexicon hits are normalized into a distribution over emotions, the
//! distributions are summed over documents, and the sums are turned into percentages
//! over every detected emotion. Documents without any hit contribute nothing, so a
//! long song cannot outweigh a short one.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analyze::text::strip_token;
use crate::analyze::{prepare_documents, Document, TextOptions};
use crate::corpus::Corpus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionShare {
    pub emotion: String,
    /// Percentage of all detected emotion, in [0, 100].
    pub percentage: f64,
}

#[derive(Debug, Deserialize)]
struct EmotionEntry {
    emotion: String,
    words: Vec<String>,
}

#[derive(Debug)]
struct EmotionLexicon {
    /// Emotion names in lexicon order (tie order of the output).
    emotions: Vec<String>,
    /// word -> indices into `emotions`
    index: HashMap<String, Vec<usize>>,
}

static LEXICON: Lazy<EmotionLexicon> = Lazy::new(|| {
    let raw: Vec<EmotionEntry> = serde_json::from_str(include_str!("../../lexicon/emotions.json"))
        .expect("valid emotion lexicon");
    let mut emotions = Vec::with_capacity(raw.len());
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, entry) in raw.into_iter().enumerate() {
        for w in entry.words {
            let slot = index.entry(w.to_lowercase()).or_default();
            if !slot.contains(&i) {
                slot.push(i);
            }
        }
        emotions.push(entry.emotion);
    }
    EmotionLexicon { emotions, index }
});

/// Emotion distribution of one text; `None` when no lexicon word occurs.
fn distribution(text: &str) -> Option<Vec<f64>> {
    let mut hits = vec![0usize; LEXICON.emotions.len()];
    let mut total = 0usize;
    for tok in text.split_whitespace().filter_map(strip_token) {
        if let Some(ids) = LEXICON.index.get(&tok.to_lowercase()) {
            for &i in ids {
                hits[i] += 1;
                total += 1;
            }
        }
    }
    if total == 0 {
        return None;
    }
    Some(hits.into_iter().map(|h| h as f64 / total as f64).collect())
}

/// Top emotions of a slice by share of detected emotion.
pub fn top_emotions(slice: &Corpus, top_n: usize, opts: &TextOptions) -> Vec<EmotionShare> {
    let docs = prepare_documents(slice, opts, "emotion");
    emotions_in(&docs.docs, top_n)
}

pub(crate) fn emotions_in(docs: &[Document<'_>], top_n: usize) -> Vec<EmotionShare> {
    let mut sums = vec![0.0f64; LEXICON.emotions.len()];
    for doc in docs {
        if let Some(dist) = distribution(&doc.text) {
            for (s, d) in sums.iter_mut().zip(dist) {
                *s += d;
            }
        }
    }
    let grand: f64 = sums.iter().sum();
    if grand <= 0.0 {
        return Vec::new();
    }

    let mut rows: Vec<(usize, f64)> = sums
        .into_iter()
        .enumerate()
        .filter(|(_, s)| *s > 0.0)
        .map(|(i, s)| (i, s / grand * 100.0))
        .collect();
    // stable sort: equal shares keep lexicon order
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows.into_iter()
        .take(top_n)
        .map(|(i, percentage)| EmotionShare {
            emotion: LEXICON.emotions[i].clone(),
            percentage,
        })
        .collect()
}
