// src/sentiment.rs
//! # Sentiment Scorer
//! Lexicon polarity model over free text, plus idempotent corpus annotation.
//!
//! Scoring: every token found in the polarity lexicon contributes its polarity,
//! multiplied by a preceding intensifier ("very", "so", …). A negator within the
//! previous three tokens flips and halves the contribution. The song score is the
//! mean contribution, clamped to [-1, 1]; text without lexicon hits scores 0.0.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::analyze::text::{note_malformed, sanitize, strip_token};
use crate::cache::{AnalysisCache, CacheKey};
use crate::corpus::{Corpus, SongRecord};

/// Bumped whenever the lexicon or the scoring rules change.
pub const SENTIMENT_MODEL_VERSION: &str = "lexicon-v1";

pub const POSITIVE_THRESHOLD: f64 = 0.2;
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

#[derive(Debug, Deserialize)]
struct SentimentLexicon {
    polarity: HashMap<String, f64>,
    #[serde(default)]
    intensifiers: HashMap<String, f64>,
}

static LEXICON: Lazy<SentimentLexicon> = Lazy::new(|| {
    let raw = include_str!("../lexicon/sentiment.json");
    serde_json::from_str::<SentimentLexicon>(raw).expect("valid sentiment lexicon")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// > 0.2 Positive, < -0.2 Negative, otherwise Neutral.
pub fn label_sentiment(score: f64) -> SentimentLabel {
    if score > POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if score < NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Polarity of `text` in [-1, 1]. Pure: same text, same model version, same score.
pub fn score_sentiment(text: &str) -> f64 {
    match sanitize(text, usize::MAX) {
        Ok(clean) => polarity_of(&clean),
        Err(_) => 0.0,
    }
}

fn polarity_of(clean: &str) -> f64 {
    let tokens: Vec<String> = clean
        .split_whitespace()
        .filter_map(strip_token)
        .map(|t| t.to_lowercase())
        .collect();

    let mut sum = 0.0f64;
    let mut hits = 0usize;
    for i in 0..tokens.len() {
        let Some(&base) = LEXICON.polarity.get(tokens[i].as_str()) else {
            continue;
        };
        let intensity = if i >= 1 {
            LEXICON
                .intensifiers
                .get(tokens[i - 1].as_str())
                .copied()
                .unwrap_or(1.0)
        } else {
            1.0
        };
        let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

        let mut v = (base * intensity).clamp(-1.0, 1.0);
        if negated {
            v *= -0.5;
        }
        sum += v;
        hits += 1;
    }

    if hits == 0 {
        return 0.0;
    }
    (sum / hits as f64).clamp(-1.0, 1.0)
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "don't"
            | "doesn't"
            | "didn't"
            | "ain't"
            | "nor"
    )
}

/// Annotates corpora with a `sentiment` column, at most once per distinct snapshot.
#[derive(Debug)]
pub struct SentimentScorer {
    max_lyrics_bytes: usize,
    columns: AnalysisCache<Vec<Option<f64>>>,
}

impl SentimentScorer {
    pub fn new(max_lyrics_bytes: usize, cache_capacity: usize) -> Self {
        Self {
            max_lyrics_bytes,
            columns: AnalysisCache::with_capacity("sentiment", cache_capacity),
        }
    }

    /// Score a single lyric; `MalformedText` when it fails sanitization.
    pub fn try_score(&self, text: &str) -> crate::error::Result<f64> {
        let clean = sanitize(text, self.max_lyrics_bytes)?;
        Ok(polarity_of(&clean))
    }

    /// Fill `sentiment` for every lyric-bearing record that lacks it.
    ///
    /// Presence wins: existing scores are never recomputed or changed, and a corpus
    /// that is already annotated is returned as-is. Records without lyrics, and
    /// records whose lyrics fail sanitization, stay unscored.
    pub fn annotate(&self, corpus: &Corpus) -> Corpus {
        if corpus.is_sentiment_annotated() {
            return corpus.clone();
        }
        let key = CacheKey::new(corpus.fingerprint(), &["sentiment", SENTIMENT_MODEL_VERSION]);
        let column = self
            .columns
            .get_or_insert_with(&key, || self.score_column(corpus));

        let records: Vec<SongRecord> = corpus
            .iter()
            .zip(column.iter())
            .map(|(r, s)| {
                let mut r = r.clone();
                if r.sentiment.is_none() {
                    r.sentiment = *s;
                }
                r
            })
            .collect();
        Corpus::from_validated(records)
    }

    /// Drop memoized columns derived from `snapshot`.
    pub fn invalidate(&self, snapshot: &str) -> usize {
        self.columns.invalidate_snapshot(snapshot)
    }

    fn score_column(&self, corpus: &Corpus) -> Vec<Option<f64>> {
        let mut scored = 0usize;
        let mut skipped = 0usize;
        let column = corpus
            .iter()
            .map(|r| {
                if r.sentiment.is_some() {
                    return r.sentiment;
                }
                let text = r.lyrics_text()?;
                match self.try_score(text) {
                    Ok(s) => {
                        scored += 1;
                        Some(s)
                    }
                    Err(e) => {
                        skipped += 1;
                        note_malformed("sentiment", &r.title, &e);
                        None
                    }
                }
            })
            .collect();
        metrics::counter!("lyrics_sentiment_scored_total").increment(scored as u64);
        info!(
            target: "sentiment",
            songs = corpus.len(),
            scored,
            skipped,
            model = SENTIMENT_MODEL_VERSION,
            "sentiment annotation complete"
        );
        column
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        let cfg = crate::config::AnalyticsConfig::default();
        Self::new(cfg.max_lyrics_bytes, cfg.cache_capacity)
    }
}
