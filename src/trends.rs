// src/trends.rs
//! Time series over a corpus (or an artist slice).
//!
//! A year/decade with no contributing record is absent from the map, never zero:
//! sentiment means use scored songs only, lexical diversity uses lyric-bearing songs
//! only, and view sums use every song.

use std::collections::BTreeMap;

use crate::analyze::lexical::{frequent_words_in, WordFrequency};
use crate::analyze::{prepare_documents, TextOptions};
use crate::corpus::{Corpus, SongRecord};

fn mean_by<K, V>(corpus: &Corpus, key: K, value: V) -> BTreeMap<i64, f64>
where
    K: Fn(&SongRecord) -> i64,
    V: Fn(&SongRecord) -> Option<f64>,
{
    let mut acc: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for r in corpus.iter() {
        if let Some(v) = value(r) {
            let slot = acc.entry(key(r)).or_insert((0.0, 0));
            slot.0 += v;
            slot.1 += 1;
        }
    }
    acc.into_iter().map(|(k, (sum, n))| (k, sum / n as f64)).collect()
}

fn diversity(r: &SongRecord) -> Option<f64> {
    r.has_lyrics().then(|| r.lexical_diversity())
}

/// Mean sentiment per year. Unscored records are ignored; annotate first.
pub fn sentiment_by_year(corpus: &Corpus) -> BTreeMap<i64, f64> {
    mean_by(corpus, |r| r.year, |r| r.sentiment)
}

pub fn sentiment_by_decade(corpus: &Corpus) -> BTreeMap<i64, f64> {
    mean_by(corpus, SongRecord::decade, |r| r.sentiment)
}

pub fn lexical_diversity_by_year(corpus: &Corpus) -> BTreeMap<i64, f64> {
    mean_by(corpus, |r| r.year, diversity)
}

pub fn lexical_diversity_by_decade(corpus: &Corpus) -> BTreeMap<i64, f64> {
    mean_by(corpus, SongRecord::decade, diversity)
}

pub fn views_by_year(corpus: &Corpus) -> BTreeMap<i64, u64> {
    let mut out = BTreeMap::new();
    for r in corpus.iter() {
        *out.entry(r.year).or_insert(0u64) += r.views;
    }
    out
}

/// Frequency table of one decade's lyrics; empty when the decade has none.
pub fn word_frequencies_by_decade(
    corpus: &Corpus,
    decade: i64,
    top_n: usize,
    opts: &TextOptions,
) -> Vec<WordFrequency> {
    let slice = corpus.for_decades(&[decade]);
    let docs = prepare_documents(&slice, opts, "trends");
    frequent_words_in(&docs.docs, top_n, opts.min_word_len)
}
