// src/analyze/lexical.rs
//! Word-frequency tables and bigram collocations (pointwise mutual information).
//!
//! Ties are broken by first appearance in the slice, which makes every table stable
//! for a given corpus order.

use serde::Serialize;
use std::collections::HashMap;

use crate::analyze::text::content_tokens;
use crate::analyze::{prepare_documents, Document, TextOptions};
use crate::corpus::Corpus;

/// One row of a frequency table. `rank` is 1-based for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordFrequency {
    pub rank: usize,
    pub word: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collocation {
    pub first: String,
    pub second: String,
    pub count: usize,
    /// log2(P(xy) / (P(x) P(y)))
    pub pmi: f64,
}

/// Most frequent content words of a slice. Empty lyrics → empty table.
pub fn most_frequent_words(slice: &Corpus, top_n: usize, opts: &TextOptions) -> Vec<WordFrequency> {
    let docs = prepare_documents(slice, opts, "lexical");
    frequent_words_in(&docs.docs, top_n, opts.min_word_len)
}

/// Highest-PMI adjacent pairs seen at least `min_count` times.
pub fn top_bigram_collocations(
    slice: &Corpus,
    top_n: usize,
    min_count: usize,
    opts: &TextOptions,
) -> Vec<Collocation> {
    let docs = prepare_documents(slice, opts, "lexical");
    collocations_in(&docs.docs, top_n, min_count, opts.min_word_len)
}

pub(crate) fn frequent_words_in(docs: &[Document<'_>], top_n: usize, min_len: usize) -> Vec<WordFrequency> {
    // word -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut pos = 0usize;
    for doc in docs {
        for tok in content_tokens(&doc.text, min_len) {
            let entry = counts.entry(tok).or_insert((0, pos));
            entry.0 += 1;
            pos += 1;
        }
    }

    let mut rows: Vec<(String, usize, usize)> =
        counts.into_iter().map(|(w, (c, first))| (w, c, first)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    rows.into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (word, frequency, _))| WordFrequency {
            rank: i + 1,
            word,
            frequency,
        })
        .collect()
}

pub(crate) fn collocations_in(
    docs: &[Document<'_>],
    top_n: usize,
    min_count: usize,
    min_len: usize,
) -> Vec<Collocation> {
    let mut unigrams: HashMap<String, usize> = HashMap::new();
    // (x, y) -> (count, first position)
    let mut bigrams: HashMap<(String, String), (usize, usize)> = HashMap::new();
    let mut n_words = 0usize;
    let mut n_bigrams = 0usize;

    for doc in docs {
        let toks = content_tokens(&doc.text, min_len);
        for t in &toks {
            *unigrams.entry(t.clone()).or_insert(0) += 1;
            n_words += 1;
        }
        // Pairs never span two songs.
        for pair in toks.windows(2) {
            let entry = bigrams
                .entry((pair[0].clone(), pair[1].clone()))
                .or_insert((0, n_bigrams));
            entry.0 += 1;
            n_bigrams += 1;
        }
    }
    if n_bigrams == 0 {
        return Vec::new();
    }

    let mut rows: Vec<(Collocation, usize)> = bigrams
        .into_iter()
        .filter(|(_, (c, _))| *c >= min_count)
        .map(|((x, y), (c, first))| {
            let p_xy = c as f64 / n_bigrams as f64;
            let p_x = unigrams[&x] as f64 / n_words as f64;
            let p_y = unigrams[&y] as f64 / n_words as f64;
            let pmi = (p_xy / (p_x * p_y)).log2();
            (
                Collocation {
                    first: x,
                    second: y,
                    count: c,
                    pmi,
                },
                first,
            )
        })
        .collect();
    rows.sort_by(|a, b| b.0.pmi.total_cmp(&a.0.pmi).then(a.1.cmp(&b.1)));
    rows.into_iter().take(top_n).map(|(c, _)| c).collect()
}
