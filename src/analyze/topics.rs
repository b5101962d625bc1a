// src/analyze/topics.rs
//! # Topic Modeler
//! Latent Dirichlet Allocation fitted by collapsed Gibbs sampling, plus a pluggable
//! keyword-lexicon topic labeler.
//!
//! One document per lyric-bearing song, tokenized with `content_tokens`. The fit is
//! fully determined by the document order and `LdaParams::seed`: the vocabulary is
//! numbered by first appearance and every random draw comes from one seeded `StdRng`.
//!
//! Labels are a keyword-overlap heuristic, not a classifier.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::analyze::text::content_tokens;
use crate::analyze::{prepare_documents, Document, TextOptions};
use crate::config::AnalyticsConfig;
use crate::corpus::Corpus;
use crate::error::Result;

pub const FALLBACK_TOPIC_LABEL: &str = "General/Ambiguous";

/// Maps a topic's top words to a human-readable label.
pub trait TopicLabeler: Send + Sync {
    fn label(&self, words: &[String]) -> String;
}

#[derive(Debug, Deserialize)]
struct LexiconEntry {
    label: String,
    keywords: Vec<String>,
}

/// Ordered label → keyword set table. Earlier labels win ties.
#[derive(Debug, Clone)]
pub struct KeywordLexicon {
    entries: Vec<(String, HashSet<String>)>,
}

static BUILTIN_LEXICON: Lazy<KeywordLexicon> = Lazy::new(|| {
    KeywordLexicon::from_json_str(include_str!("../../lexicon/topics.json"))
        .expect("valid topic lexicon")
});

impl KeywordLexicon {
    /// The embedded `lexicon/topics.json`.
    pub fn builtin() -> Self {
        BUILTIN_LEXICON.clone()
    }

    /// Parse a JSON array of `{ "label": ..., "keywords": [...] }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<LexiconEntry> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|e| {
                let set = e.keywords.iter().map(|k| k.trim().to_lowercase()).collect();
                (e.label, set)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }
}

impl TopicLabeler for KeywordLexicon {
    fn label(&self, words: &[String]) -> String {
        let words: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut best: Option<(&str, usize)> = None;
        for (label, keywords) in &self.entries {
            let overlap = words.iter().filter(|w| keywords.contains(*w)).count();
            if overlap == 0 {
                continue;
            }
            // strict '>' keeps the first label on ties
            if best.map_or(true, |(_, n)| overlap > n) {
                best = Some((label, overlap));
            }
        }
        best.map(|(l, _)| l.to_string())
            .unwrap_or_else(|| FALLBACK_TOPIC_LABEL.to_string())
    }
}

/// Label with the built-in lexicon.
pub fn label_topic(words: &[String]) -> String {
    BUILTIN_LEXICON.label(words)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LdaParams {
    pub num_topics: usize,
    pub num_words: usize,
    pub iterations: usize,
    pub alpha: f64,
    pub beta: f64,
    pub seed: u64,
    pub max_documents: usize,
    pub min_word_len: usize,
}

impl Default for LdaParams {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for LdaParams {
    fn from(cfg: &AnalyticsConfig) -> Self {
        Self {
            num_topics: cfg.num_topics,
            num_words: cfg.num_words,
            iterations: cfg.lda_iterations,
            alpha: cfg.lda_alpha,
            beta: cfg.lda_beta,
            seed: cfg.lda_seed,
            max_documents: cfg.lda_max_documents,
            min_word_len: cfg.min_word_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub id: usize,
    pub words: Vec<String>,
    /// Share of token assignments, in [0, 1].
    pub weight: f64,
    pub label: String,
}

#[derive(Clone)]
pub struct TopicModeler {
    params: LdaParams,
    labeler: Arc<dyn TopicLabeler>,
}

impl std::fmt::Debug for TopicModeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicModeler")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl TopicModeler {
    pub fn new(params: LdaParams) -> Self {
        Self {
            params,
            labeler: Arc::new(KeywordLexicon::builtin()),
        }
    }

    pub fn with_labeler(mut self, labeler: Arc<dyn TopicLabeler>) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn params(&self) -> &LdaParams {
        &self.params
    }

    /// Fit over every lyric-bearing song of `slice`.
    pub fn fit(&self, slice: &Corpus, max_lyrics_bytes: usize) -> Vec<Topic> {
        let opts = TextOptions {
            min_word_len: self.params.min_word_len,
            max_lyrics_bytes,
        };
        let docs = prepare_documents(slice, &opts, "topics");
        self.fit_documents(&docs.docs)
    }

    pub(crate) fn fit_documents(&self, docs: &[Document<'_>]) -> Vec<Topic> {
        let p = &self.params;
        let k = p.num_topics.max(1);
        let mut rng = StdRng::seed_from_u64(p.seed);

        let mut picked: Vec<usize> = (0..docs.len()).collect();
        if picked.len() > p.max_documents {
            picked.shuffle(&mut rng);
            picked.truncate(p.max_documents);
            picked.sort_unstable();
            debug!(target: "topics", kept = picked.len(), total = docs.len(), "down-sampled documents");
        }

        let mut vocab: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut corpus: Vec<Vec<usize>> = Vec::with_capacity(picked.len());
        for &i in &picked {
            let ids: Vec<usize> = content_tokens(&docs[i].text, p.min_word_len)
                .into_iter()
                .map(|tok| {
                    *index.entry(tok.clone()).or_insert_with(|| {
                        vocab.push(tok);
                        vocab.len() - 1
                    })
                })
                .collect();
            if !ids.is_empty() {
                corpus.push(ids);
            }
        }

        if corpus.is_empty() || vocab.len() < k.max(p.num_words) {
            debug!(
                target: "topics",
                documents = corpus.len(),
                vocabulary = vocab.len(),
                "not enough data for topic model"
            );
            return Vec::new();
        }

        let started = Instant::now();
        let n_kw = gibbs(&corpus, vocab.len(), k, p, &mut rng);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("lyrics_lda_fit_ms").record(elapsed_ms);

        let total_tokens: usize = corpus.iter().map(Vec::len).sum();
        let topics: Vec<Topic> = n_kw
            .iter()
            .enumerate()
            .map(|(id, row)| {
                let mut order: Vec<usize> = (0..row.len()).filter(|&w| row[w] > 0).collect();
                // stable: equal counts keep vocabulary order
                order.sort_by(|&a, &b| row[b].cmp(&row[a]));
                let words: Vec<String> = order
                    .into_iter()
                    .take(p.num_words)
                    .map(|w| vocab[w].clone())
                    .collect();
                let assigned: usize = row.iter().sum();
                Topic {
                    id,
                    label: self.labeler.label(&words),
                    weight: assigned as f64 / total_tokens as f64,
                    words,
                }
            })
            .collect();

        info!(
            target: "topics",
            documents = corpus.len(),
            vocabulary = vocab.len(),
            topics = k,
            elapsed_ms,
            "fitted topic model"
        );
        topics
    }
}

impl Default for TopicModeler {
    fn default() -> Self {
        Self::new(LdaParams::default())
    }
}

/// Collapsed Gibbs sampler. Returns topic-word counts `n_kw[k][w]`.
fn gibbs(docs: &[Vec<usize>], v: usize, k: usize, p: &LdaParams, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut n_dk = vec![vec![0usize; k]; docs.len()];
    let mut n_kw = vec![vec![0usize; v]; k];
    let mut n_k = vec![0usize; k];
    let mut z: Vec<Vec<usize>> = Vec::with_capacity(docs.len());

    for (d, doc) in docs.iter().enumerate() {
        let mut zd = Vec::with_capacity(doc.len());
        for &w in doc {
            let t = rng.random_range(0..k);
            n_dk[d][t] += 1;
            n_kw[t][w] += 1;
            n_k[t] += 1;
            zd.push(t);
        }
        z.push(zd);
    }

    let v_beta = v as f64 * p.beta;
    let mut weights = vec![0.0f64; k];
    for _ in 0..p.iterations {
        for (d, doc) in docs.iter().enumerate() {
            for (i, &w) in doc.iter().enumerate() {
                let old = z[d][i];
                n_dk[d][old] -= 1;
                n_kw[old][w] -= 1;
                n_k[old] -= 1;

                let mut total = 0.0;
                for t in 0..k {
                    let pt = (n_dk[d][t] as f64 + p.alpha) * (n_kw[t][w] as f64 + p.beta)
                        / (n_k[t] as f64 + v_beta);
                    total += pt;
                    weights[t] = total;
                }
                let u = rng.random::<f64>() * total;
                let new = weights.iter().position(|&c| u < c).unwrap_or(k - 1);

                z[d][i] = new;
                n_dk[d][new] += 1;
                n_kw[new][w] += 1;
                n_k[new] += 1;
            }
        }
    }
    n_kw
}

/// Topics of a slice with default parameters apart from the topic/word counts.
pub fn extract_topics(slice: &Corpus, num_topics: usize, num_words: usize) -> Vec<Topic> {
    let params = LdaParams {
        num_topics: num_topics.max(1),
        num_words: num_words.max(1),
        ..LdaParams::default()
    };
    TopicModeler::new(params).fit(slice, AnalyticsConfig::default().max_lyrics_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SongRecord;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn sample_corpus() -> Corpus {
        let lyrics = [
            "love baby darling heart kiss love baby heart",
            "highway road ride train miles road highway town",
            "love heart kiss darling baby sweet honey love",
            "road train highway miles wheels ride journey road",
            "death darkness devil blood grave shadow death dark",
            "devil blood grave darkness death shadow demon hell",
        ];
        Corpus::new(
            lyrics
                .iter()
                .enumerate()
                .map(|(i, l)| SongRecord::new("Band", format!("t{i}"), 1980).with_lyrics(*l))
                .collect(),
        )
    }

    #[test]
    fn labeler_picks_largest_overlap() {
        let lex = KeywordLexicon::builtin();
        assert_eq!(lex.label(&words(&["love", "baby", "road"])), "Love/Romance");
        assert_eq!(lex.label(&words(&["zzzz", "qqqq"])), FALLBACK_TOPIC_LABEL);
    }

    #[test]
    fn labeler_ties_go_to_first_listed() {
        let lex = KeywordLexicon::from_json_str(
            r#"[{"label":"A","keywords":["x"]},{"label":"B","keywords":["y"]}]"#,
        )
        .unwrap();
        assert_eq!(lex.label(&words(&["y", "x"])), "A");
        assert_eq!(lex.labels(), vec!["A", "B"]);
    }

    #[test]
    fn tiny_input_gives_no_topics() {
        let c = Corpus::new(vec![SongRecord::new("A", "1", 1970).with_lyrics("three words here")]);
        assert!(extract_topics(&c, 5, 5).is_empty());
        let empty = Corpus::new(vec![SongRecord::new("A", "1", 1970)]);
        assert!(extract_topics(&empty, 5, 5).is_empty());
    }

    #[test]
    fn fit_is_seeded_and_bounded() {
        let c = sample_corpus();
        let a = extract_topics(&c, 3, 4);
        let b = extract_topics(&c, 3, 4);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        let total: f64 = a.iter().map(|t| t.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let lex = KeywordLexicon::builtin();
        for t in &a {
            assert!(t.words.len() <= 4);
            assert!(t.label == FALLBACK_TOPIC_LABEL || lex.labels().contains(&t.label.as_str()));
        }
    }

    #[test]
    fn down_sampling_caps_documents() {
        let params = LdaParams {
            num_topics: 2,
            num_words: 3,
            iterations: 20,
            max_documents: 2,
            ..LdaParams::default()
        };
        let topics = TopicModeler::new(params).fit(&sample_corpus(), 10_000);
        assert_eq!(topics.len(), 2);
    }

    struct Constant;
    impl TopicLabeler for Constant {
        fn label(&self, _words: &[String]) -> String {
            "const".into()
        }
    }

    #[test]
    fn custom_labeler_is_used() {
        let params = LdaParams {
            num_topics: 2,
            num_words: 3,
            iterations: 10,
            ..LdaParams::default()
        };
        let modeler = TopicModeler::new(params).with_labeler(Arc::new(Constant));
        let topics = modeler.fit(&sample_corpus(), 10_000);
        assert!(topics.iter().all(|t| t.label == "const"));
    }
}
