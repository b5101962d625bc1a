// src/analyze/mod.rs
//! Text-analytic components: lexical statistics, part-of-speech mix, topics,
//! named entities and emotions.
//!
//! Every component works on sanitized documents produced by `prepare_documents`, so
//! a corpus slice is sanitized once per profile and malformed lyrics are skipped in
//! one place.

pub mod emotion;
pub mod lexical;
pub mod ner;
pub mod pos;
pub mod text;
pub mod topics;

use crate::config::AnalyticsConfig;
use crate::corpus::{Corpus, SongRecord};

// Re-export convenient types.
pub use crate::analyze::emotion::{top_emotions, EmotionShare};
pub use crate::analyze::lexical::{most_frequent_words, top_bigram_collocations, Collocation, WordFrequency};
pub use crate::analyze::ner::{top_entities, EntityCount, EntityKind, EntityRecognizer};
pub use crate::analyze::pos::{part_of_speech_distribution, PosTag};
pub use crate::analyze::topics::{
    extract_topics, label_topic, KeywordLexicon, LdaParams, Topic, TopicLabeler, TopicModeler,
    FALLBACK_TOPIC_LABEL,
};

/// Tokenization knobs shared by the text-analytic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    pub min_word_len: usize,
    pub max_lyrics_bytes: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for TextOptions {
    fn from(cfg: &AnalyticsConfig) -> Self {
        Self {
            min_word_len: cfg.min_word_len,
            max_lyrics_bytes: cfg.max_lyrics_bytes,
        }
    }
}

/// One lyric-bearing song after sanitization.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub record: &'a SongRecord,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Documents<'a> {
    pub docs: Vec<Document<'a>>,
    /// Lyrics that failed sanitization and were left out.
    pub skipped: usize,
}

/// Sanitize every lyric-bearing record; records without lyrics are ignored and
/// malformed ones are counted in `skipped`.
pub fn prepare_documents<'a>(
    corpus: &'a Corpus,
    opts: &TextOptions,
    component: &'static str,
) -> Documents<'a> {
    let mut out = Documents::default();
    for record in corpus.with_lyrics() {
        let Some(raw) = record.lyrics_text() else {
            continue;
        };
        match text::sanitize(raw, opts.max_lyrics_bytes) {
            Ok(clean) => out.docs.push(Document {
                record,
                text: clean,
            }),
            Err(e) => {
                out.skipped += 1;
                text::note_malformed(component, &record.title, &e);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lyricless_and_malformed_records_are_left_out() {
        let c = Corpus::new(vec![
            SongRecord::new("A", "1", 1970).with_lyrics("fine words here"),
            SongRecord::new("A", "2", 1970),
            SongRecord::new("A", "3", 1970).with_lyrics("bad\0bytes"),
        ]);
        let docs = prepare_documents(&c, &TextOptions::default(), "test");
        assert_eq!(docs.docs.len(), 1);
        assert_eq!(docs.skipped, 1);
        assert_eq!(docs.docs[0].record.title, "1");
    }
}
