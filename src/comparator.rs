// src/comparator.rs
//! # Artist Comparator
//! Builds per-artist profiles and time series and puts two of them side by side.
//!
//! A profile is computed from that artist's own records only, so swapping the two
//! arguments of `compare` swaps the halves of the result and nothing else. Profiles are
//! memoized by (artist slice fingerprint, artist, config fingerprint, sentiment model
//! version); sentiment columns are memoized by the scorer per snapshot.
//!
//! Artist names resolve exactly first, then ignoring case and repeated whitespace.
//! Unknown names get the closest known artist (`strsim::normalized_levenshtein`) in
//! the error message.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use strsim::normalized_levenshtein;
use tracing::{debug, info};

use crate::analyze::emotion::emotions_in;
use crate::analyze::lexical::{collocations_in, frequent_words_in};
use crate::analyze::pos::pos_distribution_in;
use crate::analyze::{
    prepare_documents, Collocation, EmotionShare, EntityCount, EntityRecognizer, LdaParams,
    PosTag, TextOptions, Topic, TopicLabeler, TopicModeler, WordFrequency,
};
use crate::cache::{AnalysisCache, CacheKey};
use crate::config::AnalyticsConfig;
use crate::corpus::{Corpus, SongRecord};
use crate::error::{AnalysisError, Result};
use crate::sentiment::{label_sentiment, SentimentLabel, SentimentScorer, SENTIMENT_MODEL_VERSION};
use crate::trends;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongSummary {
    pub title: String,
    pub year: i64,
    pub views: u64,
    pub sentiment: Option<f64>,
}

impl From<&SongRecord> for SongSummary {
    fn from(r: &SongRecord) -> Self {
        Self {
            title: r.title.clone(),
            year: r.year,
            views: r.views,
            sentiment: r.sentiment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumSummary {
    pub album: String,
    pub views: u64,
}

/// Aggregates of one artist over a corpus slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistProfile {
    pub artist: String,
    pub song_count: usize,
    pub songs_with_lyrics: usize,
    pub total_views: u64,
    /// Mean over scored songs; `None` when no song could be scored.
    pub average_sentiment: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    /// Mean over lyric-bearing songs.
    pub average_lexical_diversity: Option<f64>,
    pub frequent_words: Vec<WordFrequency>,
    pub collocations: Vec<Collocation>,
    pub pos_distribution: Vec<(PosTag, usize)>,
    pub top_positive_songs: Vec<SongSummary>,
    pub top_negative_songs: Vec<SongSummary>,
    pub popular_songs: Vec<SongSummary>,
    pub topics: Vec<Topic>,
    pub entities: Vec<EntityCount>,
    pub emotions: Vec<EmotionShare>,
    pub debut_year: i64,
    pub most_popular_song: Option<SongSummary>,
    pub most_popular_album: Option<AlbumSummary>,
    /// Lyrics left out of the text analytics because they failed sanitization.
    pub skipped_documents: usize,
}

/// Per-artist series; keys with no contributing song are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSeries {
    pub artist: String,
    pub sentiment_by_year: BTreeMap<i64, f64>,
    pub lexical_diversity_by_year: BTreeMap<i64, f64>,
    pub views_by_year: BTreeMap<i64, u64>,
    pub sentiment_by_decade: BTreeMap<i64, f64>,
    pub lexical_diversity_by_decade: BTreeMap<i64, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub first: ArtistProfile,
    pub second: ArtistProfile,
    pub first_series: ArtistSeries,
    pub second_series: ArtistSeries,
}

impl ComparisonResult {
    pub fn profile(&self, artist: &str) -> Option<&ArtistProfile> {
        [&self.first, &self.second].into_iter().find(|p| p.artist == artist)
    }

    pub fn series(&self, artist: &str) -> Option<&ArtistSeries> {
        [&self.first_series, &self.second_series]
            .into_iter()
            .find(|s| s.artist == artist)
    }
}

/// The engine: configuration plus memo tables. `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct LyricsAnalyzer {
    config: AnalyticsConfig,
    scorer: SentimentScorer,
    topics: TopicModeler,
    entities: EntityRecognizer,
    profiles: AnalysisCache<ArtistProfile>,
}

impl Default for LyricsAnalyzer {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl LyricsAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Self {
        let config = config.validate();
        Self {
            scorer: SentimentScorer::new(config.max_lyrics_bytes, config.cache_capacity),
            topics: TopicModeler::new(LdaParams::from(&config)),
            entities: EntityRecognizer::from_env(),
            profiles: AnalysisCache::with_capacity("profiles", config.cache_capacity),
            config,
        }
    }

    /// Swap the topic labeler. Drops memoized profiles.
    pub fn with_labeler(mut self, labeler: Arc<dyn TopicLabeler>) -> Self {
        self.topics = self.topics.with_labeler(labeler);
        self.profiles.clear();
        self
    }

    /// Swap the entity recognizer. Drops memoized profiles.
    pub fn with_entity_recognizer(mut self, entities: EntityRecognizer) -> Self {
        self.entities = entities;
        self.profiles.clear();
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn text_options(&self) -> TextOptions {
        TextOptions::from(&self.config)
    }

    /// Fill missing sentiment scores (see `SentimentScorer::annotate`).
    pub fn annotate(&self, corpus: &Corpus) -> Corpus {
        self.scorer.annotate(corpus)
    }

    /// Corpus-wide mean sentiment per year.
    pub fn sentiment_trend(&self, corpus: &Corpus) -> BTreeMap<i64, f64> {
        trends::sentiment_by_year(&self.annotate(corpus))
    }

    /// Frequency table of one decade's lyrics, with the configured options.
    pub fn decade_words(&self, corpus: &Corpus, decade: i64) -> Vec<WordFrequency> {
        trends::word_frequencies_by_decade(corpus, decade, self.config.top_words, &self.text_options())
    }

    /// Canonical artist name as stored in the corpus, if any.
    pub fn resolve_artist(corpus: &Corpus, name: &str) -> Option<String> {
        let artists = corpus.artists();
        if let Some(exact) = artists.iter().find(|a| a.as_str() == name) {
            return Some(exact.clone());
        }
        let wanted = normalize_name(name);
        artists.into_iter().find(|a| normalize_name(a) == wanted)
    }

    /// Closest known artist name, for error messages.
    pub fn closest_artist(corpus: &Corpus, name: &str) -> Option<String> {
        let wanted = normalize_name(name);
        corpus
            .artists()
            .into_iter()
            .map(|a| (normalized_levenshtein(&wanted, &normalize_name(&a)), a))
            .fold(None, |best: Option<(f64, String)>, (score, a)| match best {
                Some((s, _)) if s >= score => best,
                _ => Some((score, a)),
            })
            .map(|(_, a)| a)
    }

    fn unknown_artist(corpus: &Corpus, name: &str) -> String {
        match Self::closest_artist(corpus, name) {
            Some(close) => format!("unknown artist '{name}' (closest match: '{close}')"),
            None => format!("unknown artist '{name}' (corpus has no artists)"),
        }
    }

    /// Profile of one artist. `InsufficientData` when the corpus has no song by them.
    pub fn artist_profile(&self, corpus: &Corpus, artist: &str) -> Result<Arc<ArtistProfile>> {
        let name = Self::resolve_artist(corpus, artist).ok_or_else(|| AnalysisError::InsufficientData {
            artist: artist.to_string(),
            what: Self::unknown_artist(corpus, artist),
        })?;
        let slice = corpus.for_artist(&name);
        if slice.is_empty() {
            return Err(AnalysisError::InsufficientData {
                artist: name,
                what: "no songs".into(),
            });
        }

        let config_fp = self.config.cache_fingerprint();
        let key = CacheKey::new(
            slice.fingerprint(),
            &["profile", name.as_str(), config_fp.as_str(), SENTIMENT_MODEL_VERSION],
        );
        Ok(self
            .profiles
            .get_or_insert_with(&key, || self.build_profile(&name, &self.annotate(&slice))))
    }

    /// Time series of one artist. Same resolution rules as `artist_profile`.
    pub fn artist_series(&self, corpus: &Corpus, artist: &str) -> Result<ArtistSeries> {
        let name = Self::resolve_artist(corpus, artist).ok_or_else(|| AnalysisError::InsufficientData {
            artist: artist.to_string(),
            what: Self::unknown_artist(corpus, artist),
        })?;
        let slice = self.annotate(&corpus.for_artist(&name));
        Ok(build_series(&name, &slice))
    }

    /// Compare exactly two distinct artists.
    pub fn compare(&self, corpus: &Corpus, first: &str, second: &str) -> Result<ComparisonResult> {
        let resolve = |name: &str| {
            Self::resolve_artist(corpus, name)
                .ok_or_else(|| AnalysisError::InsufficientSelection(Self::unknown_artist(corpus, name)))
        };
        let a = resolve(first)?;
        let b = resolve(second)?;
        if a == b {
            return Err(AnalysisError::InsufficientSelection(format!(
                "two distinct artists are required, got '{a}' twice"
            )));
        }

        let pair = corpus.filter_by(|r| r.artist == a || r.artist == b);
        info!(
            target: "comparator",
            first = %a,
            second = %b,
            songs = pair.len(),
            "comparing artists"
        );

        let first_profile = self.artist_profile(&pair, &a)?;
        let second_profile = self.artist_profile(&pair, &b)?;
        Ok(ComparisonResult {
            first: first_profile.as_ref().clone(),
            second: second_profile.as_ref().clone(),
            first_series: self.artist_series(&pair, &a)?,
            second_series: self.artist_series(&pair, &b)?,
        })
    }

    /// Drop every memoized result derived from `corpus` or its artist slices.
    pub fn invalidate(&self, corpus: &Corpus) -> usize {
        let mut removed = self.scorer.invalidate(corpus.fingerprint());
        for artist in corpus.artists() {
            let slice = corpus.for_artist(&artist);
            removed += self.scorer.invalidate(slice.fingerprint());
            removed += self.profiles.invalidate_snapshot(slice.fingerprint());
        }
        debug!(target: "comparator", removed, "invalidated cached analyses");
        removed
    }

    pub fn cached_profiles(&self) -> usize {
        self.profiles.len()
    }

    fn build_profile(&self, artist: &str, slice: &Corpus) -> ArtistProfile {
        let cfg = &self.config;
        let opts = self.text_options();
        let docs = prepare_documents(slice, &opts, "comparator");

        let scored: Vec<&SongRecord> = slice.iter().filter(|r| r.sentiment.is_some()).collect();
        let average_sentiment = mean(scored.iter().filter_map(|r| r.sentiment));
        let average_lexical_diversity = mean(slice.with_lyrics().map(SongRecord::lexical_diversity));

        let mut ranked: Vec<&SongRecord> = scored
            .iter()
            .copied()
            .filter(|r| r.views >= cfg.top_songs_min_views)
            .collect();
        // stable sorts: equal scores keep corpus order
        ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));
        let top_positive_songs = ranked.iter().take(cfg.top_songs).map(|r| SongSummary::from(*r)).collect();
        ranked.sort_by(|a, b| score(a).total_cmp(&score(b)));
        let top_negative_songs = ranked.iter().take(cfg.top_songs).map(|r| SongSummary::from(*r)).collect();

        let mut popular: Vec<&SongRecord> = slice
            .iter()
            .filter(|r| r.views >= cfg.popular_songs_min_views)
            .collect();
        popular.sort_by(|a, b| b.views.cmp(&a.views));
        let popular_songs = popular.iter().take(cfg.popular_songs).map(|r| SongSummary::from(*r)).collect();

        let most_popular_song = slice
            .iter()
            .fold(None::<&SongRecord>, |best, r| match best {
                Some(b) if b.views >= r.views => Some(b),
                _ => Some(r),
            })
            .map(SongSummary::from);

        let profile = ArtistProfile {
            artist: artist.to_string(),
            song_count: slice.len(),
            songs_with_lyrics: slice.with_lyrics().count(),
            total_views: slice.total_views(),
            sentiment_label: average_sentiment.map(label_sentiment),
            average_sentiment,
            average_lexical_diversity,
            frequent_words: frequent_words_in(&docs.docs, cfg.top_words, cfg.min_word_len),
            collocations: collocations_in(&docs.docs, cfg.top_bigrams, cfg.min_bigram_count, cfg.min_word_len),
            pos_distribution: pos_distribution_in(&docs.docs, cfg.top_pos_tags),
            top_positive_songs,
            top_negative_songs,
            popular_songs,
            topics: self.topics.fit_documents(&docs.docs),
            entities: self.entities.top_entities_in(&docs.docs, cfg.top_entities),
            emotions: emotions_in(&docs.docs, cfg.top_emotions),
            debut_year: slice.iter().map(|r| r.year).min().unwrap_or_default(),
            most_popular_song,
            most_popular_album: most_popular_album(slice),
            skipped_documents: docs.skipped,
        };
        debug!(
            target: "comparator",
            artist,
            songs = profile.song_count,
            documents = docs.docs.len(),
            skipped = docs.skipped,
            "built artist profile"
        );
        profile
    }
}

/// Compare two artists with the default configuration.
pub fn compare(corpus: &Corpus, first: &str, second: &str) -> Result<ComparisonResult> {
    LyricsAnalyzer::default().compare(corpus, first, second)
}

fn build_series(artist: &str, slice: &Corpus) -> ArtistSeries {
    ArtistSeries {
        artist: artist.to_string(),
        sentiment_by_year: trends::sentiment_by_year(slice),
        lexical_diversity_by_year: trends::lexical_diversity_by_year(slice),
        views_by_year: trends::views_by_year(slice),
        sentiment_by_decade: trends::sentiment_by_decade(slice),
        lexical_diversity_by_decade: trends::lexical_diversity_by_decade(slice),
    }
}

fn score(r: &SongRecord) -> f64 {
    r.sentiment.unwrap_or(0.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Album with the most summed views; ties go to the album seen first.
fn most_popular_album(slice: &Corpus) -> Option<AlbumSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut views: HashMap<&str, u64> = HashMap::new();
    for r in slice.iter() {
        let Some(album) = r.album.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            continue;
        };
        let slot = views.entry(album).or_insert_with(|| {
            order.push(album);
            0
        });
        *slot += r.views;
    }
    let mut best: Option<AlbumSummary> = None;
    for album in order {
        let v = views[album];
        if best.as_ref().map_or(true, |b| v > b.views) {
            best = Some(AlbumSummary {
                album: album.to_string(),
                views: v,
            });
        }
    }
    best
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
