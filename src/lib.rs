// src/lib.rs
//! Rock lyrics analytics: sentiment, lexical statistics, topics, entities and
//! emotions over a song corpus, with side-by-side artist comparison.
//!
//! Start with [`LyricsAnalyzer`]; the free functions in [`analyze`] and [`trends`]
//! work on any [`Corpus`] slice directly.

pub mod analyze;
pub mod cache;
pub mod comparator;
pub mod config;
pub mod corpus;
pub mod error;
pub mod sentiment;
pub mod telemetry;
pub mod trends;

// ---- Re-exports for stable public API ----
pub use crate::comparator::{
    compare, AlbumSummary, ArtistProfile, ArtistSeries, ComparisonResult, LyricsAnalyzer,
    SongSummary,
};
pub use crate::config::AnalyticsConfig;
pub use crate::corpus::{decade_of, lexical_diversity, lyric_length, Corpus, SongRecord};
pub use crate::error::{AnalysisError, Result};
pub use crate::sentiment::{
    label_sentiment, score_sentiment, SentimentLabel, SentimentScorer, SENTIMENT_MODEL_VERSION,
};
