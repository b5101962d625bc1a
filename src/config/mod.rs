// src/config/mod.rs
//! Analytics configuration loaded from TOML with env overrides.
//!
//! Resolution order:
//! 1) `$LYRICS_ANALYTICS_CONFIG` (must exist when set)
//! 2) `config/analytics.toml` (optional)
//! 3) built-in defaults
//!
//! After the file is parsed, `LYRICS_MIN_WORD_LEN`, `LYRICS_MIN_VIEWS` and
//! `LYRICS_LDA_SEED` override single fields. Every field has a default, so a partial
//! file is fine.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/analytics.toml";

pub const ENV_CONFIG_PATH: &str = "LYRICS_ANALYTICS_CONFIG";
pub const ENV_MIN_WORD_LEN: &str = "LYRICS_MIN_WORD_LEN";
pub const ENV_MIN_VIEWS: &str = "LYRICS_MIN_VIEWS";
pub const ENV_LDA_SEED: &str = "LYRICS_LDA_SEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Tokens shorter than this (in chars) are dropped from word tables and topics.
    pub min_word_len: usize,
    pub top_words: usize,
    /// Size of the top positive / top negative song lists.
    pub top_songs: usize,
    /// Minimum views for a song to enter the positive/negative lists (0 = no filter).
    pub top_songs_min_views: u64,
    pub popular_songs: usize,
    pub popular_songs_min_views: u64,
    pub num_topics: usize,
    pub num_words: usize,
    /// Gibbs sweeps per LDA fit.
    pub lda_iterations: usize,
    pub lda_alpha: f64,
    pub lda_beta: f64,
    pub lda_seed: u64,
    /// Larger slices are down-sampled before fitting.
    pub lda_max_documents: usize,
    pub min_bigram_count: usize,
    pub top_bigrams: usize,
    pub top_pos_tags: usize,
    pub top_entities: usize,
    pub top_emotions: usize,
    /// Lyrics above this size are treated as malformed and skipped.
    pub max_lyrics_bytes: usize,
    pub cache_capacity: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_word_len: 4,
            top_words: 10,
            top_songs: 3,
            top_songs_min_views: 0,
            popular_songs: 3,
            popular_songs_min_views: 1000,
            num_topics: 5,
            num_words: 5,
            lda_iterations: 200,
            lda_alpha: 0.1,
            lda_beta: 0.01,
            lda_seed: 42,
            lda_max_documents: 500,
            min_bigram_count: 2,
            top_bigrams: 10,
            top_pos_tags: 8,
            top_entities: 5,
            top_emotions: 3,
            max_lyrics_bytes: 100_000,
            cache_capacity: 256,
        }
    }
}

impl AnalyticsConfig {
    /// Load using env var + fallbacks (see module docs), then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        path.display()
                    ));
                }
                Self::from_file(&path)?
            }
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!(target: "config", "no analytics config file, using defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg.validate())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading analytics config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&content)
            .with_context(|| format!("parsing analytics config {}", path.display()))?;
        info!(target: "config", path = %path.display(), "loaded analytics config");
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let cfg: AnalyticsConfig = toml::from_str(toml_str)?;
        Ok(cfg.validate())
    }

    /// Override single fields from the environment; unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env::<usize>(ENV_MIN_WORD_LEN) {
            self.min_word_len = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_MIN_VIEWS) {
            self.top_songs_min_views = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_LDA_SEED) {
            self.lda_seed = v;
        }
    }

    /// Clamp values that would make an analysis meaningless.
    pub fn validate(mut self) -> Self {
        self.min_word_len = self.min_word_len.max(1);
        self.num_topics = self.num_topics.max(1);
        self.num_words = self.num_words.max(1);
        self.lda_iterations = self.lda_iterations.max(1);
        self.lda_max_documents = self.lda_max_documents.max(1);
        self.min_bigram_count = self.min_bigram_count.max(1);
        self.cache_capacity = self.cache_capacity.max(1);
        if !(self.lda_alpha.is_finite() && self.lda_alpha > 0.0) {
            self.lda_alpha = Self::default().lda_alpha;
        }
        if !(self.lda_beta.is_finite() && self.lda_beta > 0.0) {
            self.lda_beta = Self::default().lda_beta;
        }
        self
    }

    /// Stable text form used as part of cache keys.
    pub fn cache_fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AnalyticsConfig::from_toml_str("min_word_len = 5\nnum_topics = 3\n").unwrap();
        assert_eq!(cfg.min_word_len, 5);
        assert_eq!(cfg.num_topics, 3);
        assert_eq!(cfg.top_words, 10);
        assert_eq!(cfg.popular_songs_min_views, 1000);
    }

    #[test]
    fn validate_clamps_nonsense() {
        let cfg = AnalyticsConfig::from_toml_str("num_topics = 0\nlda_alpha = -1.0\n").unwrap();
        assert_eq!(cfg.num_topics, 1);
        assert!(cfg.lda_alpha > 0.0);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AnalyticsConfig::from_toml_str("num_topics = \"many\"").is_err());
    }

    #[test]
    fn fingerprint_changes_with_params() {
        let a = AnalyticsConfig::default();
        let mut b = AnalyticsConfig::default();
        b.lda_seed = 7;
        assert_ne!(a.cache_fingerprint(), b.cache_fingerprint());
    }
}
