// src/corpus.rs
//! # Corpus Model
//! Song-record schema, the immutable `Corpus` container, and the derived values every
//! other component relies on (`decade_of`, `lyric_length`, `lexical_diversity`).
//!
//! Derived values are pure functions of one record and are never stored: an input
//! table may carry `decade` / `lyric_length` columns, but they are ignored and
//! recomputed on demand.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::sentiment::{label_sentiment, SentimentLabel};

/// One row of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub artist: String,
    pub title: String,
    #[serde(deserialize_with = "de_lenient_i64")]
    pub year: i64,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Polarity in [-1, 1]; filled by `SentimentScorer::annotate` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl SongRecord {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, year: i64) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            year,
            lyrics: None,
            views: 0,
            album: None,
            language: None,
            sentiment: None,
        }
    }

    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }

    pub fn with_views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Lyrics that contain at least one non-whitespace character.
    pub fn lyrics_text(&self) -> Option<&str> {
        self.lyrics.as_deref().filter(|l| !l.trim().is_empty())
    }

    pub fn has_lyrics(&self) -> bool {
        self.lyrics_text().is_some()
    }

    pub fn decade(&self) -> i64 {
        decade_of(self.year)
    }

    pub fn lyric_length(&self) -> usize {
        self.lyrics.as_deref().map(lyric_length).unwrap_or(0)
    }

    pub fn lexical_diversity(&self) -> f64 {
        self.lyrics.as_deref().map(lexical_diversity).unwrap_or(0.0)
    }

    pub fn sentiment_label(&self) -> Option<SentimentLabel> {
        self.sentiment.map(label_sentiment)
    }

    fn is_analyzable(&self) -> bool {
        !self.artist.trim().is_empty() && !self.title.trim().is_empty()
    }
}

/// Year truncated to the nearest lower multiple of ten (floor, also for negatives).
pub fn decade_of(year: i64) -> i64 {
    year.div_euclid(10) * 10
}

/// Whitespace word count.
pub fn lyric_length(lyrics: &str) -> usize {
    lyrics.split_whitespace().count()
}

/// Unique words / total words, in [0, 1]. Empty or whitespace-only text yields 0.
pub fn lexical_diversity(lyrics: &str) -> f64 {
    let mut total = 0usize;
    let mut unique = HashSet::new();
    for w in lyrics.split_whitespace() {
        total += 1;
        unique.insert(w.to_lowercase());
    }
    if total == 0 {
        return 0.0;
    }
    unique.len() as f64 / total as f64
}

/// Immutable, cheaply clonable collection of songs. Filtering returns new values.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Arc<Vec<SongRecord>>,
    fingerprint: Arc<OnceLock<String>>,
}

impl Corpus {
    /// Build a corpus; rows without artist or title never enter analysis.
    ///
    /// Precomputed sentiment is clamped to [-1, 1]; non-finite values are cleared so
    /// that `annotate` scores the song again.
    pub fn new(records: Vec<SongRecord>) -> Self {
        let before = records.len();
        let mut records: Vec<SongRecord> = records.into_iter().filter(|r| r.is_analyzable()).collect();
        let dropped = before - records.len();
        if dropped > 0 {
            warn!(target: "corpus", dropped, "dropped records without artist or title");
        }

        let mut repaired = 0usize;
        for r in records.iter_mut() {
            if let Some(s) = r.sentiment {
                let fixed = s.is_finite().then(|| s.clamp(-1.0, 1.0));
                if fixed != Some(s) {
                    r.sentiment = fixed;
                    repaired += 1;
                }
            }
        }
        if repaired > 0 {
            warn!(target: "corpus", repaired, "sentiment values outside [-1, 1] repaired");
        }
        Self::from_validated(records)
    }

    pub(crate) fn from_validated(records: Vec<SongRecord>) -> Self {
        Self {
            records: Arc::new(records),
            fingerprint: Arc::new(OnceLock::new()),
        }
    }

    /// Decode a JSON array of song rows. Optional columns may be missing.
    ///
    /// Only a document that is not an array fails; a row that cannot be decoded
    /// (unusable year, missing artist) is dropped and counted.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self::from_json_rows(rows))
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
        Ok(Self::from_json_rows(rows))
    }

    fn from_json_rows(rows: Vec<serde_json::Value>) -> Self {
        let mut records = Vec::with_capacity(rows.len());
        let mut rejected = 0usize;
        for (index, row) in rows.into_iter().enumerate() {
            match SongRecord::deserialize(row) {
                Ok(r) => records.push(r),
                Err(e) => {
                    rejected += 1;
                    debug!(target: "corpus", index, error = %e, "row rejected");
                }
            }
        }
        if rejected > 0 {
            warn!(target: "corpus", rejected, "dropped rows that could not be decoded");
        }
        Self::new(records)
    }

    pub fn records(&self) -> &[SongRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SongRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// New corpus holding the records that satisfy `predicate`, in original order.
    pub fn filter_by<P>(&self, predicate: P) -> Corpus
    where
        P: Fn(&SongRecord) -> bool,
    {
        Self::from_validated(self.records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    pub fn for_artist(&self, artist: &str) -> Corpus {
        self.filter_by(|r| r.artist == artist)
    }

    pub fn for_years(&self, years: &[i64]) -> Corpus {
        self.filter_by(|r| years.contains(&r.year))
    }

    pub fn for_decades(&self, decades: &[i64]) -> Corpus {
        self.filter_by(|r| decades.contains(&r.decade()))
    }

    /// Keep rows tagged `en`; rows without a language tag are kept as well.
    pub fn english_only(&self) -> Corpus {
        self.filter_by(|r| {
            r.language
                .as_deref()
                .map_or(true, |l| l.trim().eq_ignore_ascii_case("en"))
        })
    }

    /// Distinct artists in first-seen order.
    pub fn artists(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for r in self.records.iter() {
            if seen.insert(r.artist.as_str()) {
                out.push(r.artist.clone());
            }
        }
        out
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i64> {
        let mut years: Vec<i64> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Records with usable lyrics (the input of every text-analytic function).
    pub fn with_lyrics(&self) -> impl Iterator<Item = &SongRecord> + '_ {
        self.records.iter().filter(|r| r.has_lyrics())
    }

    pub fn total_views(&self) -> u64 {
        self.records.iter().map(|r| r.views).sum()
    }

    /// True when every record with lyrics already carries a sentiment score.
    pub fn is_sentiment_annotated(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.sentiment.is_some() || !r.has_lyrics())
    }

    /// SHA-256 content hash of the snapshot (hex). Computed once per value.
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.get_or_init(|| {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            for r in self.records.iter() {
                hasher.update(r.artist.as_bytes());
                hasher.update([0x1f]);
                hasher.update(r.title.as_bytes());
                hasher.update([0x1f]);
                hasher.update(r.year.to_le_bytes());
                hasher.update(r.views.to_le_bytes());
                match &r.lyrics {
                    Some(l) => {
                        hasher.update([1]);
                        hasher.update(l.as_bytes());
                    }
                    None => hasher.update([0]),
                }
                hasher.update([0x1f]);
                hasher.update(r.album.as_deref().unwrap_or_default().as_bytes());
                hasher.update([0x1f]);
                hasher.update(r.language.as_deref().unwrap_or_default().as_bytes());
                match r.sentiment {
                    Some(s) => {
                        hasher.update([1]);
                        hasher.update(s.to_bits().to_le_bytes());
                    }
                    None => hasher.update([0]),
                }
                hasher.update([0x1e]);
            }
            to_hex(&hasher.finalize())
        })
    }
}

impl FromIterator<SongRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = SongRecord>>(iter: I) -> Self {
        Corpus::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a SongRecord;
    type IntoIter = std::slice::Iter<'a, SongRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/* ----------------------------
Lenient numeric columns
---------------------------- */

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericCell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumericCell {
    fn to_i64(&self) -> std::result::Result<i64, String> {
        match self {
            NumericCell::Int(v) => Ok(*v),
            NumericCell::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            NumericCell::Float(f) => Err(format!("non-finite number {f}")),
            NumericCell::Text(s) => {
                // "1,975" -> 1975
                let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
                cleaned
                    .parse::<i64>()
                    .or_else(|_| cleaned.parse::<f64>().map(|f| f.trunc() as i64))
                    .map_err(|_| format!("not a number: {s:?}"))
            }
        }
    }
}

fn de_lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = NumericCell::deserialize(deserializer)?;
    cell.to_i64().map_err(serde::de::Error::custom)
}

fn de_lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    // Counts never reject a row: garbage and negatives read as 0.
    let cell = Option::<NumericCell>::deserialize(deserializer)?;
    let Some(cell) = cell else {
        return Ok(0);
    };
    match cell.to_i64() {
        Ok(v) => Ok(u64::try_from(v).unwrap_or(0)),
        Err(e) => {
            debug!(target: "corpus", error = %e, "unreadable count read as 0");
            Ok(0)
        }
    }
}
