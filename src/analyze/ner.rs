// src/analyze/ner.rs
//! Named-entity extraction: Person / Place / Organization.
//!
//! Two passes per lyric line:
//! 1. Gazetteer: regex patterns per category. The built-in set is embedded from
//!    `lexicon/entities.json`; more can be loaded from a directory of `*.json` files
//!    shaped `{ "patterns": [ { "regex", "keyword" } ] }`, category = file stem
//!    (`person.json`, `place.json`, `organization.json`). A hit counts under its
//!    `keyword`.
//! 2. Heuristic: runs of capitalized words that do not start a line or sentence.
//!    The run's words decide the kind (titles → Person, "River"/"Street"/… → Place,
//!    "Band"/"Records"/… → Organization), otherwise Person.
//!
//! Counts aggregate by exact text. No coreference ("Mary" and "Mary Jane" are two
//! entities).
//!
//! Notes:
//! - Regexes must be compatible with the `regex` crate (no lookarounds).
//! - A missing config dir is fine; unreadable or invalid files are skipped with a warning.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::analyze::text::strip_token;
use crate::analyze::{prepare_documents, Document, TextOptions};
use crate::corpus::Corpus;
use crate::error::{AnalysisError, Result};

/// Directory with extra gazetteer files, read by `EntityRecognizer::from_env`.
pub const ENV_NER_CONFIG_DIR: &str = "LYRICS_NER_CONFIG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Person,
    Place,
    Organization,
}

impl EntityKind {
    /// Category names accepted in gazetteer files.
    pub fn from_category(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "person" | "people" | "persons" => Some(Self::Person),
            "place" | "places" | "location" | "gpe" => Some(Self::Place),
            "organization" | "organisation" | "org" | "organizations" => Some(Self::Organization),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCount {
    pub text: String,
    pub kind: EntityKind,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
struct PatternSpec {
    regex: String,
    keyword: String,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    patterns: Vec<PatternSpec>,
}

#[derive(Debug, Clone)]
struct EntityPattern {
    kind: EntityKind,
    regex: Regex,
    keyword: String,
}

impl EntityPattern {
    fn compile(kind: EntityKind, spec: PatternSpec) -> Result<Self> {
        let regex = Regex::new(&spec.regex)
            .map_err(|e| AnalysisError::Config(format!("bad entity pattern '{}': {e}", spec.regex)))?;
        Ok(Self {
            kind,
            regex,
            keyword: spec.keyword,
        })
    }
}

static BUILTIN: Lazy<EntityRecognizer> = Lazy::new(|| {
    EntityRecognizer::from_json_str(include_str!("../../lexicon/entities.json"))
        .expect("valid entity gazetteer")
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("word regex"));

/// Capitalized for emphasis or grammar, not names.
const NON_ENTITY: &[&str] = &[
    "I", "I'm", "I'll", "I've", "I'd", "Oh", "Ooh", "Ah", "Yeah", "Hey", "Whoa", "No", "Yes",
    "Baby", "Babe", "Love", "Honey", "Darling", "Sugar", "Mama", "Lord", "God", "Heaven",
    "Hell", "Christmas", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
    "Sunday", "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December", "OK", "Okay", "Chorus", "Verse",
];

const PERSON_TITLES: &[&str] = &[
    "Mr", "Mrs", "Ms", "Miss", "Mister", "Dr", "Doctor", "Sir", "Lady", "Captain", "Uncle",
    "Aunt", "Saint", "St", "King", "Queen", "Prince", "Princess", "Sergeant", "Major",
    "Father", "Brother", "Sister", "Little", "Big",
];

const PLACE_CUES: &[&str] = &[
    "City", "Street", "Avenue", "Road", "River", "Lake", "Mountain", "Mountains", "Valley",
    "Town", "County", "Park", "Bay", "Beach", "Island", "Hill", "Hills", "Boulevard",
    "Highway", "Station", "Square", "Bridge", "Canyon", "Falls", "Harbor", "Hotel", "Mount",
    "Fort", "Desert", "Coast",
];

const ORG_CUES: &[&str] = &[
    "Band", "Records", "Army", "Navy", "Corporation", "Company", "Inc", "Club", "Church",
    "University", "College", "Bank", "Party", "Gang", "Brothers", "Orchestra", "Society",
];

#[derive(Debug, Clone)]
pub struct EntityRecognizer {
    patterns: Vec<EntityPattern>,
}

impl Default for EntityRecognizer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EntityRecognizer {
    /// The embedded gazetteer.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Gazetteer without any patterns; only the capitalization heuristic runs.
    pub fn heuristic_only() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Parse a `{ "<category>": [ { "regex", "keyword" } ] }` map.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<PatternSpec>> = serde_json::from_str(json)?;
        let mut patterns = Vec::new();
        // categories in name order, so overlapping matches resolve the same way every run
        for (category, specs) in raw {
            let kind = EntityKind::from_category(&category)
                .ok_or_else(|| AnalysisError::Config(format!("unknown entity category '{category}'")))?;
            for spec in specs {
                patterns.push(EntityPattern::compile(kind, spec)?);
            }
        }
        Ok(Self { patterns })
    }

    /// Built-in gazetteer plus the files in `$LYRICS_NER_CONFIG_DIR` when it is set.
    pub fn from_env() -> Self {
        match std::env::var(ENV_NER_CONFIG_DIR) {
            Ok(dir) => Self::builtin().with_config_dir(Path::new(&dir)),
            Err(_) => Self::builtin(),
        }
    }

    /// Append the patterns of every `*.json` file in `dir`.
    pub fn with_config_dir(mut self, dir: &Path) -> Self {
        let read_dir = match fs::read_dir(dir) {
            Ok(d) => d,
            Err(_) => return self, // Missing dir is ok → just the built-in set
        };

        let mut paths: Vec<_> = read_dir
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown");
            let Some(kind) = EntityKind::from_category(stem) else {
                warn!(target: "ner", file = %path.display(), "unknown entity category, skipping");
                continue;
            };
            let parsed = fs::read_to_string(&path)
                .map_err(AnalysisError::from)
                .and_then(|s| serde_json::from_str::<PatternFile>(&s).map_err(AnalysisError::from));
            let file = match parsed {
                Ok(f) => f,
                Err(e) => {
                    warn!(target: "ner", file = %path.display(), error = %e, "skipping entity config");
                    continue;
                }
            };
            let before = self.patterns.len();
            for spec in file.patterns {
                match EntityPattern::compile(kind, spec) {
                    Ok(p) => self.patterns.push(p),
                    Err(e) => warn!(target: "ner", file = %path.display(), error = %e, "skipping pattern"),
                }
            }
            debug!(
                target: "ner",
                file = %path.display(),
                added = self.patterns.len() - before,
                "loaded entity patterns"
            );
        }
        self
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Every entity mention in `text`, in reading order per line.
    pub fn recognize(&self, text: &str) -> Vec<(String, EntityKind)> {
        let mut out = Vec::new();
        for line in text.lines() {
            self.recognize_line(line, &mut out);
        }
        out
    }

    fn recognize_line(&self, line: &str, out: &mut Vec<(String, EntityKind)>) {
        let mut found: Vec<Span> = Vec::new();
        for p in &self.patterns {
            for m in p.regex.find_iter(line) {
                if !overlaps(m.start(), m.end(), &found) {
                    found.push((m.start(), m.end(), p.keyword.clone(), p.kind));
                }
            }
        }

        let mut run: Vec<String> = Vec::new();
        let mut run_start = 0usize;
        let mut sentence_start = true;
        let mut spans: Vec<Span> = Vec::new();

        for m in WORD.find_iter(line) {
            let raw = m.as_str();
            let Some(word) = strip_token(raw) else {
                flush_run(&mut run, run_start, m.start(), &mut spans);
                if raw.ends_with(['.', '!', '?']) {
                    sentence_start = true;
                }
                continue;
            };
            // "Mr." ends neither the run nor the sentence
            let abbreviation = raw.ends_with('.') && PERSON_TITLES.contains(&word.as_str());
            let ends_clause =
                !abbreviation && raw.ends_with([',', ';', ':', '.', '!', '?', ')', '"']);
            let ends_sentence = !abbreviation && raw.ends_with(['.', '!', '?']);

            let candidate = !sentence_start
                && word.chars().next().is_some_and(char::is_uppercase)
                && !NON_ENTITY.contains(&word.as_str())
                && !overlaps(m.start(), m.end(), &found);

            if candidate {
                if run.is_empty() {
                    run_start = m.start();
                }
                run.push(word);
                if ends_clause {
                    flush_run(&mut run, run_start, m.end(), &mut spans);
                }
            } else {
                flush_run(&mut run, run_start, m.start(), &mut spans);
            }
            sentence_start = ends_sentence;
        }
        flush_run(&mut run, run_start, line.len(), &mut spans);

        found.extend(spans);
        found.sort_by_key(|(s, _, _, _)| *s);
        out.extend(found.into_iter().map(|(_, _, t, k)| (t, k)));
    }

    /// Most frequent entities of a slice; ties keep first appearance.
    pub fn top_entities(&self, slice: &Corpus, top_n: usize, opts: &TextOptions) -> Vec<EntityCount> {
        let docs = prepare_documents(slice, opts, "ner");
        self.top_entities_in(&docs.docs, top_n)
    }

    pub(crate) fn top_entities_in(&self, docs: &[Document<'_>], top_n: usize) -> Vec<EntityCount> {
        // text -> (kind, count, first position)
        let mut counts: HashMap<String, (EntityKind, usize, usize)> = HashMap::new();
        let mut pos = 0usize;
        for doc in docs {
            for (text, kind) in self.recognize(&doc.text) {
                let entry = counts.entry(text).or_insert((kind, 0, pos));
                entry.1 += 1;
                pos += 1;
            }
        }
        let mut rows: Vec<(EntityCount, usize)> = counts
            .into_iter()
            .map(|(text, (kind, count, first))| (EntityCount { text, kind, count }, first))
            .collect();
        rows.sort_by(|a, b| b.0.count.cmp(&a.0.count).then(a.1.cmp(&b.1)));
        rows.into_iter().take(top_n).map(|(e, _)| e).collect()
    }
}

type Span = (usize, usize, String, EntityKind);

fn overlaps(start: usize, end: usize, spans: &[Span]) -> bool {
    spans.iter().any(|(s, e, _, _)| start < *e && *s < end)
}

fn flush_run(
    run: &mut Vec<String>,
    start: usize,
    end: usize,
    spans: &mut Vec<Span>,
) {
    if run.is_empty() {
        return;
    }
    let words = std::mem::take(run);
    // a lone title ("Captain") is not a name
    if words.len() == 1 && PERSON_TITLES.contains(&words[0].as_str()) {
        return;
    }
    let kind = classify_run(&words);
    spans.push((start, end, words.join(" "), kind));
}

fn classify_run(words: &[String]) -> EntityKind {
    if words.iter().any(|w| ORG_CUES.contains(&w.as_str())) {
        EntityKind::Organization
    } else if words.iter().any(|w| PLACE_CUES.contains(&w.as_str())) {
        EntityKind::Place
    } else {
        EntityKind::Person
    }
}

/// Most frequent entities with the built-in gazetteer and default text options.
pub fn top_entities(slice: &Corpus, top_n: usize) -> Vec<EntityCount> {
    BUILTIN.top_entities(slice, top_n, &TextOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SongRecord;
    use serial_test::serial;
    use std::io::Write;

    fn names(found: &[(String, EntityKind)]) -> Vec<&str> {
        found.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn gazetteer_hits_use_keyword() {
        let r = EntityRecognizer::builtin();
        let found = r.recognize("Took a train to New York City\nthen on to Memphis");
        assert!(found.contains(&("New York".to_string(), EntityKind::Place)));
        assert!(found.contains(&("Memphis".to_string(), EntityKind::Place)));
    }

    #[test]
    fn line_start_and_sentence_start_are_not_names() {
        let r = EntityRecognizer::heuristic_only();
        let found = r.recognize("Running down the road. Tonight we ride\nWalking with Jenny Lee");
        assert_eq!(names(&found), vec!["Jenny Lee"]);
        assert_eq!(found[0].1, EntityKind::Person);
    }

    #[test]
    fn cue_words_pick_the_kind() {
        let r = EntityRecognizer::heuristic_only();
        let found = r.recognize("we met down on Baker Street\nplaying for the Silver Band");
        assert!(found.contains(&("Baker Street".to_string(), EntityKind::Place)));
        assert!(found.contains(&("Silver Band".to_string(), EntityKind::Organization)));
    }

    #[test]
    fn titles_stay_attached() {
        let r = EntityRecognizer::heuristic_only();
        let found = r.recognize("say hello to Mr. Jones");
        assert_eq!(names(&found), vec!["Mr Jones"]);
    }

    #[test]
    fn emphasis_words_are_ignored() {
        let r = EntityRecognizer::heuristic_only();
        assert!(r.recognize("and I said Oh Baby I Love you").is_empty());
    }

    #[test]
    fn top_entities_counts_and_orders() {
        let c = Corpus::new(vec![
            SongRecord::new("A", "1", 1970).with_lyrics("going to London\nback to London with Mary"),
            SongRecord::new("A", "2", 1971).with_lyrics("leaving Mary in Paris\nand London calling"),
            SongRecord::new("A", "3", 1971),
        ]);
        let top = top_entities(&c, 2);
        assert_eq!(top[0].text, "London");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[0].kind, EntityKind::Place);
        assert_eq!(top[1].text, "Mary");
        assert_eq!(top[1].count, 2);
    }

    #[test]
    fn config_dir_adds_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("organization.json")).unwrap();
        write!(f, r#"{{"patterns":[{{"regex":"\\bAcme\\b","keyword":"Acme Corp"}}]}}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("weather.json"), r#"{"patterns":[]}"#).unwrap();

        let base = EntityRecognizer::builtin().pattern_count();
        let r = EntityRecognizer::builtin().with_config_dir(dir.path());
        assert_eq!(r.pattern_count(), base + 1);
        let found = r.recognize("we worked for Acme all day");
        assert!(found.contains(&("Acme Corp".to_string(), EntityKind::Organization)));
    }

    #[test]
    #[serial]
    fn from_env_tolerates_missing_dir() {
        std::env::set_var(ENV_NER_CONFIG_DIR, "__ner_config_dir_should_not_exist__");
        let r = EntityRecognizer::from_env();
        assert_eq!(r.pattern_count(), EntityRecognizer::builtin().pattern_count());
        std::env::remove_var(ENV_NER_CONFIG_DIR);
    }
}
