//! Demo: compare two artists and print the result as JSON.
//!
//! Usage: `compare_demo [corpus.json] [artist_a] [artist_b]`. Without a path the
//! bundled sample corpus is used; without names the first two artists are compared.

use anyhow::{bail, Context, Result};
use rock_lyrics_analytics::{telemetry, AnalyticsConfig, Corpus, LyricsAnalyzer};
use std::fs::File;
use std::io::BufReader;

const SAMPLE: &str = include_str!("../../demos/sample_corpus.json");

fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let mut args = std::env::args().skip(1);
    let corpus = match args.next() {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening corpus {path}"))?;
            Corpus::from_json_reader(BufReader::new(file))
                .with_context(|| format!("decoding corpus {path}"))?
        }
        None => Corpus::from_json_str(SAMPLE).context("decoding bundled sample corpus")?,
    };

    let artists = corpus.artists();
    let first = args.next().or_else(|| artists.first().cloned());
    let second = args.next().or_else(|| artists.get(1).cloned());
    let (Some(first), Some(second)) = (first, second) else {
        bail!("corpus needs at least two artists, found {}", artists.len());
    };

    let analyzer = LyricsAnalyzer::new(AnalyticsConfig::load()?);
    let result = analyzer.compare(&corpus, &first, &second)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
