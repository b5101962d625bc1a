// tests/corpus_input.rs
use rock_lyrics_analytics::trends::{sentiment_by_year, word_frequencies_by_decade};
use rock_lyrics_analytics::analyze::TextOptions;
use rock_lyrics_analytics::{score_sentiment, Corpus, LyricsAnalyzer};

const SAMPLE: &str = include_str!("../demos/sample_corpus.json");

#[test]
fn sample_corpus_decodes_leniently() {
    let corpus = Corpus::from_json_str(SAMPLE).unwrap();
    assert_eq!(corpus.len(), 5);
    assert_eq!(corpus.artists(), vec!["Queen".to_string(), "Kiss".to_string()]);
    // "1,975" cleaned up
    assert_eq!(corpus.records()[0].year, 1975);
    assert!(corpus.records()[4].lyrics.is_none());
}

#[test]
fn optional_and_derived_columns_are_tolerated() {
    let json = r#"[
        {"artist":"A","title":"t1","year":1980,"lyrics":"words","decade":1900,"lyric_length":99},
        {"artist":"A","title":"t2","year":"1981","views":null},
        {"artist":"","title":"dropped","year":1982}
    ]"#;
    let corpus = Corpus::from_json_str(json).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.records()[0].decade(), 1980);
    assert_eq!(corpus.records()[0].lyric_length(), 1);
    assert_eq!(corpus.records()[1].views, 0);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(Corpus::from_json_str("{not json").is_err());
}

#[test]
fn annotation_is_idempotent_and_memoized() {
    let analyzer = LyricsAnalyzer::default();
    let corpus = Corpus::from_json_str(SAMPLE).unwrap();
    let once = analyzer.annotate(&corpus);
    let twice = analyzer.annotate(&once);
    let a: Vec<_> = once.iter().map(|r| r.sentiment).collect();
    let b: Vec<_> = twice.iter().map(|r| r.sentiment).collect();
    assert_eq!(a, b);
    assert!(a.iter().flatten().all(|s| (-1.0..=1.0).contains(s)));
    // Beth has no lyrics
    assert_eq!(a[4], None);
}

#[test]
fn sentiment_is_pure() {
    assert_eq!(score_sentiment(""), 0.0);
    let t = "Ich liebe dich, je t'aime, \u{2764}\u{FE0F} love";
    assert_eq!(score_sentiment(t), score_sentiment(t));
}

#[test]
fn corpus_wide_trends() {
    let analyzer = LyricsAnalyzer::default();
    let corpus = Corpus::from_json_str(SAMPLE).unwrap();
    let trend = analyzer.sentiment_trend(&corpus);
    assert_eq!(trend.keys().copied().collect::<Vec<_>>(), vec![1975, 1976]);
    // unannotated input has no scores
    assert!(sentiment_by_year(&corpus).is_empty());

    let words = word_frequencies_by_decade(&corpus, 1970, 5, &TextOptions::default());
    assert!(!words.is_empty());
    assert!(word_frequencies_by_decade(&corpus, 1960, 5, &TextOptions::default()).is_empty());
    assert_eq!(analyzer.decade_words(&corpus, 1970), word_frequencies_by_decade(&corpus, 1970, 10, &TextOptions::from(analyzer.config())));
}

#[test]
fn filters_never_mutate_the_source() {
    let corpus = Corpus::from_json_str(SAMPLE).unwrap();
    let fp = corpus.fingerprint().to_string();
    let seventies = corpus.for_years(&[1975]);
    assert_eq!(seventies.len(), 2);
    assert_eq!(corpus.english_only().len(), 5);
    assert_eq!(corpus.len(), 5);
    assert_eq!(corpus.fingerprint(), fp);
}

#[test]
fn out_of_range_sentiment_never_reaches_profiles() {
    let json = r#"[
        {"artist":"A","title":"x","year":1975,"lyrics":"la la","views":1,"sentiment":7.5},
        {"artist":"B","title":"y","year":1976,"lyrics":"sweet love","views":1}
    ]"#;
    let corpus = Corpus::from_json_str(json).unwrap();
    let r = LyricsAnalyzer::default().compare(&corpus, "A", "B").unwrap();
    let a = r.profile("A").unwrap();
    assert_eq!(a.average_sentiment, Some(1.0));
    assert!(r.series("A").unwrap().sentiment_by_year.values().all(|s| (-1.0..=1.0).contains(s)));
}

#[test]
fn one_bad_row_does_not_sink_the_batch() {
    let json = r#"[
        {"artist":"A","title":"x","year":1975,"lyrics":"la","views":3},
        {"artist":"A","title":"y","year":"unknown","lyrics":"la","views":4},
        {"artist":"B","title":"z","year":1976,"lyrics":"la","views":-2}
    ]"#;
    let corpus = Corpus::from_json_str(json).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.total_views(), 3);
}
