// tests/compare_scenarios.rs
use rock_lyrics_analytics::analyze::{extract_topics, KeywordLexicon, FALLBACK_TOPIC_LABEL};
use rock_lyrics_analytics::{
    compare, AnalysisError, Corpus, LyricsAnalyzer, SentimentLabel, SongRecord,
};

fn queen_vs_kiss() -> Corpus {
    Corpus::new(vec![
        SongRecord::new("Queen", "Love Song", 1975)
            .with_lyrics("love love love, sweet love tonight")
            .with_views(500),
        SongRecord::new("Queen", "Happy Song", 1976)
            .with_lyrics("so happy, I love this wonderful day")
            .with_views(2000),
        SongRecord::new("Queen", "Good Song", 1977)
            .with_lyrics("good times and good friends, love")
            .with_views(1500),
        SongRecord::new("Kiss", "Rock Song", 1976)
            .with_lyrics("rock and roll all night")
            .with_views(100),
        SongRecord::new("Kiss", "Party Song", 1977)
            .with_lyrics("party every day")
            .with_views(50),
    ])
}

#[test]
fn scenario_queen_vs_kiss() {
    let result = compare(&queen_vs_kiss(), "Queen", "Kiss").expect("comparison");
    let queen = &result.first;
    assert_eq!(queen.artist, "Queen");
    assert_eq!(queen.top_positive_songs.len(), 3);

    let love = queen
        .frequent_words
        .iter()
        .find(|w| w.word == "love")
        .expect("love in frequent words");
    assert!(love.frequency >= 3);
    assert_eq!(queen.frequent_words[0].rank, 1);

    assert_eq!(result.second.artist, "Kiss");
    assert_eq!(result.second.total_views, 150);
}

#[test]
fn lyricless_songs_count_but_are_not_analyzed() {
    let corpus = Corpus::new(vec![
        SongRecord::new("A", "with words", 1980).with_lyrics("Tokyo nights in Tokyo").with_views(10),
        SongRecord::new("A", "instrumental", 1981).with_views(90),
        SongRecord::new("B", "other", 1982).with_lyrics("plain words").with_views(1),
    ]);
    let result = compare(&corpus, "A", "B").unwrap();
    let a = &result.first;
    assert_eq!(a.song_count, 2);
    assert_eq!(a.songs_with_lyrics, 1);
    assert_eq!(a.total_views, 100);
    assert_eq!(result.first_series.views_by_year.get(&1981), Some(&90));
    assert!(!result.first_series.sentiment_by_year.contains_key(&1981));
    assert!(a.entities.iter().all(|e| e.count <= 2));
}

#[test]
fn same_artist_twice_or_single_artist_corpus_is_rejected() {
    let corpus = queen_vs_kiss();
    assert!(matches!(
        compare(&corpus, "Queen", "Queen"),
        Err(AnalysisError::InsufficientSelection(_))
    ));

    let single = corpus.for_artist("Queen");
    assert!(matches!(
        compare(&single, "Queen", "Kiss"),
        Err(AnalysisError::InsufficientSelection(_))
    ));
}

#[test]
fn one_short_song_has_no_topics() {
    let corpus = Corpus::new(vec![SongRecord::new("A", "short", 1990).with_lyrics("three small words")]);
    assert!(extract_topics(&corpus, 5, 5).is_empty());
}

#[test]
fn all_neutral_scores_stay_neutral_and_flat() {
    let corpus = Corpus::new(vec![
        SongRecord::new("A", "1", 1970).with_lyrics("radio static").with_sentiment(0.0),
        SongRecord::new("A", "2", 1972).with_lyrics("engine noise").with_sentiment(0.0),
        SongRecord::new("B", "3", 1971).with_lyrics("paper walls").with_sentiment(0.0),
    ]);
    let result = compare(&corpus, "A", "B").unwrap();
    assert_eq!(result.first.sentiment_label, Some(SentimentLabel::Neutral));
    assert_eq!(result.second.sentiment_label, Some(SentimentLabel::Neutral));

    let a = &result.first_series.sentiment_by_year;
    assert_eq!(a.keys().copied().collect::<Vec<_>>(), vec![1970, 1972]);
    assert!(a.values().all(|v| *v == 0.0));
    assert!(!a.contains_key(&1971));
}

#[test]
fn swapping_artists_swaps_profiles_only() {
    let corpus = queen_vs_kiss();
    let analyzer = LyricsAnalyzer::default();
    let ab = analyzer.compare(&corpus, "Queen", "Kiss").unwrap();
    let ba = analyzer.compare(&corpus, "Kiss", "Queen").unwrap();
    assert_eq!(ab.first, ba.second);
    assert_eq!(ab.second, ba.first);
    assert_eq!(ab.first_series, ba.second_series);
    assert_eq!(ab.second_series, ba.first_series);
}

#[test]
fn comparison_is_stable_across_analyzers() {
    let corpus = queen_vs_kiss();
    let one = LyricsAnalyzer::default().compare(&corpus, "Queen", "Kiss").unwrap();
    let two = LyricsAnalyzer::default().compare(&corpus, "Queen", "Kiss").unwrap();
    assert_eq!(one, two);
}

#[test]
fn topic_labels_come_from_the_lexicon() {
    let lexicon = KeywordLexicon::builtin();
    let mut records = Vec::new();
    for i in 0..12 {
        let lyrics = match i % 3 {
            0 => "highway road train miles riding wheels journey town",
            1 => "heaven angel prayer faith spirit glory grace church",
            _ => "money gold diamond fame business dollar million cash",
        };
        records.push(SongRecord::new("A", format!("song {i}"), 1980 + i).with_lyrics(lyrics));
    }
    let topics = extract_topics(&Corpus::new(records), 3, 5);
    assert_eq!(topics.len(), 3);
    for t in topics {
        assert!(t.label == FALLBACK_TOPIC_LABEL || lexicon.labels().contains(&t.label.as_str()));
    }
}

#[test]
fn result_serializes_to_json() {
    let result = compare(&queen_vs_kiss(), "Queen", "Kiss").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["first"]["artist"], "Queen");
    assert!(json["first_series"]["views_by_year"].is_object());
}
