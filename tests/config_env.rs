// tests/config_env.rs
use rock_lyrics_analytics::config::{
    AnalyticsConfig, ENV_CONFIG_PATH, ENV_LDA_SEED, ENV_MIN_VIEWS, ENV_MIN_WORD_LEN,
};
use std::{env, fs};

fn clear_env() {
    for k in [ENV_CONFIG_PATH, ENV_MIN_WORD_LEN, ENV_MIN_VIEWS, ENV_LDA_SEED] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn load_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing → defaults
    let cfg = AnalyticsConfig::load().unwrap();
    assert_eq!(cfg, AnalyticsConfig::default());

    // 2) ./config/analytics.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("analytics.toml"), "num_topics = 3\n").unwrap();
    assert_eq!(AnalyticsConfig::load().unwrap().num_topics, 3);

    // 3) env path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "num_topics = 7\ntop_words = 20\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AnalyticsConfig::load().unwrap();
    assert_eq!(cfg.num_topics, 7);
    assert_eq!(cfg.top_words, 20);

    // 4) env path must exist
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AnalyticsConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn field_overrides_from_env() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_MIN_WORD_LEN, "5");
    env::set_var(ENV_MIN_VIEWS, "1000");
    env::set_var(ENV_LDA_SEED, "not-a-number");
    let cfg = AnalyticsConfig::load().unwrap();
    assert_eq!(cfg.min_word_len, 5);
    assert_eq!(cfg.top_songs_min_views, 1000);
    assert_eq!(cfg.lda_seed, AnalyticsConfig::default().lda_seed);

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn invalid_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("bad.toml");
    fs::write(&p, "num_topics = [").unwrap();
    let err = AnalyticsConfig::from_file(&p).unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"));
}
