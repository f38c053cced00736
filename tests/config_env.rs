// tests/config_env.rs
use portal_announcer::config::Config;
use portal_announcer::error::ConfigError;
use std::env;
use std::time::Duration;

const KEYS: &[&str] = &[
    "TELEGRAM_TOKEN",
    "TELEGRAM_CHAT_ID",
    "TELEGRAM_API_BASE",
    "SAKAI_URL",
    "SAKAI_USERNAME",
    "SAKAI_PASSWORD",
    "HEADLESS",
    "ALLOW_PAGE_SEARCH",
    "NOTIFY_DELAY_MS",
    "ANNOUNCEMENTS_FILE",
];

fn clear() {
    for k in KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn reads_process_environment() {
    clear();
    env::set_var("TELEGRAM_TOKEN", "123:abc");
    env::set_var("TELEGRAM_CHAT_ID", "-100200");
    env::set_var("SAKAI_USERNAME", "student");
    env::set_var("SAKAI_PASSWORD", "hunter2");
    env::set_var("ALLOW_PAGE_SEARCH", "true");

    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.portal_url.as_str(), "https://online.deu.edu.tr/portal");
    assert!(cfg.allow_page_search);
    assert!(!cfg.headless);
    assert_eq!(cfg.notify_delay, Duration::from_millis(1000));
    assert_eq!(cfg.history_path.to_str(), Some("duyurular.json"));

    // secrets never reach Debug output
    let dbg = format!("{cfg:?}");
    assert!(!dbg.contains("123:abc"));
    assert!(!dbg.contains("hunter2"));

    clear();
}

#[serial_test::serial]
#[test]
fn missing_credentials_name_the_variable() {
    clear();
    env::set_var("TELEGRAM_TOKEN", "123:abc");
    env::set_var("TELEGRAM_CHAT_ID", "-100200");
    env::set_var("SAKAI_USERNAME", "student");

    let err = Config::from_env().unwrap_err();
    assert_eq!(err, ConfigError::Missing("SAKAI_PASSWORD"));
    assert!(err.to_string().contains("SAKAI_PASSWORD"));

    clear();
}
