use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("X_COOKIE_HEADER", "auth_token=abc; ct0=def");
    m.insert("DISCORD_WEBHOOK_1", "https://discord.test/api/webhooks/1/token");
    m.insert("X_USERNAMES1", "alice\nbob");
    m
}

#[test]
fn build_app_config_fails_without_cookie_header() {
    let mut map = full_env();
    map.remove("X_COOKIE_HEADER");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "X_COOKIE_HEADER"),
        "expected MissingEnvVar(X_COOKIE_HEADER), got: {result:?}"
    );
}

#[test]
fn blank_cookie_header_counts_as_missing() {
    let mut map = full_env();
    map.insert("X_COOKIE_HEADER", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_fails_without_groups() {
    let mut map = full_env();
    map.remove("DISCORD_WEBHOOK_1");
    map.remove("X_USERNAMES1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::NoGroups)),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.site_url, "https://x.com");
    assert_eq!(cfg.site_host(), "x.com");
    assert_eq!(cfg.state_dir, PathBuf::from("./state"));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.post_limit, 10);
    assert_eq!(cfg.window_days, 7);
    assert_eq!(cfg.max_empty_steps, 5);
    assert_eq!(cfg.step_budget, 15);
    assert_eq!(cfg.scroll_px, 700);
    assert_eq!(cfg.settle_delay_ms, 1000);
    assert_eq!(cfg.initial_wait_ms, 15_000);
    assert_eq!(cfg.ready_timeout_secs, 30);
    assert_eq!(cfg.nav_timeout_secs, 60);
    assert_eq!(cfg.send_delay_ms, 1000);
    assert!(cfg.link_host.is_none());
    assert!(!cfg.image_only);
    assert_eq!(cfg.seen_match, SeenMatchPolicy::Substring);
    assert_eq!(cfg.webhook_timeout_secs, 30);
    assert_eq!(cfg.webhook_max_retries, 3);
    assert_eq!(cfg.webhook_backoff_base_secs, 1);
    assert_eq!(cfg.groups.len(), 1);
    assert_eq!(cfg.groups[0].profiles, vec!["alice", "bob"]);
}

#[test]
fn step_budget_follows_post_limit_when_unset() {
    let mut map = full_env();
    map.insert("POSTWATCH_POST_LIMIT", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.step_budget, 5);
}

#[test]
fn step_budget_override() {
    let mut map = full_env();
    map.insert("POSTWATCH_STEP_BUDGET", "40");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.step_budget, 40);
}

#[test]
fn default_step_budget_rounds_up() {
    assert_eq!(default_step_budget(0), 0);
    assert_eq!(default_step_budget(1), 2);
    assert_eq!(default_step_budget(10), 15);
    assert_eq!(default_step_budget(11), 17);
}

#[test]
fn site_url_trailing_slash_is_trimmed() {
    let mut map = full_env();
    map.insert("POSTWATCH_SITE_URL", "https://twitter.com/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.site_url, "https://twitter.com");
    assert_eq!(cfg.site_host(), "twitter.com");
}

#[test]
fn post_limit_invalid() {
    let mut map = full_env();
    map.insert("POSTWATCH_POST_LIMIT", "ten");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTWATCH_POST_LIMIT"),
        "expected InvalidEnvVar(POSTWATCH_POST_LIMIT), got: {result:?}"
    );
}

#[test]
fn send_delay_ms_override() {
    let mut map = full_env();
    map.insert("POSTWATCH_SEND_DELAY_MS", "2500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.send_delay_ms, 2500);
}

#[test]
fn send_delay_ms_invalid() {
    let mut map = full_env();
    map.insert("POSTWATCH_SEND_DELAY_MS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTWATCH_SEND_DELAY_MS"),
        "got: {result:?}"
    );
}

#[test]
fn zero_max_empty_steps_is_rejected() {
    let mut map = full_env();
    map.insert("POSTWATCH_MAX_EMPTY_STEPS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTWATCH_MAX_EMPTY_STEPS"),
        "got: {result:?}"
    );
}

#[test]
fn link_host_override() {
    let mut map = full_env();
    map.insert("POSTWATCH_LINK_HOST", " fixupx.com ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.link_host.as_deref(), Some("fixupx.com"));
}

#[test]
fn blank_link_host_is_none() {
    let mut map = full_env();
    map.insert("POSTWATCH_LINK_HOST", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.link_host.is_none());
}

#[test]
fn image_only_accepts_common_booleans() {
    for (raw, expected) in [("true", true), ("1", true), ("YES", true), ("off", false)] {
        let mut map = full_env();
        map.insert("POSTWATCH_IMAGE_ONLY", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.image_only, expected, "for {raw}");
    }
}

#[test]
fn image_only_invalid() {
    let mut map = full_env();
    map.insert("POSTWATCH_IMAGE_ONLY", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTWATCH_IMAGE_ONLY"),
        "got: {result:?}"
    );
}

#[test]
fn seen_match_exact() {
    let mut map = full_env();
    map.insert("POSTWATCH_SEEN_MATCH", "Exact");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.seen_match, SeenMatchPolicy::Exact);
}

#[test]
fn seen_match_unknown_fails() {
    let err = parse_seen_match("fuzzy").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "POSTWATCH_SEEN_MATCH"));
}

#[test]
fn incomplete_group_propagates() {
    let mut map = full_env();
    map.insert("DISCORD_WEBHOOK_2", "https://discord.test/api/webhooks/2/token");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::IncompleteGroup { index: 2, .. })),
        "got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("auth_token=abc"));
    assert!(!debug.contains("webhooks/1/token"));
}
