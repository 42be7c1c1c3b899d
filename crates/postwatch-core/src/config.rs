use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, SeenMatchPolicy};
use crate::groups::build_groups;
use crate::ConfigError;

/// Reads `.env` (if present) into the process environment, then builds the
/// config from it.
///
/// # Errors
///
/// Returns `ConfigError` for a missing cookie header, an unparsable value,
/// or missing/incomplete destination groups.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Builds the config from the process environment only, without `.env`.
///
/// # Errors
///
/// See [`load_app_config`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Default step budget for a target post count: `ceil(1.5 * limit)`.
pub fn default_step_budget(post_limit: usize) -> u32 {
    let budget = post_limit.saturating_mul(3).div_ceil(2);
    u32::try_from(budget).unwrap_or(u32::MAX)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let cookie_header = require("X_COOKIE_HEADER")?;
    let site_url = or_default("POSTWATCH_SITE_URL", "https://x.com")
        .trim_end_matches('/')
        .to_owned();
    let state_dir = PathBuf::from(or_default("POSTWATCH_STATE_DIR", "./state"));
    let log_level = or_default("POSTWATCH_LOG_LEVEL", "info");

    let post_limit = parse_value::<usize>(
        "POSTWATCH_POST_LIMIT",
        &or_default("POSTWATCH_POST_LIMIT", "10"),
    )?;
    let window_days = parse_value::<u32>(
        "POSTWATCH_WINDOW_DAYS",
        &or_default("POSTWATCH_WINDOW_DAYS", "7"),
    )?;
    let max_empty_steps = parse_value::<u32>(
        "POSTWATCH_MAX_EMPTY_STEPS",
        &or_default("POSTWATCH_MAX_EMPTY_STEPS", "5"),
    )?;
    if max_empty_steps == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTWATCH_MAX_EMPTY_STEPS".to_owned(),
            reason: "must be at least 1".to_owned(),
        });
    }
    let step_budget = match lookup("POSTWATCH_STEP_BUDGET") {
        Ok(raw) => parse_value::<u32>("POSTWATCH_STEP_BUDGET", &raw)?,
        Err(_) => default_step_budget(post_limit),
    };
    let scroll_px = parse_value::<u32>(
        "POSTWATCH_SCROLL_PX",
        &or_default("POSTWATCH_SCROLL_PX", "700"),
    )?;

    let settle_delay_ms = parse_num("POSTWATCH_SETTLE_DELAY_MS", "1000")?;
    let initial_wait_ms = parse_num("POSTWATCH_INITIAL_WAIT_MS", "15000")?;
    let ready_timeout_secs = parse_num("POSTWATCH_READY_TIMEOUT_SECS", "30")?;
    let nav_timeout_secs = parse_num("POSTWATCH_NAV_TIMEOUT_SECS", "60")?;
    let send_delay_ms = parse_num("POSTWATCH_SEND_DELAY_MS", "1000")?;

    let link_host = lookup("POSTWATCH_LINK_HOST")
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty());
    let image_only = parse_bool(
        "POSTWATCH_IMAGE_ONLY",
        &or_default("POSTWATCH_IMAGE_ONLY", "false"),
    )?;
    let seen_match = parse_seen_match(&or_default("POSTWATCH_SEEN_MATCH", "substring"))?;

    let webhook_timeout_secs = parse_num("POSTWATCH_WEBHOOK_TIMEOUT_SECS", "30")?;
    let webhook_max_retries = parse_value::<u32>(
        "POSTWATCH_WEBHOOK_MAX_RETRIES",
        &or_default("POSTWATCH_WEBHOOK_MAX_RETRIES", "3"),
    )?;
    let webhook_backoff_base_secs = parse_num("POSTWATCH_WEBHOOK_BACKOFF_BASE_SECS", "1")?;

    let groups = build_groups(&lookup)?;

    Ok(AppConfig {
        cookie_header,
        site_url,
        state_dir,
        log_level,
        post_limit,
        window_days,
        max_empty_steps,
        step_budget,
        scroll_px,
        settle_delay_ms,
        initial_wait_ms,
        ready_timeout_secs,
        nav_timeout_secs,
        send_delay_ms,
        link_host,
        image_only,
        seen_match,
        webhook_timeout_secs,
        webhook_max_retries,
        webhook_backoff_base_secs,
        groups,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

/// `exact` or `substring`, case-insensitive.
fn parse_seen_match(s: &str) -> Result<SeenMatchPolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "exact" => Ok(SeenMatchPolicy::Exact),
        "substring" => Ok(SeenMatchPolicy::Substring),
        other => Err(ConfigError::InvalidEnvVar {
            var: "POSTWATCH_SEEN_MATCH".to_string(),
            reason: format!("expected \"exact\" or \"substring\", got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
