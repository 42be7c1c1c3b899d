//! Narrows collected posts to recent posts authored by the target profile.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

use crate::error::CollectorError;
use crate::types::PostRecord;

/// Matches exactly `<site>/<profile>/status/<digits>`, case-insensitive on
/// scheme and host only. Reposts, quoted posts from other accounts, and
/// media sub-paths do not match.
///
/// # Errors
///
/// Returns [`CollectorError::Pattern`] if the pattern fails to compile.
pub fn post_url_pattern(site_url: &str, profile: &str) -> Result<Regex, CollectorError> {
    let pattern = format!(
        "^(?i:{})/{}/status/[0-9]+$",
        regex::escape(site_url.trim_end_matches('/')),
        regex::escape(profile)
    );
    Regex::new(&pattern).map_err(|source| CollectorError::Pattern {
        profile: profile.to_owned(),
        source,
    })
}

/// Returns up to `limit` post URLs, newest first.
///
/// A record is kept when `published_at >= now - window` (the boundary
/// instant itself is inside the window) and its URL matches
/// [`post_url_pattern`]. Duplicate URLs (exact string match) keep their
/// first occurrence. Truncation happens last.
///
/// # Errors
///
/// Returns [`CollectorError::Pattern`] if the URL pattern cannot be built.
pub fn filter_recent(
    records: &[PostRecord],
    site_url: &str,
    profile: &str,
    window: TimeDelta,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<String>, CollectorError> {
    let pattern = post_url_pattern(site_url, profile)?;
    // An enormous window keeps everything instead of overflowing.
    let cutoff = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut recent: Vec<&PostRecord> = records
        .iter()
        .filter(|r| r.published_at >= cutoff)
        .collect();
    recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen: HashSet<&str> = HashSet::new();
    let urls = recent
        .into_iter()
        .map(|r| r.url.as_str())
        .filter(|url| seen.insert(*url))
        .filter(|url| pattern.is_match(url))
        .take(limit)
        .map(str::to_owned)
        .collect();
    Ok(urls)
}

/// [`filter_recent`] bound to a site, window, and limit.
#[derive(Debug, Clone)]
pub struct RecencyFilter {
    pub site_url: String,
    pub window_days: u32,
    pub limit: usize,
}

impl RecencyFilter {
    pub fn new(site_url: &str, window_days: u32, limit: usize) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_owned(),
            window_days,
            limit,
        }
    }

    /// # Errors
    ///
    /// See [`filter_recent`].
    pub fn apply(
        &self,
        records: &[PostRecord],
        profile: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, CollectorError> {
        let urls = filter_recent(
            records,
            &self.site_url,
            profile,
            TimeDelta::days(i64::from(self.window_days)),
            self.limit,
            now,
        )?;
        tracing::info!(
            profile,
            collected = records.len(),
            kept = urls.len(),
            window_days = self.window_days,
            "filtered posts"
        );
        Ok(urls)
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
