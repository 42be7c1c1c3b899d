//! Scroll-driven timeline collection.
//!
//! The timeline loads lazily and gives no "finished loading" signal, so the
//! collector scrolls a fixed increment, waits a settle delay, and re-reads
//! the rendered posts. It stops after `step_budget` steps or after
//! `max_empty_steps` consecutive steps that produced nothing new.

use std::time::Duration;

use postwatch_core::{AppConfig, SeenMatchPolicy};

use crate::error::CollectorError;
use crate::page::AuthenticatedPage;
use crate::types::PostRecord;

/// Selector that marks one rendered post on the timeline.
pub const POST_SELECTOR: &str = "article";

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Number of posts the caller ultimately wants.
    pub target_count: usize,
    /// Hard cap on scroll steps.
    pub step_budget: u32,
    /// Consecutive steps without a new post before giving up early.
    pub max_empty_steps: u32,
    pub scroll_px: u32,
    pub settle_delay: Duration,
    /// Fixed pause after navigation, before waiting for the first post.
    pub initial_wait: Duration,
    /// Bound on waiting for the first post element.
    pub ready_timeout: Duration,
    /// Drop posts without an attached image.
    pub image_only: bool,
    pub seen_match: SeenMatchPolicy,
    /// Log per-step counts at `info` instead of `debug`.
    pub verbose: bool,
}

impl CollectorOptions {
    /// Options for `target_count` posts with the stock timing values.
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            step_budget: postwatch_core::config::default_step_budget(target_count),
            max_empty_steps: 5,
            scroll_px: 700,
            settle_delay: Duration::from_secs(1),
            initial_wait: Duration::from_secs(15),
            ready_timeout: Duration::from_secs(30),
            image_only: false,
            seen_match: SeenMatchPolicy::default(),
            verbose: false,
        }
    }

    pub fn from_config(config: &AppConfig, verbose: bool) -> Self {
        Self {
            target_count: config.post_limit,
            step_budget: config.step_budget,
            max_empty_steps: config.max_empty_steps,
            scroll_px: config.scroll_px,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            initial_wait: Duration::from_millis(config.initial_wait_ms),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            image_only: config.image_only,
            seen_match: config.seen_match,
            verbose,
        }
    }
}

/// Raw post URLs already collected in one session.
///
/// Matching is by [`SeenMatchPolicy`]; under `Substring`, a candidate is seen
/// if it contains or is contained in any earlier URL.
#[derive(Debug, Clone)]
pub struct SeenUrls {
    policy: SeenMatchPolicy,
    urls: Vec<String>,
}

impl SeenUrls {
    pub fn new(policy: SeenMatchPolicy) -> Self {
        Self {
            policy,
            urls: Vec::new(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        match self.policy {
            SeenMatchPolicy::Exact => self.urls.iter().any(|seen| seen == url),
            SeenMatchPolicy::Substring => self
                .urls
                .iter()
                .any(|seen| url.contains(seen.as_str()) || seen.contains(url)),
        }
    }

    /// Records `url` and returns `true` if it was not seen before.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.urls.push(url.to_owned());
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

pub struct FeedCollector {
    site_url: String,
    options: CollectorOptions,
}

impl FeedCollector {
    pub fn new(site_url: &str, options: CollectorOptions) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_owned(),
            options,
        }
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// Timeline URL for `profile`.
    pub fn profile_url(&self, profile: &str) -> String {
        format!("{}/{profile}", self.site_url)
    }

    /// Loads the profile timeline and collects its posts.
    ///
    /// Never fails: any page error is logged and yields an empty list, so a
    /// broken profile does not stop the rest of the run.
    pub async fn collect_profile<P>(&self, page: &P, profile: &str) -> Vec<PostRecord>
    where
        P: AuthenticatedPage + ?Sized,
    {
        match self.try_collect_profile(page, profile).await {
            Ok(records) => {
                tracing::info!(profile, count = records.len(), "fetched posts");
                records
            }
            Err(e) => {
                tracing::error!(profile, error = %e, "failed to fetch posts");
                Vec::new()
            }
        }
    }

    /// Fallible form of [`Self::collect_profile`].
    ///
    /// # Errors
    ///
    /// Propagates navigation, ready-wait, scroll, and extraction failures.
    pub async fn try_collect_profile<P>(
        &self,
        page: &P,
        profile: &str,
    ) -> Result<Vec<PostRecord>, CollectorError>
    where
        P: AuthenticatedPage + ?Sized,
    {
        let url = self.profile_url(profile);
        tracing::info!(
            profile,
            url = %url,
            target = self.options.target_count,
            step_budget = self.options.step_budget,
            "loading profile timeline"
        );
        page.navigate(&url).await?;
        page.pause(self.options.initial_wait).await;
        page.wait_for_selector(POST_SELECTOR, self.options.ready_timeout)
            .await?;
        self.collect_loaded(page, profile).await
    }

    /// Runs the scroll/extract loop on a page that already shows posts.
    ///
    /// Returns records in first-seen order. An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Propagates scroll and extraction failures.
    pub async fn collect_loaded<P>(
        &self,
        page: &P,
        profile: &str,
    ) -> Result<Vec<PostRecord>, CollectorError>
    where
        P: AuthenticatedPage + ?Sized,
    {
        let opts = &self.options;
        let mut seen = SeenUrls::new(opts.seen_match);
        let mut results: Vec<PostRecord> = Vec::new();
        let mut empty_steps = 0u32;

        for step in 1..=opts.step_budget {
            page.scroll_by(opts.scroll_px).await?;
            page.pause(opts.settle_delay).await;

            let rendered = page.extract_posts().await?;
            let rendered_count = rendered.len();

            let mut added = 0usize;
            for record in rendered.into_iter().filter_map(crate::types::RawPost::into_record) {
                if opts.image_only && !record.has_image {
                    continue;
                }
                if seen.insert(&record.url) {
                    results.push(record);
                    added += 1;
                }
            }

            if opts.verbose {
                tracing::info!(profile, step, rendered = rendered_count, added, "scroll step");
            } else {
                tracing::debug!(profile, step, rendered = rendered_count, added, "scroll step");
            }

            if added == 0 {
                empty_steps += 1;
                tracing::debug!(
                    profile,
                    empty_steps,
                    max_empty_steps = opts.max_empty_steps,
                    "no new posts in step"
                );
                if empty_steps >= opts.max_empty_steps {
                    break;
                }
            } else {
                empty_steps = 0;
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod tests;
