use std::path::PathBuf;

use crate::Group;

/// How the collector decides whether a freshly rendered post link was
/// already seen earlier in the same scroll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeenMatchPolicy {
    /// Only an identical URL counts as seen.
    Exact,
    /// A URL counts as seen when it contains, or is contained in, a URL
    /// already seen. Tolerates suffix drift such as `/photo/1` appended by
    /// re-renders.
    #[default]
    Substring,
}

impl std::fmt::Display for SeenMatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeenMatchPolicy::Exact => write!(f, "exact"),
            SeenMatchPolicy::Substring => write!(f, "substring"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub cookie_header: String,
    pub site_url: String,
    pub state_dir: PathBuf,
    pub log_level: String,
    pub post_limit: usize,
    pub window_days: u32,
    pub max_empty_steps: u32,
    pub step_budget: u32,
    pub scroll_px: u32,
    pub settle_delay_ms: u64,
    pub initial_wait_ms: u64,
    pub ready_timeout_secs: u64,
    pub nav_timeout_secs: u64,
    pub send_delay_ms: u64,
    pub link_host: Option<String>,
    pub image_only: bool,
    pub seen_match: SeenMatchPolicy,
    pub webhook_timeout_secs: u64,
    pub webhook_max_retries: u32,
    pub webhook_backoff_base_secs: u64,
    pub groups: Vec<Group>,
}

impl AppConfig {
    /// Host part of `site_url`, used for cookie scoping and link rewriting.
    pub fn site_host(&self) -> String {
        url::Url::parse(&self.site_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_else(|| {
                self.site_url
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_owned()
            })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("cookie_header", &"[redacted]")
            .field("site_url", &self.site_url)
            .field("state_dir", &self.state_dir)
            .field("log_level", &self.log_level)
            .field("post_limit", &self.post_limit)
            .field("window_days", &self.window_days)
            .field("max_empty_steps", &self.max_empty_steps)
            .field("step_budget", &self.step_budget)
            .field("scroll_px", &self.scroll_px)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("initial_wait_ms", &self.initial_wait_ms)
            .field("ready_timeout_secs", &self.ready_timeout_secs)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("send_delay_ms", &self.send_delay_ms)
            .field("link_host", &self.link_host)
            .field("image_only", &self.image_only)
            .field("seen_match", &self.seen_match)
            .field("webhook_timeout_secs", &self.webhook_timeout_secs)
            .field("webhook_max_retries", &self.webhook_max_retries)
            .field(
                "webhook_backoff_base_secs",
                &self.webhook_backoff_base_secs,
            )
            .field("groups", &self.groups)
            .finish()
    }
}
