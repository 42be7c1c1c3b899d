use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::types::RawPost;

/// Scripted page: each scroll step pops the next batch of rendered posts.
/// Once the script runs out, the last batch keeps being rendered.
struct FakePage {
    batches: Mutex<VecDeque<Vec<RawPost>>>,
    last: Mutex<Vec<RawPost>>,
    scrolls: AtomicU32,
    ready: bool,
    navigated: Mutex<Vec<String>>,
}

impl FakePage {
    fn new(batches: Vec<Vec<RawPost>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            last: Mutex::new(Vec::new()),
            scrolls: AtomicU32::new(0),
            ready: true,
            navigated: Mutex::new(Vec::new()),
        }
    }

    fn never_ready() -> Self {
        Self {
            ready: false,
            ..Self::new(vec![vec![post(1, "2026-10-15T00:00:00Z")]])
        }
    }

    fn scrolls(&self) -> u32 {
        self.scrolls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticatedPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), CollectorError> {
        self.navigated.lock().unwrap().push(url.to_owned());
        Ok(())
    }

    async fn scroll_by(&self, _pixels: u32) -> Result<(), CollectorError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self, _duration: Duration) {}

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), CollectorError> {
        if self.ready {
            Ok(())
        } else {
            Err(CollectorError::Timeout {
                what: selector.to_owned(),
                secs: timeout.as_secs(),
            })
        }
    }

    async fn extract_posts(&self) -> Result<Vec<RawPost>, CollectorError> {
        let mut last = self.last.lock().unwrap();
        if let Some(batch) = self.batches.lock().unwrap().pop_front() {
            *last = batch;
        }
        Ok(last.clone())
    }
}

fn post(id: u64, datetime: &str) -> RawPost {
    RawPost {
        url: Some(format!("https://x.com/alice/status/{id}")),
        datetime: Some(datetime.to_owned()),
        text: Some(format!("post {id}")),
        has_image: false,
    }
}

fn options(step_budget: u32, max_empty_steps: u32) -> CollectorOptions {
    CollectorOptions {
        step_budget,
        max_empty_steps,
        settle_delay: Duration::ZERO,
        initial_wait: Duration::ZERO,
        ready_timeout: Duration::ZERO,
        ..CollectorOptions::new(10)
    }
}

fn collector(opts: CollectorOptions) -> FeedCollector {
    FeedCollector::new("https://x.com/", opts)
}

#[tokio::test]
async fn always_empty_page_stops_after_max_empty_steps() {
    let page = FakePage::new(vec![]);
    let records = collector(options(15, 5))
        .collect_loaded(&page, "alice")
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(page.scrolls(), 5, "should stop at max_empty_steps, not step_budget");
}

#[tokio::test]
async fn step_budget_caps_loop_when_posts_keep_arriving() {
    let batches = (1..=20)
        .map(|i| vec![post(i, "2026-10-15T00:00:00Z")])
        .collect();
    let page = FakePage::new(batches);
    let records = collector(options(4, 5))
        .collect_loaded(&page, "alice")
        .await
        .unwrap();
    assert_eq!(page.scrolls(), 4);
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn new_post_resets_empty_counter() {
    let a = post(1, "2026-10-15T00:00:00Z");
    let b = post(2, "2026-10-14T00:00:00Z");
    // step1: a (new), step2: a (empty 1), step3: a+b (new, reset),
    // then b repeats: empty 1, 2 -> stop at step 5.
    let page = FakePage::new(vec![
        vec![a.clone()],
        vec![a.clone()],
        vec![a.clone(), b.clone()],
    ]);
    let records = collector(options(15, 2))
        .collect_loaded(&page, "alice")
        .await
        .unwrap();
    assert_eq!(page.scrolls(), 5);
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://x.com/alice/status/1", "https://x.com/alice/status/2"]
    );
}

#[tokio::test]
async fn incomplete_elements_are_discarded() {
    let mut no_time = post(2, "2026-10-15T00:00:00Z");
    no_time.datetime = None;
    let mut no_url = post(3, "2026-10-15T00:00:00Z");
    no_url.url = None;
    let page = FakePage::new(vec![vec![post(1, "2026-10-15T00:00:00Z"), no_time, no_url]]);
    let records = collector(options(3, 1))
        .collect_loaded(&page, "alice")
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://x.com/alice/status/1");
}

#[tokio::test]
async fn image_only_drops_posts_without_image() {
    let mut with_image = post(1, "2026-10-15T00:00:00Z");
    with_image.has_image = true;
    let page = FakePage::new(vec![vec![with_image, post(2, "2026-10-15T00:00:00Z")]]);
    let opts = CollectorOptions {
        image_only: true,
        ..options(3, 1)
    };
    let records = collector(opts).collect_loaded(&page, "alice").await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].has_image);
}

#[tokio::test]
async fn substring_policy_suppresses_suffix_drift() {
    let base = post(1, "2026-10-15T00:00:00Z");
    let mut drifted = base.clone();
    drifted.url = Some("https://x.com/alice/status/1/photo/1".to_owned());
    let page = FakePage::new(vec![vec![base], vec![drifted]]);
    let records = collector(options(2, 5))
        .collect_loaded(&page, "alice")
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn exact_policy_keeps_suffix_variants() {
    let base = post(1, "2026-10-15T00:00:00Z");
    let mut drifted = base.clone();
    drifted.url = Some("https://x.com/alice/status/1/photo/1".to_owned());
    let page = FakePage::new(vec![vec![base], vec![drifted]]);
    let opts = CollectorOptions {
        seen_match: SeenMatchPolicy::Exact,
        ..options(2, 5)
    };
    let records = collector(opts).collect_loaded(&page, "alice").await.unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn substring_policy_matches_both_directions() {
    let mut seen = SeenUrls::new(SeenMatchPolicy::Substring);
    assert!(seen.insert("https://x.com/a/status/12/photo/1"));
    assert!(!seen.insert("https://x.com/a/status/12"));
    assert!(!seen.insert("https://x.com/a/status/12/photo/1/extra"));
    assert_eq!(seen.len(), 1);
}

#[test]
fn substring_policy_can_suppress_prefix_ids() {
    // Known false positive: status/12 is a substring of status/123.
    let mut seen = SeenUrls::new(SeenMatchPolicy::Substring);
    assert!(seen.insert("https://x.com/a/status/12"));
    assert!(!seen.insert("https://x.com/a/status/123"));

    let mut exact = SeenUrls::new(SeenMatchPolicy::Exact);
    assert!(exact.insert("https://x.com/a/status/12"));
    assert!(exact.insert("https://x.com/a/status/123"));
}

#[tokio::test]
async fn collect_profile_navigates_to_profile_url() {
    let page = FakePage::new(vec![vec![post(1, "2026-10-15T00:00:00Z")]]);
    let records = collector(options(2, 1)).collect_profile(&page, "alice").await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        page.navigated.lock().unwrap().as_slice(),
        ["https://x.com/alice".to_owned()]
    );
}

#[tokio::test]
async fn ready_timeout_yields_empty_without_scrolling() {
    let page = FakePage::never_ready();
    let collector = collector(options(10, 5));

    let err = collector.try_collect_profile(&page, "alice").await.unwrap_err();
    assert!(matches!(err, CollectorError::Timeout { .. }));

    let records = collector.collect_profile(&page, "alice").await;
    assert!(records.is_empty());
    assert_eq!(page.scrolls(), 0);
}

#[test]
fn default_options_follow_target_count() {
    let opts = CollectorOptions::new(10);
    assert_eq!(opts.step_budget, 15);
    assert_eq!(opts.max_empty_steps, 5);
    assert_eq!(opts.scroll_px, 700);
}
