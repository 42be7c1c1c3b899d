//! Headless Chromium implementation of [`AuthenticatedPage`].
//!
//! The session owns the browser process, its CDP event-loop task, and one
//! page that is reused for every profile of a run. It must be released with
//! [`ChromiumSession::close`] on every exit path.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::CollectorError;
use crate::page::AuthenticatedPage;
use crate::types::RawPost;

/// Poll interval used while waiting for a selector to appear.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Serialises every rendered `article` into the [`RawPost`] JSON shape.
///
/// Returned as a string so the result survives CDP's by-value transfer
/// without depending on remote-object handling.
const EXTRACT_POSTS_JS: &str = r#"
JSON.stringify(Array.from(document.querySelectorAll("article")).map(a => {
  const link = a.querySelector('a[href*="/status/"]');
  const time = a.querySelector("time");
  const text = a.querySelector("div[lang]");
  return {
    url: link ? link.href : null,
    datetime: time ? time.getAttribute("datetime") : null,
    text: text && text.textContent ? text.textContent.trim() : null,
    hasImage: a.querySelector("img[alt='Image']") !== null
  };
}))
"#;

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Cookie header (`name=value; name2=value2`) for the logged-in session.
    pub cookie_header: String,
    /// Host the cookies are scoped to, without a leading dot.
    pub cookie_host: String,
    pub nav_timeout: Duration,
    /// Pass `--no-sandbox`; needed when running as root in containers.
    pub no_sandbox: bool,
}

/// Splits a `name=value; name2=value2` header into cookie pairs.
///
/// Pairs are separated by `;`, names from values by the first `=`, so values
/// may themselves contain `=`. Blank segments are skipped.
///
/// # Errors
///
/// Returns [`CollectorError::InvalidCookie`] for a segment without `=` or
/// with an empty name, and when the header holds no cookie at all.
pub fn parse_cookie_header(header: &str) -> Result<Vec<(String, String)>, CollectorError> {
    let mut pairs = Vec::new();
    for segment in header.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (name, value) = segment
            .split_once('=')
            .ok_or_else(|| CollectorError::InvalidCookie(format!("missing '=' in \"{segment}\"")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CollectorError::InvalidCookie(format!(
                "empty cookie name in \"{segment}\""
            )));
        }
        pairs.push((name.to_owned(), value.trim().to_owned()));
    }
    if pairs.is_empty() {
        return Err(CollectorError::InvalidCookie("no cookies present".to_owned()));
    }
    Ok(pairs)
}

pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    nav_timeout: Duration,
}

impl ChromiumSession {
    /// Launches headless Chromium, installs the session cookies, and opens the
    /// page that every profile fetch will reuse.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidCookie`] for a malformed cookie header
    /// and [`CollectorError::Browser`] if the browser cannot be started.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, CollectorError> {
        let cookies = parse_cookie_header(&options.cookie_header)?;

        let mut builder = BrowserConfig::builder().request_timeout(options.nav_timeout);
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(CollectorError::Browser)?;

        tracing::info!("launching headless browser");
        let (mut browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser event loop stopped");
                    break;
                }
            }
        });

        let page = match open_page(&browser, &cookies, &options.cookie_host).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!(error = %close_err, "failed to close browser after setup error");
                }
                handler.abort();
                return Err(e);
            }
        };

        tracing::info!(cookies = cookies.len(), "browser session ready");
        Ok(Self {
            browser,
            handler,
            page,
            nav_timeout: options.nav_timeout,
        })
    }

    /// Closes the browser and stops the event-loop task.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Browser`] if the close command fails; the
    /// event-loop task is stopped either way.
    pub async fn close(mut self) -> Result<(), CollectorError> {
        tracing::info!("closing browser");
        let result = self.browser.close().await;
        if result.is_ok() {
            if let Err(e) = self.browser.wait().await {
                tracing::debug!(error = %e, "failed to reap browser process");
            }
        }
        self.handler.abort();
        result.map(|_| ()).map_err(CollectorError::from)
    }
}

/// `https://<host>/`, the page cookies are installed from.
fn cookie_origin(cookie_host: &str) -> String {
    format!("https://{}/", cookie_host.trim_start_matches('.'))
}

/// Session cookies scoped to `.<host>`, path `/`, secure.
fn cookie_params(
    cookies: &[(String, String)],
    cookie_host: &str,
) -> Result<Vec<CookieParam>, CollectorError> {
    let origin = cookie_origin(cookie_host);
    let domain = format!(".{}", cookie_host.trim_start_matches('.'));
    cookies
        .iter()
        .map(|(name, value)| {
            CookieParam::builder()
                .name(name.clone())
                .value(value.clone())
                .url(origin.clone())
                .domain(domain.clone())
                .path("/")
                .secure(true)
                .build()
                .map_err(CollectorError::InvalidCookie)
        })
        .collect()
}

/// Opens the shared page on the site origin, then installs the cookies.
/// Chromium refuses cookies for a page that is not on an http(s) URL.
async fn open_page(
    browser: &Browser,
    cookies: &[(String, String)],
    cookie_host: &str,
) -> Result<Page, CollectorError> {
    let params = cookie_params(cookies, cookie_host)?;
    let origin = cookie_origin(cookie_host);
    let page = browser
        .new_page(origin.as_str())
        .await
        .map_err(|e| CollectorError::Navigation {
            url: origin.clone(),
            reason: e.to_string(),
        })?;
    page.set_cookies(params).await?;
    Ok(page)
}

#[async_trait]
impl AuthenticatedPage for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), CollectorError> {
        tracing::debug!(url, "navigating");
        match tokio::time::timeout(self.nav_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CollectorError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CollectorError::Timeout {
                what: format!("navigation to {url}"),
                secs: self.nav_timeout.as_secs(),
            }),
        }
    }

    async fn scroll_by(&self, pixels: u32) -> Result<(), CollectorError> {
        self.page
            .evaluate(format!("window.scrollBy(0, {pixels})"))
            .await?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), CollectorError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| CollectorError::Timeout {
                what: format!("selector \"{selector}\""),
                secs: timeout.as_secs(),
            })
    }

    async fn extract_posts(&self) -> Result<Vec<RawPost>, CollectorError> {
        let json: String = self
            .page
            .evaluate(EXTRACT_POSTS_JS)
            .await?
            .into_value()
            .map_err(|e| CollectorError::Extraction(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| CollectorError::Extraction(e.to_string()))
    }
}
