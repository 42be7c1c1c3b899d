//! Delivers new post links for one profile and records them as sent.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use postwatch_core::normalize_url;
use postwatch_notify::Notifier;

use crate::error::StateError;
use crate::state::{BlobStore, DedupStore, StateKey};

/// Rewrites links on `from_host` to `to_host` before sending, so chat
/// clients pick a host that renders embeds. Dedup identity is computed on
/// the original link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    from_host: String,
    to_host: String,
}

impl LinkRewrite {
    pub fn new(from_host: &str, to_host: &str) -> Self {
        Self {
            from_host: from_host.to_ascii_lowercase(),
            to_host: to_host.to_owned(),
        }
    }

    /// Returns `link` with its host swapped when it is exactly `from_host`.
    /// Anything else, including unparsable input, is returned unchanged.
    pub fn apply(&self, link: &str) -> String {
        let Ok(mut parsed) = url::Url::parse(link) else {
            return link.to_owned();
        };
        let matches = parsed
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(&self.from_host));
        if matches && parsed.set_host(Some(&self.to_host)).is_ok() {
            parsed.to_string()
        } else {
            link.to_owned()
        }
    }
}

/// Counts from one [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

pub struct Dispatcher<S> {
    store: DedupStore<S>,
    send_delay: Duration,
    rewrite: Option<LinkRewrite>,
}

impl<S: BlobStore> Dispatcher<S> {
    pub fn new(store: DedupStore<S>, send_delay: Duration) -> Self {
        Self {
            store,
            send_delay,
            rewrite: None,
        }
    }

    #[must_use]
    pub fn with_rewrite(mut self, rewrite: Option<LinkRewrite>) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn store(&self) -> &DedupStore<S> {
        &self.store
    }

    /// Sends every candidate whose normalized form is not yet recorded for
    /// `key`, oldest first, then records them.
    ///
    /// `candidates` is newest-first, as produced by the recency filter. A
    /// failed send is logged and still recorded, so a post is never
    /// delivered twice even if it is sometimes missed. When nothing is new,
    /// no message is sent and state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] only if the final save fails. Send failures
    /// are reported in the returned [`DispatchReport`].
    pub async fn dispatch<N>(
        &self,
        key: &StateKey,
        candidates: &[String],
        notifier: &N,
    ) -> Result<DispatchReport, StateError>
    where
        N: Notifier + ?Sized,
    {
        let existing = self.store.load(key).await;

        let mut unique = HashSet::new();
        let mut fresh: Vec<&str> = candidates
            .iter()
            .map(String::as_str)
            .filter(|url| !existing.contains(&normalize_url(url)))
            .filter(|url| unique.insert(*url))
            .collect();

        if fresh.is_empty() {
            tracing::info!(key = %key, "no new posts");
            return Ok(DispatchReport::default());
        }

        fresh.reverse();
        tracing::info!(key = %key, count = fresh.len(), "sending new posts");

        let mut report = DispatchReport::default();
        for url in &fresh {
            let message = match &self.rewrite {
                Some(rewrite) => rewrite.apply(url),
                None => (*url).to_owned(),
            };
            tracing::info!(key = %key, link = %message, "sending post");
            match notifier.notify(&message).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::error!(key = %key, link = %message, error = %e, "failed to send post");
                    report.failed += 1;
                }
            }
            if !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
        }

        let mut updated: BTreeSet<String> = existing;
        updated.extend(fresh.iter().map(|u| normalize_url(u)));
        self.store.save(key, &updated).await?;

        Ok(report)
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
