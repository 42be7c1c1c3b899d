//! Runs collect, filter, and dispatch for every profile of every group.
//!
//! Groups and profiles are processed strictly in order on one page session.
//! A fault in one profile is logged and counted; it never stops the rest of
//! the run.

use chrono::{DateTime, Utc};
use postwatch_collector::{AuthenticatedPage, FeedCollector, RecencyFilter};
use postwatch_core::Group;
use postwatch_notify::{Destinations, Notifier};

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::ProfileError;
use crate::state::{BlobStore, StateKey};

/// Totals for one run, logged when the run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub groups: usize,
    pub profiles: usize,
    pub profiles_failed: usize,
    pub sent: usize,
    pub send_failures: usize,
}

pub struct GroupRouter<S> {
    collector: FeedCollector,
    filter: RecencyFilter,
    dispatcher: Dispatcher<S>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: BlobStore> GroupRouter<S> {
    pub fn new(collector: FeedCollector, filter: RecencyFilter, dispatcher: Dispatcher<S>) -> Self {
        Self {
            collector,
            filter,
            dispatcher,
            clock: Utc::now,
        }
    }

    /// Replaces the time source used for the recency window.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    /// Processes every group, then closes every destination channel.
    ///
    /// Channels are closed whether or not individual profiles failed.
    pub async fn run<P, N>(
        &self,
        page: &P,
        groups: &[Group],
        destinations: Destinations<N>,
    ) -> RunSummary
    where
        P: AuthenticatedPage + ?Sized,
        N: Notifier,
    {
        let mut summary = RunSummary::default();

        for group in groups {
            summary.groups += 1;
            tracing::info!(
                group = group.id,
                destination = %group.destination_key,
                profiles = group.profiles.len(),
                "processing group"
            );

            for profile in &group.profiles {
                summary.profiles += 1;
                let outcome = match destinations.get(group.id) {
                    Some(notifier) => self.run_profile(page, group, profile, notifier).await,
                    None => Err(ProfileError::MissingDestination(group.id)),
                };
                match outcome {
                    Ok(report) => {
                        summary.sent += report.sent;
                        summary.send_failures += report.failed;
                    }
                    Err(e) => {
                        tracing::error!(
                            group = group.id,
                            profile = %profile,
                            error = %e,
                            "profile pipeline failed"
                        );
                        summary.profiles_failed += 1;
                    }
                }
            }
        }

        destinations.close_all().await;

        tracing::info!(
            groups = summary.groups,
            profiles = summary.profiles,
            profiles_failed = summary.profiles_failed,
            sent = summary.sent,
            send_failures = summary.send_failures,
            "run complete"
        );
        summary
    }

    /// One profile: collect, keep recent posts by the profile, dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] when collection, filtering, or the state
    /// save fails. Individual send failures are counted, not returned.
    pub async fn run_profile<P, N>(
        &self,
        page: &P,
        group: &Group,
        profile: &str,
        notifier: &N,
    ) -> Result<DispatchReport, ProfileError>
    where
        P: AuthenticatedPage + ?Sized,
        N: Notifier + ?Sized,
    {
        let records = self.collector.try_collect_profile(page, profile).await?;
        tracing::info!(group = group.id, profile, count = records.len(), "fetched posts");

        let urls = self.filter.apply(&records, profile, (self.clock)())?;

        let key = StateKey::new(&group.destination_key, profile);
        let report = self.dispatcher.dispatch(&key, &urls, notifier).await?;
        Ok(report)
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
