//! Wires config into a browser session, destinations, and the group router.

use std::time::Duration;

use anyhow::Context;
use postwatch_collector::{
    BrowserOptions, ChromiumSession, CollectorOptions, FeedCollector, RecencyFilter,
};
use postwatch_core::{AppConfig, Group};
use postwatch_notify::{
    Destinations, DiscordWebhook, DryRunNotifier, Notifier, NotifyError, WebhookOptions,
};
use postwatch_pipeline::{
    BlobStore, DedupStore, Dispatcher, FsBlobStore, GroupRouter, LinkRewrite, ReadOnlyStore,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct RunArgs {
    pub group: Option<u32>,
    pub dry_run: bool,
    pub no_sandbox: bool,
    pub verbose: bool,
}

/// Groups to process: all of them, or the one named by `--group`.
pub(crate) fn select_groups(groups: &[Group], only: Option<u32>) -> anyhow::Result<Vec<Group>> {
    match only {
        None => Ok(groups.to_vec()),
        Some(id) => {
            let selected: Vec<Group> = groups.iter().filter(|g| g.id == id).cloned().collect();
            if selected.is_empty() {
                anyhow::bail!("group {id} is not configured");
            }
            Ok(selected)
        }
    }
}

/// One line per group, without webhook URLs.
pub(crate) fn describe_groups(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .map(|g| {
            format!(
                "{}\t{}\t{}\t{} profiles\t{}",
                g.id,
                g.destination_key,
                g.webhook_var,
                g.profiles.len(),
                g.profiles.join(", ")
            )
        })
        .collect()
}

fn open_destinations(
    config: &AppConfig,
    groups: &[Group],
    dry_run: bool,
) -> Result<Destinations<Box<dyn Notifier>>, NotifyError> {
    let options = WebhookOptions {
        timeout_secs: config.webhook_timeout_secs,
        max_retries: config.webhook_max_retries,
        backoff_base_secs: config.webhook_backoff_base_secs,
    };
    Destinations::open(groups, |group| {
        let channel: Box<dyn Notifier> = if dry_run {
            Box::new(DryRunNotifier::new(&group.destination_key))
        } else {
            Box::new(DiscordWebhook::new(
                &group.webhook_url,
                &group.destination_key,
                &options,
            )?)
        };
        Ok(channel)
    })
}

fn build_router(config: &AppConfig, args: &RunArgs) -> GroupRouter<Box<dyn BlobStore>> {
    let fs = FsBlobStore::new(&config.state_dir);
    let blobs: Box<dyn BlobStore> = if args.dry_run {
        Box::new(ReadOnlyStore::new(fs))
    } else {
        Box::new(fs)
    };
    let rewrite = config
        .link_host
        .as_deref()
        .map(|to| LinkRewrite::new(&config.site_host(), to));
    let dispatcher = Dispatcher::new(
        DedupStore::new(blobs),
        Duration::from_millis(config.send_delay_ms),
    )
    .with_rewrite(rewrite);

    GroupRouter::new(
        FeedCollector::new(
            &config.site_url,
            CollectorOptions::from_config(config, args.verbose),
        ),
        RecencyFilter::new(&config.site_url, config.window_days, config.post_limit),
        dispatcher,
    )
}

/// Runs the full pipeline once.
///
/// The browser session and every destination channel are released on all
/// exit paths after they are opened.
///
/// # Errors
///
/// Fails on an unknown `--group`, an unusable webhook URL, a browser that
/// cannot start, or when every profile failed.
pub(crate) async fn execute(config: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    let groups = select_groups(&config.groups, args.group)?;
    tracing::info!(
        groups = groups.len(),
        dry_run = args.dry_run,
        state_dir = %config.state_dir.display(),
        "starting run"
    );

    let router = build_router(config, args);
    let destinations =
        open_destinations(config, &groups, args.dry_run).context("failed to open destinations")?;

    let browser = BrowserOptions {
        cookie_header: config.cookie_header.clone(),
        cookie_host: config.site_host(),
        nav_timeout: Duration::from_secs(config.nav_timeout_secs),
        no_sandbox: args.no_sandbox,
    };
    let session = match ChromiumSession::launch(&browser).await {
        Ok(session) => session,
        Err(e) => {
            destinations.close_all().await;
            return Err(e).context("failed to start browser session");
        }
    };

    let summary = router.run(&session, &groups, destinations).await;

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    if summary.profiles > 0 && summary.profiles_failed == summary.profiles {
        anyhow::bail!("all {} profiles failed", summary.profiles);
    }
    Ok(())
}
