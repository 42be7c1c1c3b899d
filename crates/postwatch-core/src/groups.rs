//! Destination groups: one webhook bound to an ordered list of profiles.

use crate::ConfigError;

/// Highest numbered group slot scanned in the environment.
pub const MAX_GROUPS: u32 = 50;

/// Group id assigned to the legacy single-destination configuration.
pub const LEGACY_GROUP_ID: u32 = 0;

/// A destination plus the profiles routed to it, in declared order.
#[derive(Clone, PartialEq, Eq)]
pub struct Group {
    pub id: u32,
    /// Stable key naming this destination in persisted dedup state.
    pub destination_key: String,
    /// Env var the webhook URL was read from, kept for log lines.
    pub webhook_var: String,
    pub webhook_url: String,
    pub profiles: Vec<String>,
}

impl Group {
    pub fn new(id: u32, webhook_var: &str, webhook_url: &str, profiles: Vec<String>) -> Self {
        Self {
            id,
            destination_key: format!("group_{id}"),
            webhook_var: webhook_var.to_owned(),
            webhook_url: webhook_url.to_owned(),
            profiles,
        }
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("destination_key", &self.destination_key)
            .field("webhook_var", &self.webhook_var)
            .field("webhook_url", &"[redacted]")
            .field("profiles", &self.profiles)
            .finish()
    }
}

/// Splits a profile list on real newlines (`\n`, `\r\n`) or the literal
/// two-character sequence `\n`, as written by single-line `.env` editors.
///
/// Entries are trimmed and blank entries dropped.
pub fn parse_profile_list(raw: &str) -> Vec<String> {
    raw.replace("\\n", "\n")
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Discovers groups from `DISCORD_WEBHOOK_<i>` / `X_USERNAMES<i>` pairs for
/// `i` in `1..=MAX_GROUPS`. Slots with neither variable are skipped.
///
/// When no numbered slot is present, the legacy pair `DISCORD_WEBHOOK` /
/// `X_USERNAMES` is accepted as group `0`.
///
/// # Errors
///
/// - [`ConfigError::IncompleteGroup`] if only one half of a pair is set.
/// - [`ConfigError::NoGroups`] if nothing is configured.
pub fn build_groups<F>(lookup: F) -> Result<Vec<Group>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let non_empty = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());

    let mut groups = Vec::new();
    for index in 1..=MAX_GROUPS {
        let webhook_var = format!("DISCORD_WEBHOOK_{index}");
        let profiles_var = format!("X_USERNAMES{index}");
        if let Some(group) = read_group(index, &webhook_var, &profiles_var, &non_empty)? {
            groups.push(group);
        }
    }

    if groups.is_empty() {
        if let Some(group) =
            read_group(LEGACY_GROUP_ID, "DISCORD_WEBHOOK", "X_USERNAMES", &non_empty)?
        {
            groups.push(group);
        }
    }

    if groups.is_empty() {
        return Err(ConfigError::NoGroups);
    }
    Ok(groups)
}

fn read_group(
    index: u32,
    webhook_var: &str,
    profiles_var: &str,
    non_empty: &dyn Fn(&str) -> Option<String>,
) -> Result<Option<Group>, ConfigError> {
    let webhook_url = non_empty(webhook_var);
    let profiles = non_empty(profiles_var)
        .map(|raw| parse_profile_list(&raw))
        .unwrap_or_default();

    match (webhook_url, profiles.is_empty()) {
        (None, true) => Ok(None),
        (None, false) => Err(ConfigError::IncompleteGroup {
            index,
            missing: webhook_var.to_owned(),
        }),
        (Some(_), true) => Err(ConfigError::IncompleteGroup {
            index,
            missing: profiles_var.to_owned(),
        }),
        (Some(url), false) => Ok(Some(Group::new(index, webhook_var, url.trim(), profiles))),
    }
}
