//! Canonical identity for post URLs.
//!
//! Two links to the same post must collapse to the same key regardless of
//! tracking query strings, fragments, or a trailing slash, so the dedup
//! state never re-notifies a post the page happened to render differently.

use url::Url;

/// Normalizes a post URL to `origin + path`, without query, fragment, or
/// trailing slashes.
///
/// Input that does not parse as an absolute URL with a real origin falls
/// back to a plain string transform: everything from the first `?` is
/// dropped and trailing `/` characters are trimmed.
///
/// The function is total and idempotent.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) if parsed.origin().is_tuple() => {
            let origin = parsed.origin().ascii_serialization();
            let path = parsed.path().trim_end_matches('/');
            format!("{origin}{path}")
        }
        _ => fallback_normalize(trimmed),
    }
}

fn fallback_normalize(url: &str) -> String {
    let without_query = url.split_once('?').map_or(url, |(head, _)| head);
    without_query.trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
