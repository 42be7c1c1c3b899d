use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One post as rendered on the timeline, before validation.
///
/// Field names match the JSON produced by the in-page extraction script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    pub url: Option<String>,
    pub datetime: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub has_image: bool,
}

/// A validated post: it has a link and a parseable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub text: Option<String>,
    pub has_image: bool,
}

impl RawPost {
    /// Converts into a [`PostRecord`], or `None` when the link or timestamp
    /// is missing, blank, or not RFC 3339.
    pub fn into_record(self) -> Option<PostRecord> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let datetime = self.datetime?;
        let published_at = DateTime::parse_from_rfc3339(datetime.trim())
            .ok()?
            .with_timezone(&Utc);
        let text = self
            .text
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Some(PostRecord {
            url,
            published_at,
            text,
            has_image: self.has_image,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn raw(url: Option<&str>, datetime: Option<&str>) -> RawPost {
        RawPost {
            url: url.map(str::to_owned),
            datetime: datetime.map(str::to_owned),
            text: Some("  hello  ".to_owned()),
            has_image: true,
        }
    }

    #[test]
    fn complete_raw_post_converts() {
        let record = raw(
            Some("https://x.com/alice/status/1"),
            Some("2026-10-15T12:30:00.000Z"),
        )
        .into_record()
        .unwrap();
        assert_eq!(record.url, "https://x.com/alice/status/1");
        assert_eq!(
            record.published_at,
            Utc.with_ymd_and_hms(2026, 10, 15, 12, 30, 0).unwrap()
        );
        assert_eq!(record.text.as_deref(), Some("hello"));
        assert!(record.has_image);
    }

    #[test]
    fn missing_url_is_discarded() {
        assert!(raw(None, Some("2026-10-15T12:30:00Z")).into_record().is_none());
        assert!(raw(Some("  "), Some("2026-10-15T12:30:00Z"))
            .into_record()
            .is_none());
    }

    #[test]
    fn missing_or_bad_timestamp_is_discarded() {
        assert!(raw(Some("https://x.com/a/status/1"), None)
            .into_record()
            .is_none());
        assert!(raw(Some("https://x.com/a/status/1"), Some("yesterday"))
            .into_record()
            .is_none());
    }

    #[test]
    fn deserializes_extraction_json() {
        let json = r#"[{"url":"https://x.com/a/status/1","datetime":"2026-10-15T12:30:00.000Z","text":null,"hasImage":false},{"url":null,"datetime":null}]"#;
        let posts: Vec<RawPost> = serde_json::from_str(json).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(!posts[0].has_image);
        assert_eq!(posts[1], RawPost::default());
    }
}
