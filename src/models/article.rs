use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Article priority. The store treats anything unrecognized as `low`,
/// matching the column default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Low,
        })
    }
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

/// A full row from the article store. Rows are created outside this
/// client and never physically removed; `is_deleted` toggles visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List projection used by the background worker: enough to render a
/// list entry with a content preview and both timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleSummary {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some("") | None => "Untitled",
            Some(t) => t,
        }
    }

    /// Content preview for list entries, capped at 100 characters.
    pub fn preview(&self) -> String {
        let content = self.content.as_deref().unwrap_or("");
        let mut preview: String = content.chars().take(100).collect();
        if content.chars().count() > 100 {
            preview.push_str("...");
        }
        preview
    }
}

/// Lighter projection for the popup list: id and title only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleHeading {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Partial update document. `None` fields are left untouched by the
/// store; the repository stamps `updated_at` on every send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// List query options. At most one of `today`/`week` is meaningful: the
/// today bound wins when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleFilter {
    #[serde(default)]
    pub today: bool,
    #[serde(default)]
    pub week: bool,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ArticleStats {
    pub total: u64,
    pub today: u64,
    pub week: u64,
}

/// Time window selector cycled by the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    All,
    Today,
    Week,
}

impl TimeFilter {
    pub fn cycle(self) -> Self {
        match self {
            TimeFilter::All => TimeFilter::Today,
            TimeFilter::Today => TimeFilter::Week,
            TimeFilter::Week => TimeFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeFilter::All => "All",
            TimeFilter::Today => "Today",
            TimeFilter::Week => "Week",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_unknown_values_read_as_low() {
        let p: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(p, Priority::High);

        let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn article_defaults_apply_to_missing_fields() {
        let article: Article = serde_json::from_str(
            r#"{"id":1,"created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(article.priority, Priority::Low);
        assert!(!article.is_deleted);
        assert!(article.title.is_none());
        assert!(article.url.is_none());
    }

    #[test]
    fn patch_skips_unset_fields() {
        let patch = ArticlePatch {
            title: Some("X".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"title": "X"}));
    }

    #[test]
    fn summary_preview_caps_at_100_chars() {
        let summary = ArticleSummary {
            id: 1,
            title: None,
            content: Some("x".repeat(250)),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(summary.preview().chars().count(), 103);
        assert!(summary.preview().ends_with("..."));
    }

    #[test]
    fn time_filter_cycles_through_all_windows() {
        let f = TimeFilter::All;
        assert_eq!(f.cycle(), TimeFilter::Today);
        assert_eq!(f.cycle().cycle(), TimeFilter::Week);
        assert_eq!(f.cycle().cycle().cycle(), TimeFilter::All);
    }
}
