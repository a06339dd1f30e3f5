use serde::{Deserialize, Deserializer, Serialize};

/// A scraped item competing for a slot in the published report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsCandidate {
    pub title: String,
    pub content: String,
    pub source_platform: String,
    pub source_url: Option<String>,
    pub image: Option<String>,
}

impl NewsCandidate {
    pub fn new(title: impl Into<String>, source_platform: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            content: title.clone(),
            title,
            source_platform: source_platform.into(),
            source_url: None,
            image: None,
        }
    }

    /// Empty content falls back to the title.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.trim().is_empty() {
            self.content = content;
        }
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = non_empty(url.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = non_empty(image.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads an explicit JSON `null` as the field's default. Older history files and model
/// replies both write `null` for empty text.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One previously published item as stored in the history file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<String>,
    /// Calendar day, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// ISO-8601 creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// How a history store bounds its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep only the newest `max_entries` entries.
    Count { max_entries: usize },
    /// Keep entries whose day is no older than `today - days`.
    Days { days: u32 },
}

/// Per-platform soft quota plus the hard global cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionQuota {
    pub platforms: Vec<String>,
    pub platform_quota: usize,
    pub global_cap: usize,
}

impl SelectionQuota {
    pub fn new(platform_quota: usize, global_cap: usize) -> Self {
        Self {
            platforms: Vec::new(),
            platform_quota,
            global_cap,
        }
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }
}

/// Candidate projection handed to the selector service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorInput {
    pub title: String,
    pub content: String,
    pub source_platform: String,
    pub source_url: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolishedItem {
    #[serde(deserialize_with = "null_as_default")]
    pub rank: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source_platform: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
}

impl PolishedItem {
    pub fn headline(title: impl Into<String>) -> Self {
        Self {
            rank: 0,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn from_candidate(rank: u32, candidate: &NewsCandidate) -> Self {
        Self {
            rank,
            title: candidate.title.clone(),
            content: candidate.content.clone(),
            source_platform: candidate.source_platform.clone(),
            source_url: candidate.source_url.clone().unwrap_or_default(),
            image: candidate.image.clone().unwrap_or_default(),
        }
    }

    pub fn is_headline(&self) -> bool {
        self.rank == 0
    }
}

/// Final ranked report: rank 0 headline followed by the selected articles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolishedReport {
    pub news: Vec<PolishedItem>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub total: usize,
}

impl PolishedReport {
    pub fn articles(&self) -> impl Iterator<Item = &PolishedItem> {
        self.news.iter().filter(|item| !item.is_headline())
    }
}
