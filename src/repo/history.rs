use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use tracing::{debug, info, warn};

use crate::{
    model::{HistoryEntry, PolishedItem, RetentionPolicy},
    util::clock::beijing_now,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Size-bounded log of published items backed by a single JSON file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    retention: RetentionPolicy,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Open the store and load whatever the backing file holds.
    pub fn open(path: impl Into<PathBuf>, retention: RetentionPolicy) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            retention,
            entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Re-read the backing file, replacing the in-memory log.
    pub fn load(&mut self) -> &[HistoryEntry] {
        self.entries = load_entries(&self.path);
        &self.entries
    }

    /// Add entries to the in-memory log without persisting.
    pub fn append<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = HistoryEntry>,
    {
        self.entries.extend(entries);
    }

    /// Project published articles into history entries stamped with `now`.
    /// The headline row and untitled items are skipped. Returns the number added.
    pub fn record<'a, I>(&mut self, items: I, category: &str, now: DateTime<FixedOffset>) -> usize
    where
        I: IntoIterator<Item = &'a PolishedItem>,
    {
        let date = now.format(DATE_FORMAT).to_string();
        let timestamp = now.to_rfc3339();
        let before = self.entries.len();

        self.append(
            items
                .into_iter()
                .filter(|item| !item.is_headline() && !item.title.is_empty())
                .map(|item| HistoryEntry {
                    title: item.title.clone(),
                    content: item.content.clone(),
                    category: category.to_string(),
                    source_platform: Some(item.source_platform.clone())
                        .filter(|platform| !platform.is_empty()),
                    date: Some(date.clone()),
                    timestamp: Some(timestamp.clone()),
                }),
        );

        let added = self.entries.len() - before;
        if added > 0 {
            info!(added, category, "recorded items into history");
        }
        added
    }

    /// Apply the retention policy relative to today in report time (UTC+8).
    pub fn evict_old(&mut self) -> usize {
        self.evict_old_at(beijing_now().date_naive())
    }

    /// Apply the retention policy relative to `today`. Returns the number of entries dropped.
    pub fn evict_old_at(&mut self, today: NaiveDate) -> usize {
        let before = self.entries.len();

        match self.retention {
            RetentionPolicy::Count { max_entries } => {
                if self.entries.len() > max_entries {
                    let excess = self.entries.len() - max_entries;
                    self.entries.drain(0..excess);
                }
            }
            RetentionPolicy::Days { days } => {
                let cutoff = today - Duration::days(i64::from(days));
                self.entries
                    .retain(|entry| entry_day(entry).is_some_and(|day| day >= cutoff));
            }
        }

        let evicted = before - self.entries.len();
        if evicted > 0 {
            info!(
                evicted,
                remaining = self.entries.len(),
                policy = ?self.retention,
                "evicted old history entries"
            );
        }
        evicted
    }

    /// Rewrite the whole backing file: temporary sibling first, then rename over the target.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create history dir {:?}", parent))?;
        }

        let body = serde_json::to_string_pretty(&self.entries)
            .context("failed to serialize history entries")?;
        write_atomic(&self.path, body.as_bytes())?;

        debug!(path = ?self.path, entries = self.entries.len(), "history saved");
        Ok(())
    }
}

/// Best-effort read: a missing, unreadable or malformed file yields an empty history.
pub fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    if !path.exists() {
        debug!(path = ?path, "history file absent, starting empty");
        return Vec::new();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = ?path, error = %err, "history file unreadable, treating as empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<HistoryEntry>>(&contents) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = ?path, error = %err, "history file malformed, treating as empty");
            Vec::new()
        }
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid file path {:?}", path))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp, bytes).with_context(|| format!("failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to replace {:?}", path))?;
    Ok(())
}

/// Calendar day of an entry: `date`, or the leading day of `timestamp`.
fn entry_day(entry: &HistoryEntry) -> Option<NaiveDate> {
    if let Some(date) = entry.date.as_deref() {
        return NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok();
    }
    entry
        .timestamp
        .as_deref()
        .and_then(|ts| ts.get(..10))
        .and_then(|day| NaiveDate::parse_from_str(day, DATE_FORMAT).ok())
}
