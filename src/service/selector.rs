use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    config::RetryConfig,
    error::SelectorError,
    model::{HistoryEntry, NewsCandidate, PolishedReport, SelectorInput},
    util::title::{char_prefix, truncate_with_ellipsis},
};

const EMPTY_HISTORY: &str = "无历史记录";

/// External service that picks, rewrites and summarizes the final batch.
#[async_trait]
pub trait Selector: Send + Sync {
    async fn select(&self, request: &SelectionRequest) -> Result<PolishedReport, SelectorError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub candidates: Vec<SelectorInput>,
    pub history_context: String,
    pub global_cap: usize,
}

impl SelectionRequest {
    pub fn new(
        candidates: &[NewsCandidate],
        history: &[HistoryEntry],
        global_cap: usize,
        content_char_limit: usize,
        history_limit: usize,
    ) -> Self {
        let candidates = candidates
            .iter()
            .filter(|c| !c.title.is_empty() || !c.content.is_empty())
            .map(|c| SelectorInput {
                title: c.title.clone(),
                content: truncate_with_ellipsis(&c.content, content_char_limit),
                source_platform: c.source_platform.clone(),
                source_url: c.source_url.clone().unwrap_or_default(),
                image: c.image.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            candidates,
            history_context: render_history_context(history, history_limit),
            global_cap,
        }
    }

    /// Headline plus one entry per slot.
    pub fn expected_items(&self) -> usize {
        self.global_cap + 1
    }
}

/// Human-readable list of the newest `limit` history titles for the prompt, newest first.
pub fn render_history_context(history: &[HistoryEntry], limit: usize) -> String {
    let lines: Vec<String> = history
        .iter()
        .rev()
        .filter(|entry| !entry.title.is_empty())
        .take(limit)
        .map(|entry| {
            let day = entry
                .date
                .as_deref()
                .or(entry.timestamp.as_deref())
                .map(|value| char_prefix(value, 10))
                .unwrap_or_default();
            if day.is_empty() {
                format!("- {}", entry.title)
            } else {
                format!("- {} ({day})", entry.title)
            }
        })
        .collect();

    if lines.is_empty() {
        EMPTY_HISTORY.to_string()
    } else {
        lines.join("\n")
    }
}

/// Call `selector` up to `retry.max_attempts` times, sleeping `retry.delay_secs`
/// between attempts.
pub async fn select_with_retry(
    selector: &dyn Selector,
    request: &SelectionRequest,
    retry: &RetryConfig,
) -> Result<PolishedReport, SelectorError> {
    let attempts = retry.max_attempts.max(1);
    let delay = Duration::from_secs(retry.delay_secs);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match selector.select(request).await {
            Ok(report) => {
                info!(
                    selector = selector.name(),
                    attempt,
                    items = report.news.len(),
                    "selection succeeded"
                );
                return Ok(report);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(
                    selector = selector.name(),
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "selection attempt failed"
                );
                last_error = Some(err);
                if attempt < attempts && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(SelectorError::Exhausted {
        attempts,
        last: last_error.map(|err| err.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::model::PolishedItem;

    struct FlakySelector {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl Selector for FlakySelector {
        async fn select(
            &self,
            _request: &SelectionRequest,
        ) -> Result<PolishedReport, SelectorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(SelectorError::MalformedResponse(format!("call {call}")));
            }
            Ok(PolishedReport {
                news: vec![PolishedItem::headline("头条")],
                ..Default::default()
            })
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn no_delay(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay_secs: 0,
        }
    }

    fn empty_request() -> SelectionRequest {
        SelectionRequest::new(&[], &[], 9, 800, 10)
    }

    #[tokio::test]
    async fn retries_until_success() {
        let selector = FlakySelector {
            calls: AtomicU32::new(0),
            fail_first: 2,
        };
        let report = select_with_retry(&selector, &empty_request(), &no_delay(3))
            .await
            .unwrap();
        assert_eq!(report.news.len(), 1);
        assert_eq!(selector.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let selector = FlakySelector {
            calls: AtomicU32::new(0),
            fail_first: 10,
        };
        let err = select_with_retry(&selector, &empty_request(), &no_delay(3))
            .await
            .unwrap_err();
        assert!(matches!(err, SelectorError::Exhausted { attempts: 3, .. }));
        assert_eq!(selector.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn history_context_lists_newest_entries() {
        let history: Vec<HistoryEntry> = (1..=12)
            .map(|i| HistoryEntry {
                title: format!("旧闻{i}"),
                date: Some("2026-10-16".to_string()),
                ..Default::default()
            })
            .collect();
        let rendered = render_history_context(&history, 10);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "- 旧闻12 (2026-10-16)");
        assert_eq!(lines[9], "- 旧闻3 (2026-10-16)");
    }

    #[test]
    fn history_context_uses_timestamp_day_and_placeholder() {
        assert_eq!(render_history_context(&[], 10), EMPTY_HISTORY);
        let entry = HistoryEntry {
            title: "A wins award".to_string(),
            timestamp: Some("2026-10-15T09:30:00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render_history_context(&[entry], 10),
            "- A wins award (2026-10-15)"
        );
    }

    #[test]
    fn request_truncates_long_content() {
        let body = "字".repeat(900);
        let candidate = NewsCandidate::new("长文", "Baidu").with_content(body);
        let request = SelectionRequest::new(&[candidate], &[], 9, 800, 10);
        assert_eq!(request.candidates[0].content.chars().count(), 803);
        assert!(request.candidates[0].content.ends_with("..."));
        assert_eq!(request.expected_items(), 10);
    }
}
