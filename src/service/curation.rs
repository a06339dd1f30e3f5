use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::{
    config::{AppConfig, FallbackPolicy},
    error::{CurationError, CurationResult, SelectorError},
    model::{HistoryEntry, NewsCandidate, PolishedItem, PolishedReport, SelectionQuota},
    repo::{history::HistoryStore, report::save_report},
    service::{
        dedup::filter_new,
        selection::{self, ContentPolicy},
        selector::{select_with_retry, SelectionRequest, Selector},
    },
};

/// Where the published report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    Selector,
    LocalFallback,
}

#[derive(Debug)]
pub struct CycleOutcome {
    pub report: PolishedReport,
    pub report_path: PathBuf,
    pub source: ReportSource,
    pub duplicates_dropped: usize,
    pub history_len: usize,
}

/// One curation cycle over a fully materialized candidate batch: history dedup, quota
/// selection, external selection with retry and fallback, report write, history update.
pub async fn run_cycle(
    config: &AppConfig,
    selector: Option<&dyn Selector>,
    policy: &dyn ContentPolicy,
    candidates: Vec<NewsCandidate>,
    now: DateTime<FixedOffset>,
) -> CurationResult<CycleOutcome> {
    let mut history = HistoryStore::open(&config.history.file, config.history.retention);
    history.evict_old_at(now.date_naive());
    info!(entries = history.entries().len(), "history loaded");

    let scraped = candidates.len();
    let (fresh, duplicates_dropped) =
        filter_new(candidates, history.entries(), config.history.duplicate_threshold);
    info!(scraped, duplicates_dropped, "history dedup done");

    let quota = SelectionQuota {
        platforms: config.selection.platforms.clone(),
        platform_quota: config.selection.platform_quota,
        global_cap: config.selection.global_cap,
    };
    let selected = selection::select(&fresh, &quota, policy);
    if selected.is_empty() {
        return Err(CurationError::NoCandidates);
    }
    info!(selected = selected.len(), cap = quota.global_cap, "quota selection done");

    let (mut report, source) = resolve_report(
        config,
        selector,
        &selected,
        history.entries(),
        now,
    )
    .await?;

    report.timestamp = now.format("%Y%m%d_%H%M%S").to_string();
    report.total = report.news.len();
    let report_path = save_report(
        Path::new(&config.pipeline.output_dir),
        &config.pipeline.category,
        &report,
    )?;

    history.record(report.articles(), &config.pipeline.category, now);
    history.evict_old_at(now.date_naive());
    history.save()?;

    Ok(CycleOutcome {
        history_len: history.entries().len(),
        report,
        report_path,
        source,
        duplicates_dropped,
    })
}

/// Ask the selector for the final report, applying the configured fallback when it is
/// missing or keeps failing.
pub async fn resolve_report(
    config: &AppConfig,
    selector: Option<&dyn Selector>,
    selected: &[NewsCandidate],
    history: &[HistoryEntry],
    now: DateTime<FixedOffset>,
) -> CurationResult<(PolishedReport, ReportSource)> {
    let deepseek = &config.ai.deepseek;
    let result = match selector {
        Some(selector) => {
            let request = SelectionRequest::new(
                selected,
                history,
                config.selection.global_cap,
                deepseek.content_char_limit,
                deepseek.history_context_limit,
            );
            select_with_retry(selector, &request, &config.ai.retry).await
        }
        None => Err(SelectorError::NotConfigured),
    };

    match result {
        Ok(report) => Ok((report, ReportSource::Selector)),
        Err(err) => match config.ai.fallback {
            FallbackPolicy::Abort => Err(CurationError::SelectionFailed(err)),
            FallbackPolicy::Local => {
                warn!(error = %err, "selector unavailable, publishing local selection");
                Ok((
                    local_report(selected, &config.pipeline.category, now),
                    ReportSource::LocalFallback,
                ))
            }
        },
    }
}

/// Report built from the quota selection alone: a dated headline plus the picks in order.
pub fn local_report(
    selected: &[NewsCandidate],
    category: &str,
    now: DateTime<FixedOffset>,
) -> PolishedReport {
    let label = match category {
        "entertainment" => "娱乐资讯精选",
        "world" => "国际资讯精选",
        _ => "今日资讯精选",
    };
    let headline = format!("{label} | {}热点", now.format("%m月%d日"));

    let news: Vec<PolishedItem> = std::iter::once(PolishedItem::headline(headline))
        .chain(
            selected
                .iter()
                .zip(1u32..)
                .map(|(candidate, rank)| PolishedItem::from_candidate(rank, candidate)),
        )
        .collect();

    PolishedReport {
        total: news.len(),
        news,
        timestamp: String::new(),
    }
}
