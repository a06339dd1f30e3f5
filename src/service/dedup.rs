use tracing::debug;

use crate::{
    model::{HistoryEntry, NewsCandidate},
    util::{similarity::similarity, title::char_prefix},
};

pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Bodies must be longer than this (in chars) on both sides before they are compared.
const MIN_CONTENT_CHARS: usize = 50;
/// Only the leading part of each body is compared.
const CONTENT_PREFIX_CHARS: usize = 200;

/// Whether `candidate` repeats something already in `history`.
///
/// Checks, in order: exact title match, title similarity above `threshold`, then body
/// similarity (first 200 chars) when both bodies are longer than 50 chars. An empty title
/// is never a duplicate; title validity is enforced by the selector.
pub fn is_duplicate(candidate: &NewsCandidate, history: &[HistoryEntry], threshold: f64) -> bool {
    let title = candidate.title.as_str();
    if title.is_empty() {
        return false;
    }

    if let Some(hit) = history.iter().find(|h| h.title == title) {
        debug!(title, matched = %hit.title, "exact title match in history");
        return true;
    }

    for h in history {
        let score = similarity(title, &h.title);
        if score > threshold {
            debug!(title, matched = %h.title, score, "similar title in history");
            return true;
        }
    }

    let content = candidate.content.as_str();
    if content.chars().count() <= MIN_CONTENT_CHARS {
        return false;
    }
    let content = char_prefix(content, CONTENT_PREFIX_CHARS);

    for h in history {
        if h.content.chars().count() <= MIN_CONTENT_CHARS {
            continue;
        }
        let score = similarity(content, char_prefix(&h.content, CONTENT_PREFIX_CHARS));
        if score > threshold {
            debug!(title, matched = %h.title, score, "similar content in history");
            return true;
        }
    }

    false
}

/// Drop every candidate that duplicates history, keeping discovery order.
/// Returns the survivors and how many were dropped.
pub fn filter_new(
    candidates: Vec<NewsCandidate>,
    history: &[HistoryEntry],
    threshold: f64,
) -> (Vec<NewsCandidate>, usize) {
    let total = candidates.len();
    let kept: Vec<NewsCandidate> = candidates
        .into_iter()
        .filter(|candidate| !is_duplicate(candidate, history, threshold))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(title: &str, content: &str) -> HistoryEntry {
        HistoryEntry {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_title_is_never_duplicate() {
        let candidate = NewsCandidate::new("", "X");
        assert!(!is_duplicate(&candidate, &[hist("", "")], DEFAULT_THRESHOLD));
    }

    #[test]
    fn exact_title_match_ignores_content() {
        let candidate = NewsCandidate::new("A wins award", "X").with_content("totally different");
        assert!(is_duplicate(
            &candidate,
            &[hist("A wins award", "original body")],
            DEFAULT_THRESHOLD
        ));
    }

    #[test]
    fn paraphrased_title_is_duplicate() {
        // ratio 86 / 90
        let candidate = NewsCandidate::new("Apple unveils new iPhone at its September event", "X");
        let history = [hist("Apple unveils new iPhone at September event", "")];
        assert!(is_duplicate(&candidate, &history, DEFAULT_THRESHOLD));
    }

    #[test]
    fn short_bodies_are_not_compared() {
        let body = "Same short body text shared by both items.";
        let candidate = NewsCandidate::new("Rocket lands safely", "X").with_content(body);
        let history = [hist("Bakery wins prize", body)];
        assert!(!is_duplicate(&candidate, &history, DEFAULT_THRESHOLD));
    }

    #[test]
    fn body_of_exactly_fifty_chars_is_not_compared() {
        let body = "演".repeat(50);
        let candidate = NewsCandidate::new("巡演再加场", "抖音热榜").with_content(body.clone());
        let history = [hist("足球联赛开幕", &body)];
        assert!(!is_duplicate(&candidate, &history, DEFAULT_THRESHOLD));

        let longer = format!("{body}。");
        let candidate = NewsCandidate::new("巡演再加场", "抖音热榜").with_content(longer.clone());
        let history = [hist("足球联赛开幕", &longer)];
        assert!(is_duplicate(&candidate, &history, DEFAULT_THRESHOLD));
    }

    #[test]
    fn long_matching_bodies_are_duplicates() {
        let body = "某知名歌手今晚在上海举办个人巡回演唱会，现场观众超过五万人，门票开售一分钟即告售罄，主办方宣布加场两晚以满足歌迷需求。";
        assert!(body.chars().count() > 50);
        let candidate = NewsCandidate::new("巡演再加场", "抖音热榜").with_content(body);
        let history = [hist("上海演唱会门票秒空", body)];
        assert!(is_duplicate(&candidate, &history, DEFAULT_THRESHOLD));
    }

    #[test]
    fn filter_new_reports_drop_count() {
        let history = [hist("A wins award", "")];
        let (kept, dropped) = filter_new(
            vec![
                NewsCandidate::new("A wins award", "X"),
                NewsCandidate::new("B opens store", "X"),
            ],
            &history,
            DEFAULT_THRESHOLD,
        );
        assert_eq!(dropped, 1);
        assert_eq!(kept[0].title, "B opens store");
    }
}
