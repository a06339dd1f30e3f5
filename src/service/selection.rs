use std::collections::HashSet;

use tracing::debug;

use crate::{
    model::{NewsCandidate, SelectionQuota},
    util::title::is_selectable_title,
};

/// Topic filter applied to titles before selection.
pub trait ContentPolicy {
    fn is_allowed(&self, title: &str) -> bool;
}

impl<F> ContentPolicy for F
where
    F: Fn(&str) -> bool,
{
    fn is_allowed(&self, title: &str) -> bool {
        self(title)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ContentPolicy for AllowAll {
    fn is_allowed(&self, _title: &str) -> bool {
        true
    }
}

/// Rejects titles containing any keyword as a plain, case-sensitive substring.
/// No tokenization: a keyword also matches inside longer words.
#[derive(Debug, Clone, Default)]
pub struct KeywordBlocklist {
    keywords: Vec<String>,
}

impl KeywordBlocklist {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.is_empty())
            .collect();
        Self { keywords }
    }
}

impl ContentPolicy for KeywordBlocklist {
    fn is_allowed(&self, title: &str) -> bool {
        !self.keywords.iter().any(|k| title.contains(k.as_str()))
    }
}

/// Selection state shared by the per-platform and overflow passes.
struct Picker<'a, P: ContentPolicy + ?Sized> {
    policy: &'a P,
    cap: usize,
    seen_titles: HashSet<&'a str>,
    picked: Vec<&'a NewsCandidate>,
}

impl<'a, P: ContentPolicy + ?Sized> Picker<'a, P> {
    fn is_full(&self) -> bool {
        self.picked.len() >= self.cap
    }

    fn try_pick(&mut self, candidate: &'a NewsCandidate) -> bool {
        let title = candidate.title.as_str();
        if !is_selectable_title(title) || self.seen_titles.contains(title) {
            return false;
        }
        if !self.policy.is_allowed(title) {
            debug!(title, "candidate rejected by content policy");
            return false;
        }
        self.seen_titles.insert(title);
        self.picked.push(candidate);
        true
    }
}

/// Platforms in selection order: configured priority first, then any other platform in
/// order of first appearance.
pub fn platform_order(candidates: &[NewsCandidate], priority: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for platform in priority
        .iter()
        .map(String::as_str)
        .chain(candidates.iter().map(|c| c.source_platform.as_str()))
    {
        if !order.iter().any(|p| p == platform) {
            order.push(platform.to_string());
        }
    }
    order
}

/// Choose up to `quota.global_cap` candidates.
///
/// First pass walks platforms in priority order, taking at most `quota.platform_quota`
/// from each. If slots remain, a second pass tops up from all candidates in discovery
/// order. Titles must be selectable, unique within the batch and allowed by `policy`.
/// Order is stable: platform priority, then intra-platform order, then overflow order.
pub fn select<P>(
    candidates: &[NewsCandidate],
    quota: &SelectionQuota,
    policy: &P,
) -> Vec<NewsCandidate>
where
    P: ContentPolicy + ?Sized,
{
    let mut picker = Picker {
        policy,
        cap: quota.global_cap,
        seen_titles: HashSet::new(),
        picked: Vec::with_capacity(quota.global_cap),
    };

    for platform in platform_order(candidates, &quota.platforms) {
        let mut taken = 0;
        for candidate in candidates.iter().filter(|c| c.source_platform == platform) {
            if taken >= quota.platform_quota || picker.is_full() {
                break;
            }
            if picker.try_pick(candidate) {
                taken += 1;
            }
        }
        debug!(platform = %platform, taken, "platform pass done");
    }

    if !picker.is_full() {
        for candidate in candidates {
            if picker.is_full() {
                break;
            }
            picker.try_pick(candidate);
        }
    }

    let mut selected: Vec<NewsCandidate> = picker.picked.into_iter().cloned().collect();
    selected.truncate(quota.global_cap);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(platform: &str, n: usize) -> Vec<NewsCandidate> {
        (1..=n)
            .map(|i| NewsCandidate::new(format!("{platform}{i}"), platform))
            .collect()
    }

    fn titles(selected: &[NewsCandidate]) -> Vec<&str> {
        selected.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn platform_priority_then_overflow() {
        let mut candidates = batch("A", 5);
        candidates.extend(batch("B", 5));
        let quota = SelectionQuota::new(3, 9).with_platforms(["A", "B"]);

        let selected = select(&candidates, &quota, &AllowAll);
        assert_eq!(
            titles(&selected),
            vec!["A1", "A2", "A3", "B1", "B2", "B3", "A4", "A5", "B4"]
        );
    }

    #[test]
    fn configured_priority_beats_discovery_order() {
        let mut candidates = batch("A", 2);
        candidates.extend(batch("B", 2));
        let quota = SelectionQuota::new(1, 3).with_platforms(["B"]);

        let selected = select(&candidates, &quota, &AllowAll);
        assert_eq!(titles(&selected), vec!["B1", "A1", "A2"]);
    }

    #[test]
    fn skips_short_duplicate_and_blocked_titles() {
        let candidates = vec![
            NewsCandidate::new("", "A"),
            NewsCandidate::new("瓜", "A"),
            NewsCandidate::new("军事演习开始", "A"),
            NewsCandidate::new("新剧开播", "A"),
            NewsCandidate::new("新剧开播", "B"),
            NewsCandidate::new("演唱会官宣", "B"),
        ];
        let policy = KeywordBlocklist::new(["军事"]);
        let selected = select(&candidates, &SelectionQuota::new(3, 9), &policy);
        assert_eq!(titles(&selected), vec!["新剧开播", "演唱会官宣"]);
    }

    #[test]
    fn blocklist_is_plain_case_sensitive_substring() {
        let policy = KeywordBlocklist::new(["war", "军"]);
        assert!(!policy.is_allowed("Star Wars reboot awarded"));
        assert!(policy.is_allowed("WAR declared"));
        assert!(!policy.is_allowed("冠军诞生"));
    }

    #[test]
    fn closure_policy() {
        let policy = |title: &str| !title.starts_with("广告");
        let candidates = vec![
            NewsCandidate::new("广告：新品上市", "A"),
            NewsCandidate::new("新品发布会", "A"),
        ];
        let selected = select(&candidates, &SelectionQuota::new(3, 9), &policy);
        assert_eq!(titles(&selected), vec!["新品发布会"]);
    }

    #[test]
    fn never_exceeds_global_cap() {
        let mut candidates = Vec::new();
        for platform in ["A", "B", "C", "D"] {
            candidates.extend(batch(platform, 6));
        }
        for cap in [0, 1, 5, 9, 30] {
            let selected = select(&candidates, &SelectionQuota::new(3, cap), &AllowAll);
            assert!(selected.len() <= cap);
            let unique: HashSet<_> = selected.iter().map(|c| &c.title).collect();
            assert_eq!(unique.len(), selected.len());
        }
    }

    #[test]
    fn platform_order_appends_unlisted() {
        let mut candidates = batch("C", 1);
        candidates.extend(batch("A", 1));
        let order = platform_order(&candidates, &["B".to_string(), "A".to_string()]);
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
