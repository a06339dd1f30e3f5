use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::{
    model::NewsCandidate,
    util::{html::strip_html_basic, url_norm::normalize_or_keep},
};

/// Scraper output row. Each platform script names its fields a little differently.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCandidate {
    #[serde(alias = "标题")]
    title: String,
    content: String,
    #[serde(alias = "platform")]
    source_platform: String,
    #[serde(alias = "link", alias = "video_link", alias = "链接")]
    source_url: String,
    #[serde(alias = "cover_image", alias = "图片")]
    image: String,
}

/// Image placeholders some scrapers emit instead of leaving the field empty.
const IMAGE_PLACEHOLDERS: &[&str] = &["无图片", "下载失败"];

impl RawCandidate {
    fn into_candidate(self, default_platform: &str) -> NewsCandidate {
        let platform = if self.source_platform.trim().is_empty() {
            default_platform.to_string()
        } else {
            self.source_platform.trim().to_string()
        };

        let mut candidate = NewsCandidate::new(self.title.trim(), platform)
            .with_content(strip_html_basic(&self.content));

        if !self.source_url.trim().is_empty() {
            candidate = candidate.with_source_url(normalize_or_keep(&self.source_url));
        }
        if !IMAGE_PLACEHOLDERS
            .iter()
            .any(|placeholder| self.image.contains(placeholder))
        {
            candidate = candidate.with_image(self.image);
        }
        candidate
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateFile {
    List(Vec<RawCandidate>),
    Wrapped { news: Vec<RawCandidate> },
}

/// Parse a candidate batch. Accepts a bare array or an object with a `news` array;
/// rows without a platform label get `default_platform`.
pub fn parse_candidates(contents: &str, default_platform: &str) -> Result<Vec<NewsCandidate>> {
    let file: CandidateFile = serde_json::from_str(contents)
        .map_err(|err| anyhow!("candidate file is neither a list nor {{\"news\": [...]}}: {err}"))?;
    let rows = match file {
        CandidateFile::List(rows) => rows,
        CandidateFile::Wrapped { news } => news,
    };

    Ok(rows
        .into_iter()
        .map(|row| row.into_candidate(default_platform))
        .collect())
}

/// Load the materialized scrape output for one cycle, in discovery order.
pub fn load_candidates(path: &Path) -> Result<Vec<NewsCandidate>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read candidate file {:?}", path))?;
    let default_platform = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let candidates = parse_candidates(&contents, default_platform)
        .with_context(|| format!("failed to parse candidate file {:?}", path))?;

    tracing::info!(path = ?path, count = candidates.len(), "candidates loaded");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_platform_specific_aliases() {
        let raw = r#"[
            {"标题": "新剧开播", "链接": "https://v.qq.com/x/1?utm_source=wx", "图片": "无图片", "source_platform": "腾讯娱乐"},
            {"title": "演唱会官宣", "video_link": "https://www.douyin.com/video/2", "cover_image": "https://p3.douyinpic.com/a.jpg", "platform": "抖音热榜"},
            {"title": "UP主新作", "content": "<p>播放量破百万</p>"}
        ]"#;
        let candidates = parse_candidates(raw, "bilibili").unwrap();
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].title, "新剧开播");
        assert_eq!(candidates[0].content, "新剧开播");
        assert_eq!(candidates[0].source_url.as_deref(), Some("https://v.qq.com/x/1"));
        assert_eq!(candidates[0].image, None);

        assert_eq!(candidates[1].source_platform, "抖音热榜");
        assert_eq!(
            candidates[1].image.as_deref(),
            Some("https://p3.douyinpic.com/a.jpg")
        );

        assert_eq!(candidates[2].source_platform, "bilibili");
        assert_eq!(candidates[2].content, "播放量破百万");
        assert_eq!(candidates[2].source_url, None);
    }

    #[test]
    fn accepts_wrapped_news_array() {
        let raw = r#"{"news": [{"title": "B opens store", "source_platform": "X"}]}"#;
        let candidates = parse_candidates(raw, "unknown").unwrap();
        assert_eq!(candidates[0].source_platform, "X");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_candidates(r#"{"items": 1}"#, "x").is_err());
    }
}
