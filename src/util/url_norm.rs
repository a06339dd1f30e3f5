use anyhow::{Context, Result};
use url::Url;

const TRACKING_PREFIXES: &[&str] = &["utm_", "spm", "_hs", "mc_", "icn", "icp"];
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "yclid", "cmp", "ref", "referrer", "share_token", "from",
];

/// Normalize a scraped article link: drop fragments, default ports and tracking
/// parameters so the published `source_url` stays stable across scrapes.
pub fn normalize_source_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid url: {raw}"))?;

    url.set_fragment(None);

    if let Some(port) = url.port() {
        let remove =
            (url.scheme() == "http" && port == 80) || (url.scheme() == "https" && port == 443);
        if remove {
            url.set_port(None).ok();
        }
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut encoded = url.query_pairs_mut();
        encoded.clear();
        for (k, v) in pairs {
            encoded.append_pair(&k, &v);
        }
    }

    Ok(url.to_string())
}

/// Like [`normalize_source_url`] but keeps the raw value when it does not parse.
pub fn normalize_or_keep(raw: &str) -> String {
    match normalize_source_url(raw) {
        Ok(url) => url,
        Err(err) => {
            tracing::debug!(error = %err, "keeping unparsable source url as-is");
            raw.trim().to_string()
        }
    }
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&lower.as_str())
        || TRACKING_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}
