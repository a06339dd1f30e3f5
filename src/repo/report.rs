use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::history::write_atomic;
use crate::model::PolishedReport;

/// Write `report` as `<output_dir>/<category>_<timestamp>.json` and return the path.
pub fn save_report(output_dir: &Path, category: &str, report: &PolishedReport) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {:?}", output_dir))?;

    let path = output_dir.join(format!("{category}_{}.json", report.timestamp));
    let body = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    write_atomic(&path, body.as_bytes())?;

    tracing::info!(path = ?path, items = report.news.len(), "report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolishedItem;

    #[test]
    fn writes_named_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = PolishedReport {
            news: vec![PolishedItem::headline("娱乐资讯精选")],
            timestamp: "20261017_200000".to_string(),
            total: 1,
        };

        let path = save_report(dir.path(), "entertainment", &report).unwrap();
        assert!(path.ends_with("entertainment_20261017_200000.json"));

        let parsed: PolishedReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
