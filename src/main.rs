use anyhow::Context;
use curator::{
    config::{self, AppConfig},
    error::CurationError,
    repo::candidates::load_candidates,
    service::{
        curation::run_cycle,
        selection::KeywordBlocklist,
        selector::Selector,
    },
    util::{clock::beijing_now, deepseek::DeepseekClient},
};
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing_appender::rolling;
use tracing_subscriber::{fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    setup_tracing(&config)?;

    tracing::info!(
        category = %config.pipeline.category,
        candidates = %config.pipeline.candidates_file,
        "starting curation cycle"
    );

    let candidates = load_candidates(Path::new(&config.pipeline.candidates_file))?;
    let policy = KeywordBlocklist::new(config.selection.blocked_keywords.iter().cloned());

    let deepseek = if config.ai.deepseek.has_api_key() {
        Some(DeepseekClient::new(
            config.ai.deepseek.clone(),
            &config.http_client,
        )?)
    } else {
        tracing::warn!("deepseek api key missing, selector disabled");
        None
    };
    let selector = deepseek.as_ref().map(|client| client as &dyn Selector);

    match run_cycle(&config, selector, &policy, candidates, beijing_now()).await {
        Ok(outcome) => {
            tracing::info!(
                path = ?outcome.report_path,
                items = outcome.report.total,
                source = ?outcome.source,
                duplicates_dropped = outcome.duplicates_dropped,
                history = outcome.history_len,
                "curation cycle finished"
            );
            Ok(())
        }
        Err(CurationError::NoCandidates) => {
            tracing::warn!("nothing new to publish this cycle");
            Ok(())
        }
        Err(err) => Err(err).context("curation cycle failed"),
    }
}

fn setup_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_deref().unwrap_or("info")));

    let log_path = Path::new(&config.logging.file);
    let file_name = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path {:?}", log_path))?;
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("failed to create log dir {:?}", directory))?;

    // One file per day; the guard must outlive every log call.
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(directory, file_name));
    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer().with_writer(std::io::stdout).with_target(false))
        .with(
            fmt_layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(())
}
