use thiserror::Error;

/// Failures of the external selection service.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("selector not configured")]
    NotConfigured,
    #[error("selector request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("selector returned non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed selector response: {0}")]
    MalformedResponse(String),
    #[error("selection failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl SelectorError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SelectorError::NotConfigured | SelectorError::Exhausted { .. })
    }
}

/// Outcome of a curation cycle that produced nothing to publish.
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("no candidates left after filtering")]
    NoCandidates,
    #[error("selection failed: {0}")]
    SelectionFailed(#[source] SelectorError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CurationResult<T> = Result<T, CurationError>;
