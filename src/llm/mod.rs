use http::header::InvalidHeaderValue;
use thiserror::Error;

use crate::util::env::EnvErr;

pub mod backoff;
pub mod client;
pub mod extract;
pub mod prompt;

pub type LlmResult<T> = core::result::Result<T, LlmErr>;

#[derive(Debug, Error)]
pub enum LlmErr {
    #[error("rate limited by completion endpoint")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("completion endpoint temporarily unavailable")]
    Unavailable,

    #[error("completion request failed with status {status}: {body}")]
    FetchErrWithBody { status: u16, body: String },

    #[error("completion response contained no choices")]
    EmptyResponse,

    #[error("unable to locate JSON in completion text")]
    MissingJson,

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    HeaderError(#[from] InvalidHeaderValue),

    #[error(transparent)]
    EnvError(#[from] EnvErr),
}

impl LlmErr {
    /// Rate-limit and quota-style failures are worth retrying with backoff;
    /// everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmErr::RateLimited { .. } | LlmErr::Unavailable)
    }
}
