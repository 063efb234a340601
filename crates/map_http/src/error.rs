use map_core::{TransportError, TransportErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("http: {0}")]
    Http(String),

    #[error("connect: {0}")]
    Connect(String),

    #[error("policy: URL '{url}' not in allowlist")]
    PolicyDeny { url: String },

    #[error("timeout: request exceeded {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("timeout: {requested_ms}ms exceeds policy cap of {max_ms}ms")]
    TimeoutCap { requested_ms: u64, max_ms: u64 },

    #[error("response too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, HttpError>;

impl From<HttpError> for TransportError {
    fn from(e: HttpError) -> Self {
        let kind = match &e {
            HttpError::Http(_) => TransportErrorKind::Other,
            HttpError::Connect(_) => TransportErrorKind::Connect,
            HttpError::PolicyDeny { .. } | HttpError::TimeoutCap { .. } => {
                TransportErrorKind::PolicyDeny
            }
            HttpError::Timeout { .. } => TransportErrorKind::Timeout,
            HttpError::TooLarge { .. } => TransportErrorKind::TooLarge,
        };
        TransportError::new(kind, e.to_string())
    }
}
