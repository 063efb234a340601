use thiserror::Error;

/// Protocol defects: the adapter itself is incomplete or wrong.
///
/// A defect is never turned into an [`ErrorDetail`](crate::ErrorDetail).
/// It travels on the outer `Err` of [`MapResult`](crate::MapResult) up to the
/// caller of the usecase dispatcher.
#[derive(Error, Debug)]
pub enum Defect {
    #[error("unexpected response in map '{map}': status {status}, content-type '{content_type}'")]
    UnexpectedResponse {
        map: String,
        status: u16,
        content_type: String,
    },

    #[error("sub-map '{map}' was expected to succeed but failed: {title}{}", detail_suffix(.detail))]
    InfallibleSubMap {
        map: String,
        title: String,
        detail: Option<String>,
    },

    #[error("no such operation: provider '{provider}' has no usecase '{usecase}'")]
    UnknownOperation { provider: String, usecase: String },

    #[error("no such provider: '{0}'")]
    UnknownProvider(String),

    #[error("provider '{provider}' has no service '{service}'")]
    UnknownService { provider: String, service: String },

    #[error("provider '{provider}' has no security scheme '{scheme}'")]
    UnknownSecurityScheme { provider: String, scheme: String },

    #[error("template value '{key}' is missing or not a scalar")]
    MissingTemplateValue { key: String },

    #[error("serde-json: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

/// Failure reported by the HTTP transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    PolicyDeny,
    TooLarge,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::PolicyDeny => "policy deny",
            TransportErrorKind::TooLarge => "response too large",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Defect>;
