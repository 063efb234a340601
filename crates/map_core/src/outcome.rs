//! Outcome and the normalized error payload.
//!
//! `Outcome<T>` is a plain `Result<T, ErrorDetail>`: exactly one of data or
//! error, by construction. Map functions wrap it once more in
//! [`MapResult`], whose outer `Err` carries protocol defects.

use crate::error::Defect;
use crate::types::Headers;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub type Outcome<T> = std::result::Result<T, ErrorDetail>;

/// What every map function returns: a defect, or an outcome.
pub type MapResult<T> = std::result::Result<Outcome<T>, Defect>;

/// Unwraps the `Ok` of an [`Outcome`] or returns its error from the enclosing
/// map function as `Ok(Err(error))`. This is the early-exit point of a map.
///
/// ```rust,ignore
/// let response = try_outcome!(ctx.fetch(request));
/// let page = try_outcome!(ctx.invoke("FetchPage", cursor, fetch_page)?);
/// ```
#[macro_export]
macro_rules! try_outcome {
    ($expr:expr) => {
        match $expr {
            ::std::result::Result::Ok(value) => value,
            ::std::result::Result::Err(error) => {
                return ::std::result::Result::Ok(::std::result::Result::Err(
                    ::std::convert::From::from(error),
                ))
            }
        }
    };
}

/// Normalized, provider-agnostic error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
    /// Provider payload the error was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,
}

impl ErrorDetail {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            code: None,
            rate_limit: None,
            original: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_detail_opt(mut self, detail: Option<impl Into<String>>) -> Self {
        self.detail = detail.map(Into::into);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_original(mut self, original: Value) -> Self {
        self.original = Some(original);
        self
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limit.is_some()
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorDetail {}

/// Rate limit state reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_requests_percentage: Option<f64>,
    /// Unix seconds at which the window resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_timestamp: Option<u64>,
    /// Seconds until the window resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_after: Option<u64>,
    /// Seconds the provider asks the caller to wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Header names a provider uses to report its limits. `None` means the
/// provider does not send that value.
#[derive(Debug, Clone)]
pub struct RateLimitHeaders {
    /// Fixed bucket name for this provider, not read from a header.
    pub bucket: Option<&'static str>,
    pub limit: Option<&'static str>,
    pub remaining: Option<&'static str>,
    pub reset: Option<&'static str>,
    pub reset_after: Option<&'static str>,
    pub retry_after: Option<&'static str>,
}

impl Default for RateLimitHeaders {
    fn default() -> Self {
        Self {
            bucket: None,
            limit: Some("x-ratelimit-limit"),
            remaining: Some("x-ratelimit-remaining"),
            reset: Some("x-ratelimit-reset"),
            reset_after: None,
            retry_after: Some("retry-after"),
        }
    }
}

impl RateLimitHeaders {
    /// Only `retry-after`.
    pub fn retry_after_only() -> Self {
        Self {
            bucket: None,
            limit: None,
            remaining: None,
            reset: None,
            reset_after: None,
            retry_after: Some("retry-after"),
        }
    }
}

fn header_u64(headers: &Headers, name: Option<&str>) -> Option<u64> {
    name.and_then(|n| headers.get(n))
        .and_then(|v| v.trim().parse::<u64>().ok())
}

impl RateLimitInfo {
    /// Derives rate limit info from `headers`. Values whose header is absent or
    /// not an integer stay `None`; `retry-after` given as an HTTP date is
    /// ignored. Returns `None` when no header contributed anything.
    pub fn from_headers(headers: &Headers, scheme: &RateLimitHeaders) -> Option<RateLimitInfo> {
        let total_requests = header_u64(headers, scheme.limit);
        let remaining_requests = header_u64(headers, scheme.remaining);
        let info = RateLimitInfo {
            bucket: None,
            total_requests,
            remaining_requests,
            remaining_requests_percentage: percentage(remaining_requests, total_requests),
            reset_timestamp: header_u64(headers, scheme.reset),
            reset_after: header_u64(headers, scheme.reset_after),
            retry_after: header_u64(headers, scheme.retry_after),
        };
        if info.is_empty() {
            return None;
        }
        Some(RateLimitInfo {
            bucket: scheme.bucket.map(str::to_string),
            ..info
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_none()
            && self.total_requests.is_none()
            && self.remaining_requests.is_none()
            && self.reset_timestamp.is_none()
            && self.reset_after.is_none()
            && self.retry_after.is_none()
    }
}

/// `remaining / total * 100`, when both are known and `total` is non-zero.
pub fn percentage(remaining: Option<u64>, total: Option<u64>) -> Option<f64> {
    match (remaining, total) {
        (Some(r), Some(t)) if t > 0 => Some(r as f64 / t as f64 * 100.0),
        _ => None,
    }
}
