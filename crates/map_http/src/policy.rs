use crate::error::{HttpError, Result};
use serde::{Deserialize, Serialize};

/// Request timeout when nothing else is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Policy constraints on outgoing calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportPolicy {
    /// Allowed URL patterns (glob). Empty = allow all.
    #[serde(default)]
    pub allowed_urls: Vec<String>,
    /// Max response size in bytes. 0 = no limit.
    #[serde(default)]
    pub max_response_bytes: usize,
    /// Max timeout in ms. 0 = no cap.
    #[serde(default)]
    pub max_timeout_ms: u64,
}

impl TransportPolicy {
    /// `*` allows everything; a trailing `*` is a prefix match; anything
    /// else must equal the URL.
    pub fn allows(&self, url: &str) -> bool {
        self.allowed_urls.is_empty()
            || self.allowed_urls.iter().any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => url.starts_with(prefix),
                None => url == pattern.as_str(),
            })
    }
}

/// Rejects calls outside the allowlist or above the timeout cap.
pub fn check_policy(url: &str, timeout_ms: u64, policy: &TransportPolicy) -> Result<()> {
    if !policy.allows(url) {
        return Err(HttpError::PolicyDeny {
            url: url.to_string(),
        });
    }
    if policy.max_timeout_ms > 0 && timeout_ms > policy.max_timeout_ms {
        return Err(HttpError::TimeoutCap {
            requested_ms: timeout_ms,
            max_ms: policy.max_timeout_ms,
        });
    }
    Ok(())
}

/// Reject bodies over the policy's size cap.
pub fn check_size(size: usize, policy: &TransportPolicy) -> Result<()> {
    if policy.max_response_bytes > 0 && size > policy.max_response_bytes {
        return Err(HttpError::TooLarge {
            size,
            max: policy.max_response_bytes,
        });
    }
    Ok(())
}
