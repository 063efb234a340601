//! Fallback error mapping shared by providers for responses their own
//! tables do not describe.

use map_core::{
    Body, ErrorDetail, Headers, MapContext, MapResult, RateLimitHeaders, RateLimitInfo, ResponseDescriptor,
};

/// Longest text body carried into `detail`.
const MAX_DETAIL_CHARS: usize = 200;

pub fn status_title(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        429 => "Rate limit exceeded",
        500..=599 => "Provider unavailable",
        _ => "Unknown error",
    }
}

/// Best human-readable message in a body: common JSON message fields, or
/// the (truncated) text itself.
pub fn body_message(body: &Body) -> Option<String> {
    match body {
        Body::Json(_) => ["/message", "/error_message", "/error/message", "/error", "/detail"]
            .iter()
            .find_map(|p| body.str_at(p))
            .map(str::to_string),
        Body::Text(text) if !text.trim().is_empty() => {
            Some(text.trim().chars().take(MAX_DETAIL_CHARS).collect())
        }
        _ => None,
    }
}

/// Rate limit info for a response already known to be rate limited. Present
/// even when the provider sent no limit headers.
pub fn rate_limited(headers: &Headers, scheme: &RateLimitHeaders) -> Option<RateLimitInfo> {
    Some(RateLimitInfo::from_headers(headers, scheme).unwrap_or_default())
}

/// `MapHttpError`: status-derived error for any response.
pub fn map_http_error<T>(_ctx: &MapContext<'_>, response: &ResponseDescriptor) -> MapResult<T> {
    let body = response.body_auto();
    let mut error = ErrorDetail::new(status_title(response.status))
        .with_detail_opt(body_message(body))
        .with_code(response.status.to_string());
    if response.status == 429 {
        error = error.with_rate_limit(rate_limited(&response.headers, &RateLimitHeaders::default()));
    }
    if let Some(json) = body.as_json() {
        error = error.with_original(json.clone());
    }
    Ok(Err(error))
}
