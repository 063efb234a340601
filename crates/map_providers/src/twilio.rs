//! Twilio Programmable Messaging: `SendMessage` (SMS).

use crate::common::{map_http_error, rate_limited, status_title};
use map_core::{
    require_str, try_outcome, Any, ErrorDetail, MapContext, MapResult, Method, Provider,
    RateLimitHeaders, ResponseDescriptor, ResponseDispatch, SecurityScheme, UsecaseDispatcher,
    Vars,
};
use serde::Serialize;
use serde_json::Value;

pub const NAME: &str = "twilio";
pub const BASIC: &str = "basic_auth";
pub const ACCOUNT_SID: &str = "ACCOUNT_SID";

/// Twilio's "too many requests" error code.
const RATE_LIMIT_CODE: u64 = 20429;

pub fn provider() -> Provider {
    Provider::new(NAME)
        .service("default", "https://api.twilio.com")
        .security_scheme(SecurityScheme::basic(BASIC))
}

pub fn dispatcher() -> UsecaseDispatcher {
    UsecaseDispatcher::new(provider()).map("SendMessage", send_message)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub message_id: String,
}

pub fn send_message(ctx: &MapContext<'_>, input: &Value) -> MapResult<SentMessage> {
    let from = try_outcome!(require_str(input, "from"));
    let to = try_outcome!(require_str(input, "to"));
    let text = try_outcome!(require_str(input, "text"));
    let Some(account) = ctx.parameter(ACCOUNT_SID) else {
        return Ok(Err(
            ErrorDetail::new("Missing required parameter").with_detail(ACCOUNT_SID)
        ));
    };

    let vars = Vars::new().extend(ACCOUNT_SID, account);
    let request = ctx
        .request(
            Method::Post,
            "/2010-04-01/Accounts/{ACCOUNT_SID}/Messages.json",
            &vars,
        )?
        .form([("From", from), ("To", to), ("Body", text)]);
    let request = try_outcome!(ctx.secure(request, BASIC)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("SendMessage")
        .on(201, "json", |res| {
            Ok(match res.body_auto().str_at("/sid") {
                Some(sid) => Ok(SentMessage {
                    message_id: sid.to_string(),
                }),
                None => Err(ErrorDetail::new("Unknown error").with_detail("response without sid")),
            })
        })
        .on(Any, "json", |res| ctx.invoke("MapTwilioError", res, map_twilio_error))
        .on(Any, Any, |res| ctx.invoke("MapHttpError", res, map_http_error))
        .dispatch(&response)
}

/// `MapTwilioError`: `{ code, message, more_info, status }` bodies.
fn map_twilio_error<T>(_ctx: &MapContext<'_>, res: &ResponseDescriptor) -> MapResult<T> {
    let body = res.body_auto();
    let code = body.pointer("/code").and_then(Value::as_u64);
    let status = body
        .pointer("/status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(res.status);
    let rate_limit = code == Some(RATE_LIMIT_CODE) || status == 429;

    let title = match status {
        _ if rate_limit => "Rate limit exceeded",
        401 => "Unauthorized",
        400 => "Bad request",
        s if s >= 500 => status_title(s),
        _ => "Unknown error",
    };

    let mut error = ErrorDetail::new(title)
        .with_detail_opt(body.str_at("/message"))
        .with_code(code.map_or_else(|| status.to_string(), |c| c.to_string()));
    if rate_limit {
        error = error.with_rate_limit(rate_limited(
            &res.headers,
            &RateLimitHeaders::retry_after_only(),
        ));
    }
    if let Some(original) = body.as_json() {
        error = error.with_original(original.clone());
    }
    Ok(Err(error))
}
