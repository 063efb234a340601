//! Slack Web API: `SendMessage` and cursor-paginated `ListChannels`.
//!
//! Slack reports most failures as `200 {"ok": false, "error": "<code>"}`;
//! every map funnels those through `MapSlackError`.

use crate::common::{map_http_error, rate_limited, status_title};
use map_core::{
    paginate, require_str, try_outcome, Any, Body, ErrorDetail, MapContext,
    MapResult, Method, Page, Provider, RateLimitHeaders, ResponseDescriptor,
    ResponseDispatch, SecurityScheme, UsecaseDispatcher, Vars, DEFAULT_PAGE_CEILING,
};
use serde::Serialize;
use serde_json::{json, Value};

pub const NAME: &str = "slack";
pub const BEARER: &str = "bearer_token";

/// Channels requested per `conversations.list` page.
pub const PAGE_LIMIT: u32 = 200;

pub fn provider() -> Provider {
    Provider::new(NAME)
        .service("default", "https://slack.com/api")
        .security_scheme(SecurityScheme::bearer(BEARER))
}

pub fn dispatcher() -> UsecaseDispatcher {
    UsecaseDispatcher::new(provider())
        .map("SendMessage", send_message)
        .map("ListChannels", list_channels)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelList {
    pub channels: Vec<Channel>,
}

pub fn send_message(ctx: &MapContext<'_>, input: &Value) -> MapResult<SentMessage> {
    let channel = try_outcome!(require_str(input, "destination"));
    let text = try_outcome!(require_str(input, "text"));
    let request = ctx
        .request(Method::Post, "/chat.postMessage", &Vars::new())?
        .json(json!({ "channel": channel, "text": text }));
    let request = try_outcome!(ctx.secure(request, BEARER)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("SendMessage")
        .on(200, "json", |res| {
            if !is_ok(res.body_auto()) {
                return ctx.invoke("MapSlackError", res, map_slack_error);
            }
            Ok(match res.body_auto().str_at("/ts") {
                Some(ts) => Ok(SentMessage {
                    message_id: ts.to_string(),
                }),
                None => Err(ErrorDetail::new("Slack error").with_detail("response without ts")),
            })
        })
        .on(429, Any, |res| ctx.invoke("MapSlackError", res, map_slack_error))
        .on(Any, "json", |res| ctx.invoke("MapSlackError", res, map_slack_error))
        .on(Any, Any, |res| ctx.invoke("MapHttpError", res, map_http_error))
        .dispatch(&response)
}

pub fn list_channels(ctx: &MapContext<'_>, _input: &Value) -> MapResult<ChannelList> {
    let channels = try_outcome!(paginate(
        ctx,
        "FetchChannelsPage",
        None,
        DEFAULT_PAGE_CEILING,
        fetch_channels_page,
    )?);
    Ok(Ok(ChannelList { channels }))
}

/// One `conversations.list` page. An empty or absent `next_cursor` marks
/// the last page.
fn fetch_channels_page(
    ctx: &MapContext<'_>,
    cursor: Option<String>,
) -> MapResult<Page<Channel, Option<String>>> {
    let request = ctx
        .request(Method::Get, "/conversations.list", &Vars::new())?
        .query("limit", PAGE_LIMIT)
        .query_opt("cursor", cursor);
    let request = try_outcome!(ctx.secure(request, BEARER)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("FetchChannelsPage")
        .on(200, "json", |res| {
            let body = res.body_auto();
            if !is_ok(body) {
                return ctx.invoke("MapSlackError", res, map_slack_error);
            }
            let channels = body
                .pointer("/channels")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(channel).collect())
                .unwrap_or_default();
            let next = body
                .str_at("/response_metadata/next_cursor")
                .filter(|c| !c.trim().is_empty());
            Ok(Ok(match next {
                Some(next) => Page::more(channels, Some(next.to_string())),
                None => Page::last(channels),
            }))
        })
        .on(429, Any, |res| ctx.invoke("MapSlackError", res, map_slack_error))
        .on(Any, "json", |res| ctx.invoke("MapSlackError", res, map_slack_error))
        .on(Any, Any, |res| ctx.invoke("MapHttpError", res, map_http_error))
        .dispatch(&response)
}

fn is_ok(body: &Body) -> bool {
    body.pointer("/ok").and_then(Value::as_bool) == Some(true)
}

/// Channels without an id or name are skipped.
fn channel(raw: &Value) -> Option<Channel> {
    Some(Channel {
        id: raw.get("id")?.as_str()?.to_string(),
        name: raw.get("name")?.as_str()?.to_string(),
        description: raw
            .pointer("/purpose/value")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        created_at: raw.get("created").and_then(Value::as_i64),
        members_count: raw.get("num_members").and_then(Value::as_u64),
    })
}

/// `MapSlackError`: Slack error codes and HTTP 429 to domain errors.
fn map_slack_error<T>(_ctx: &MapContext<'_>, res: &ResponseDescriptor) -> MapResult<T> {
    let code = res.body_auto().str_at("/error");
    let limited = res.status == 429 || code == Some("ratelimited");

    let title = match code {
        _ if limited => "Rate limit exceeded",
        Some("not_authed" | "invalid_auth" | "account_inactive" | "token_revoked") => "Unauthorized",
        Some("channel_not_found") => "Channel not found",
        Some(_) => "Slack error",
        None => status_title(res.status),
    };

    let mut error = ErrorDetail::new(title)
        .with_detail_opt(code)
        .with_code(code.map(str::to_string).unwrap_or_else(|| res.status.to_string()));
    if limited {
        error = error.with_rate_limit(rate_limited(
            &res.headers,
            &RateLimitHeaders::retry_after_only(),
        ));
    }
    Ok(Err(error))
}
