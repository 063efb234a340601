//! Strava: page-number paginated `ListActivities` for the authenticated
//! athlete.

use map_core::{
    percentage, try_outcome, Any, ErrorDetail, Headers, MapContext, MapResult, Method, Page,
    Provider, RateLimitInfo, ResponseDescriptor, ResponseDispatch, SecurityScheme,
    UsecaseDispatcher, Vars, DEFAULT_PAGE_CEILING,
};
use serde::Serialize;
use serde_json::Value;

pub const NAME: &str = "strava";
pub const BEARER: &str = "bearer_token";

pub const DEFAULT_PER_PAGE: u64 = 50;
/// Largest `per_page` Strava accepts.
pub const MAX_PER_PAGE: u64 = 200;

/// Strava's short window is fifteen minutes.
const SHORT_BUCKET: &str = "15min";

pub fn provider() -> Provider {
    Provider::new(NAME)
        .service("default", "https://www.strava.com/api/v3")
        .security_scheme(SecurityScheme::bearer(BEARER))
}

pub fn dispatcher() -> UsecaseDispatcher {
    UsecaseDispatcher::new(provider()).map("ListActivities", list_activities)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityList {
    pub activities: Vec<Activity>,
}

/// Filters shared by every page of one listing.
#[derive(Debug, Clone, Copy)]
struct ActivityQuery {
    per_page: u64,
    before: Option<i64>,
    after: Option<i64>,
}

impl ActivityQuery {
    fn from_input(input: &Value) -> Self {
        let per_page = input
            .get("perPage")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self {
            per_page,
            before: input.get("before").and_then(Value::as_i64),
            after: input.get("after").and_then(Value::as_i64),
        }
    }
}

pub fn list_activities(ctx: &MapContext<'_>, input: &Value) -> MapResult<ActivityList> {
    let query = ActivityQuery::from_input(input);
    let activities = try_outcome!(paginate_activities(ctx, query)?);
    Ok(Ok(ActivityList { activities }))
}

fn paginate_activities(ctx: &MapContext<'_>, query: ActivityQuery) -> MapResult<Vec<Activity>> {
    map_core::paginate(ctx, "FetchActivitiesPage", 1u64, DEFAULT_PAGE_CEILING, |ctx, page| {
        fetch_activities_page(ctx, page, query)
    })
}

/// One page of `/athlete/activities`. A page shorter than `per_page` is the
/// last one.
fn fetch_activities_page(
    ctx: &MapContext<'_>,
    page: u64,
    query: ActivityQuery,
) -> MapResult<Page<Activity, u64>> {
    let request = ctx
        .request(Method::Get, "/athlete/activities", &Vars::new())?
        .query("page", page)
        .query("per_page", query.per_page)
        .query_opt("before", query.before)
        .query_opt("after", query.after);
    let request = try_outcome!(ctx.secure(request, BEARER)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("FetchActivitiesPage")
        .on(200, "json", |res| {
            let Some(raw) = res.body_auto().as_json().and_then(Value::as_array) else {
                return Ok(Err(ErrorDetail::new("Unknown error")
                    .with_detail("activities response is not a list")));
            };
            let activities: Vec<Activity> = raw.iter().filter_map(activity).collect();
            Ok(Ok(if (raw.len() as u64) < query.per_page {
                Page::last(activities)
            } else {
                Page::more(activities, page + 1)
            }))
        })
        .on(Any, Any, |res| ctx.invoke("MapStravaError", res, map_strava_error))
        .dispatch(&response)
}

fn activity(raw: &Value) -> Option<Activity> {
    let text = |field: &str| raw.get(field).and_then(Value::as_str).map(str::to_string);
    Some(Activity {
        id: raw.get("id")?.as_u64()?,
        name: text("name").unwrap_or_default(),
        kind: text("sport_type").or_else(|| text("type")),
        start_date: text("start_date"),
        distance: raw.get("distance").and_then(Value::as_f64),
        moving_time: raw.get("moving_time").and_then(Value::as_u64),
    })
}

/// Short-window usage from `x-ratelimit-limit` / `x-ratelimit-usage`, both
/// `"<15min>,<daily>"` pairs.
pub fn rate_limit(headers: &Headers) -> Option<RateLimitInfo> {
    let short = |name: &str| -> Option<u64> {
        headers.get(name)?.split(',').next()?.trim().parse().ok()
    };
    let total = short("x-ratelimit-limit");
    let used = short("x-ratelimit-usage");
    if total.is_none() && used.is_none() {
        return None;
    }
    let remaining = total.zip(used).map(|(t, u)| t.saturating_sub(u));
    Some(RateLimitInfo {
        bucket: Some(SHORT_BUCKET.to_string()),
        total_requests: total,
        remaining_requests: remaining,
        remaining_requests_percentage: percentage(remaining, total),
        ..RateLimitInfo::default()
    })
}

/// `MapStravaError`
fn map_strava_error<T>(_ctx: &MapContext<'_>, res: &ResponseDescriptor) -> MapResult<T> {
    let title = match res.status {
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        429 => "Rate limit exceeded",
        _ => "Unknown error",
    };
    let mut error = ErrorDetail::new(title)
        .with_detail_opt(res.body_auto().str_at("/message"))
        .with_code(res.status.to_string());
    if res.status == 429 {
        error = error.with_rate_limit(Some(rate_limit(&res.headers).unwrap_or_default()));
    }
    if let Some(body) = res.body_auto().as_json() {
        error = error.with_original(body.clone());
    }
    Ok(Err(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn per_page_defaults_and_clamps() {
        assert_eq!(ActivityQuery::from_input(&json!({})).per_page, 50);
        assert_eq!(ActivityQuery::from_input(&json!({"perPage": 1000})).per_page, 200);
        assert_eq!(ActivityQuery::from_input(&json!({"perPage": 0})).per_page, 1);
    }

    #[test]
    fn rate_limit_from_short_window() {
        let headers: Headers = [
            ("X-RateLimit-Limit", "600,30000"),
            ("X-RateLimit-Usage", "150,27536"),
        ]
        .into_iter()
        .collect();
        let info = rate_limit(&headers).unwrap();
        assert_eq!(info.bucket.as_deref(), Some("15min"));
        assert_eq!(info.total_requests, Some(600));
        assert_eq!(info.remaining_requests, Some(450));
        assert_eq!(info.remaining_requests_percentage, Some(75.0));
    }

    #[test]
    fn no_rate_limit_headers() {
        assert_eq!(rate_limit(&Headers::new()), None);
    }

    #[test]
    fn activity_prefers_sport_type() {
        let a = activity(&json!({
            "id": 7, "name": "Morning Ride", "type": "Ride", "sport_type": "GravelRide",
            "start_date": "2024-05-01T06:00:00Z", "distance": 30120.5, "moving_time": 4210
        }))
        .unwrap();
        assert_eq!(a.kind.as_deref(), Some("GravelRide"));
        assert_eq!(
            serde_json::to_value(&a).unwrap()["startDate"],
            json!("2024-05-01T06:00:00Z")
        );
        assert!(activity(&json!({"name": "no id"})).is_none());
    }
}
