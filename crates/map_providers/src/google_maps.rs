//! Google Maps geocoding: forward (`Geocode`) and reverse (`ReverseGeocode`).
//!
//! The API answers 200 for most failures and reports them in the body's
//! `status`, so both maps branch on it after dispatch.

use crate::common::{body_message, rate_limited, status_title};
use map_core::{
    missing_input, optional_str, require_f64, try_outcome, Any, ApiKeyPlacement, Body, Defect,
    ErrorDetail, MapContext, MapResult, Method, Outcome, Provider, RateLimitHeaders,
    ResponseDescriptor, ResponseDispatch, SecurityScheme, UsecaseDispatcher, Vars,
};
use serde::Serialize;
use serde_json::Value;

pub const NAME: &str = "google-maps";
pub const API_KEY: &str = "api_key";

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

const ADDRESS_FIELDS: [&str; 5] = [
    "streetAddress",
    "addressLocality",
    "addressRegion",
    "postalCode",
    "addressCountry",
];

pub fn provider() -> Provider {
    Provider::new(NAME)
        .service("default", "https://maps.googleapis.com")
        .security_scheme(SecurityScheme::api_key(API_KEY, ApiKeyPlacement::Query, "key"))
}

pub fn dispatcher() -> UsecaseDispatcher {
    UsecaseDispatcher::new(provider())
        .map("Geocode", geocode)
        .map("ReverseGeocode", reverse_geocode)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
}

pub fn geocode(ctx: &MapContext<'_>, input: &Value) -> MapResult<Coordinates> {
    let address = try_outcome!(address_query(input));
    let request = ctx
        .request(Method::Get, GEOCODE_PATH, &Vars::new())?
        .query("address", address);
    let request = try_outcome!(ctx.secure(request, API_KEY)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("Geocode")
        .on(200, "json", |res| {
            let body = res.body_auto();
            if body.str_at("/status") != Some("OK") {
                return Ok(Err(status_error("Error geocoding address", body)));
            }
            let location = body.pointer("/results/0/geometry/location");
            let coordinate = |axis: &str| location.and_then(|l| l.get(axis)).and_then(Value::as_f64);
            Ok(match (coordinate("lat"), coordinate("lng")) {
                (Some(latitude), Some(longitude)) => Ok(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => Err(ErrorDetail::new("Error geocoding address")
                    .with_detail("result without location")),
            })
        })
        .on(Any, Any, |res| ctx.invoke("MapGoogleError", res, map_google_error))
        .dispatch(&response)
}

pub fn reverse_geocode(ctx: &MapContext<'_>, input: &Value) -> MapResult<Vec<Address>> {
    let latitude = try_outcome!(require_f64(input, "latitude"));
    let longitude = try_outcome!(require_f64(input, "longitude"));
    let request = ctx
        .request(Method::Get, GEOCODE_PATH, &Vars::new())?
        .query("latlng", format!("{latitude},{longitude}"));
    let request = try_outcome!(ctx.secure(request, API_KEY)?);
    let response = try_outcome!(ctx.fetch(&request));

    ResponseDispatch::new("ReverseGeocode")
        .on(200, "json", |res| {
            let body = res.body_auto();
            match body.str_at("/status") {
                Some("OK") => {}
                Some("ZERO_RESULTS") => return Ok(Ok(Vec::new())),
                _ => return Ok(Err(status_error("Error reverse geocoding coordinates", body))),
            }
            let results = body
                .pointer("/results")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let addresses = results
                .iter()
                .map(|result| ctx.invoke_infallible("FormatAddress", result, format_address))
                .collect::<Result<Vec<_>, Defect>>()?;
            Ok(Ok(addresses))
        })
        .on(Any, Any, |res| ctx.invoke("MapGoogleError", res, map_google_error))
        .dispatch(&response)
}

/// `query`, or the structured address fields joined with `", "`.
fn address_query(input: &Value) -> Outcome<String> {
    if let Some(query) = optional_str(input, "query") {
        return Ok(query.to_string());
    }
    let parts: Vec<&str> = ADDRESS_FIELDS
        .iter()
        .filter_map(|field| optional_str(input, field))
        .collect();
    if parts.is_empty() {
        return Err(missing_input("query"));
    }
    Ok(parts.join(", "))
}

fn status_error(title: &str, body: &Body) -> ErrorDetail {
    ErrorDetail::new(title).with_detail_opt(body.str_at("/status"))
}

/// Reshapes one geocoding result. Results are objects; anything else means
/// the response was not understood.
fn format_address(_ctx: &MapContext<'_>, result: &Value) -> MapResult<Address> {
    if !result.is_object() {
        return Ok(Err(ErrorDetail::new("Malformed geocoding result")));
    }
    let components = result
        .get("address_components")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let component = |kind: &str, field: &str| -> Option<String> {
        components
            .iter()
            .find(|c| {
                c.get("types")
                    .and_then(Value::as_array)
                    .is_some_and(|types| types.iter().any(|t| t == kind))
            })
            .and_then(|c| c.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let street_address = match (
        component("street_number", "long_name"),
        component("route", "long_name"),
    ) {
        (Some(number), Some(route)) => Some(format!("{number} {route}")),
        (None, route) => route,
        (number, None) => number,
    };

    Ok(Ok(Address {
        formatted_address: result
            .get("formatted_address")
            .and_then(Value::as_str)
            .map(str::to_string),
        address_country: component("country", "short_name"),
        address_region: component("administrative_area_level_1", "short_name"),
        address_locality: component("locality", "long_name"),
        postal_code: component("postal_code", "long_name"),
        street_address,
    }))
}

/// `MapGoogleError`: non-200 responses.
fn map_google_error<T>(_ctx: &MapContext<'_>, res: &ResponseDescriptor) -> MapResult<T> {
    let body = res.body_auto();
    let code = body
        .str_at("/status")
        .map(str::to_string)
        .unwrap_or_else(|| res.status.to_string());
    let rate_limit = (res.status == 429)
        .then(|| rate_limited(&res.headers, &RateLimitHeaders::retry_after_only()))
        .flatten();
    Ok(Err(ErrorDetail::new(status_title(res.status))
        .with_detail_opt(body_message(body))
        .with_code(code)
        .with_rate_limit(rate_limit)))
}
