use map_core::testing::ScriptedTransport;
use map_core::{Invocation, MapResult, ResponseDescriptor};
use map_providers::catalog;
use serde_json::{json, Value};

fn security() -> Value {
    json!({"api_key": {"apikey": "AIza-test"}})
}

fn perform(usecase: &str, input: Value, transport: &ScriptedTransport) -> MapResult<Value> {
    let invocation = Invocation::new(input).with_security(security());
    catalog().perform("google-maps", usecase, &invocation, transport)
}

#[test]
fn geocode_ok_returns_first_location() {
    let transport = ScriptedTransport::new().respond(ResponseDescriptor::json(
        200,
        &json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 1.23, "lng": 4.56}}}]
        }),
    ));
    let out = perform("Geocode", json!({"query": "1600 Amphitheatre"}), &transport).unwrap();
    assert_eq!(out, Ok(json!({"latitude": 1.23, "longitude": 4.56})));

    let req = &transport.requests()[0];
    assert_eq!(req.url, "https://maps.googleapis.com/maps/api/geocode/json");
    assert!(req.query.contains(&("address".into(), "1600 Amphitheatre".into())));
    assert!(req.query.contains(&("key".into(), "AIza-test".into())));
}

#[test]
fn geocode_non_ok_status_is_domain_error() {
    let transport = ScriptedTransport::new()
        .respond(ResponseDescriptor::json(200, &json!({"status": "INVALID_REQUEST"})));
    let err = perform("Geocode", json!({"query": "?"}), &transport)
        .unwrap()
        .unwrap_err();
    assert_eq!(err.title, "Error geocoding address");
    assert_eq!(err.detail.as_deref(), Some("INVALID_REQUEST"));
}

#[test]
fn geocode_429_goes_through_catch_all() {
    let transport = ScriptedTransport::new().respond(
        ResponseDescriptor::text(429, "text/plain", "slow down").with_header("retry-after", "30"),
    );
    let err = perform("Geocode", json!({"query": "x"}), &transport)
        .unwrap()
        .unwrap_err();
    assert_eq!(err.title, "Rate limit exceeded");
    assert_eq!(err.detail.as_deref(), Some("slow down"));
    assert_eq!(err.rate_limit.unwrap().retry_after, Some(30));
}

#[test]
fn geocode_without_query_does_not_call_provider() {
    let transport = ScriptedTransport::new();
    let err = perform("Geocode", json!({}), &transport).unwrap().unwrap_err();
    assert_eq!(err.title, "Missing required input");
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn geocode_without_api_key_is_missing_credentials() {
    let transport = ScriptedTransport::new();
    let invocation = Invocation::new(json!({"query": "x"}));
    let err = catalog()
        .perform("google-maps", "Geocode", &invocation, &transport)
        .unwrap()
        .unwrap_err();
    assert_eq!(err.title, "Missing credentials");
    assert_eq!(err.detail.as_deref(), Some("api_key.apikey"));
}

#[test]
fn reverse_geocode_lists_addresses() {
    let transport = ScriptedTransport::new().respond(ResponseDescriptor::json(
        200,
        &json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "Karlův most, Praha",
                    "address_components": [
                        {"long_name": "Praha", "short_name": "Praha", "types": ["locality"]},
                        {"long_name": "Czechia", "short_name": "CZ", "types": ["country"]}
                    ]
                },
                {"formatted_address": "Praha 1"}
            ]
        }),
    ));
    let out = perform(
        "ReverseGeocode",
        json!({"latitude": 50.0865, "longitude": 14.4114}),
        &transport,
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        out,
        json!([
            {"formattedAddress": "Karlův most, Praha", "addressCountry": "CZ", "addressLocality": "Praha"},
            {"formattedAddress": "Praha 1"}
        ])
    );
    let req = &transport.requests()[0];
    assert!(req.query.contains(&("latlng".into(), "50.0865,14.4114".into())));
}

#[test]
fn reverse_geocode_zero_results_is_empty_list() {
    let transport = ScriptedTransport::new()
        .respond(ResponseDescriptor::json(200, &json!({"status": "ZERO_RESULTS", "results": []})));
    let out = perform("ReverseGeocode", json!({"latitude": 0.0, "longitude": 0.0}), &transport)
        .unwrap();
    assert_eq!(out, Ok(json!([])));
}

#[test]
fn reverse_geocode_malformed_result_is_defect() {
    let transport = ScriptedTransport::new()
        .respond(ResponseDescriptor::json(200, &json!({"status": "OK", "results": [42]})));
    let defect = perform("ReverseGeocode", json!({"latitude": 1.0, "longitude": 2.0}), &transport)
        .unwrap_err();
    assert!(matches!(defect, map_core::Defect::InfallibleSubMap { map, .. } if map == "FormatAddress"));
}

#[test]
fn network_failure_is_domain_error() {
    let transport = ScriptedTransport::new().fail(map_core::TransportError::new(
        map_core::TransportErrorKind::Timeout,
        "after 10000ms",
    ));
    let err = perform("Geocode", json!({"query": "x"}), &transport)
        .unwrap()
        .unwrap_err();
    assert_eq!(err.title, "Network error");
    assert_eq!(err.detail.as_deref(), Some("timeout: after 10000ms"));
}
