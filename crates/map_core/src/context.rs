//! Per-invocation context handed to every map function, and sub-map
//! composition on top of it.

use crate::error::{Defect, TransportError};
use crate::outcome::{ErrorDetail, MapResult, Outcome};
use crate::provider::{resolve_request_url, Provider};
use crate::types::{Method, RequestDescriptor, ResponseDescriptor};
use crate::vars::Vars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// The HTTP collaborator. Blocks until the response is available.
pub trait HttpTransport {
    fn send(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError> {
        (**self).send(request)
    }
}

/// What the caller hands to a usecase: all three bags are opaque here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub security: Value,
}

impl Invocation {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            parameters: Value::Object(Map::new()),
            security: Value::Object(Map::new()),
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_security(mut self, security: Value) -> Self {
        self.security = security;
        self
    }
}

pub struct MapContext<'a> {
    provider: &'a Provider,
    parameters: Map<String, Value>,
    security: &'a Value,
    transport: &'a dyn HttpTransport,
}

impl<'a> MapContext<'a> {
    pub fn new(
        provider: &'a Provider,
        invocation: &'a Invocation,
        transport: &'a dyn HttpTransport,
    ) -> Self {
        Self {
            provider,
            parameters: provider.merge_parameters(&invocation.parameters),
            security: &invocation.security,
            transport,
        }
    }

    pub fn provider(&self) -> &Provider {
        self.provider
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    pub fn security(&self) -> &Value {
        self.security
    }

    pub fn url(&self, service: Option<&str>, path_template: &str, vars: &Vars) -> Result<String, Defect> {
        resolve_request_url(self.provider, &self.parameters, service, path_template, vars)
    }

    /// Request on the default service.
    pub fn request(&self, method: Method, path_template: &str, vars: &Vars) -> Result<RequestDescriptor, Defect> {
        Ok(RequestDescriptor::new(method, self.url(None, path_template, vars)?))
    }

    /// Applies the provider's security scheme `scheme` to `request`.
    pub fn secure(&self, request: RequestDescriptor, scheme: &str) -> MapResult<RequestDescriptor> {
        Ok(self.provider.scheme(scheme)?.apply(request, self.security))
    }

    /// Issues one HTTP call. Transport failures become a "Network error"
    /// outcome; they are never defects.
    pub fn fetch(&self, request: &RequestDescriptor) -> Outcome<ResponseDescriptor> {
        debug!(provider = %self.provider.name, method = %request.method, url = %request.url, "sending request");
        match self.transport.send(request) {
            Ok(response) => {
                trace!(status = response.status, bytes = response.raw.len(), "response received");
                Ok(response)
            }
            Err(e) => {
                debug!(error = %e, "transport failed");
                Err(ErrorDetail::new("Network error").with_detail(e.to_string()))
            }
        }
    }

    /// Calls a sub-map whose failure is part of its contract. Its outcome is
    /// returned as data for the caller to branch on.
    pub fn invoke<A, T, F>(&self, name: &str, args: A, map: F) -> MapResult<T>
    where
        F: FnOnce(&MapContext<'a>, A) -> MapResult<T>,
    {
        debug!(submap = name, "invoking sub-map");
        let outcome = map(self, args)?;
        if let Err(e) = &outcome {
            debug!(submap = name, title = %e.title, "sub-map returned error");
        }
        Ok(outcome)
    }

    /// Calls a sub-map that must not fail here. An error outcome means the
    /// adapter is wrong and is escalated as [`Defect::InfallibleSubMap`].
    pub fn invoke_infallible<A, T, F>(&self, name: &str, args: A, map: F) -> Result<T, Defect>
    where
        F: FnOnce(&MapContext<'a>, A) -> MapResult<T>,
    {
        match self.invoke(name, args, map)? {
            Ok(value) => Ok(value),
            Err(e) => Err(Defect::InfallibleSubMap {
                map: name.to_string(),
                title: e.title,
                detail: e.detail,
            }),
        }
    }
}

/// Required string field of a map's input, or a "Missing required input" error.
pub fn require_str<'v>(input: &'v Value, field: &str) -> Outcome<&'v str> {
    input
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing_input(field))
}

pub fn require_f64(input: &Value, field: &str) -> Outcome<f64> {
    input
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing_input(field))
}

pub fn optional_str<'v>(input: &'v Value, field: &str) -> Option<&'v str> {
    input
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub fn missing_input(field: &str) -> ErrorDetail {
    ErrorDetail::new("Missing required input").with_detail(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Any, ResponseDispatch};
    use crate::error::TransportErrorKind;
    use crate::security::SecurityScheme;
    use serde_json::json;
    use std::cell::RefCell;

    struct Canned(RefCell<Vec<Result<ResponseDescriptor, TransportError>>>);

    impl HttpTransport for Canned {
        fn send(&self, _: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError> {
            self.0.borrow_mut().remove(0)
        }
    }

    fn provider() -> Provider {
        Provider::new("acme")
            .service("default", "https://acme.test")
            .security_scheme(SecurityScheme::bearer("bearer"))
    }

    fn reshape(_: &MapContext<'_>, raw: Value) -> MapResult<String> {
        match raw.get("name").and_then(Value::as_str) {
            Some(n) => Ok(Ok(n.to_uppercase())),
            None => Ok(Err(missing_input("name"))),
        }
    }

    #[test]
    fn invoke_propagates_error_as_data() {
        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![]));
        let ctx = MapContext::new(&p, &inv, &t);
        let out = ctx.invoke("Reshape", json!({}), reshape).unwrap();
        assert_eq!(out.unwrap_err().title, "Missing required input");
    }

    #[test]
    fn invoke_infallible_escalates_error() {
        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![]));
        let ctx = MapContext::new(&p, &inv, &t);
        assert_eq!(
            ctx.invoke_infallible("Reshape", json!({"name": "ok"}), reshape).unwrap(),
            "OK"
        );
        let err = ctx.invoke_infallible("Reshape", json!({}), reshape).unwrap_err();
        assert!(matches!(err, Defect::InfallibleSubMap { map, .. } if map == "Reshape"));
    }

    #[test]
    fn transport_failure_is_network_error_outcome() {
        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![Err(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        ))]));
        let ctx = MapContext::new(&p, &inv, &t);
        let req = ctx.request(Method::Get, "/x", &Vars::new()).unwrap();
        let err = ctx.fetch(&req).unwrap_err();
        assert_eq!(err.title, "Network error");
        assert_eq!(err.detail.as_deref(), Some("connect: connection refused"));
    }

    #[test]
    fn secure_with_unknown_scheme_is_defect() {
        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![]));
        let ctx = MapContext::new(&p, &inv, &t);
        let req = RequestDescriptor::get("https://acme.test");
        assert!(matches!(
            ctx.secure(req, "oauth"),
            Err(Defect::UnknownSecurityScheme { .. })
        ));
    }

    #[test]
    fn secure_with_missing_token_is_domain_error() {
        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![]));
        let ctx = MapContext::new(&p, &inv, &t);
        let out = ctx.secure(RequestDescriptor::get("https://acme.test"), "bearer").unwrap();
        assert_eq!(out.unwrap_err().title, "Missing credentials");
    }

    #[test]
    fn map_with_error_funnel_sub_map() {
        fn map_error(_: &MapContext<'_>, res: &ResponseDescriptor) -> MapResult<u32> {
            Ok(Err(ErrorDetail::new("Provider error")
                .with_detail_opt(res.body_auto().str_at("/message"))))
        }

        fn get_count(ctx: &MapContext<'_>, _input: &Value) -> MapResult<u32> {
            let req = ctx.request(Method::Get, "/count", &Vars::new())?;
            let res = crate::try_outcome!(ctx.fetch(&req));
            ResponseDispatch::new("GetCount")
                .on(200, "json", |r| {
                    Ok(r.body_auto()
                        .pointer("/count")
                        .and_then(Value::as_u64)
                        .map(|c| c as u32)
                        .ok_or_else(|| ErrorDetail::new("Malformed response")))
                })
                .on(Any, "json", |r| ctx.invoke("MapError", r, map_error))
                .dispatch(&res)
        }

        let p = provider();
        let inv = Invocation::new(json!({}));
        let t = Canned(RefCell::new(vec![
            Ok(ResponseDescriptor::json(200, &json!({"count": 7}))),
            Ok(ResponseDescriptor::json(500, &json!({"message": "down"}))),
        ]));
        let ctx = MapContext::new(&p, &inv, &t);
        assert_eq!(get_count(&ctx, &inv.input).unwrap(), Ok(7));
        let err = get_count(&ctx, &inv.input).unwrap().unwrap_err();
        assert_eq!(err.title, "Provider error");
        assert_eq!(err.detail.as_deref(), Some("down"));
    }

    #[test]
    fn require_helpers() {
        let input = json!({"a": "x", "blank": "  ", "n": 1.5});
        assert_eq!(require_str(&input, "a").unwrap(), "x");
        assert_eq!(require_str(&input, "blank").unwrap_err().detail.as_deref(), Some("blank"));
        assert_eq!(require_f64(&input, "n").unwrap(), 1.5);
        assert!(require_f64(&input, "a").is_err());
        assert_eq!(optional_str(&input, "missing"), None);
    }
}
