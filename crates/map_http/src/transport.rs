//! Blocking reqwest transport. Every call is checked against the
//! [`TransportPolicy`] before it is sent and after the body is read.

use crate::cid::request_cid;
use crate::error::{HttpError, Result};
use crate::policy::{check_policy, check_size, TransportPolicy};
use map_core::{
    Headers, HttpTransport, RequestBody, RequestDescriptor, ResponseDescriptor, TransportError,
};
use std::time::Duration;
use tracing::{debug, trace};

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    policy: TransportPolicy,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(policy: TransportPolicy, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!("mapx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Http(e.to_string()))?;
        Ok(Self {
            client,
            policy,
            timeout_ms,
        })
    }

    pub fn policy(&self) -> &TransportPolicy {
        &self.policy
    }

    /// Execute `request` and collect the full response.
    pub fn execute(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor> {
        check_policy(&request.url, self.timeout_ms, &self.policy)?;

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| HttpError::Http(e.to_string()))?;
        let mut req = self.client.request(method, &request.url);

        for (k, v) in request.headers.iter() {
            req = req.header(k, v);
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Form(pairs) => req.form(pairs),
            RequestBody::Text(text) => {
                let req = if request.headers.contains("content-type") {
                    req
                } else {
                    req.header("content-type", "text/plain; charset=utf-8")
                };
                req.body(text.clone())
            }
        };

        let cid = request_cid(request);
        debug!(request = %cid, method = %request.method, url = %request.url, "http call");

        let resp = req.send().map_err(|e| self.classify(e))?;
        let status = resp.status().as_u16();

        let mut headers = Headers::new();
        for (k, v) in resp.headers() {
            if let Ok(val) = v.to_str() {
                headers.append(k.as_str(), val);
            }
        }

        let body = resp.bytes().map_err(|e| self.classify(e))?;
        check_size(body.len(), &self.policy)?;

        debug!(request = %cid, status, bytes = body.len(), "http response");
        trace!(request = %cid, body = %String::from_utf8_lossy(&body), "response body");
        Ok(ResponseDescriptor::new(status, headers, body.to_vec()))
    }

    fn classify(&self, e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if e.is_connect() {
            HttpError::Connect(e.to_string())
        } else {
            HttpError::Http(e.to_string())
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &RequestDescriptor) -> std::result::Result<ResponseDescriptor, TransportError> {
        self.execute(request).map_err(TransportError::from)
    }
}
