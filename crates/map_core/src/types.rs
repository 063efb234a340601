use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-valued header map. Names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `name` with `value`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), vec![value.into()]);
    }

    /// Add `value` next to any existing values of `name`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k.as_ref(), v);
        }
        headers
    }
}

/// Body of an outgoing request. The transport sets the matching content type
/// unless the request already carries one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
}

/// A fully resolved HTTP request: url, headers, query and body are final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Adds the query pair only when `value` is present.
    pub fn query_opt(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form<K: Into<String>, V: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }
}

/// Decoded response body, chosen from the declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON value at `pointer` (RFC 6901), if the body is JSON and the path exists.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.pointer(pointer))
    }

    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(Value::as_str)
    }
}

/// Response as handed back by the transport. The body is decoded lazily,
/// at most once, on the first call to [`ResponseDescriptor::body_auto`].
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub headers: Headers,
    pub raw: Vec<u8>,
    decoded: OnceCell<Body>,
}

impl ResponseDescriptor {
    pub fn new(status: u16, headers: Headers, raw: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            raw,
            decoded: OnceCell::new(),
        }
    }

    /// `application/json` response with `body` serialized.
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type", "application/json; charset=utf-8");
        Self::new(status, headers, body.to_string().into_bytes())
    }

    pub fn text(status: u16, content_type: &str, body: &str) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type", content_type);
        Self::new(status, headers, body.as_bytes().to_vec())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// All values of the `content-type` header.
    pub fn content_types(&self) -> &[String] {
        self.headers.get_all("content-type")
    }

    pub fn body_auto(&self) -> &Body {
        self.decoded.get_or_init(|| decode_body(self.content_types(), &self.raw))
    }
}

impl PartialEq for ResponseDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.headers == other.headers && self.raw == other.raw
    }
}

fn decode_body(content_types: &[String], raw: &[u8]) -> Body {
    if raw.is_empty() {
        return Body::Empty;
    }
    let declared = content_types.join(",").to_ascii_lowercase();
    if declared.contains("json") {
        return match serde_json::from_slice(raw) {
            Ok(v) => Body::Json(v),
            Err(e) => {
                warn!(error = %e, "body declared as json failed to decode, keeping text");
                Body::Text(String::from_utf8_lossy(raw).into_owned())
            }
        };
    }
    if declared.contains("text/") || declared.contains("xml") || declared.contains("form-urlencoded")
    {
        return Body::Text(String::from_utf8_lossy(raw).into_owned());
    }
    Body::Binary(raw.to_vec())
}
