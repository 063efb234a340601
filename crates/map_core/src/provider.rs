//! Provider description: named services (base URLs), security schemes and
//! default parameters, plus request URL resolution against them.

use crate::error::{Defect, Result};
use crate::security::SecurityScheme;
use crate::vars::{scalar_string, Vars};
use serde_json::{Map, Value};

pub const DEFAULT_SERVICE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    pub services: Vec<Service>,
    pub default_service: String,
    pub security: Vec<SecurityScheme>,
    pub parameters: Map<String, Value>,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: Vec::new(),
            default_service: DEFAULT_SERVICE.to_string(),
            security: Vec::new(),
            parameters: Map::new(),
        }
    }

    /// Adds a service, or replaces the base URL of an existing one.
    pub fn service(mut self, id: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.set_service_url(id, base_url);
        self
    }

    pub fn set_service_url(&mut self, id: impl Into<String>, base_url: impl Into<String>) {
        let id = id.into();
        let base_url = base_url.into();
        match self.services.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.base_url = base_url,
            None => self.services.push(Service { id, base_url }),
        }
    }

    pub fn default_service(mut self, id: impl Into<String>) -> Self {
        self.default_service = id.into();
        self
    }

    pub fn security_scheme(mut self, scheme: SecurityScheme) -> Self {
        self.security.push(scheme);
        self
    }

    pub fn parameter_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn service_url(&self, id: Option<&str>) -> Result<&str> {
        let id = id.unwrap_or(self.default_service.as_str());
        self.services
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.base_url.as_str())
            .ok_or_else(|| Defect::UnknownService {
                provider: self.name.clone(),
                service: id.to_string(),
            })
    }

    pub fn scheme(&self, id: &str) -> Result<&SecurityScheme> {
        self.security
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| Defect::UnknownSecurityScheme {
                provider: self.name.clone(),
                scheme: id.to_string(),
            })
    }

    /// Provider defaults overlaid with `overrides`; override values win.
    pub fn merge_parameters(&self, overrides: &Value) -> Map<String, Value> {
        let mut merged = self.parameters.clone();
        if let Some(obj) = overrides.as_object() {
            for (k, v) in obj {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

/// Builds the absolute URL for `path_template` on service `service_id`
/// (the provider's default service when `None`).
///
/// `{NAME}` placeholders in the base URL come from `parameters`; those in the
/// path come from `vars` and are percent-encoded.
pub fn resolve_request_url(
    provider: &Provider,
    parameters: &Map<String, Value>,
    service_id: Option<&str>,
    path_template: &str,
    vars: &Vars,
) -> Result<String> {
    let base = substitute(provider.service_url(service_id)?, |key| {
        parameters.get(key).and_then(scalar_string)
    })?;
    let path = substitute(path_template, |key| {
        vars.scalar(key)
            .map(|v| urlencoding::encode(&v).into_owned())
    })?;

    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        Ok(base.to_string())
    } else {
        Ok(format!("{base}/{path}"))
    }
}

fn substitute(template: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // unterminated brace is literal text
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let key = after[..close].trim();
        let value = lookup(key).ok_or_else(|| Defect::MissingTemplateValue {
            key: key.to_string(),
        })?;
        out.push_str(&value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
