//! Runtime configuration: where each provider lives and how calls are bounded.
//!
//! Precedence for a service base URL, highest first:
//! 1. `MAPX_<PROVIDER>_<SERVICE>_URL` environment variable
//! 2. `providers.<name>.services.<id>` in the JSON config file
//! 3. the provider's built-in default

mod error;

pub use error::{ConfigError, Result};

use lazy_static::lazy_static;
use map_core::Provider;
use map_http::TransportPolicy;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use map_http::DEFAULT_TIMEOUT_MS;

lazy_static! {
    /// Config file named by `MAPX_CONFIG`, if any.
    pub static ref CONFIG_PATH: Option<PathBuf> = std::env::var_os("MAPX_CONFIG").map(PathBuf::from);
    /// `MAPX_HTTP_TIMEOUT_MS`, if set to a number.
    pub static ref HTTP_TIMEOUT_MS: Option<u64> = std::env::var("MAPX_HTTP_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.trim().parse().ok());
}


#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderOverrides>,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOverrides {
    /// service id -> base URL
    #[serde(default)]
    pub services: BTreeMap<String, String>,
    /// default parameters, overridden by invocation parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSettings {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_response_bytes: usize,
    /// Largest timeout calls may use; 0 means no cap.
    #[serde(default)]
    pub max_timeout_ms: u64,
    #[serde(default)]
    pub allowed_urls: Vec<String>,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// `path`, else `MAPX_CONFIG`, else an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path.or(CONFIG_PATH.as_deref()) {
            Some(p) => {
                debug!(path = %p.display(), "loading config");
                Self::from_file(p)
            }
            None => Ok(Self::default()),
        }
    }

    /// `MAPX_HTTP_TIMEOUT_MS`, else the file's `http.timeout_ms`, else 10s.
    pub fn timeout_ms(&self) -> u64 {
        HTTP_TIMEOUT_MS
            .or(self.http.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn transport_policy(&self) -> TransportPolicy {
        TransportPolicy {
            allowed_urls: self.http.allowed_urls.clone(),
            max_response_bytes: self.http.max_response_bytes,
            max_timeout_ms: self.http.max_timeout_ms,
        }
    }

    /// Applies file and process-environment overrides to `provider`.
    pub fn apply(&self, provider: &mut Provider) {
        self.apply_with_env(provider, |key| std::env::var(key).ok())
    }

    pub fn apply_with_env(&self, provider: &mut Provider, env: impl Fn(&str) -> Option<String>) {
        if let Some(overrides) = self.providers.get(&provider.name) {
            for (id, url) in &overrides.services {
                provider.set_service_url(id.as_str(), url.as_str());
            }
            for (k, v) in &overrides.parameters {
                provider.parameters.insert(k.clone(), v.clone());
            }
        }

        let ids: Vec<String> = provider.services.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            let key = service_env_key(&provider.name, &id);
            if let Some(url) = env(&key) {
                debug!(provider = %provider.name, service = %id, "base url from {key}");
                provider.set_service_url(id, url);
            }
        }
    }
}

/// `MAPX_<PROVIDER>_<SERVICE>_URL`, upper-cased, `-` and `.` as `_`.
pub fn service_env_key(provider: &str, service: &str) -> String {
    let norm = |s: &str| s.to_ascii_uppercase().replace(['-', '.'], "_");
    format!("MAPX_{}_{}_URL", norm(provider), norm(service))
}
