//! Built-in provider maps and the catalog that routes
//! `(provider, usecase)` to them.
//!
//! | provider      | usecases                    |
//! |---------------|-----------------------------|
//! | `google-maps` | `Geocode`, `ReverseGeocode` |
//! | `slack`       | `SendMessage`, `ListChannels` |
//! | `strava`      | `ListActivities`            |
//! | `twilio`      | `SendMessage`               |

pub mod common;
pub mod google_maps;
pub mod slack;
pub mod strava;
pub mod twilio;

use map_core::{
    log_invocation, Defect, HttpTransport, Invocation, MapResult, Provider, UsecaseDispatcher,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Provider name to its usecase dispatcher.
pub struct Catalog {
    providers: BTreeMap<String, UsecaseDispatcher>,
}

/// Every built-in provider, each logging invocations through
/// [`log_invocation`].
pub fn catalog() -> Catalog {
    Catalog::new()
        .register(google_maps::dispatcher().with_debug_hook(log_invocation))
        .register(slack::dispatcher().with_debug_hook(log_invocation))
        .register(strava::dispatcher().with_debug_hook(log_invocation))
        .register(twilio::dispatcher().with_debug_hook(log_invocation))
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Adds a dispatcher under its provider's name, replacing any previous one.
    pub fn register(mut self, dispatcher: UsecaseDispatcher) -> Self {
        self.providers
            .insert(dispatcher.provider().name.clone(), dispatcher);
        self
    }

    pub fn get(&self, provider: &str) -> Option<&UsecaseDispatcher> {
        self.providers.get(provider)
    }

    pub fn providers(&self) -> impl Iterator<Item = &UsecaseDispatcher> {
        self.providers.values()
    }

    /// Applies `f` to every provider description, e.g. to override base URLs.
    pub fn configure(&mut self, mut f: impl FnMut(&mut Provider)) {
        for dispatcher in self.providers.values_mut() {
            f(dispatcher.provider_mut());
        }
    }

    pub fn perform(
        &self,
        provider: &str,
        usecase: &str,
        invocation: &Invocation,
        transport: &dyn HttpTransport,
    ) -> MapResult<Value> {
        let dispatcher = self
            .get(provider)
            .ok_or_else(|| Defect::UnknownProvider(provider.to_string()))?;
        dispatcher.perform(usecase, invocation, transport)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_builtin_providers_sorted() {
        let c = catalog();
        let names: Vec<&str> = c.providers().map(|d| d.provider().name.as_str()).collect();
        assert_eq!(names, vec!["google-maps", "slack", "strava", "twilio"]);
    }

    #[test]
    fn configure_reaches_every_provider() {
        let mut c = catalog();
        c.configure(|p| p.set_service_url("default", format!("http://stub/{}", p.name)));
        let slack = c.get("slack").unwrap().provider();
        assert_eq!(slack.service_url(None).unwrap(), "http://stub/slack");
    }
}
