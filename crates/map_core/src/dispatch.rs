//! Ordered response dispatch.
//!
//! A map lists `(status, content-type, handler)` rules in the order it wants
//! them tried. The first rule whose two predicates hold runs, and no other.
//! A response no rule accepts is a protocol defect: the map forgot a case.
//!
//! ```rust,ignore
//! ResponseDispatch::new("Geocode")
//!     .on(200, "application/json", |res| geocode_result(res))
//!     .on(Any, "application/json", |res| ctx.invoke("MapError", res, map_error))
//!     .dispatch(&response)
//! ```

use crate::error::Defect;
use crate::outcome::MapResult;
use crate::types::ResponseDescriptor;
use tracing::debug;

/// Wildcard for either predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPredicate {
    Code(u16),
    Any,
}

impl StatusPredicate {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusPredicate::Code(code) => *code == status,
            StatusPredicate::Any => true,
        }
    }
}

impl From<u16> for StatusPredicate {
    fn from(code: u16) -> Self {
        StatusPredicate::Code(code)
    }
}

/// Lets bare literals (`.on(200, ..)`) be used. Codes outside `u16` are a
/// mistake in the rule table: debug builds panic, release builds get a rule
/// that never matches.
impl From<i32> for StatusPredicate {
    fn from(code: i32) -> Self {
        let status = u16::try_from(code);
        debug_assert!(status.is_ok(), "status code {code} is out of range");
        StatusPredicate::Code(status.unwrap_or(0))
    }
}

impl From<Any> for StatusPredicate {
    fn from(_: Any) -> Self {
        StatusPredicate::Any
    }
}

/// Matches when any `content-type` value contains the needle
/// (ASCII case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypePredicate {
    Contains(String),
    Any,
}

impl ContentTypePredicate {
    pub fn matches(&self, content_types: &[String]) -> bool {
        match self {
            ContentTypePredicate::Any => true,
            ContentTypePredicate::Contains(needle) => {
                let needle = needle.to_ascii_lowercase();
                content_types
                    .iter()
                    .any(|value| value.to_ascii_lowercase().contains(&needle))
            }
        }
    }
}

impl From<&str> for ContentTypePredicate {
    fn from(needle: &str) -> Self {
        ContentTypePredicate::Contains(needle.to_string())
    }
}

impl From<Any> for ContentTypePredicate {
    fn from(_: Any) -> Self {
        ContentTypePredicate::Any
    }
}

type Handler<'a, T> = Box<dyn FnOnce(&ResponseDescriptor) -> MapResult<T> + 'a>;

pub struct DispatchRule<'a, T> {
    pub status: StatusPredicate,
    pub content_type: ContentTypePredicate,
    handler: Handler<'a, T>,
}

impl<T> DispatchRule<'_, T> {
    pub fn matches(&self, response: &ResponseDescriptor) -> bool {
        self.status.matches(response.status) && self.content_type.matches(response.content_types())
    }
}

/// Rule table for one HTTP call of one map.
pub struct ResponseDispatch<'a, T> {
    map: String,
    rules: Vec<DispatchRule<'a, T>>,
}

impl<'a, T> ResponseDispatch<'a, T> {
    /// `map` names the calling map in defects and logs.
    pub fn new(map: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            rules: Vec::new(),
        }
    }

    pub fn on<F>(
        mut self,
        status: impl Into<StatusPredicate>,
        content_type: impl Into<ContentTypePredicate>,
        handler: F,
    ) -> Self
    where
        F: FnOnce(&ResponseDescriptor) -> MapResult<T> + 'a,
    {
        self.rules.push(DispatchRule {
            status: status.into(),
            content_type: content_type.into(),
            handler: Box::new(handler),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs the first matching rule. No match is [`Defect::UnexpectedResponse`].
    pub fn dispatch(self, response: &ResponseDescriptor) -> MapResult<T> {
        for (index, rule) in self.rules.into_iter().enumerate() {
            if rule.matches(response) {
                debug!(map = %self.map, rule = index, status = response.status, "dispatch rule matched");
                return (rule.handler)(response);
            }
        }
        Err(Defect::UnexpectedResponse {
            map: self.map,
            status: response.status,
            content_type: response.content_types().join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorDetail;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn first_matching_rule_wins() {
        let res = ResponseDescriptor::json(200, &json!({}));
        let second_ran = Cell::new(false);
        let out = ResponseDispatch::new("T")
            .on(200, "application/json", |_| Ok(Ok("first")))
            .on(Any, Any, |_| {
                second_ran.set(true);
                Ok(Ok("second"))
            })
            .dispatch(&res)
            .unwrap();
        assert_eq!(out, Ok("first"));
        assert!(!second_ran.get());
    }

    #[test]
    fn earlier_wildcard_shadows_later_exact() {
        let res = ResponseDescriptor::json(404, &json!({}));
        let out = ResponseDispatch::new("T")
            .on(Any, "json", |_| Ok(Ok(1)))
            .on(404, "json", |_| Ok(Ok(2)))
            .dispatch(&res)
            .unwrap();
        assert_eq!(out, Ok(1));
    }

    #[test]
    fn content_type_distinguishes_same_status() {
        let plain = ResponseDescriptor::text(500, "text/plain", "oops");
        let out = ResponseDispatch::new("T")
            .on(500, "application/json", |_| Ok(Ok("json")))
            .on(500, "text/plain", |_| Ok(Ok("text")))
            .dispatch(&plain)
            .unwrap();
        assert_eq!(out, Ok("text"));
    }

    #[test]
    fn content_type_match_is_substring_over_all_values() {
        let res = ResponseDescriptor::text(200, "text/html", "")
            .with_header("content-type", "application/vnd.api+json");
        let out = ResponseDispatch::new("T")
            .on(200, "json", |_| Ok(Ok(())))
            .dispatch(&res)
            .unwrap();
        assert!(out.is_ok());
    }

    #[test]
    fn no_match_is_unexpected_response_defect() {
        let res = ResponseDescriptor::text(418, "text/plain", "teapot");
        let err = ResponseDispatch::<()>::new("Geocode")
            .on(200, "application/json", |_| Ok(Ok(())))
            .dispatch(&res)
            .unwrap_err();
        match err {
            Defect::UnexpectedResponse {
                map,
                status,
                content_type,
            } => {
                assert_eq!(map, "Geocode");
                assert_eq!(status, 418);
                assert_eq!(content_type, "text/plain");
            }
            other => panic!("unexpected defect: {other}"),
        }
    }

    #[test]
    fn missing_content_type_only_matches_any() {
        let res = ResponseDescriptor::new(204, Default::default(), vec![]);
        let out = ResponseDispatch::new("T")
            .on(204, "json", |_| Ok(Ok("json")))
            .on(204, Any, |_| Ok(Ok("any")))
            .dispatch(&res)
            .unwrap();
        assert_eq!(out, Ok("any"));
    }

    #[test]
    fn catch_all_turns_429_into_domain_error() {
        let res = ResponseDescriptor::json(429, &json!({"message": "slow down"}));
        let out = ResponseDispatch::<()>::new("T")
            .on(200, "json", |_| Ok(Ok(())))
            .on(Any, Any, |r| {
                Ok(Err(ErrorDetail::new("Rate limit exceeded")
                    .with_detail_opt(r.body_auto().str_at("/message"))))
            })
            .dispatch(&res)
            .unwrap();
        let err = out.unwrap_err();
        assert_eq!(err.title, "Rate limit exceeded");
        assert_eq!(err.detail.as_deref(), Some("slow down"));
    }

    #[test]
    fn literal_status_codes_convert() {
        assert_eq!(StatusPredicate::from(404), StatusPredicate::Code(404));
        assert!(StatusPredicate::from(429).matches(429));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "status code 70000 is out of range")]
    fn out_of_range_status_literal_panics_in_debug() {
        let _ = ResponseDispatch::<()>::new("T").on(70000, Any, |_| Ok(Ok(())));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "status code -1 is out of range")]
    fn negative_status_literal_panics_in_debug() {
        let _ = StatusPredicate::from(-1);
    }
}
