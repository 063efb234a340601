//! Execution protocol shared by every provider map.
//!
//! A map turns a normalized usecase call into provider HTTP requests and the
//! provider's responses back into a normalized result. This crate holds the
//! part every map shares:
//!
//! ```text
//! UsecaseDispatcher::perform(usecase, invocation, transport)
//!   │
//!   ▼
//! map fn (&MapContext, &input) ──► ctx.fetch(request) ──► HttpTransport
//!   │                                   │
//!   │                                   ▼
//!   │                      ResponseDispatch (first matching rule)
//!   │                                   │
//!   ├── ctx.invoke(..)           sub-map, error kept as data
//!   ├── ctx.invoke_infallible(..) sub-map, error escalated as Defect
//!   └── paginate(..)             bounded page loop
//!   │
//!   ▼
//! MapResult<T> = Result<Outcome<T>, Defect>
//! ```
//!
//! `Outcome<T>` is `Result<T, ErrorDetail>`: provider-reported failures are
//! data. `Defect` is reserved for bugs in the map itself and is never
//! converted into an `ErrorDetail`.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod outcome;
pub mod pagination;
pub mod provider;
pub mod security;
pub mod types;
pub mod usecase;
pub mod vars;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{
    missing_input, optional_str, require_f64, require_str, HttpTransport, Invocation, MapContext,
};
pub use dispatch::{Any, ContentTypePredicate, ResponseDispatch, StatusPredicate};
pub use error::{Defect, TransportError, TransportErrorKind};
pub use outcome::{percentage, ErrorDetail, MapResult, Outcome, RateLimitHeaders, RateLimitInfo};
pub use pagination::{paginate, Page, DEFAULT_PAGE_CEILING};
pub use provider::{resolve_request_url, Provider, Service, DEFAULT_SERVICE};
pub use security::{ApiKeyPlacement, SecurityScheme};
pub use types::{Body, Headers, Method, RequestBody, RequestDescriptor, ResponseDescriptor};
pub use usecase::{log_invocation, mask_security, UsecaseDispatcher};
pub use vars::Vars;
