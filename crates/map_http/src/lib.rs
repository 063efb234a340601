//! HTTP transport for provider maps.
//!
//! Maps build a `RequestDescriptor`; this crate sends it and hands back a
//! `ResponseDescriptor`. Failures are reported as `TransportError`, which the
//! map context turns into a "Network error" outcome.
//!
//! ```text
//! MapContext::fetch(request)
//!   │
//!   ▼  check_policy (allowlist, timeout cap)
//! ReqwestTransport::execute()
//!   │
//!   ▼  check_size
//! ResponseDescriptor { status, headers, raw }
//! ```

pub mod cid;
pub mod error;
pub mod policy;
#[cfg(feature = "http")]
pub mod transport;

pub use cid::request_cid;
pub use error::HttpError;
pub use policy::{check_policy, check_size, TransportPolicy, DEFAULT_TIMEOUT_MS};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
