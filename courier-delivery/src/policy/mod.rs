//! Policy abstractions for delivery operations.
//!
//! - [`RetryPolicy`]: attempt budget, per-attempt timeout and backoff
//! - [`TlsPolicyResolver`]: provider-aware TLS parameters for a host

pub mod retry;
pub mod tls;

pub use retry::{Backoff, RetryPolicy};
pub use tls::{MinTlsVersion, ProviderKind, TlsMode, TlsPolicyResolver, TransportParameters};
