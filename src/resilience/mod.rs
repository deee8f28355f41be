//! Resilience layer: rate governance and retry with backoff.
//!
//! Every outbound call goes through [`Resilience::execute`], which spaces
//! calls per API category and absorbs rate-limit and transient failures.

pub mod governor;
pub mod retry;

pub use governor::{ApiCategory, RateGovernor, RateProfile};
pub use retry::{Resilience, RetryConfig};
