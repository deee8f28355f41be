//! Slack workspace exporter
//!
//! Rate-limit-aware, resumable export of a complete Slack workspace:
//! users, conversations of every type, full message history including
//! threads, and file attachments.
//!
//! - Per-category rate governance matching Slack's per-method tiers,
//!   including the 1 request/minute, 15 items/page regime imposed on
//!   non-Marketplace apps for `conversations.history` and
//!   `conversations.replies`
//! - Retry with exponential backoff that honors server `Retry-After`
//! - Durable progress checkpoints after every acknowledged page, so an
//!   interrupted run resumes without refetching
//! - Output as plain JSON files, split per conversation and per day
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use slack_export::{ExportClient, ExportConfig, Exporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::from_env()?;
//!     let client = ExportClient::new(config)?;
//!     let summary = Exporter::new(client).run(false).await?;
//!     println!("Exported {} conversations", summary.completed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;
pub mod types;

// Services
pub mod services;

// Pagination and durability
pub mod export;
pub mod pagination;
pub mod progress;

// Resilience
pub mod resilience;

// Observability
pub mod observability;

// Testing utilities
pub mod fixtures;
pub mod mocks;

// Tests
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use client::ExportClient;
pub use config::{ExportConfig, ExportConfigBuilder};
pub use errors::{ExportError, ExportResult};
pub use export::{Exporter, ExportSummary};

/// Default base URL for the Slack Web API
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Default spacing between general API calls, in seconds
pub const DEFAULT_ACCESS_INTERVAL_SECS: u64 = 2;

/// Default spacing between conversation history calls for non-Marketplace
/// apps, in seconds
pub const DEFAULT_CONVERSATIONS_INTERVAL_SECS: u64 = 60;

/// Page cap for general listing calls
pub const GENERAL_PAGE_LIMIT: u32 = 200;

/// History/replies page cap for Marketplace-approved apps
pub const MARKETPLACE_PAGE_LIMIT: u32 = 200;

/// History/replies page cap imposed on non-Marketplace apps
pub const NON_MARKETPLACE_PAGE_LIMIT: u32 = 15;
