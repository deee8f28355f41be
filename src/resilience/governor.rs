//! Rate governor enforcing minimum spacing between calls per API category.
//!
//! Slack's budget is a fixed calls-per-minute allowance per method tier, so
//! the governor tracks the last call instant per category and makes callers
//! wait out the remainder of the interval. Categories are independent:
//! waiting on conversation history never delays a user-directory call.

use crate::config::ExportConfig;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// API call category, each with its own rate profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCategory {
    /// Directory listings, file downloads, everything but history
    General,
    /// `conversations.history` and `conversations.replies`, the strictest tier
    ConversationHistory,
}

impl std::fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::ConversationHistory => write!(f, "conversation_history"),
        }
    }
}

/// Per-category rate parameters, fixed for the run
#[derive(Debug, Clone)]
pub struct RateProfile {
    /// Minimum spacing between calls
    pub min_interval: Duration,
    /// Maximum items requested per page
    pub max_page_size: u32,
}

struct CategoryState {
    profile: RateProfile,
    last_call: Mutex<Option<Instant>>,
}

impl CategoryState {
    fn new(profile: RateProfile) -> Self {
        Self {
            profile,
            last_call: Mutex::new(None),
        }
    }
}

/// Governor tracking and enforcing per-category call spacing
pub struct RateGovernor {
    general: CategoryState,
    history: CategoryState,
}

impl RateGovernor {
    /// Build the governor from the run configuration.
    ///
    /// The conversation-history profile is selected once by the Marketplace
    /// flag; there is no runtime detection of app approval.
    pub fn new(config: &ExportConfig) -> Self {
        Self::with_profiles(
            RateProfile {
                min_interval: config.access_interval,
                max_page_size: crate::GENERAL_PAGE_LIMIT,
            },
            RateProfile {
                min_interval: config.history_interval(),
                max_page_size: config.history_page_limit(),
            },
        )
    }

    /// Build the governor from explicit profiles
    pub fn with_profiles(general: RateProfile, history: RateProfile) -> Self {
        Self {
            general: CategoryState::new(general),
            history: CategoryState::new(history),
        }
    }

    fn state(&self, category: ApiCategory) -> &CategoryState {
        match category {
            ApiCategory::General => &self.general,
            ApiCategory::ConversationHistory => &self.history,
        }
    }

    /// The rate profile for a category
    pub fn profile(&self, category: ApiCategory) -> &RateProfile {
        &self.state(category).profile
    }

    /// Page cap for a category
    pub fn page_limit(&self, category: ApiCategory) -> u32 {
        self.state(category).profile.max_page_size
    }

    /// Block until the category's interval has elapsed since its last call,
    /// then stamp the new call time and return.
    pub async fn acquire(&self, category: ApiCategory) {
        let state = self.state(category);
        loop {
            let ready_at = {
                let mut last = state.last_call.lock();
                let now = Instant::now();
                match *last {
                    Some(prev) if now < prev + state.profile.min_interval => {
                        Some(prev + state.profile.min_interval)
                    }
                    _ => {
                        *last = Some(now);
                        None
                    }
                }
            };

            match ready_at {
                None => return,
                Some(ready) => {
                    debug!(
                        category = %category,
                        wait_ms = (ready - Instant::now()).as_millis() as u64,
                        "Waiting for rate interval"
                    );
                    tokio::time::sleep_until(ready).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for RateGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGovernor")
            .field("general", &self.general.profile)
            .field("conversation_history", &self.history.profile)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(general_secs: u64, history_secs: u64) -> RateGovernor {
        RateGovernor::with_profiles(
            RateProfile {
                min_interval: Duration::from_secs(general_secs),
                max_page_size: 200,
            },
            RateProfile {
                min_interval: Duration::from_secs(history_secs),
                max_page_size: 15,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_enforces_spacing() {
        let gov = governor(2, 60);

        let start = Instant::now();
        gov.acquire(ApiCategory::General).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        gov.acquire(ApiCategory::General).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_categories_are_independent() {
        let gov = governor(2, 60);

        gov.acquire(ApiCategory::ConversationHistory).await;
        let start = Instant::now();
        // A history wait must not delay the general category.
        gov.acquire(ApiCategory::General).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_interval_passes_through() {
        let gov = governor(2, 60);

        gov.acquire(ApiCategory::General).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        gov.acquire(ApiCategory::General).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_profiles_from_config() {
        let config = crate::config::ExportConfigBuilder::new()
            .user_token("xoxp-test")
            .unwrap()
            .build_unchecked();
        let gov = RateGovernor::new(&config);

        assert_eq!(gov.page_limit(ApiCategory::ConversationHistory), 15);
        assert_eq!(
            gov.profile(ApiCategory::ConversationHistory).min_interval,
            Duration::from_secs(60)
        );
        assert_eq!(gov.page_limit(ApiCategory::General), 200);
    }
}
