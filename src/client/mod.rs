//! Client facade wiring configuration, transport, resilience, and services.

use crate::auth::AuthManager;
use crate::config::ExportConfig;
use crate::errors::ExportResult;
use crate::resilience::{RateGovernor, Resilience, RetryConfig};
use crate::services::{ConversationsService, FileFetcher, UsersService};
use crate::transport::{HttpTransport, ReqwestTransport};
use std::sync::Arc;

/// Configured Slack export client.
///
/// All services share one transport, one rate governor, and one retry
/// configuration; the governor being shared is what makes call spacing
/// hold across services.
#[derive(Clone)]
pub struct ExportClient {
    config: Arc<ExportConfig>,
    resilience: Arc<Resilience>,
    users: UsersService,
    conversations: ConversationsService,
    files: FileFetcher,
}

impl ExportClient {
    /// Create a client with the default reqwest transport
    pub fn new(config: ExportConfig) -> ExportResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(
            config.connect_timeout,
            config.read_timeout,
        )?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(config: ExportConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        let auth = AuthManager::new(config.clone());

        let retry = RetryConfig::new()
            .max_attempts(config.max_retry_attempts)
            .base_backoff(config.base_backoff)
            .max_backoff(config.max_backoff);
        let governor = Arc::new(RateGovernor::new(&config));
        let resilience = Arc::new(Resilience::new(governor, retry));

        let users = UsersService::new(
            transport.clone(),
            auth.clone(),
            config.base_url.clone(),
            resilience.clone(),
        );
        let conversations = ConversationsService::new(
            transport.clone(),
            auth.clone(),
            config.base_url.clone(),
            resilience.clone(),
        );
        let files = FileFetcher::new(transport, auth, resilience.clone());

        Self {
            config,
            resilience,
            users,
            conversations,
            files,
        }
    }

    /// Run configuration
    pub fn config(&self) -> &Arc<ExportConfig> {
        &self.config
    }

    /// Shared resilience wrapper
    pub fn resilience(&self) -> &Arc<Resilience> {
        &self.resilience
    }

    /// Users service
    pub fn users(&self) -> &UsersService {
        &self.users
    }

    /// Conversations service
    pub fn conversations(&self) -> &ConversationsService {
        &self.conversations
    }

    /// File fetcher
    pub fn files(&self) -> &FileFetcher {
        &self.files
    }
}

impl std::fmt::Debug for ExportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportClient")
            .field("config", &self.config)
            .finish()
    }
}
