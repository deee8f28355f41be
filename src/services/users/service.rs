//! Users service implementation.

use super::{ListUsersRequest, ListUsersResponse};
use crate::auth::AuthManager;
use crate::errors::ExportResult;
use crate::resilience::{ApiCategory, Resilience};
use crate::transport::{ApiRequest, HttpTransport};
use crate::types::User;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Users service
#[derive(Clone)]
pub struct UsersService {
    transport: Arc<dyn HttpTransport>,
    auth: AuthManager,
    base_url: String,
    resilience: Arc<Resilience>,
}

impl UsersService {
    /// Create a new users service
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: AuthManager,
        base_url: String,
        resilience: Arc<Resilience>,
    ) -> Self {
        Self {
            transport,
            auth,
            base_url,
            resilience,
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// Fetch one page of the user directory
    #[instrument(skip(self))]
    pub async fn list(&self, request: ListUsersRequest) -> ExportResult<ListUsersResponse> {
        let url = self.build_url("users.list");
        let headers = self.auth.headers()?;
        let transport = self.transport.clone();

        let value = self
            .resilience
            .execute(ApiCategory::General, || {
                let req = ApiRequest::new(url.clone(), headers.clone())
                    .opt_param("cursor", request.cursor.as_ref().map(|c| c.to_string()))
                    .opt_param("limit", request.limit.map(|l| l.to_string()));
                let transport = transport.clone();
                async move { transport.call_api(req).await }
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    /// Fetch the complete user directory, following pagination
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> ExportResult<Vec<User>> {
        let limit = self.resilience.page_limit(ApiCategory::General);
        let mut users = Vec::new();
        let mut cursor = None;

        loop {
            let mut request = ListUsersRequest::new().limit(limit);
            if let Some(c) = cursor {
                request = request.cursor(c);
            }

            let response = self.list(request).await?;
            users.extend(response.members.iter().cloned());

            match response.next_cursor() {
                Some(next) => {
                    debug!(cursor = %next, "Fetching next user page");
                    cursor = Some(next);
                }
                None => break,
            }
        }

        debug!(count = users.len(), "User directory fetched");
        Ok(users)
    }
}

impl std::fmt::Debug for UsersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersService")
            .field("base_url", &self.base_url)
            .finish()
    }
}
