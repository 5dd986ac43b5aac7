use chrono::Utc;

use crate::error::{RelayError, RelayResult};
use crate::models::{CredentialRecord, CredentialStore};
use crate::modules::oauth;
use crate::proxy::trace::CallTrace;
use crate::proxy::upstream::Upstream;

/// Owns the credential record for the process lifetime.
///
/// There is no expiry tracking: the cached token is used until the transport
/// observes a 401 and calls `invalidate`, at which point the next
/// `get_access_token` performs a refresh-token exchange.
pub struct TokenManager {
    store: CredentialStore,
    record: CredentialRecord,
    token_endpoint: String,
    cached: Option<String>,
    preissued_spent: bool,
}

impl TokenManager {
    /// Create new TokenManager around a loaded credential record.
    pub fn new(store: CredentialStore, record: CredentialRecord, token_endpoint: String) -> Self {
        Self {
            store,
            record,
            token_endpoint,
            cached: None,
            preissued_spent: false,
        }
    }

    /// Return a usable bearer token, acquiring one lazily.
    ///
    /// The bootstrap-issued access token is used directly until it fails
    /// once; after that every acquisition goes through the token endpoint.
    pub async fn get_access_token(
        &mut self,
        upstream: &dyn Upstream,
        trace: &mut CallTrace,
    ) -> RelayResult<String> {
        if let Some(token) = &self.cached {
            return Ok(token.clone());
        }

        if !self.preissued_spent && !self.record.access_token.is_empty() {
            trace.note("using stored access token directly");
            self.cached = Some(self.record.access_token.clone());
            return Ok(self.record.access_token.clone());
        }

        self.refresh(upstream, trace).await
    }

    /// Drop the cached token so the next acquisition refreshes.
    pub fn invalidate(&mut self) {
        self.cached = None;
        self.preissued_spent = true;
    }

    async fn refresh(
        &mut self,
        upstream: &dyn Upstream,
        trace: &mut CallTrace,
    ) -> RelayResult<String> {
        trace.note("refreshing access token");

        let form = oauth::refresh_request_form(&self.record);
        let reply = upstream.refresh_token(&self.token_endpoint, &form).await?;

        if !reply.is_success() {
            trace.note(format!("token refresh failed: {}", reply.status));
            return Err(RelayError::Auth {
                status: reply.status,
                body: reply.body,
            });
        }

        let tokens = oauth::parse_token_response(&reply.body)?;

        self.record.access_token = tokens.access_token.clone();
        if let Some(rotated) = tokens.refresh_token {
            self.record.refresh_token = rotated;
        }
        self.record.created_at = Utc::now();

        // Persist only after a successful exchange
        self.store.save(&self.record)?;

        self.cached = Some(tokens.access_token.clone());
        trace.note("token refreshed successfully");
        Ok(tokens.access_token)
    }
}
