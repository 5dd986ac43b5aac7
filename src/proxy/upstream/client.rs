// Upstream client implementation

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};
use crate::models::UpstreamProxyConfig;

/// Response header carrying the server-assigned session identifier.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// What came back from one upstream call, reduced to the parts the relay
/// routes on.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub session_id: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two HTTP exchanges the relay performs. Seam for fakes in tests.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// `grant_type=refresh_token` exchange against the token endpoint.
    async fn refresh_token(
        &self,
        endpoint: &str,
        form: &[(&'static str, String)],
    ) -> RelayResult<HttpReply>;

    /// POST one envelope to the relay endpoint with the bearer header and,
    /// if known, the session header.
    async fn post_envelope(
        &self,
        endpoint: &str,
        bearer: &str,
        session_id: Option<&str>,
        envelope: &Value,
    ) -> RelayResult<HttpReply>;
}

pub struct UpstreamClient {
    http_client: Client,
    timeout_secs: u64,
}

impl UpstreamClient {
    pub fn new(timeout_secs: u64, proxy_config: Option<UpstreamProxyConfig>) -> Self {
        let http_client = crate::utils::http::create_client_with_proxy(timeout_secs, proxy_config);
        Self {
            http_client,
            timeout_secs,
        }
    }

    /// A timeout is its own failure mode, distinct from a server-reported error.
    fn map_send_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Timeout(self.timeout_secs)
        } else {
            RelayError::Network(e)
        }
    }

    async fn into_reply(&self, response: reqwest::Response) -> RelayResult<HttpReply> {
        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        Ok(HttpReply {
            status,
            session_id,
            body,
        })
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn refresh_token(
        &self,
        endpoint: &str,
        form: &[(&'static str, String)],
    ) -> RelayResult<HttpReply> {
        let response = self
            .http_client
            .post(endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.into_reply(response).await
    }

    async fn post_envelope(
        &self,
        endpoint: &str,
        bearer: &str,
        session_id: Option<&str>,
        envelope: &Value,
    ) -> RelayResult<HttpReply> {
        let mut request = self
            .http_client
            .post(endpoint)
            .header(header::ACCEPT, ACCEPT_VALUE)
            .bearer_auth(bearer)
            .json(envelope);

        if let Some(sid) = session_id {
            request = request.header(SESSION_HEADER, sid);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        self.into_reply(response).await
    }
}
