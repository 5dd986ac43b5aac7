// Authenticated transport against the remote relay endpoint.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{RelayError, RelayResult};
use crate::proxy::protocol::{self, DecodedBody, RpcMessage, PROTOCOL_VERSION};
use crate::proxy::session::SessionState;
use crate::proxy::token_manager::TokenManager;
use crate::proxy::trace::CallTrace;
use crate::proxy::upstream::Upstream;

/// Process-level relay context: upstream seam, token manager, session state
/// and the outbound id counter, all mutated by the single queue worker.
pub struct Relay {
    upstream: Arc<dyn Upstream>,
    tokens: TokenManager,
    session: SessionState,
    server_url: String,
    next_id: u64,
}

impl Relay {
    pub fn new(upstream: Arc<dyn Upstream>, tokens: TokenManager, server_url: String) -> Self {
        Self {
            upstream,
            tokens,
            session: SessionState::new(),
            server_url,
            next_id: 1,
        }
    }

    /// Forward one caller message through the handshake gate.
    pub async fn dispatch(
        &mut self,
        method: &str,
        params: Option<Value>,
        trace: &mut CallTrace,
    ) -> RelayResult<Option<Value>> {
        self.ensure_initialized(trace).await?;
        self.send(method, params, trace).await
    }

    /// Perform the protocol handshake exactly once per process lifetime.
    ///
    /// Tolerant on purpose: a handshake response with no decodable payload
    /// does not block proxying — the `initialized` notification is sent and
    /// the session marked initialized either way. Auth and remote failures
    /// still propagate, leaving the session uninitialized for a later retry.
    pub async fn ensure_initialized(&mut self, trace: &mut CallTrace) -> RelayResult<()> {
        if self.session.is_initialized() {
            return Ok(());
        }

        trace.note("starting session handshake");
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        match self.send("initialize", Some(params), trace).await {
            Ok(_) => {}
            Err(RelayError::Decode(_)) => {
                trace.note("initialize returned no payload, continuing anyway");
            }
            Err(e) => return Err(e),
        }

        self.send("notifications/initialized", None, trace).await?;
        self.session.mark_initialized();
        trace.note("session handshake complete");
        Ok(())
    }

    /// Send one envelope and decode the reply.
    ///
    /// Requests get an id from the monotonic counter; notification methods
    /// omit it and return `Ok(None)` when the reply carries no payload.
    pub async fn send(
        &mut self,
        method: &str,
        params: Option<Value>,
        trace: &mut CallTrace,
    ) -> RelayResult<Option<Value>> {
        let is_note = protocol::is_notification(method);
        let envelope = if is_note {
            RpcMessage::notification(method, params)
        } else {
            let id = self.next_id;
            self.next_id += 1;
            RpcMessage::request(json!(id), method, params)
        };
        let body = serde_json::to_value(&envelope)?;

        trace.note(format!("sending {}", method));

        // Bounded re-auth: attempt 1 may refresh once, attempt 2 is final.
        let mut attempt = 1;
        let reply = loop {
            let token = self
                .tokens
                .get_access_token(self.upstream.as_ref(), trace)
                .await?;

            let reply = self
                .upstream
                .post_envelope(&self.server_url, &token, self.session.session_id(), &body)
                .await?;
            trace.note(format!("response status {}", reply.status));

            if reply.status == 401 {
                if attempt == 1 {
                    trace.note("got 401, refreshing token and retrying once");
                    self.tokens.invalidate();
                    attempt += 1;
                    continue;
                }
                return Err(RelayError::Auth {
                    status: reply.status,
                    body: reply.body,
                });
            }
            break reply;
        };

        if let Some(sid) = &reply.session_id {
            if self.session.record_session_id(sid) {
                trace.note("captured session id");
            }
        }

        if !reply.is_success() {
            return Err(RelayError::Remote {
                status: reply.status,
                body: reply.body,
            });
        }

        match protocol::decode_body(&reply.body)? {
            Some(decoded) => {
                trace.note(match &decoded {
                    DecodedBody::Framed(_) => "parsed event frame",
                    DecodedBody::Direct(_) => "parsed direct JSON",
                });
                Ok(Some(decoded.into_payload()))
            }
            None if is_note => Ok(None),
            None => Err(RelayError::Decode("no payload in response body".to_string())),
        }
    }
}
