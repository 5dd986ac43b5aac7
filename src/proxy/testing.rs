// Scripted upstream fake shared by the relay's test modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::RelayResult;
use crate::models::{CredentialRecord, CredentialStore};
use crate::proxy::token_manager::TokenManager;
use crate::proxy::transport::Relay;
use crate::proxy::upstream::{HttpReply, Upstream};

/// Records every exchange and answers from pre-scripted reply queues.
/// An unscripted call is a test bug and panics.
pub(crate) struct FakeUpstream {
    pub rpc_replies: Mutex<VecDeque<RelayResult<HttpReply>>>,
    pub refresh_replies: Mutex<VecDeque<RelayResult<HttpReply>>>,
    /// (session header, envelope) per rpc call, in order.
    pub rpc_calls: Mutex<Vec<(Option<String>, Value)>>,
    pub refresh_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self {
            rpc_replies: Mutex::new(VecDeque::new()),
            refresh_replies: Mutex::new(VecDeque::new()),
            rpc_calls: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn script_rpc(&self, reply: RelayResult<HttpReply>) {
        self.rpc_replies.lock().unwrap().push_back(reply);
    }

    pub fn script_refresh(&self, reply: RelayResult<HttpReply>) {
        self.refresh_replies.lock().unwrap().push_back(reply);
    }

    pub fn ok_body(body: &str) -> RelayResult<HttpReply> {
        Ok(HttpReply {
            status: 200,
            session_id: None,
            body: body.to_string(),
        })
    }

    /// A 200 whose body is a single `data:` event frame.
    pub fn ok_framed(payload: &str) -> RelayResult<HttpReply> {
        Ok(HttpReply {
            status: 200,
            session_id: None,
            body: format!("event: message\ndata: {}\n\n", payload),
        })
    }

    pub fn status(status: u16, body: &str) -> RelayResult<HttpReply> {
        Ok(HttpReply {
            status,
            session_id: None,
            body: body.to_string(),
        })
    }

    pub fn with_session(reply: RelayResult<HttpReply>, session_id: &str) -> RelayResult<HttpReply> {
        reply.map(|mut r| {
            r.session_id = Some(session_id.to_string());
            r
        })
    }

    pub fn sent_methods(&self) -> Vec<String> {
        self.rpc_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, envelope)| envelope["method"].as_str().unwrap_or("").to_string())
            .collect()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn refresh_token(
        &self,
        _endpoint: &str,
        _form: &[(&'static str, String)],
    ) -> RelayResult<HttpReply> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted refresh call")
    }

    async fn post_envelope(
        &self,
        _endpoint: &str,
        _bearer: &str,
        session_id: Option<&str>,
        envelope: &Value,
    ) -> RelayResult<HttpReply> {
        self.rpc_calls
            .lock()
            .unwrap()
            .push((session_id.map(|s| s.to_string()), envelope.clone()));
        self.rpc_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted rpc call")
    }
}

/// A relay over the fake, with a pre-issued access token on disk.
pub(crate) fn relay_with(upstream: Arc<FakeUpstream>) -> (tempfile::TempDir, Relay) {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("credentials.json"));
    let record = CredentialRecord {
        client_id: "cid".to_string(),
        access_token: "at-0".to_string(),
        refresh_token: "rt-0".to_string(),
        created_at: Utc::now(),
    };
    store.save(&record).unwrap();

    let tokens = TokenManager::new(store, record, "https://t/token".to_string());
    let relay = Relay::new(upstream, tokens, "https://t/mcp".to_string());
    (dir, relay)
}

/// Scripts the two handshake exchanges (`initialize` + `initialized`).
pub(crate) fn script_handshake(upstream: &FakeUpstream) {
    upstream.script_rpc(FakeUpstream::ok_framed(
        r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}"#,
    ));
    upstream.script_rpc(FakeUpstream::status(202, ""));
}
