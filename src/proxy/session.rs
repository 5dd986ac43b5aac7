// Session state negotiated with the remote server.

/// In-memory session state, owned by the relay for the process lifetime.
///
/// `initialized` flips to true after the handshake exchange and never flips
/// back. A session id issued by the server sticks until the server issues a
/// different one; it is never cleared mid-session.
#[derive(Debug, Default)]
pub struct SessionState {
    session_id: Option<String>,
    initialized: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record a server-assigned session id. Returns true when the id changed.
    pub fn record_session_id(&mut self, id: &str) -> bool {
        if self.session_id.as_deref() == Some(id) {
            return false;
        }
        tracing::info!(
            "got session id: {}...",
            id.chars().take(20).collect::<String>()
        );
        self.session_id = Some(id.to_string());
        true
    }
}
