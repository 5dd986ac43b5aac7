use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};

/// Persisted OAuth credentials, produced once by the external bootstrap and
/// rewritten after every successful refresh.
///
/// `access_token` is always the most recently issued value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub client_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

/// On-disk home of the credential record.
///
/// The file is shared across process invocations; concurrent relays racing on
/// it is accepted (last writer wins) for a single-user local setup.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the record. A missing file is a hard error — the relay cannot
    /// authenticate without a bootstrap-issued refresh token.
    pub fn load(&self) -> RelayResult<CredentialRecord> {
        if !self.path.exists() {
            return Err(RelayError::Credential(format!(
                "credential file does not exist: {:?} (run the OAuth bootstrap first)",
                self.path
            )));
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| RelayError::Credential(format!("failed to read credential file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| RelayError::Credential(format!("failed to parse credential file: {}", e)))
    }

    /// Save the record (atomic write).
    pub fn save(&self, record: &CredentialRecord) -> RelayResult<()> {
        let content = serde_json::to_string_pretty(record)?;

        let mut temp_path = self.path.clone();
        temp_path.set_extension("json.tmp");

        // Write to temp file
        fs::write(&temp_path, content)
            .map_err(|e| RelayError::Credential(format!("failed to write temp file: {}", e)))?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)
            .map_err(|e| RelayError::Credential(format!("failed to replace credential file: {}", e)))
    }
}
