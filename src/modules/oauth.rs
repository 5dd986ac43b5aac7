use serde::{Deserialize, Serialize};

use crate::error::RelayResult;
use crate::models::CredentialRecord;

/// Token endpoint response for the refresh-token exchange.
///
/// The endpoint may rotate the refresh token; when it does, the new value
/// replaces the stored one.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
}

/// Form body for `grant_type=refresh_token`.
pub fn refresh_request_form(record: &CredentialRecord) -> Vec<(&'static str, String)> {
    vec![
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", record.refresh_token.clone()),
        ("client_id", record.client_id.clone()),
    ]
}

pub fn parse_token_response(body: &str) -> RelayResult<TokenResponse> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_refresh_form_fields() {
        let record = CredentialRecord {
            client_id: "cid".to_string(),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            created_at: Utc::now(),
        };

        let form = refresh_request_form(&record);
        assert_eq!(form[0], ("grant_type", "refresh_token".to_string()));
        assert_eq!(form[1], ("refresh_token", "rt".to_string()));
        assert_eq!(form[2], ("client_id", "cid".to_string()));
    }

    #[test]
    fn test_parse_with_and_without_rotation() {
        let rotated =
            parse_token_response(r#"{"access_token":"new-at","refresh_token":"new-rt"}"#).unwrap();
        assert_eq!(rotated.access_token, "new-at");
        assert_eq!(rotated.refresh_token.as_deref(), Some("new-rt"));

        let plain = parse_token_response(r#"{"access_token":"new-at"}"#).unwrap();
        assert_eq!(plain.refresh_token, None);

        assert!(parse_token_response(r#"{"error":"invalid_grant"}"#).is_err());
    }
}
