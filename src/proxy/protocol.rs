// JSON-RPC 2.0 envelope types and response body decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// Protocol version sent during the session handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// An outbound request or notification.
///
/// Notifications (no `id`) use the same wire format but expect no response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcMessage {
    /// Create a request (has an id, expects a response).
    pub fn request(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Create a notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// The caller's correlation id, with an explicit `null` treated as absent.
    pub fn correlation_id(&self) -> Option<Value> {
        self.id.clone().filter(|v| !v.is_null())
    }
}

/// A response emitted back to the caller (success or error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

// ===== Standard error codes =====

pub const RPC_PARSE_ERROR: i32 = -32700;
pub const RPC_INVALID_REQUEST: i32 = -32600;
pub const RPC_METHOD_NOT_FOUND: i32 = -32601;
pub const RPC_INVALID_PARAMS: i32 = -32602;
pub const RPC_INTERNAL_ERROR: i32 = -32603;

/// One-way methods carry no id and expect no response.
pub fn is_notification(method: &str) -> bool {
    method.starts_with("notifications/")
}

/// How a response body delivered its payload.
///
/// The remote answers either with a bare JSON document or with a single
/// streamed event (`data: <json>`); both decode to the same payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// Payload extracted from the first `data:` event frame.
    Framed(Value),
    /// The whole body parsed as JSON.
    Direct(Value),
}

impl DecodedBody {
    pub fn into_payload(self) -> Value {
        match self {
            Self::Framed(v) | Self::Direct(v) => v,
        }
    }
}

/// Decode a response body as a framed event or a direct JSON document.
///
/// Returns `Ok(None)` when the body carries no payload at all, which is
/// expected for notifications. A `data:` frame that is not valid JSON is a
/// decode error rather than an empty body.
pub fn decode_body(text: &str) -> RelayResult<Option<DecodedBody>> {
    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            if !data.trim().is_empty() {
                let value = serde_json::from_str(data).map_err(|e| {
                    RelayError::Decode(format!("invalid JSON in event frame: {}", e))
                })?;
                return Ok(Some(DecodedBody::Framed(value)));
            }
        }
    }

    let trimmed = text.trim();
    if !trimmed.is_empty() {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Ok(Some(DecodedBody::Direct(value)));
        }
        tracing::debug!(
            "response body is not JSON: {}",
            trimmed.chars().take(100).collect::<String>()
        );
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_id_and_skips_missing_params() {
        let msg = RpcMessage::request(json!(1), "tools/call", None);
        let text = serde_json::to_string(&msg).unwrap();
        assert!(text.contains(r#""id":1"#));
        assert!(!text.contains("params"));
    }

    #[test]
    fn test_notification_omits_id() {
        let msg = RpcMessage::notification("notifications/initialized", None);
        let text = serde_json::to_string(&msg).unwrap();
        assert!(!text.contains(r#""id""#));
    }

    #[test]
    fn test_null_id_is_not_a_correlation_id() {
        let msg: RpcMessage = serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"m"}"#).unwrap();
        assert_eq!(msg.correlation_id(), None);
    }

    #[test]
    fn test_notification_method_detection() {
        assert!(is_notification("notifications/initialized"));
        assert!(!is_notification("initialize"));
        assert!(!is_notification("tools/call"));
    }

    #[test]
    fn test_decode_framed_and_direct_agree() {
        let payload = r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
        let framed = decode_body(&format!("event: message\ndata: {}\n\n", payload))
            .unwrap()
            .unwrap();
        let direct = decode_body(payload).unwrap().unwrap();

        assert!(matches!(framed, DecodedBody::Framed(_)));
        assert!(matches!(direct, DecodedBody::Direct(_)));
        assert_eq!(framed.into_payload(), direct.into_payload());
    }

    #[test]
    fn test_decode_framed_extracts_result() {
        let decoded = decode_body("data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.into_payload()["result"], json!({"ok": true}));
    }

    #[test]
    fn test_decode_skips_empty_data_frames() {
        let decoded = decode_body("data: \ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{}}\n")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.into_payload()["id"], json!(2));
    }

    #[test]
    fn test_decode_empty_body_is_no_payload() {
        assert_eq!(decode_body("").unwrap(), None);
        assert_eq!(decode_body("  \n ").unwrap(), None);
        assert_eq!(decode_body("Accepted").unwrap(), None);
    }

    #[test]
    fn test_decode_bad_frame_is_an_error() {
        assert!(decode_body("data: {not json").is_err());
    }
}
