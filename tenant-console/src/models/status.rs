use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error envelope returned by the tenant service on non-2xx responses.
///
/// `code` may be numeric (gRPC status) or a string depending on the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RpcStatus {
    /// Parse an error body. Bodies that are not an envelope keep their raw
    /// text as the message.
    pub fn from_error_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).unwrap_or_else(|_| Self::from_text(body))
            }
            _ => Self::from_text(body),
        }
    }

    fn from_text(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).trim().to_string();
        Self {
            message: (!text.is_empty()).then_some(text),
            ..Default::default()
        }
    }

    pub fn code_string(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(code) => Some(code.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.as_deref().unwrap_or("no message");
        match self.code_string() {
            Some(code) => write!(f, "{} (code {})", message, code),
            None => f.write_str(message),
        }
    }
}
