// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types of the call/response protocol.
//
// Outbound (page -> native): `(action, payload JSON string, callback id)`.
// Inbound (native -> page): one evaluated statement
// `window.<ns>._handleResponse(<id>, <bool>, <json|null>);`.

use serde_json::{Map, Value, json};

use tether_core::error::{Result, TetherError};

/// Identifier the page attached to a call. Normally a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackId(String);

impl CallbackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the id as a JavaScript expression.
    ///
    /// Numeric ids are emitted bare so they match the numeric keys of the
    /// page's callback table. Anything else is emitted as a quoted string
    /// literal and cannot break out of the statement.
    pub fn to_js(&self) -> String {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.clone()
        } else {
            js_json(&Value::String(self.0.clone()))
        }
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallbackId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Parse the payload string of a call. An empty string is an empty object.
pub fn parse_payload(payload_json: &str) -> Result<Value> {
    if payload_json.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_str::<Value>(payload_json) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(TetherError::invalid("Payload must be a JSON object")),
        Err(e) => Err(TetherError::invalid(format!("Invalid payload: {e}"))),
    }
}

/// One call as received from the page.
#[derive(Debug, Clone)]
pub struct BridgeRequest {
    pub action: String,
    pub payload: Value,
    pub callback_id: CallbackId,
}

/// Outcome of one call, addressed to the page's pending entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    pub callback_id: CallbackId,
    pub success: bool,
    pub data: Option<Value>,
}

impl BridgeResponse {
    /// Successful response. `null` data is sent as `null`.
    pub fn success(callback_id: CallbackId, data: Value) -> Self {
        Self {
            callback_id,
            success: true,
            data: (!data.is_null()).then_some(data),
        }
    }

    /// Failed response carrying `{"error": message}`.
    pub fn failure(callback_id: CallbackId, message: impl Into<String>) -> Self {
        Self {
            callback_id,
            success: false,
            data: Some(json!({ "error": message.into() })),
        }
    }

    /// Message of a failed response.
    pub fn error_message(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.data.as_ref()?.get("error")?.as_str()
    }

    /// Statement that hands this response to the page's client stub.
    pub fn to_script(&self, namespace: &str) -> String {
        let data = self.data.as_ref().map_or_else(|| "null".to_owned(), js_json);
        format!(
            "window.{namespace}._handleResponse({}, {}, {data});",
            self.callback_id.to_js(),
            self.success,
        )
    }
}

/// JSON text that is also a valid JavaScript expression.
///
/// U+2028 and U+2029 are legal in JSON strings but terminate lines in older
/// JavaScript engines.
fn js_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail.
    let text = serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned());
    text.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Receiver of finished responses, typically the UI queue.
pub trait ResponseSink: Send + Sync {
    fn deliver(&self, response: BridgeResponse);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_an_empty_object() {
        assert_eq!(parse_payload("").expect("parse"), json!({}));
        assert_eq!(parse_payload("  ").expect("parse"), json!({}));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = parse_payload("[1, 2]").expect_err("array");
        assert_eq!(err.to_string(), "Payload must be a JSON object");
        let err = parse_payload("{oops").expect_err("garbage");
        assert!(err.to_string().starts_with("Invalid payload:"));
    }

    #[test]
    fn success_script_with_numeric_id() {
        let response = BridgeResponse::success(CallbackId::from("7"), json!({"text": "hi"}));
        assert_eq!(
            response.to_script("Tether"),
            r#"window.Tether._handleResponse(7, true, {"text":"hi"});"#
        );
    }

    #[test]
    fn null_result_renders_null() {
        let response = BridgeResponse::success(CallbackId::from("1"), Value::Null);
        assert_eq!(response.data, None);
        assert_eq!(
            response.to_script("Tether"),
            "window.Tether._handleResponse(1, true, null);"
        );
    }

    #[test]
    fn failure_carries_error_field() {
        let response = BridgeResponse::failure(CallbackId::from("3"), "Scan cancelled");
        assert_eq!(response.error_message(), Some("Scan cancelled"));
        assert_eq!(
            response.to_script("App"),
            r#"window.App._handleResponse(3, false, {"error":"Scan cancelled"});"#
        );
    }

    #[test]
    fn non_numeric_ids_are_quoted() {
        let id = CallbackId::from("1); alert(1); (");
        assert_eq!(id.to_js(), r#""1); alert(1); (""#);
        assert_eq!(CallbackId::from("").to_js(), r#""""#);
    }

    #[test]
    fn line_separators_are_escaped() {
        let response = BridgeResponse::success(CallbackId::from("2"), json!({"text": "a\u{2028}b"}));
        let script = response.to_script("Tether");
        assert!(script.contains(r"a\u2028b"));
        assert!(!script.contains('\u{2028}'));
    }
}
