// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// biometric.available / biometric.authenticate
//
// The system prompt reports three kinds of events. A rejected finger or
// face is not final (the prompt stays up for another attempt), so only
// success and terminal errors settle the call.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use tether_core::error::{Result, TetherError};

use super::non_empty;
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::correlator::{PendingRequests, RequestToken};
use crate::platform::traits::{BiometricAvailability, BiometricPrompt};
use crate::registry::{Empty, Handler, RegistryBuilder};

/// Key under which hosts report prompt events.
pub const EVENT_KEY: &str = "biometricEvent";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub reason: Option<String>,
    pub title: Option<String>,
    pub cancel_text: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
}

/// One callback from the system prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum BiometricEvent {
    Succeeded,
    /// Not recognised; the user may try again.
    Failed,
    /// The prompt closed (cancelled, locked out, hardware error...).
    Error { code: i32, message: String },
}

impl BiometricEvent {
    /// Read an event from a host result, `None` if it carries none.
    pub fn from_host(value: &Value) -> Option<Self> {
        match value.get(EVENT_KEY)?.as_str()? {
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "error" => Some(Self::Error {
                code: value
                    .get("code")
                    .and_then(Value::as_i64)
                    .and_then(|c| i32::try_from(c).ok())
                    .unwrap_or(-1),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Biometric authentication failed")
                    .to_owned(),
            }),
            _ => None,
        }
    }

    pub fn to_host(&self) -> Value {
        match self {
            Self::Succeeded => json!({ EVENT_KEY: "succeeded" }),
            Self::Failed => json!({ EVENT_KEY: "failed" }),
            Self::Error { code, message } => {
                json!({ EVENT_KEY: "error", "code": code, "message": message })
            }
        }
    }

    fn into_result(self) -> Option<AuthResult> {
        match self {
            Self::Succeeded => Some(AuthResult {
                success: true,
                error: None,
                error_code: None,
            }),
            Self::Failed => None,
            Self::Error { code, message } => Some(AuthResult {
                success: false,
                error: Some(message),
                error_code: Some(code),
            }),
        }
    }
}

/// Route a prompt event to the authenticate call waiting on `token`.
/// Returns whether the call settled.
pub fn report_biometric_event(
    pending: &PendingRequests,
    token: RequestToken,
    event: BiometricEvent,
) -> bool {
    if event == BiometricEvent::Failed {
        tracing::debug!(%token, "biometric attempt not recognised, prompt stays open");
        return false;
    }
    pending.complete(token, Ok(event.to_host()))
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("biometric.available", |ctx: &HandlerContext, _: Empty| {
            // Failures still answer the page, as an unavailable sensor.
            Ok(ctx
                .platform()
                .biometric_availability()
                .unwrap_or_else(|e| BiometricAvailability::unavailable(e.to_string())))
        })
        .handler("biometric.authenticate", Authenticate)
}

struct Authenticate;

impl Handler for Authenticate {
    type Request = AuthenticateRequest;
    type Response = AuthResult;

    fn handle(&self, ctx: &HandlerContext, req: AuthenticateRequest, done: Completion<AuthResult>) {
        let prompt = BiometricPrompt {
            title: non_empty(req.title.as_deref())
                .unwrap_or("Biometric Authentication")
                .to_owned(),
            reason: non_empty(req.reason.as_deref())
                .unwrap_or("Authenticate to continue")
                .to_owned(),
            cancel_text: non_empty(req.cancel_text.as_deref())
                .unwrap_or("Cancel")
                .to_owned(),
        };

        ctx.host_request(
            done,
            |platform, token| platform.authenticate(token, &prompt),
            |_, reply| {
                BiometricEvent::from_host(&reply)
                    .and_then(BiometricEvent::into_result)
                    .ok_or_else(|| TetherError::platform("Unexpected biometric result"))
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handlers::test_support::{run, start, wait_for_request};
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn availability_passes_through() {
        let platform = FakePlatform::new();
        platform.state().biometric = BiometricAvailability::unavailable("No biometrics enrolled");
        assert_eq!(
            run(&platform, "biometric.available", json!({})).await,
            Ok(json!({ "available": false, "type": "none", "error": "No biometrics enrolled" }))
        );
    }

    #[tokio::test]
    async fn failed_attempts_do_not_settle_the_call() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let mut rx = start(&ctx, "biometric.authenticate", json!({ "title": "Unlock" }));
        let token = wait_for_request(&platform, "authenticate").await;
        assert_eq!(platform.host_requests()[0].detail, "Unlock");

        assert!(!report_biometric_event(ctx.pending(), token, BiometricEvent::Failed));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        assert!(report_biometric_event(ctx.pending(), token, BiometricEvent::Succeeded));
        assert_eq!(rx.await.expect("settled"), Ok(json!({ "success": true })));
    }

    #[tokio::test]
    async fn terminal_errors_resolve_with_the_code() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let rx = start(&ctx, "biometric.authenticate", json!({}));
        let token = wait_for_request(&platform, "authenticate").await;
        assert_eq!(platform.host_requests()[0].detail, "Biometric Authentication");

        let event = BiometricEvent::Error {
            code: 13,
            message: "Cancel".into(),
        };
        report_biometric_event(ctx.pending(), token, event);
        assert_eq!(
            rx.await.expect("settled"),
            Ok(json!({ "success": false, "error": "Cancel", "errorCode": 13 }))
        );
    }

    #[test]
    fn events_survive_the_host_encoding() {
        for event in [
            BiometricEvent::Succeeded,
            BiometricEvent::Failed,
            BiometricEvent::Error {
                code: 7,
                message: "Too many attempts".into(),
            },
        ] {
            assert_eq!(BiometricEvent::from_host(&event.to_host()), Some(event));
        }
        assert_eq!(BiometricEvent::from_host(&json!({ "granted": true })), None);
    }
}
