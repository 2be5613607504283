// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rust counterpart of the injected page stub.
//
// Same contract as `window.<ns>.call` / `_handleResponse`: numeric ids
// starting at 1, one pending entry per call, responses for unknown ids
// ignored. Used by the console host and the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::dispatcher::Dispatcher;
use crate::protocol::{BridgeResponse, CallbackId};
use crate::ui::UiReceiver;

/// Why a call did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No native boundary to send to.
    #[error("{0} not available")]
    Unavailable(String),

    /// The native side answered with a failure.
    #[error("{0}")]
    Rejected(String),

    #[error("bridge dropped the call")]
    Dropped,
}

/// The native boundary as seen from the page.
pub trait Transport: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, action: &str, payload: &str, callback_id: &str) -> Result<(), CallError>;
}

type Reply = Result<Value, CallError>;

pub struct BridgeClient<T> {
    transport: Option<T>,
    native_object: String,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
}

impl<T: Transport> BridgeClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_transport(Some(transport))
    }

    /// Client on a page without a native boundary.
    pub fn detached() -> Self {
        Self::with_transport(None)
    }

    fn with_transport(transport: Option<T>) -> Self {
        Self {
            transport,
            native_object: "AndroidBridge".into(),
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Name reported when the boundary is missing.
    pub fn with_native_object(mut self, name: impl Into<String>) -> Self {
        self.native_object = name.into();
        self
    }

    pub fn is_native(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_available())
    }

    /// Issue a call and wait for its response.
    pub async fn call(&self, action: &str, payload: Option<&Value>) -> Result<Value, CallError> {
        let transport = self
            .transport
            .as_ref()
            .filter(|t| t.is_available())
            .ok_or_else(|| CallError::Unavailable(self.native_object.clone()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);
        // Removes the entry however this future ends, including being dropped.
        let _entry = PendingEntry { client: self, id };

        let payload = payload.map(Value::to_string).unwrap_or_default();
        transport.send(action, &payload, &id.to_string())?;
        rx.await.unwrap_or(Err(CallError::Dropped))
    }

    /// Settle the pending call `callback_id`. Unknown ids are ignored.
    pub fn deliver_response(&self, callback_id: &str, success: bool, data: Option<Value>) -> bool {
        let Ok(id) = callback_id.parse::<u64>() else {
            return false;
        };
        let Some(tx) = self.lock_pending().remove(&id) else {
            return false;
        };
        let reply = if success {
            Ok(data.unwrap_or(Value::Null))
        } else {
            let message = data
                .as_ref()
                .and_then(|d| d.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            Err(CallError::Rejected(message.to_owned()))
        };
        // The caller may have stopped waiting; the entry is gone either way.
        let _ = tx.send(reply);
        true
    }

    pub fn deliver(&self, response: BridgeResponse) -> bool {
        self.deliver_response(response.callback_id.as_str(), response.success, response.data)
    }

    pub fn pending_calls(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Reply>>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct PendingEntry<'a, T: Transport> {
    client: &'a BridgeClient<T>,
    id: u64,
}

impl<T: Transport> Drop for PendingEntry<'_, T> {
    fn drop(&mut self) {
        self.client.lock_pending().remove(&self.id);
    }
}

/// In-process boundary straight into a [`Dispatcher`].
pub struct LocalTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Transport for LocalTransport {
    fn send(&self, action: &str, payload: &str, callback_id: &str) -> Result<(), CallError> {
        self.dispatcher
            .dispatch(action, payload, CallbackId::new(callback_id));
        Ok(())
    }
}

/// Feed responses from the UI queue to `client` until the queue closes.
pub async fn pump_responses<T: Transport>(client: Arc<BridgeClient<T>>, mut responses: UiReceiver) {
    while let Some(response) = responses.recv().await {
        if !client.deliver(response) {
            tracing::debug!("response for an unknown call ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl Transport for Arc<Recorder> {
        fn send(&self, action: &str, payload: &str, callback_id: &str) -> Result<(), CallError> {
            self.sent.lock().expect("lock").push((
                action.to_owned(),
                payload.to_owned(),
                callback_id.to_owned(),
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_payload_defaults_to_empty() {
        let recorder = Arc::new(Recorder::default());
        let client = Arc::new(BridgeClient::new(Arc::clone(&recorder)));

        let first = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.call("device.info", None).await }
        });
        let second = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.call("storage.get", Some(&json!({ "key": "k" }))).await }
        });
        while client.pending_calls() < 2 {
            tokio::task::yield_now().await;
        }

        let sent = recorder.sent.lock().expect("lock").clone();
        let mut ids: Vec<&str> = sent.iter().map(|(_, _, id)| id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["1", "2"]);
        let info = sent.iter().find(|(a, _, _)| a == "device.info").expect("sent");
        assert_eq!(info.1, "");

        // Settle in reverse order: each call gets its own data.
        for (action, _, id) in &sent {
            client.deliver_response(id, true, Some(json!({ "action": action })));
        }
        assert_eq!(
            first.await.expect("join"),
            Ok(json!({ "action": "device.info" }))
        );
        assert_eq!(
            second.await.expect("join"),
            Ok(json!({ "action": "storage.get" }))
        );
    }

    #[tokio::test]
    async fn unknown_and_duplicate_deliveries_are_ignored() {
        let recorder = Arc::new(Recorder::default());
        let client = Arc::new(BridgeClient::new(Arc::clone(&recorder)));
        assert!(!client.deliver_response("99", true, None));

        let call = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.call("clipboard.read", None).await }
        });
        while client.pending_calls() < 1 {
            tokio::task::yield_now().await;
        }
        assert!(client.deliver_response("1", false, Some(json!({ "error": "nope" }))));
        assert!(!client.deliver_response("1", true, None));
        assert_eq!(
            call.await.expect("join"),
            Err(CallError::Rejected("nope".into()))
        );
    }

    #[tokio::test]
    async fn failure_without_data_uses_a_generic_message() {
        let recorder = Arc::new(Recorder::default());
        let client = Arc::new(BridgeClient::new(Arc::clone(&recorder)));
        let call = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.call("haptic", None).await }
        });
        while client.pending_calls() < 1 {
            tokio::task::yield_now().await;
        }
        client.deliver_response("1", false, None);
        assert_eq!(
            call.await.expect("join"),
            Err(CallError::Rejected("Unknown error".into()))
        );
    }

    #[tokio::test]
    async fn abandoned_calls_leave_no_pending_entry() {
        let recorder = Arc::new(Recorder::default());
        let client = Arc::new(BridgeClient::new(Arc::clone(&recorder)));
        let call = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.call("location.current", None).await }
        });
        while client.pending_calls() < 1 {
            tokio::task::yield_now().await;
        }

        call.abort();
        assert!(call.await.expect_err("aborted").is_cancelled());
        assert_eq!(client.pending_calls(), 0);
        assert!(!client.deliver_response("1", true, None));
    }

    #[tokio::test]
    async fn missing_boundary_rejects_without_a_pending_entry() {
        let client = BridgeClient::<LocalTransport>::detached();
        assert!(!client.is_native());
        let err = client.call("haptic", None).await.expect_err("unavailable");
        assert_eq!(err.to_string(), "AndroidBridge not available");
        assert_eq!(client.pending_calls(), 0);
    }
}
