// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native side of the bridge: routes each call to its handler and delivers
// exactly one response per call to the response sink.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use tether_core::error::TetherError;

use crate::completion::{Outcome, RawCompletion};
use crate::context::HandlerContext;
use crate::protocol::{BridgeRequest, BridgeResponse, CallbackId, ResponseSink, parse_payload};
use crate::registry::HandlerRegistry;

/// Calls left unsettled this long are failed.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

pub struct Dispatcher {
    registry: HandlerRegistry,
    ctx: HandlerContext,
    sink: Arc<dyn ResponseSink>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, ctx: HandlerContext, sink: Arc<dyn ResponseSink>) -> Self {
        Self {
            registry,
            ctx,
            sink,
            timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }

    /// `None` lets calls wait forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Entry point for the native boundary: `(action, payload JSON, id)`.
    pub fn dispatch(&self, action: &str, payload_json: &str, callback_id: CallbackId) {
        if self.ctx.debug().log_bridge_calls() {
            debug!(action, %callback_id, payload = payload_json, "bridge call");
        }
        match parse_payload(payload_json) {
            Ok(payload) => self.dispatch_request(BridgeRequest {
                action: action.to_owned(),
                payload,
                callback_id,
            }),
            Err(e) => {
                warn!(action, %callback_id, error = %e, "rejecting malformed payload");
                self.respond(BridgeResponse::failure(callback_id, e.to_string()));
            }
        }
    }

    pub fn dispatch_request(&self, request: BridgeRequest) {
        let BridgeRequest {
            action,
            payload,
            callback_id,
        } = request;

        let Some(handler) = self.registry.get(&action) else {
            warn!(%action, %callback_id, "no handler registered");
            let message = TetherError::HandlerNotFound(action).to_string();
            self.respond(BridgeResponse::failure(callback_id, message));
            return;
        };

        let (done, outcome) = RawCompletion::channel();
        self.watch(action.clone(), callback_id, outcome);

        let guard = done.panic_guard();
        if let Err(panic) =
            std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(&self.ctx, payload, done)))
        {
            error!(%action, "handler panicked while dispatching");
            guard.settle(&*panic);
        }
    }

    /// Wait for the call's outcome (bounded by the timeout) and deliver it.
    fn watch(&self, action: String, callback_id: CallbackId, outcome: oneshot::Receiver<Outcome>) {
        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        let log_calls = self.ctx.debug().log_bridge_calls();

        drop(self.ctx.runtime().spawn(async move {
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, outcome).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(%action, %callback_id, ?limit, "bridge call timed out");
                        Ok(Err(TetherError::Timeout(action.clone()).to_string()))
                    }
                },
                None => outcome.await,
            };

            let response = match outcome {
                Ok(Ok(data)) => BridgeResponse::success(callback_id, data),
                Ok(Err(message)) => BridgeResponse::failure(callback_id, message),
                Err(_) => BridgeResponse::failure(callback_id, "Handler finished without a result"),
            };
            if log_calls {
                debug!(
                    %action,
                    callback_id = %response.callback_id,
                    success = response.success,
                    data = ?response.data,
                    "bridge response"
                );
            }
            sink.deliver(response);
        }));
    }

    /// Fail a call that never reached a handler, e.g. one whose arguments
    /// could not be read at the native boundary.
    pub fn reject(&self, callback_id: CallbackId, message: impl Into<String>) {
        warn!(%callback_id, "rejecting bridge call");
        self.respond(BridgeResponse::failure(callback_id, message));
    }

    fn respond(&self, response: BridgeResponse) {
        self.sink.deliver(response);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("actions", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::registry::{Empty, Handler};
    use crate::completion::Completion;
    use crate::testing::FakePlatform;
    use crate::ui::UiQueue;
    use tether_core::error::Result;

    struct Never;

    impl Handler for Never {
        type Request = Empty;
        type Response = ();

        fn handle(&self, ctx: &HandlerContext, _request: Empty, done: Completion<()>) {
            // Park the completion until the call is abandoned.
            drop(ctx.runtime().spawn(async move {
                let mut done = done;
                done.closed().await;
                done.success(());
            }));
        }
    }

    fn dispatcher(timeout: Option<Duration>) -> (Dispatcher, crate::ui::UiReceiver) {
        let registry = HandlerRegistry::builder()
            .sync("echo", |_ctx: &HandlerContext, payload: Value| -> Result<Value> { Ok(payload) })
            .sync("boom", |_ctx: &HandlerContext, _: Empty| -> Result<()> {
                panic!("camera exploded")
            })
            .blocking("decode", |_ctx: &HandlerContext, _: Empty| -> Result<()> {
                panic!("decode failed at frame {}", 3)
            })
            .handler("never", Never)
            .build()
            .expect("build");
        let (queue, rx) = UiQueue::new();
        let ctx = FakePlatform::new().context();
        (
            Dispatcher::new(registry, ctx, Arc::new(queue)).with_timeout(timeout),
            rx,
        )
    }

    #[tokio::test]
    async fn empty_payload_reaches_the_handler_as_an_empty_object() {
        let (dispatcher, mut rx) = dispatcher(None);
        dispatcher.dispatch("echo", "", CallbackId::from("1"));
        let response = rx.recv().await.expect("response");
        assert!(response.success);
        assert_eq!(response.data, Some(json!({})));
    }

    #[tokio::test]
    async fn unknown_action_fails_without_running_anything() {
        let (dispatcher, mut rx) = dispatcher(None);
        dispatcher.dispatch("teleport", "{}", CallbackId::from("7"));
        let response = rx.recv().await.expect("response");
        assert!(!response.success);
        assert_eq!(response.error_message(), Some("Handler not found: teleport"));
    }

    #[tokio::test]
    async fn malformed_payload_fails_immediately() {
        let (dispatcher, mut rx) = dispatcher(None);
        dispatcher.dispatch("echo", "{not json", CallbackId::from("2"));
        let response = rx.recv().await.expect("response");
        assert!(!response.success);
        assert!(
            response
                .error_message()
                .is_some_and(|m| m.starts_with("Invalid payload:"))
        );
    }

    #[tokio::test]
    async fn handler_panic_becomes_a_failure_with_its_message() {
        let (dispatcher, mut rx) = dispatcher(None);
        dispatcher.dispatch("boom", "", CallbackId::from("3"));
        let response = rx.recv().await.expect("response");
        assert!(!response.success);
        assert_eq!(response.error_message(), Some("camera exploded"));
    }

    #[tokio::test]
    async fn blocking_handler_panic_carries_its_message() {
        let (dispatcher, mut rx) = dispatcher(None);
        dispatcher.dispatch("decode", "", CallbackId::from("5"));
        let response = rx.recv().await.expect("response");
        assert_eq!(response.error_message(), Some("decode failed at frame 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn unsettled_calls_time_out_and_late_results_are_discarded() {
        let (dispatcher, mut rx) = dispatcher(Some(Duration::from_secs(5)));
        dispatcher.dispatch("never", "", CallbackId::from("4"));
        let response = rx.recv().await.expect("response");
        assert_eq!(response.error_message(), Some("Timed out waiting for never"));

        // The parked completion settles once it sees the timeout; nothing
        // else may reach the queue.
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_none());
    }
}
