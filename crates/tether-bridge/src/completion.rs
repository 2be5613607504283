// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-use completion handed to every handler invocation.
//
// A completion is consumed by value, so a handler can settle its call at
// most once. Dropping it unsettled (an early return, a panic, a lost task)
// still settles the call with a failure.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use tether_core::error::{Result, TetherError};

/// What a handler produced: result data or an error message.
pub type Outcome = std::result::Result<Value, String>;

/// State shared between a completion and its panic guards.
#[derive(Debug, Default)]
struct Guarded {
    /// Live guards that will report a panic themselves.
    guards: usize,
    /// Sender left behind by a completion that unwound under a guard.
    orphan: Option<oneshot::Sender<Outcome>>,
}

type Shared = Arc<Mutex<Guarded>>;

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Guarded> {
    shared.lock().unwrap_or_else(|p| p.into_inner())
}

fn send(tx: oneshot::Sender<Outcome>, outcome: Outcome) {
    if tx.send(outcome).is_err() {
        tracing::debug!("completion arrived after the call was settled, discarding");
    }
}

/// Untyped completion owned by the dispatcher's watcher.
#[derive(Debug)]
pub struct RawCompletion {
    tx: Option<oneshot::Sender<Outcome>>,
    shared: Shared,
}

impl RawCompletion {
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            tx: Some(tx),
            shared: Shared::default(),
        };
        (completion, rx)
    }

    pub fn succeed(mut self, data: Value) {
        self.send(Ok(data));
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.send(Err(message.into()));
    }

    /// Guard for code that runs the handler under `catch_unwind`. While it
    /// lives, a panic leaves the call for [`PanicGuard::settle`] to report
    /// with the panic's own message.
    pub fn panic_guard(&self) -> PanicGuard {
        lock(&self.shared).guards += 1;
        PanicGuard {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether nobody waits for the outcome any more (timed out).
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }

    /// Resolves once nobody waits for the outcome any more.
    pub async fn closed(&mut self) {
        match self.tx.as_mut() {
            Some(tx) => tx.closed().await,
            None => std::future::pending().await,
        }
    }

    fn send(&mut self, outcome: Outcome) {
        if let Some(tx) = self.tx.take() {
            send(tx, outcome);
        }
    }
}

impl Drop for RawCompletion {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        if !std::thread::panicking() {
            tracing::warn!("completion dropped unsettled");
            send(tx, Err("Handler finished without a result".to_owned()));
            return;
        }
        let mut guarded = lock(&self.shared);
        if guarded.guards > 0 {
            guarded.orphan = Some(tx);
        } else {
            tracing::warn!("completion dropped by an unguarded panic");
            send(tx, Err(PANICKED.to_owned()));
        }
    }
}

const PANICKED: &str = "Handler panicked";

/// Reports a caught handler panic on the call it guards.
#[derive(Debug)]
#[must_use = "a guard dropped immediately does not cover the handler"]
pub struct PanicGuard {
    shared: Shared,
}

impl PanicGuard {
    /// Fail the call with the message carried by `panic`. A call the handler
    /// settled, or still holds elsewhere, is left alone.
    pub fn settle(self, panic: &(dyn Any + Send)) {
        let message = panic_message(panic);
        tracing::error!(message, "handler panicked");
        if let Some(tx) = lock(&self.shared).orphan.take() {
            send(tx, Err(message.to_owned()));
        }
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        let mut guarded = lock(&self.shared);
        guarded.guards -= 1;
        // Unwound on a thread this guard was not watching.
        if let Some(tx) = guarded.orphan.take() {
            send(tx, Err(PANICKED.to_owned()));
        }
    }
}

/// Text of a panic payload from `panic!` or `catch_unwind`.
pub fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or(PANICKED)
}

/// Typed completion for a handler whose result serializes from `T`.
#[derive(Debug)]
pub struct Completion<T> {
    raw: RawCompletion,
    _result: PhantomData<fn(T)>,
}

impl<T: Serialize> Completion<T> {
    pub fn new(raw: RawCompletion) -> Self {
        Self {
            raw,
            _result: PhantomData,
        }
    }

    pub fn success(self, value: T) {
        match serde_json::to_value(&value) {
            Ok(data) => self.raw.succeed(data),
            Err(e) => self.raw.fail(format!("Invalid response: {e}")),
        }
    }

    pub fn error(self, message: impl Into<String>) {
        self.raw.fail(message);
    }

    /// Settle with a handler result; errors are sent as their `Display` text.
    pub fn finish(self, result: Result<T>) {
        match result {
            Ok(value) => self.success(value),
            Err(e) => {
                match &e {
                    TetherError::Platform(_) | TetherError::Io(_) | TetherError::Storage(_) => {
                        tracing::error!(error = %e, "platform call failed");
                    }
                    _ => tracing::debug!(error = %e, "handler returned an error"),
                }
                self.error(e.to_string());
            }
        }
    }

    pub fn panic_guard(&self) -> PanicGuard {
        self.raw.panic_guard()
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_closed()
    }

    pub async fn closed(&mut self) {
        self.raw.closed().await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_serializes_the_value() {
        let (raw, mut rx) = RawCompletion::channel();
        Completion::new(raw).success(json!({ "on": true }));
        assert_eq!(rx.try_recv().expect("settled"), Ok(json!({ "on": true })));
    }

    #[test]
    fn unit_results_become_null() {
        let (raw, mut rx) = RawCompletion::channel();
        Completion::<()>::new(raw).success(());
        assert_eq!(rx.try_recv().expect("settled"), Ok(Value::Null));
    }

    #[test]
    fn errors_use_their_display_text() {
        let (raw, mut rx) = RawCompletion::channel();
        Completion::<()>::new(raw).finish(Err(TetherError::invalid("Missing key parameter")));
        assert_eq!(
            rx.try_recv().expect("settled"),
            Err("Missing key parameter".to_owned())
        );
    }

    #[test]
    fn dropping_unsettled_sends_a_failure() {
        let (raw, mut rx) = RawCompletion::channel();
        drop(Completion::<()>::new(raw));
        assert_eq!(
            rx.try_recv().expect("settled"),
            Err("Handler finished without a result".to_owned())
        );
    }

    #[test]
    fn panicking_while_holding_a_completion_reports_the_panic() {
        let (raw, mut rx) = RawCompletion::channel();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = raw;
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(
            rx.try_recv().expect("settled"),
            Err("Handler panicked".to_owned())
        );
    }

    #[test]
    fn guarded_panic_carries_its_message() {
        let (raw, mut rx) = RawCompletion::channel();
        let guard = raw.panic_guard();
        let panic = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = raw;
            panic!("camera exploded");
        }))
        .expect_err("panicked");
        assert!(rx.try_recv().is_err(), "left for the guard");

        guard.settle(&*panic);
        assert_eq!(
            rx.try_recv().expect("settled"),
            Err("camera exploded".to_owned())
        );
    }

    #[test]
    fn guard_leaves_settled_and_live_calls_alone() {
        let (raw, mut rx) = RawCompletion::channel();
        let guard = raw.panic_guard();
        raw.succeed(json!(1));
        guard.settle(&"late");
        assert_eq!(rx.try_recv().expect("settled"), Ok(json!(1)));

        // Still held by the handler: the guard has nothing to report.
        let (raw, mut rx) = RawCompletion::channel();
        drop(raw.panic_guard());
        assert!(rx.try_recv().is_err());
        drop(raw);
        assert_eq!(
            rx.try_recv().expect("settled"),
            Err("Handler finished without a result".to_owned())
        );
    }

    #[test]
    fn formatted_panics_keep_their_text() {
        let panic = std::panic::catch_unwind(|| panic!("decode failed at {}", 3)).expect_err("panicked");
        assert_eq!(panic_message(&*panic), "decode failed at 3");
    }

    #[test]
    fn closed_once_the_receiver_is_gone() {
        let (raw, rx) = RawCompletion::channel();
        assert!(!raw.is_closed());
        drop(rx);
        assert!(raw.is_closed());
    }
}
