// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handler trait and the action-name registry.
//
// The page addresses handlers by string; each handler declares typed
// request and response types. The registry erases them behind
// `ErasedHandler` so one map can hold every action.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tether_core::error::{Result, TetherError};

use crate::completion::{Completion, RawCompletion};
use crate::context::HandlerContext;

/// One bridge action.
pub trait Handler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    /// Start the action. May settle `done` before returning or hand it to a
    /// background task.
    fn handle(&self, ctx: &HandlerContext, request: Self::Request, done: Completion<Self::Response>);
}

/// Request type for actions without parameters. Accepts any object.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct Empty {}

/// Object-safe face of a [`Handler`].
pub trait ErasedHandler: Send + Sync {
    fn call(&self, ctx: &HandlerContext, payload: Value, done: RawCompletion);
}

struct Typed<H>(H);

impl<H: Handler> ErasedHandler for Typed<H> {
    fn call(&self, ctx: &HandlerContext, payload: Value, done: RawCompletion) {
        match serde_json::from_value::<H::Request>(payload) {
            Ok(request) => self.0.handle(ctx, request, Completion::new(done)),
            Err(e) => done.fail(format!("Invalid payload: {e}")),
        }
    }
}

/// Handler from a synchronous closure run on the calling thread.
pub struct FnHandler<F, Req, Resp> {
    f: F,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<F, Req, Resp> Handler for FnHandler<F, Req, Resp>
where
    F: Fn(&HandlerContext, Req) -> Result<Resp> + Send + Sync + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn handle(&self, ctx: &HandlerContext, request: Req, done: Completion<Resp>) {
        done.finish((self.f)(ctx, request));
    }
}

/// Handler from a closure run on the blocking thread pool.
pub struct BlockingHandler<F, Req, Resp> {
    f: Arc<F>,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<F, Req, Resp> Handler for BlockingHandler<F, Req, Resp>
where
    F: Fn(&HandlerContext, Req) -> Result<Resp> + Send + Sync + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn handle(&self, ctx: &HandlerContext, request: Req, done: Completion<Resp>) {
        let f = Arc::clone(&self.f);
        ctx.spawn_blocking(done, move |ctx| f(ctx, request));
    }
}

/// Immutable map from action name to handler.
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn ErasedHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, action: &str) -> Option<&dyn ErasedHandler> {
        self.handlers.get(action).map(|h| h.as_ref())
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("actions", &self.actions())
            .finish()
    }
}

/// Collects handlers; [`RegistryBuilder::build`] rejects duplicate names.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Box<dyn ErasedHandler>>,
    duplicate: Option<String>,
}

impl RegistryBuilder {
    pub fn handler<H: Handler>(mut self, action: &str, handler: H) -> Self {
        if self
            .handlers
            .insert(action.to_owned(), Box::new(Typed(handler)))
            .is_some()
            && self.duplicate.is_none()
        {
            self.duplicate = Some(action.to_owned());
        }
        self
    }

    /// Register a closure that settles synchronously.
    pub fn sync<F, Req, Resp>(self, action: &str, f: F) -> Self
    where
        F: Fn(&HandlerContext, Req) -> Result<Resp> + Send + Sync + 'static,
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        self.handler(
            action,
            FnHandler {
                f,
                _types: PhantomData,
            },
        )
    }

    /// Register a closure that runs on the blocking pool.
    pub fn blocking<F, Req, Resp>(self, action: &str, f: F) -> Self
    where
        F: Fn(&HandlerContext, Req) -> Result<Resp> + Send + Sync + 'static,
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        self.handler(
            action,
            BlockingHandler {
                f: Arc::new(f),
                _types: PhantomData,
            },
        )
    }

    pub fn build(self) -> Result<HandlerRegistry> {
        if let Some(action) = self.duplicate {
            return Err(TetherError::DuplicateAction(action));
        }
        Ok(HandlerRegistry {
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn echo(_ctx: &HandlerContext, payload: Value) -> Result<Value> {
        Ok(payload)
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let err = HandlerRegistry::builder()
            .sync("echo", echo)
            .sync("echo", echo)
            .build()
            .expect_err("duplicate");
        assert!(matches!(err, TetherError::DuplicateAction(ref a) if a == "echo"));
    }

    #[test]
    fn actions_are_listed_sorted() {
        let registry = HandlerRegistry::builder()
            .sync("b", echo)
            .sync("a", echo)
            .build()
            .expect("build");
        assert_eq!(registry.actions(), ["a", "b"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
    }

    #[tokio::test]
    async fn mistyped_payload_fails_before_the_handler_runs() {
        #[derive(serde::Deserialize)]
        struct Req {
            #[allow(dead_code)]
            on: bool,
        }
        let registry = HandlerRegistry::builder()
            .sync("typed", |_ctx: &HandlerContext, _req: Req| -> Result<()> {
                panic!("must not run")
            })
            .build()
            .expect("build");
        let ctx = crate::testing::FakePlatform::new().context();

        let (raw, mut rx) = RawCompletion::channel();
        registry
            .get("typed")
            .expect("registered")
            .call(&ctx, json!({ "on": "yes" }), raw);
        let message = rx.try_recv().expect("settled").expect_err("failure");
        assert!(message.starts_with("Invalid payload:"), "{message}");
    }
}
