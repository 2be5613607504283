// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Execution context shared by every handler invocation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;

use tether_core::debug::DebugSettings;
use tether_core::error::Result;
use tether_core::splash::SplashManager;

use crate::completion::{Completion, panic_message};
use crate::correlator::{PendingRequests, RequestToken};
use crate::platform::PlatformBridge;

/// Platform, runtime and shell services available to handlers. Cheap to
/// clone.
#[derive(Clone)]
pub struct HandlerContext {
    platform: Arc<dyn PlatformBridge>,
    pending: PendingRequests,
    runtime: Handle,
    splash: Arc<SplashManager>,
    debug: Arc<DebugSettings>,
}

impl HandlerContext {
    pub fn new(platform: Arc<dyn PlatformBridge>, runtime: Handle) -> Self {
        Self {
            platform,
            pending: PendingRequests::new(),
            runtime,
            splash: Arc::new(SplashManager::new()),
            debug: Arc::new(DebugSettings::default()),
        }
    }

    pub fn with_splash(mut self, splash: Arc<SplashManager>) -> Self {
        self.splash = splash;
        self
    }

    pub fn with_debug(mut self, debug: Arc<DebugSettings>) -> Self {
        self.debug = debug;
        self
    }

    pub fn platform(&self) -> &dyn PlatformBridge {
        self.platform.as_ref()
    }

    pub fn platform_arc(&self) -> Arc<dyn PlatformBridge> {
        Arc::clone(&self.platform)
    }

    /// Outstanding host requests, for routing host results back.
    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn splash(&self) -> &SplashManager {
        &self.splash
    }

    pub fn debug(&self) -> &DebugSettings {
        &self.debug
    }

    /// Run `work` on the blocking pool and settle `done` with its result.
    pub fn spawn_blocking<T, F>(&self, done: Completion<T>, work: F)
    where
        T: Serialize + Send + 'static,
        F: FnOnce(&HandlerContext) -> Result<T> + Send + 'static,
    {
        let ctx = self.clone();
        let guard = done.panic_guard();
        drop(self.runtime.spawn_blocking(move || {
            if let Err(panic) =
                std::panic::catch_unwind(AssertUnwindSafe(move || done.finish(work(&ctx))))
            {
                guard.settle(&*panic);
            }
        }));
    }

    /// Start a host request and settle `done` when the host reports back.
    ///
    /// `start` receives a fresh token and must show the UI; `finish` turns
    /// the host's JSON reply into the handler result on the blocking pool.
    /// An error reply from the host becomes the failure message. If the
    /// call times out first the token is released.
    pub fn host_request<T, S, F>(&self, done: Completion<T>, start: S, finish: F)
    where
        T: Serialize + Send + 'static,
        S: FnOnce(&dyn PlatformBridge, RequestToken) -> Result<()>,
        F: FnOnce(&HandlerContext, Value) -> Result<T> + Send + 'static,
    {
        let (token, mut reply) = self.pending.register();
        if let Err(e) = start(self.platform(), token) {
            self.pending.cancel(token);
            done.finish(Err(e));
            return;
        }

        let ctx = self.clone();
        drop(self.runtime.spawn(async move {
            let mut done = done;
            let reply = tokio::select! {
                reply = &mut reply => reply,
                () = done.closed() => {
                    ctx.pending.cancel(token);
                    tracing::debug!(%token, "call settled before the host replied");
                    return;
                }
            };
            match reply {
                Ok(Ok(value)) => {
                    let worker = ctx.clone();
                    match tokio::task::spawn_blocking(move || finish(&worker, value)).await {
                        Ok(result) => done.finish(result),
                        Err(e) if e.is_panic() => {
                            let panic = e.into_panic();
                            let message = panic_message(&*panic);
                            tracing::error!(message, "host result handler panicked");
                            done.error(message);
                        }
                        Err(e) => done.error(format!("Host result handler failed: {e}")),
                    }
                }
                Ok(Err(message)) => done.error(message),
                Err(_) => done.error("Host request abandoned"),
            }
        }));
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("platform", &self.platform.platform_name())
            .field("pending", &self.pending.len())
            .finish()
    }
}
