// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether bridge: the JavaScript call/response protocol, the dispatcher and
// its handlers, and the native platform bindings they call into.
//
// A call travels page -> `Dispatcher::dispatch` -> handler -> platform
// capability, and its single response travels back through the
// `ResponseSink` (normally the `UiQueue`) as a script for the page.

pub mod client;
pub mod completion;
pub mod context;
pub mod correlator;
pub mod dispatcher;
pub mod handlers;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod script;
#[cfg(not(target_os = "android"))]
pub mod storage;
pub mod ui;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{BridgeClient, CallError, LocalTransport, Transport};
pub use completion::Completion;
pub use context::HandlerContext;
pub use correlator::{PendingRequests, RequestToken};
pub use dispatcher::{DEFAULT_CALL_TIMEOUT, Dispatcher};
pub use handlers::default_registry;
pub use platform::{PlatformBridge, platform_bridge};
pub use protocol::{BridgeRequest, BridgeResponse, CallbackId, ResponseSink};
pub use registry::{Handler, HandlerRegistry, RegistryBuilder};
pub use script::bootstrap_script;
pub use ui::{UiQueue, UiReceiver};
