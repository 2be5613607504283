// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Correlation of asynchronous host results with the request that started
// them.
//
// Permission dialogs, pickers, prompts and location fixes finish in an OS
// callback long after the handler returned. Every such request gets its own
// token; the host echoes the token back with the outcome. Two concurrent
// requests of the same kind therefore resolve independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;

/// Outcome reported by the host: a JSON result or an error message.
pub type HostReply = std::result::Result<Value, String>;

/// Token identifying one outstanding host request.
///
/// Tokens fit in 16 bits so they can double as Android request codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u16);

impl RequestToken {
    pub fn from_code(code: i32) -> Option<Self> {
        u16::try_from(code).ok().filter(|c| *c != 0).map(Self)
    }

    pub fn code(self) -> i32 {
        i32::from(self.0)
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Waiting {
    next: u16,
    senders: HashMap<u16, oneshot::Sender<HostReply>>,
}

/// Table of outstanding host requests. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PendingRequests {
    inner: Arc<Mutex<Waiting>>,
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Waiting {
                next: 1,
                senders: HashMap::new(),
            })),
        }
    }

    /// Allocate a token and the receiver its reply will arrive on.
    ///
    /// Tokens wrap around, skipping zero and any token still outstanding.
    pub fn register(&self) -> (RequestToken, oneshot::Receiver<HostReply>) {
        let (tx, rx) = oneshot::channel();
        let mut waiting = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut token = waiting.next;
        while token == 0 || waiting.senders.contains_key(&token) {
            token = token.wrapping_add(1);
        }
        waiting.next = token.wrapping_add(1);
        waiting.senders.insert(token, tx);
        (RequestToken(token), rx)
    }

    /// Route a host result to its request. Returns `false` for unknown or
    /// already completed tokens, and when the requester stopped waiting.
    pub fn complete(&self, token: RequestToken, reply: HostReply) -> bool {
        let sender = self
            .inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .senders
            .remove(&token.0);
        match sender {
            Some(tx) => {
                let delivered = tx.send(reply).is_ok();
                if !delivered {
                    tracing::debug!(%token, "host result arrived after the call was abandoned");
                }
                delivered
            }
            None => {
                tracing::warn!(%token, "host result for unknown request token");
                false
            }
        }
    }

    /// Forget a request whose host side never started.
    pub fn cancel(&self, token: RequestToken) {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .senders
            .remove(&token.0);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .senders
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
