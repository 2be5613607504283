// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The UI-affine delivery queue.
//
// Completions happen on arbitrary threads. Each finished response is pushed
// here as one unit; the host drains the receiver on its UI thread and
// evaluates the responses in order, so no two deliveries ever interleave.

use tokio::sync::mpsc;

use crate::protocol::{BridgeResponse, ResponseSink};

/// Sending half, handed to the dispatcher as its [`ResponseSink`].
#[derive(Debug, Clone)]
pub struct UiQueue {
    tx: mpsc::UnboundedSender<BridgeResponse>,
}

/// Receiving half, owned by the host's UI thread.
#[derive(Debug)]
pub struct UiReceiver {
    rx: mpsc::UnboundedReceiver<BridgeResponse>,
}

impl UiQueue {
    pub fn new() -> (Self, UiReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UiReceiver { rx })
    }
}

impl ResponseSink for UiQueue {
    fn deliver(&self, response: BridgeResponse) {
        if let Err(e) = self.tx.send(response) {
            tracing::warn!(
                callback_id = %e.0.callback_id,
                "UI queue closed, dropping bridge response"
            );
        }
    }
}

impl UiReceiver {
    /// Wait for the next response. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<BridgeResponse> {
        self.rx.recv().await
    }

    /// Blocking variant for hosts whose UI thread is not async.
    pub fn blocking_recv(&mut self) -> Option<BridgeResponse> {
        self.rx.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<BridgeResponse> {
        self.rx.try_recv().ok()
    }

    /// Take everything queued right now, in delivery order.
    pub fn drain(&mut self) -> Vec<BridgeResponse> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
