// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end bridge behaviour: client stub -> dispatcher -> handlers ->
// fake platform -> UI queue -> client stub.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use tether_bridge::client::pump_responses;
use tether_bridge::testing::FakePlatform;
use tether_bridge::{
    BridgeClient, CallError, Dispatcher, LocalTransport, UiQueue, default_registry,
};
use tether_core::types::Permission;

struct Harness {
    platform: Arc<FakePlatform>,
    dispatcher: Arc<Dispatcher>,
    client: Arc<BridgeClient<LocalTransport>>,
}

fn harness(timeout: Option<Duration>) -> Harness {
    let platform = FakePlatform::new();
    let (queue, responses) = UiQueue::new();
    let dispatcher = Arc::new(
        Dispatcher::new(
            default_registry().expect("registry"),
            platform.context(),
            Arc::new(queue),
        )
        .with_timeout(timeout),
    );
    let client = Arc::new(BridgeClient::new(LocalTransport::new(Arc::clone(&dispatcher))));
    tokio::spawn(pump_responses(Arc::clone(&client), responses));
    Harness {
        platform,
        dispatcher,
        client,
    }
}

impl Harness {
    fn spawn_call(
        &self,
        action: &'static str,
        payload: Value,
    ) -> tokio::task::JoinHandle<Result<Value, CallError>> {
        let client = Arc::clone(&self.client);
        tokio::spawn(async move { client.call(action, Some(&payload)).await })
    }

    async fn wait_for_requests(&self, kind: &str, count: usize) {
        loop {
            let seen = self
                .platform
                .host_requests()
                .iter()
                .filter(|r| r.kind == kind)
                .count();
            if seen >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}

#[tokio::test]
async fn completing_one_call_never_settles_another() {
    let h = harness(None);
    let alert = h.spawn_call("alert", json!({ "message": "Hold on" }));
    h.wait_for_requests("alert", 1).await;

    let info = h.client.call("device.info", None).await.expect("device info");
    assert_eq!(info["platform"], "android");
    assert!(!alert.is_finished());
    assert_eq!(h.client.pending_calls(), 1);

    let token = h.platform.last_token("alert").expect("alert token");
    h.dispatcher
        .context()
        .pending()
        .complete(token, Ok(json!({ "buttonIndex": 0 })));
    assert_eq!(
        alert.await.expect("joined"),
        Ok(json!({ "buttonIndex": 0 }))
    );
    assert_eq!(h.client.pending_calls(), 0);
}

#[tokio::test]
async fn unknown_and_duplicate_deliveries_are_ignored() {
    let h = harness(None);
    assert!(!h.client.deliver_response("999", true, Some(json!({}))));

    h.client.call("flashlight.available", None).await.expect("first call");
    // Call 1 has been settled; a second delivery for it is a no-op.
    assert!(!h.client.deliver_response("1", false, Some(json!({ "error": "late" }))));
    assert_eq!(h.client.pending_calls(), 0);
}

#[tokio::test]
async fn unknown_action_is_rejected_by_name() {
    let h = harness(None);
    assert_eq!(
        h.client.call("teleport", Some(&json!({}))).await,
        Err(CallError::Rejected("Handler not found: teleport".into()))
    );
}

#[tokio::test]
async fn absent_payload_reaches_handlers_as_an_empty_object() {
    let h = harness(None);
    // `storage.get` validates its key, so it proves the handler ran.
    assert_eq!(
        h.client.call("storage.get", None).await,
        Err(CallError::Rejected("Missing key parameter".into()))
    );
}

#[tokio::test]
async fn heavy_impact_haptic() {
    let h = harness(None);
    let result = h
        .client
        .call("haptic", Some(&json!({ "type": "impact", "style": "heavy" })))
        .await;
    assert_eq!(result, Ok(Value::Null));
    assert_eq!(
        h.platform.state().vibrations,
        [(Duration::from_millis(100), 255)]
    );
}

#[tokio::test]
async fn clipboard_write_without_text() {
    let h = harness(None);
    assert_eq!(
        h.client.call("clipboard.write", Some(&json!({}))).await,
        Err(CallError::Rejected("Missing 'text' parameter".into()))
    );
}

#[tokio::test]
async fn concurrent_permission_requests_resolve_independently() {
    let h = harness(None);
    let first = h.spawn_call("permission.request", json!({ "permission": "camera" }));
    h.wait_for_requests("permissions", 1).await;
    let second = h.spawn_call("permission.request", json!({ "permission": "camera" }));
    h.wait_for_requests("permissions", 2).await;

    let requests = h.platform.host_requests();
    let (t1, t2) = (requests[0].token, requests[1].token);
    assert_ne!(t1, t2);

    // Answer out of order.
    let pending = h.dispatcher.context().pending();
    assert!(pending.complete(t2, Ok(json!({ "results": { "camera": true } }))));
    assert_eq!(
        second.await.expect("joined"),
        Ok(json!({ "granted": true, "permission": "camera" }))
    );
    assert!(!first.is_finished());

    assert!(pending.complete(t1, Ok(json!({ "results": { "camera": false } }))));
    assert_eq!(
        first.await.expect("joined"),
        Ok(json!({ "granted": false, "permission": "camera" }))
    );
    assert!(pending.is_empty());
}

#[tokio::test]
async fn generated_qr_code_decodes() {
    let h = harness(None);
    let result = h
        .client
        .call("qrcode.generate", Some(&json!({ "data": "hello", "size": 128 })))
        .await
        .expect("generated");
    assert_eq!(result["width"], 128);
    assert_eq!(result["height"], 128);

    let url = result["base64"].as_str().expect("data url");
    let png = STANDARD
        .decode(url.strip_prefix("data:image/png;base64,").expect("png prefix"))
        .expect("base64");
    let img = image::load_from_memory(&png).expect("png").to_luma8();
    assert_eq!(img.dimensions(), (128, 128));

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(128, 128, |x, y| {
        img.get_pixel(x as u32, y as u32).0[0]
    });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    let (_, content) = grids[0].decode().expect("decodes");
    assert_eq!(content, "hello");
}

#[tokio::test(start_paused = true)]
async fn abandoned_host_requests_time_out_and_release_their_token() {
    let h = harness(Some(Duration::from_secs(30)));
    h.platform.grant(Permission::Location);

    let result = h.client.call("location.current", None).await;
    assert_eq!(
        result,
        Err(CallError::Rejected("Timed out waiting for location.current".into()))
    );

    let pending = h.dispatcher.context().pending();
    for _ in 0..10 {
        if pending.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(pending.is_empty());

    // The OS answering afterwards finds nobody waiting.
    let token = h.platform.last_token("location").expect("location token");
    assert!(!pending.complete(token, Ok(json!({}))));
}

#[tokio::test]
async fn detached_client_rejects_without_registering() {
    let client: BridgeClient<LocalTransport> =
        BridgeClient::detached().with_native_object("AndroidBridge");
    assert_eq!(
        client.call("device.info", None).await,
        Err(CallError::Unavailable("AndroidBridge".into()))
    );
    assert_eq!(client.pending_calls(), 0);
}
