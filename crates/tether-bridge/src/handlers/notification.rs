// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// notification.local / notification.cancel / notification.cancelAll

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use serde::{Deserialize, Serialize};

use tether_core::error::{Result, TetherError};
use tether_core::types::Permission;

use crate::context::HandlerContext;
use crate::registry::{Empty, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocalNotification {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct Posted {
    pub id: i32,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    let next_id = Arc::new(AtomicI32::new(0));

    builder
        .sync("notification.local", move |ctx: &HandlerContext, req: LocalNotification| {
            post(ctx, &next_id, req)
        })
        .sync("notification.cancel", |ctx: &HandlerContext, req: CancelRequest| -> Result<()> {
            let id = req
                .id
                .filter(|&id| id != -1)
                .ok_or_else(|| TetherError::invalid("Missing notification id"))?;
            ctx.platform().cancel_notification(id)
        })
        .sync("notification.cancelAll", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().cancel_all_notifications()
        })
}

fn post(ctx: &HandlerContext, next_id: &AtomicI32, req: LocalNotification) -> Result<Posted> {
    let title = req.title.unwrap_or_default();
    let body = req.body.unwrap_or_default();
    if title.is_empty() && body.is_empty() {
        return Err(TetherError::invalid("Title or body is required"));
    }

    let platform = ctx.platform();
    if !platform.permission_status(Permission::Notifications).granted {
        return Err(TetherError::PermissionDenied(
            "Notification permission not granted".into(),
        ));
    }

    let id = next_id.fetch_add(1, Ordering::Relaxed) + 1;
    platform.post_notification(id, &title, &body)?;
    tracing::debug!(id, "local notification posted");
    Ok(Posted { id })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tether_core::types::Permission;

    use crate::completion::RawCompletion;
    use crate::handlers::default_registry;
    use crate::handlers::test_support::run;
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn title_or_body_is_required() {
        let platform = FakePlatform::new();
        platform.grant(Permission::Notifications);
        assert_eq!(
            run(&platform, "notification.local", json!({ "title": "" })).await,
            Err("Title or body is required".into())
        );
    }

    #[tokio::test]
    async fn posting_needs_permission() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "notification.local", json!({ "body": "hi" })).await,
            Err("Notification permission not granted".into())
        );
    }

    #[tokio::test]
    async fn ids_increase_and_cancel_removes() {
        let platform = FakePlatform::new();
        platform.grant(Permission::Notifications);
        let ctx = platform.context();
        let registry = default_registry().expect("registry");
        let call = |action: &str, payload: Value| {
            let (done, rx) = RawCompletion::channel();
            registry.get(action).expect("registered").call(&ctx, payload, done);
            rx
        };

        let first = call("notification.local", json!({ "title": "One" })).await.expect("settled");
        let second = call("notification.local", json!({ "body": "Two" })).await.expect("settled");
        assert_eq!(first, Ok(json!({ "id": 1 })));
        assert_eq!(second, Ok(json!({ "id": 2 })));

        assert_eq!(
            call("notification.cancel", json!({ "id": 1 })).await.expect("settled"),
            Ok(Value::Null)
        );
        assert_eq!(
            platform.state().notifications.keys().copied().collect::<Vec<_>>(),
            [2]
        );

        call("notification.cancelAll", json!({})).await.expect("settled").expect("cleared");
        assert!(platform.state().notifications.is_empty());
    }

    #[tokio::test]
    async fn cancel_requires_an_id() {
        let platform = FakePlatform::new();
        for payload in [json!({}), json!({ "id": -1 })] {
            assert_eq!(
                run(&platform, "notification.cancel", payload).await,
                Err("Missing notification id".into())
            );
        }
    }
}
