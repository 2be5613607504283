// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// onesignal.* actions, forwarded to the push vendor SDK.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tether_core::error::{Result, TetherError};

use super::required;
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::platform::traits::PushSubscription;
use crate::registry::{Empty, Handler, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub external_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagRequest {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagsRequest {
    pub tags: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Tags {
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushGrant {
    #[serde(default)]
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct PushPermission {
    pub permission: bool,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("onesignal.login", |ctx: &HandlerContext, req: LoginRequest| -> Result<()> {
            let external_id = required(req.external_id, "externalId is required")?;
            ctx.platform().push_login(&external_id)
        })
        .sync("onesignal.logout", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().push_logout()
        })
        .sync("onesignal.setTag", |ctx: &HandlerContext, req: TagRequest| -> Result<()> {
            let key = required(req.key, "key is required")?;
            let tags = BTreeMap::from([(key, req.value.unwrap_or_default())]);
            ctx.platform().push_add_tags(&tags)
        })
        .sync("onesignal.setTags", |ctx: &HandlerContext, req: TagsRequest| -> Result<()> {
            let tags = req
                .tags
                .ok_or_else(|| TetherError::invalid("tags object is required"))?;
            ctx.platform().push_add_tags(&stringify_tags(tags))
        })
        .sync("onesignal.deleteTag", |ctx: &HandlerContext, req: TagRequest| -> Result<()> {
            let key = required(req.key, "key is required")?;
            ctx.platform().push_remove_tag(&key)
        })
        .sync("onesignal.getTags", |ctx: &HandlerContext, _: Empty| {
            Ok(Tags {
                tags: ctx.platform().push_tags()?,
            })
        })
        .handler("onesignal.requestPermission", RequestPushPermission)
        .sync("onesignal.getPermissionStatus", |ctx: &HandlerContext, _: Empty| {
            Ok(PushPermission {
                permission: ctx.platform().push_permission()?,
            })
        })
        .sync("onesignal.getSubscriptionId", |ctx: &HandlerContext, _: Empty| -> Result<PushSubscription> {
            ctx.platform().push_subscription()
        })
        .sync("onesignal.optIn", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().push_set_opted_in(true)
        })
        .sync("onesignal.optOut", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().push_set_opted_in(false)
        })
        .sync("onesignal.addEmail", |ctx: &HandlerContext, req: EmailRequest| -> Result<()> {
            let email = required(req.email, "email is required")?;
            ctx.platform().push_add_email(&email)
        })
        .sync("onesignal.removeEmail", |ctx: &HandlerContext, req: EmailRequest| -> Result<()> {
            let email = required(req.email, "email is required")?;
            ctx.platform().push_remove_email(&email)
        })
}

/// Tag values are strings on the vendor side; other JSON values keep
/// their JSON text.
fn stringify_tags(tags: Map<String, Value>) -> BTreeMap<String, String> {
    tags.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

struct RequestPushPermission;

impl Handler for RequestPushPermission {
    type Request = Empty;
    type Response = PushGrant;

    fn handle(&self, ctx: &HandlerContext, _: Empty, done: Completion<PushGrant>) {
        ctx.host_request(
            done,
            |platform, token| platform.push_request_permission(token),
            |_, reply| Ok(serde_json::from_value(reply)?),
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::handlers::test_support::{run, start, wait_for_request};
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn validation_messages() {
        let platform = FakePlatform::new();
        for (action, message) in [
            ("onesignal.login", "externalId is required"),
            ("onesignal.setTag", "key is required"),
            ("onesignal.deleteTag", "key is required"),
            ("onesignal.setTags", "tags object is required"),
            ("onesignal.addEmail", "email is required"),
            ("onesignal.removeEmail", "email is required"),
        ] {
            assert_eq!(run(&platform, action, json!({})).await, Err(message.into()), "{action}");
        }
    }

    #[tokio::test]
    async fn login_and_subscription() {
        let platform = FakePlatform::new();
        run(&platform, "onesignal.login", json!({ "externalId": "user-9" }))
            .await
            .expect("login");
        assert_eq!(
            run(&platform, "onesignal.getSubscriptionId", json!({})).await,
            Ok(json!({ "subscriptionId": "sub-user-9", "optedIn": true }))
        );
        run(&platform, "onesignal.optOut", json!({})).await.expect("opt out");
        run(&platform, "onesignal.logout", json!({})).await.expect("logout");
        assert_eq!(
            run(&platform, "onesignal.getSubscriptionId", json!({})).await,
            Ok(json!({ "subscriptionId": null, "optedIn": false }))
        );
    }

    #[tokio::test]
    async fn tags_are_stringified_and_removable() {
        let platform = FakePlatform::new();
        run(&platform, "onesignal.setTag", json!({ "key": "plan" }))
            .await
            .expect("set tag");
        run(
            &platform,
            "onesignal.setTags",
            json!({ "tags": { "level": 3, "beta": true, "team": "red" } }),
        )
        .await
        .expect("set tags");
        run(&platform, "onesignal.deleteTag", json!({ "key": "team" }))
            .await
            .expect("delete");

        assert_eq!(
            run(&platform, "onesignal.getTags", json!({})).await,
            Ok(json!({ "tags": { "beta": "true", "level": "3", "plan": "" } }))
        );
    }

    #[tokio::test]
    async fn emails_and_permission_status() {
        let platform = FakePlatform::new();
        run(&platform, "onesignal.addEmail", json!({ "email": "a@example.org" }))
            .await
            .expect("add");
        assert_eq!(platform.state().push_emails, ["a@example.org"]);
        assert_eq!(
            run(&platform, "onesignal.removeEmail", json!({ "email": "a@example.org" })).await,
            Ok(Value::Null)
        );
        assert!(platform.state().push_emails.is_empty());
        assert_eq!(
            run(&platform, "onesignal.getPermissionStatus", json!({})).await,
            Ok(json!({ "permission": false }))
        );
    }

    #[tokio::test]
    async fn permission_request_waits_for_the_host() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let rx = start(&ctx, "onesignal.requestPermission", json!({}));
        let token = wait_for_request(&platform, "pushPermission").await;
        ctx.pending().complete(token, Ok(json!({ "granted": true })));
        assert_eq!(rx.await.expect("settled"), Ok(json!({ "granted": true })));
    }
}
