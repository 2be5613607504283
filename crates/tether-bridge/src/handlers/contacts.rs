// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// contacts.pick / contacts.getAll

use serde::{Deserialize, Serialize};

use tether_core::error::TetherError;
use tether_core::types::Permission;

use super::non_empty;
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::platform::traits::{ContactDetails, ContactSummary};
use crate::registry::{Empty, Handler, RegistryBuilder};

pub const DEFAULT_CONTACT_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    pub filter: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ContactList {
    pub contacts: Vec<ContactSummary>,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .handler("contacts.pick", PickContact)
        .blocking("contacts.getAll", |ctx: &HandlerContext, req: ListRequest| {
            let platform = ctx.platform();
            if !platform.permission_status(Permission::Contacts).granted {
                return Err(TetherError::PermissionDenied(
                    "Read contacts permission not granted".into(),
                ));
            }
            let limit = req.limit.unwrap_or(DEFAULT_CONTACT_LIMIT);
            let contacts = platform.query_contacts(non_empty(req.filter.as_deref()), limit)?;
            tracing::debug!(found = contacts.len(), limit, "contacts listed");
            Ok(ContactList { contacts })
        })
}

struct PickContact;

impl Handler for PickContact {
    type Request = Empty;
    type Response = ContactDetails;

    fn handle(&self, ctx: &HandlerContext, _: Empty, done: Completion<ContactDetails>) {
        ctx.host_request(
            done,
            |platform, token| platform.pick_contact(token),
            |_, reply| Ok(serde_json::from_value(reply)?),
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tether_core::types::Permission;

    use crate::handlers::test_support::{run, start, wait_for_request};
    use crate::platform::traits::ContactSummary;
    use crate::testing::FakePlatform;

    fn contact(id: &str, name: &str, has_phone: bool) -> ContactSummary {
        ContactSummary {
            id: id.into(),
            name: name.into(),
            has_phone,
        }
    }

    #[tokio::test]
    async fn listing_needs_permission() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "contacts.getAll", json!({})).await,
            Err("Read contacts permission not granted".into())
        );
    }

    #[tokio::test]
    async fn listing_filters_sorts_and_limits() {
        let platform = FakePlatform::new();
        platform.grant(Permission::Contacts);
        platform.state().contacts = vec![
            contact("3", "Zoe Ann", false),
            contact("1", "Ann Lee", true),
            contact("2", "Bob", true),
        ];

        assert_eq!(
            run(&platform, "contacts.getAll", json!({ "filter": "Ann" })).await,
            Ok(json!({ "contacts": [
                { "id": "1", "name": "Ann Lee", "hasPhone": true },
                { "id": "3", "name": "Zoe Ann", "hasPhone": false }
            ] }))
        );
        assert_eq!(
            run(&platform, "contacts.getAll", json!({ "filter": "", "limit": 1 })).await,
            Ok(json!({ "contacts": [{ "id": "1", "name": "Ann Lee", "hasPhone": true }] }))
        );
    }

    #[tokio::test]
    async fn pick_returns_the_host_details() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let rx = start(&ctx, "contacts.pick", json!({}));
        let token = wait_for_request(&platform, "pickContact").await;
        let details = json!({
            "id": "7",
            "name": "Ada",
            "phones": [{ "number": "+44 20 7946 0000", "type": "mobile" }],
            "emails": []
        });
        ctx.pending().complete(token, Ok(details.clone()));
        assert_eq!(rx.await.expect("settled"), Ok(details));
    }

    #[tokio::test]
    async fn dismissed_picker_fails() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let rx = start(&ctx, "contacts.pick", json!({}));
        let token = wait_for_request(&platform, "pickContact").await;
        ctx.pending().complete(token, Err("No contact selected".into()));
        assert_eq!(rx.await.expect("settled"), Err("No contact selected".into()));
    }
}
