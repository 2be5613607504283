// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// permission.check / permission.request / permission.requestMultiple
//
// Every request gets its own token, so concurrent requests (even for the
// same permission) settle independently when the OS answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tether_core::error::{Result, TetherError};
use tether_core::types::{Permission, PermissionStatus};

use super::required;
use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::registry::{Handler, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PermissionRequest {
    pub permission: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MultipleRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    pub granted: bool,
    pub can_ask: bool,
    pub status: &'static str,
}

impl From<PermissionStatus> for PermissionCheck {
    fn from(status: PermissionStatus) -> Self {
        Self {
            granted: status.granted,
            can_ask: status.can_ask,
            status: status.label(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PermissionGrant {
    pub granted: bool,
    pub permission: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionResults {
    #[serde(default)]
    pub results: BTreeMap<String, bool>,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("permission.check", |ctx: &HandlerContext, req: PermissionRequest| {
            let name = required(req.permission, "Missing 'permission' field")?;
            // Names we do not know are not gated by the OS.
            let status = Permission::from_name(&name)
                .map_or(PermissionStatus::IMPLICIT, |p| ctx.platform().permission_status(p));
            Ok(PermissionCheck::from(status))
        })
        .handler("permission.request", RequestOne)
        .handler("permission.requestMultiple", RequestMany)
}

/// Known permissions among `names` that are not granted yet.
fn missing(ctx: &HandlerContext, names: &[String]) -> Vec<Permission> {
    let mut missing = Vec::new();
    for permission in names.iter().filter_map(|name| Permission::from_name(name)) {
        if !missing.contains(&permission) && !ctx.platform().permission_status(permission).granted {
            missing.push(permission);
        }
    }
    missing
}

struct RequestOne;

impl Handler for RequestOne {
    type Request = PermissionRequest;
    type Response = PermissionGrant;

    fn handle(&self, ctx: &HandlerContext, req: PermissionRequest, done: Completion<PermissionGrant>) {
        let name = match required(req.permission, "Missing 'permission' field") {
            Ok(name) => name,
            Err(e) => return done.finish(Err(e)),
        };

        let wanted = missing(ctx, std::slice::from_ref(&name));
        if wanted.is_empty() {
            done.success(PermissionGrant {
                granted: true,
                permission: name,
            });
            return;
        }

        tracing::debug!(permission = %name, "requesting permission");
        ctx.host_request(
            done,
            |platform, token| platform.request_permissions(token, &wanted),
            move |_, reply| {
                let reply: PermissionResults = serde_json::from_value(reply)?;
                Ok(PermissionGrant {
                    granted: reply.results.get(&name).copied().unwrap_or(false),
                    permission: name,
                })
            },
        );
    }
}

struct RequestMany;

impl Handler for RequestMany {
    type Request = MultipleRequest;
    type Response = PermissionResults;

    fn handle(&self, ctx: &HandlerContext, req: MultipleRequest, done: Completion<PermissionResults>) {
        if req.permissions.is_empty() {
            done.finish(Err(TetherError::invalid("Missing 'permissions' array")));
            return;
        }

        let wanted = missing(ctx, &req.permissions);
        let names = req.permissions;
        if wanted.is_empty() {
            done.success(PermissionResults {
                results: names.into_iter().map(|n| (n, true)).collect(),
            });
            return;
        }

        let requested = wanted.clone();
        ctx.host_request(
            done,
            |platform, token| platform.request_permissions(token, &wanted),
            move |_, reply| {
                let reply: PermissionResults = serde_json::from_value(reply)?;
                Ok(merge_results(names, &requested, &reply.results))
            },
        );
    }
}

/// Result for every name the page asked about: what the OS answered for
/// the requested ones, granted for the rest.
fn merge_results(
    names: Vec<String>,
    requested: &[Permission],
    answered: &BTreeMap<String, bool>,
) -> PermissionResults {
    let results = names
        .into_iter()
        .map(|name| {
            let was_requested = Permission::from_name(&name).is_some_and(|p| requested.contains(&p));
            let granted = if was_requested {
                answered.get(&name).copied().unwrap_or(false)
            } else {
                true
            };
            (name, granted)
        })
        .collect();
    PermissionResults { results }
}
