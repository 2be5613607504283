// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// url.open / url.canOpen

use serde::{Deserialize, Serialize};

use tether_core::error::Result;

use super::required;
use crate::context::HandlerContext;
use crate::registry::RegistryBuilder;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UrlRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanOpen {
    pub can_open: bool,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("url.open", |ctx: &HandlerContext, req: UrlRequest| -> Result<()> {
            let url = required(req.url, "Missing 'url' parameter")?;
            ctx.platform().open_url(&url)
        })
        .sync("url.canOpen", |ctx: &HandlerContext, req: UrlRequest| {
            let url = required(req.url, "Missing 'url' parameter")?;
            // Lookup failures mean nothing can handle it.
            let can_open = ctx.platform().can_open_url(&url).unwrap_or_else(|e| {
                tracing::debug!(%url, error = %e, "url resolution failed");
                false
            });
            Ok(CanOpen { can_open })
        })
}
