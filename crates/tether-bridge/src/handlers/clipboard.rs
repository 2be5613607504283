// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// clipboard.write / clipboard.read / clipboard.hasText

use serde::{Deserialize, Serialize};

use tether_core::error::Result;

use super::required;
use crate::context::HandlerContext;
use crate::registry::{Empty, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClipboardText {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasText {
    pub has_text: bool,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("clipboard.write", |ctx: &HandlerContext, req: WriteRequest| -> Result<()> {
            let text = required(req.text, "Missing 'text' parameter")?;
            ctx.platform().set_clipboard_text(&text)
        })
        .sync("clipboard.read", |ctx: &HandlerContext, _: Empty| {
            Ok(ClipboardText {
                text: ctx.platform().clipboard_text()?,
            })
        })
        .sync("clipboard.hasText", |ctx: &HandlerContext, _: Empty| {
            Ok(HasText {
                has_text: ctx.platform().clipboard_has_text()?,
            })
        })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::handlers::test_support::run;
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn write_requires_text() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "clipboard.write", json!({})).await,
            Err("Missing 'text' parameter".into())
        );
        assert!(platform.state().clipboard.is_none());
    }

    #[tokio::test]
    async fn written_text_can_be_read_back() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "clipboard.hasText", json!({})).await,
            Ok(json!({ "hasText": false }))
        );
        assert_eq!(
            run(&platform, "clipboard.read", json!({})).await,
            Ok(json!({ "text": null }))
        );
        assert_eq!(
            run(&platform, "clipboard.write", json!({ "text": "hi" })).await,
            Ok(Value::Null)
        );
        assert_eq!(
            run(&platform, "clipboard.read", json!({})).await,
            Ok(json!({ "text": "hi" }))
        );
        assert_eq!(
            run(&platform, "clipboard.hasText", json!({})).await,
            Ok(json!({ "hasText": true }))
        );
    }
}
