// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// storage.get / storage.set

use serde::{Deserialize, Serialize};

use tether_core::error::Result;

use super::required;
use crate::context::HandlerContext;
use crate::registry::RegistryBuilder;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetRequest {
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetRequest {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoredValue {
    pub value: Option<String>,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .blocking("storage.get", |ctx: &HandlerContext, req: GetRequest| {
            let key = required(req.key, "Missing key parameter")?;
            Ok(StoredValue {
                value: ctx.platform().storage_get(&key)?,
            })
        })
        .blocking("storage.set", |ctx: &HandlerContext, req: SetRequest| -> Result<()> {
            let key = required(req.key, "Missing key parameter")?;
            ctx.platform()
                .storage_set(&key, req.value.as_deref().unwrap_or_default())
        })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::handlers::test_support::run;
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn values_round_trip_and_missing_keys_are_null() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "storage.get", json!({ "key": "theme" })).await,
            Ok(json!({ "value": null }))
        );
        assert_eq!(
            run(&platform, "storage.set", json!({ "key": "theme", "value": "dark" })).await,
            Ok(Value::Null)
        );
        assert_eq!(
            run(&platform, "storage.get", json!({ "key": "theme" })).await,
            Ok(json!({ "value": "dark" }))
        );
    }

    #[tokio::test]
    async fn set_without_value_stores_an_empty_string() {
        let platform = FakePlatform::new();
        run(&platform, "storage.set", json!({ "key": "k" }))
            .await
            .expect("stored");
        assert_eq!(platform.state().storage.get("k").map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn key_is_required() {
        let platform = FakePlatform::new();
        for action in ["storage.get", "storage.set"] {
            assert_eq!(
                run(&platform, action, json!({ "key": "" })).await,
                Err("Missing key parameter".into())
            );
        }
    }
}
