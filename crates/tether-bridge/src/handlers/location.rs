// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// location.current

use serde::{Deserialize, Serialize};

use tether_core::error::{Result, TetherError};
use tether_core::types::{LocationAccuracy, Permission};

use crate::completion::Completion;
use crate::context::HandlerContext;
use crate::platform::traits::LocationReply;
use crate::registry::{Handler, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationRequest {
    pub accuracy: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl Position {
    /// A fresh fix wins; otherwise fall back to the last known position,
    /// reported without altitude and flagged as cached.
    pub fn from_reply(reply: LocationReply) -> Result<Self> {
        if let Some(fix) = reply.current {
            return Ok(Self {
                lat: fix.lat,
                lng: fix.lng,
                accuracy: fix.accuracy,
                altitude: fix.altitude,
                timestamp: fix.timestamp,
                cached: false,
            });
        }
        let fix = reply
            .last_known
            .ok_or_else(|| TetherError::platform("Unable to get location"))?;
        Ok(Self {
            lat: fix.lat,
            lng: fix.lng,
            accuracy: fix.accuracy,
            altitude: None,
            timestamp: fix.timestamp,
            cached: true,
        })
    }
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder.handler("location.current", CurrentLocation)
}

struct CurrentLocation;

impl Handler for CurrentLocation {
    type Request = LocationRequest;
    type Response = Position;

    fn handle(&self, ctx: &HandlerContext, req: LocationRequest, done: Completion<Position>) {
        let platform = ctx.platform();
        let permitted = [Permission::Location, Permission::LocationCoarse]
            .into_iter()
            .any(|p| platform.permission_status(p).granted);
        if !permitted {
            done.finish(Err(TetherError::PermissionDenied(
                "Location permission not granted".into(),
            )));
            return;
        }

        let accuracy = LocationAccuracy::from_name(req.accuracy.as_deref().unwrap_or("high"));
        ctx.host_request(
            done,
            |platform, token| platform.request_location(token, accuracy),
            |_, reply| Position::from_reply(serde_json::from_value(reply)?),
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tether_core::types::Permission;

    use crate::handlers::test_support::{run, start, wait_for_request};
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn requires_some_location_permission() {
        let platform = FakePlatform::new();
        assert_eq!(
            run(&platform, "location.current", json!({})).await,
            Err("Location permission not granted".into())
        );
    }

    #[tokio::test]
    async fn fresh_fix_includes_altitude() {
        let platform = FakePlatform::new();
        platform.grant(Permission::LocationCoarse);
        let ctx = platform.context();
        let rx = start(&ctx, "location.current", json!({ "accuracy": "low" }));
        let token = wait_for_request(&platform, "location").await;
        assert_eq!(platform.host_requests()[0].detail, "Low");

        ctx.pending().complete(
            token,
            Ok(json!({ "current": {
                "lat": 52.5, "lng": 13.25, "accuracy": 8.0, "altitude": 34.0, "timestamp": 1000
            } })),
        );
        assert_eq!(
            rx.await.expect("settled"),
            Ok(json!({
                "lat": 52.5, "lng": 13.25, "accuracy": 8.0, "altitude": 34.0, "timestamp": 1000
            }))
        );
    }

    #[tokio::test]
    async fn falls_back_to_the_cached_position() {
        let platform = FakePlatform::new();
        platform.grant(Permission::Location);
        let ctx = platform.context();
        let rx = start(&ctx, "location.current", json!({}));
        let token = wait_for_request(&platform, "location").await;
        ctx.pending().complete(
            token,
            Ok(json!({ "lastKnown": {
                "lat": 1.5, "lng": 2.5, "accuracy": 100.0, "altitude": 9.0, "timestamp": 5
            } })),
        );
        assert_eq!(
            rx.await.expect("settled"),
            Ok(json!({ "lat": 1.5, "lng": 2.5, "accuracy": 100.0, "timestamp": 5, "cached": true }))
        );
    }

    #[tokio::test]
    async fn no_position_at_all_fails() {
        let platform = FakePlatform::new();
        platform.grant(Permission::Location);
        let ctx = platform.context();
        let rx = start(&ctx, "location.current", json!({}));
        let token = wait_for_request(&platform, "location").await;
        ctx.pending().complete(token, Ok(json!({})));
        assert_eq!(rx.await.expect("settled"), Err("Unable to get location".into()));
    }
}
