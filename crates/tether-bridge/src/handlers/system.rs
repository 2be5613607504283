// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Status bar, soft keyboard, splash screen and developer menu switches.

use serde::{Deserialize, Serialize};

use tether_core::error::{Result, TetherError};
use tether_core::types::{Color, StatusBarStyle};

use super::non_empty;
use crate::context::HandlerContext;
use crate::registry::{Empty, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusBarRequest {
    pub style: Option<String>,
    /// `#RRGGBB` or `#AARRGGBB`.
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevMenuToggle {
    pub enabled: bool,
}

impl Default for DevMenuToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Serialize)]
pub struct DevMenuStatus {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .sync("statusbar.style", status_bar_style)
        .sync("statusbar.hide", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().set_status_bar_visible(false)
        })
        .sync("statusbar.show", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().set_status_bar_visible(true)
        })
        .sync("keyboard.hide", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().set_keyboard_visible(false)
        })
        .sync("keyboard.show", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.platform().set_keyboard_visible(true)
        })
        .sync("splash.hide", |ctx: &HandlerContext, _: Empty| -> Result<()> {
            ctx.splash().hide();
            Ok(())
        })
        .sync("devmenu.toggle", |ctx: &HandlerContext, req: DevMenuToggle| {
            ctx.debug().set_dev_menu_enabled(req.enabled);
            tracing::info!(enabled = req.enabled, "dev menu toggled from the page");
            Ok(DevMenuStatus {
                enabled: ctx.debug().is_enabled(),
                message: None,
            })
        })
        .sync("devmenu.status", |ctx: &HandlerContext, _: Empty| {
            Ok(DevMenuStatus {
                enabled: ctx.debug().is_enabled(),
                message: Some("Use shake gesture to open DevMenu"),
            })
        })
}

fn status_bar_style(ctx: &HandlerContext, req: StatusBarRequest) -> Result<()> {
    let style = StatusBarStyle::from_name(req.style.as_deref().unwrap_or("dark"));
    let color = match non_empty(req.color.as_deref()) {
        Some(text) => Some(
            Color::parse(text)
                .ok_or_else(|| TetherError::invalid(format!("Invalid color: {text}")))?,
        ),
        None => None,
    };
    ctx.platform().set_status_bar_style(style, color)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::{Value, json};
    use tether_core::types::{Color, StatusBarStyle};

    use crate::handlers::test_support::{run, start};
    use crate::testing::FakePlatform;

    #[tokio::test]
    async fn style_and_color_reach_the_platform() {
        let platform = FakePlatform::new();
        let outcome = run(
            &platform,
            "statusbar.style",
            json!({ "style": "light", "color": "#112233" }),
        )
        .await;
        assert_eq!(outcome, Ok(Value::Null));
        assert_eq!(
            platform.state().status_bar,
            Some((StatusBarStyle::Light, Color::parse("#112233")))
        );
    }

    #[tokio::test]
    async fn bad_color_is_rejected() {
        let platform = FakePlatform::new();
        let outcome = run(&platform, "statusbar.style", json!({ "color": "teal-ish" })).await;
        assert_eq!(outcome, Err("Invalid color: teal-ish".into()));
    }

    #[tokio::test]
    async fn bars_and_keyboard_toggle() {
        let platform = FakePlatform::new();
        run(&platform, "statusbar.hide", json!({})).await.expect("hide");
        assert!(!platform.state().status_bar_visible);
        run(&platform, "keyboard.show", json!({})).await.expect("show");
        assert!(platform.state().keyboard_visible);
    }

    #[tokio::test]
    async fn splash_hide_fires_the_registered_callback() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let hidden = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hidden);
        ctx.splash()
            .register_hide_callback(move || flag.store(true, Ordering::SeqCst));

        start(&ctx, "splash.hide", json!({}))
            .await
            .expect("settled")
            .expect("hidden");
        assert!(hidden.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn dev_menu_toggle_defaults_to_enabled() {
        let platform = FakePlatform::new();
        let ctx = platform.context();
        let toggled = start(&ctx, "devmenu.toggle", json!({})).await.expect("settled");
        assert_eq!(toggled, Ok(json!({ "enabled": true })));

        let status = start(&ctx, "devmenu.status", json!({})).await.expect("settled");
        assert_eq!(
            status,
            Ok(json!({ "enabled": true, "message": "Use shake gesture to open DevMenu" }))
        );

        let toggled = start(&ctx, "devmenu.toggle", json!({ "enabled": false }))
            .await
            .expect("settled");
        assert_eq!(toggled, Ok(json!({ "enabled": false })));
    }
}
