// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Haptics, device/app info, battery, network and the torch.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use tether_core::error::{Result, TetherError};
use tether_core::types::HapticStyle;

use crate::context::HandlerContext;
use crate::platform::traits::{AppVersion, BatteryStatus, DeviceInfo, NetworkStatus};
use crate::registry::{Empty, RegistryBuilder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HapticRequest {
    /// `impact`, `notification` or `selection`; all map to one vibration.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TorchRequest {
    /// Absent means toggle.
    pub on: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TorchState {
    pub on: bool,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub available: bool,
}

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    let torch_on = Arc::new(Mutex::new(false));

    builder
        .sync("haptic", haptic)
        .sync("device.info", |ctx: &HandlerContext, _: Empty| -> Result<DeviceInfo> {
            Ok(ctx.platform().device_info())
        })
        .sync("app.version", |ctx: &HandlerContext, _: Empty| -> Result<AppVersion> {
            ctx.platform().app_version()
        })
        .sync("battery.status", |ctx: &HandlerContext, _: Empty| -> Result<BatteryStatus> {
            ctx.platform().battery_status()
        })
        .sync("network.status", |ctx: &HandlerContext, _: Empty| -> Result<NetworkStatus> {
            ctx.platform().network_status()
        })
        .sync("flashlight.toggle", move |ctx: &HandlerContext, req: TorchRequest| {
            toggle_torch(ctx, &torch_on, req)
        })
        .sync("flashlight.available", |ctx: &HandlerContext, _: Empty| -> Result<Availability> {
            Ok(Availability {
                available: ctx.platform().has_flash(),
            })
        })
}

fn haptic(ctx: &HandlerContext, req: HapticRequest) -> Result<()> {
    let platform = ctx.platform();
    if !platform.has_vibrator() {
        return Err(TetherError::platform("Vibrator not available"));
    }
    let style = HapticStyle::from_name(req.style.as_deref().unwrap_or("medium"));
    tracing::trace!(kind = req.kind.as_deref().unwrap_or("impact"), ?style, "haptic");
    platform.haptic(style)
}

fn toggle_torch(ctx: &HandlerContext, torch_on: &Mutex<bool>, req: TorchRequest) -> Result<TorchState> {
    let mut current = torch_on.lock().unwrap_or_else(|p| p.into_inner());
    let on = req.on.unwrap_or(!*current);

    let platform = ctx.platform();
    if !platform.has_flash() {
        return Err(TetherError::platform("No camera available"));
    }
    platform.set_torch(on)?;
    *current = on;
    Ok(TorchState { on })
}
