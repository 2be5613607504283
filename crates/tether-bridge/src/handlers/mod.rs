// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge actions.
//
// Each module registers the actions of one capability family. Validation
// messages are part of the page-facing contract and must not change.

pub mod biometric;
pub mod clipboard;
pub mod contacts;
pub mod device;
pub mod dialogs;
pub mod location;
pub mod media;
pub mod notification;
pub mod permission;
pub mod push;
pub mod qrcode;
pub mod storage;
pub mod system;
pub mod url;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use tether_core::error::{Result, TetherError};

use crate::registry::{HandlerRegistry, RegistryBuilder};

/// Registry with every built-in action.
pub fn default_registry() -> Result<HandlerRegistry> {
    register_all(HandlerRegistry::builder()).build()
}

/// Add every built-in action to `builder`, for hosts that register extras.
pub fn register_all(builder: RegistryBuilder) -> RegistryBuilder {
    let builder = device::register(builder);
    let builder = storage::register(builder);
    let builder = clipboard::register(builder);
    let builder = url::register(builder);
    let builder = system::register(builder);
    let builder = dialogs::register(builder);
    let builder = biometric::register(builder);
    let builder = media::register(builder);
    let builder = location::register(builder);
    let builder = notification::register(builder);
    let builder = qrcode::register(builder);
    let builder = permission::register(builder);
    let builder = contacts::register(builder);
    push::register(builder)
}

/// `value` if present and non-empty, otherwise a validation error.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TetherError::invalid(message))
}

/// Empty strings count as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// `data:<mime>;base64,...` for embedding bytes in a JSON result.
pub(crate) fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
