// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether shell: everything a host activity does around the bridge.

pub mod dev_menu;
pub mod shake;
pub mod shell;
pub mod webview;

#[cfg(target_os = "android")]
pub mod android;

pub use dev_menu::{DevMenu, DevMenuItem, MenuOutcome};
pub use shake::ShakeDetector;
pub use shell::{BackAction, Shell};
pub use webview::{WebViewControl, WebViewSettings};
