// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native capability traits and the per-OS implementations behind them.

pub mod attached;
pub mod manifest;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

use std::path::Path;
use std::sync::Arc;

use tether_core::error::Result;

pub use attached::AttachedHost;
pub use traits::PlatformBridge;

/// The bridge implementation for the target operating system.
///
/// `data_dir` holds the stub's key-value store; Android keeps its state in
/// SharedPreferences and ignores it.
pub fn platform_bridge(data_dir: &Path) -> Result<Arc<dyn PlatformBridge>> {
    #[cfg(target_os = "android")]
    {
        let _ = data_dir;
        Ok(Arc::new(android::AndroidBridge::new()))
    }
    #[cfg(not(target_os = "android"))]
    {
        Ok(Arc::new(stub::StubBridge::new(data_dir)?))
    }
}
