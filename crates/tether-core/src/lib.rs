// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether core: shared types, configuration and error definitions.

pub mod config;
pub mod debug;
pub mod error;
pub mod splash;
pub mod types;

pub use config::AppConfig;
pub use debug::DebugSettings;
pub use error::TetherError;
pub use splash::{SplashConfig, SplashManager};
pub use types::*;
