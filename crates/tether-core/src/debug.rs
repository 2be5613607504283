// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime developer switches, readable from any thread.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::DebugConfig;

/// Developer aids toggled at runtime by the dev menu or `devmenu.*` actions.
#[derive(Debug, Default)]
pub struct DebugSettings {
    shake_to_open_menu: AtomicBool,
    log_bridge_calls: AtomicBool,
    dev_menu_enabled: AtomicBool,
    server_url: Mutex<Option<String>>,
}

impl DebugSettings {
    pub fn from_config(config: &DebugConfig) -> Self {
        let settings = Self::default();
        settings
            .shake_to_open_menu
            .store(config.enabled || config.shake_to_open_menu, Ordering::Relaxed);
        settings
            .log_bridge_calls
            .store(config.enabled || config.log_bridge_calls, Ordering::Relaxed);
        settings.dev_menu_enabled.store(config.enabled, Ordering::Relaxed);
        settings
    }

    /// Turn on every developer aid.
    pub fn enable(&self) {
        self.shake_to_open_menu.store(true, Ordering::Relaxed);
        self.log_bridge_calls.store(true, Ordering::Relaxed);
        self.dev_menu_enabled.store(true, Ordering::Relaxed);
        tracing::info!("developer mode enabled");
    }

    pub fn disable(&self) {
        self.shake_to_open_menu.store(false, Ordering::Relaxed);
        self.log_bridge_calls.store(false, Ordering::Relaxed);
        self.dev_menu_enabled.store(false, Ordering::Relaxed);
        tracing::info!("developer mode disabled");
    }

    /// Whether the developer menu may be shown.
    pub fn is_enabled(&self) -> bool {
        self.dev_menu_enabled.load(Ordering::Relaxed)
    }

    pub fn set_dev_menu_enabled(&self, on: bool) {
        self.dev_menu_enabled.store(on, Ordering::Relaxed);
    }

    pub fn shake_to_open_menu(&self) -> bool {
        self.shake_to_open_menu.load(Ordering::Relaxed)
    }

    pub fn set_shake_to_open_menu(&self, on: bool) {
        self.shake_to_open_menu.store(on, Ordering::Relaxed);
    }

    pub fn log_bridge_calls(&self) -> bool {
        self.log_bridge_calls.load(Ordering::Relaxed)
    }

    pub fn set_log_bridge_calls(&self, on: bool) {
        self.log_bridge_calls.store(on, Ordering::Relaxed);
    }

    /// Dev server the host should load instead of the configured start URL.
    pub fn server_url(&self) -> Option<String> {
        self.server_url
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Empty strings clear the override.
    pub fn set_server_url(&self, url: Option<String>) {
        let url = url.filter(|u| !u.trim().is_empty());
        tracing::info!(url = ?url, "dev server url changed");
        *self.server_url.lock().unwrap_or_else(|p| p.into_inner()) = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_switch_turns_everything_on() {
        let config = DebugConfig {
            enabled: true,
            ..Default::default()
        };
        let settings = DebugSettings::from_config(&config);
        assert!(settings.is_enabled());
        assert!(settings.shake_to_open_menu());
        assert!(settings.log_bridge_calls());
    }

    #[test]
    fn individual_switches_without_dev_menu() {
        let config = DebugConfig {
            log_bridge_calls: true,
            ..Default::default()
        };
        let settings = DebugSettings::from_config(&config);
        assert!(!settings.is_enabled());
        assert!(settings.log_bridge_calls());
        assert!(!settings.shake_to_open_menu());
    }

    #[test]
    fn enable_and_disable() {
        let settings = DebugSettings::default();
        settings.enable();
        assert!(settings.shake_to_open_menu());
        settings.disable();
        assert!(!settings.is_enabled());
        assert!(!settings.log_bridge_calls());
    }

    #[test]
    fn blank_server_url_clears_override() {
        let settings = DebugSettings::default();
        settings.set_server_url(Some("http://10.0.2.2:5173".into()));
        assert_eq!(settings.server_url().as_deref(), Some("http://10.0.2.2:5173"));
        settings.set_server_url(Some("  ".into()));
        assert_eq!(settings.server_url(), None);
    }
}
