// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "tether.json";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page shipped inside the application package.
    pub bundled_url: String,
    /// Hosted build of the web application.
    pub remote_url: Option<String>,
    /// Load `remote_url` instead of the bundled page.
    pub use_remote: bool,
    /// Overrides every other source when set (live-reload dev server).
    pub dev_server_url: Option<String>,
    pub bridge: BridgeConfig,
    pub debug: DebugConfig,
    pub push: PushConfig,
    pub webview: WebViewConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bundled_url: "file:///android_asset/www/index.html".into(),
            remote_url: None,
            use_remote: false,
            dev_server_url: None,
            bridge: BridgeConfig::default(),
            debug: DebugConfig::default(),
            push: PushConfig::default(),
            webview: WebViewConfig::default(),
        }
    }
}

impl AppConfig {
    /// URL the host should load first.
    ///
    /// Precedence: dev server override, then the remote build when enabled,
    /// then the bundled page.
    pub fn start_url(&self) -> &str {
        if let Some(url) = self.dev_server_url.as_deref().filter(|u| !u.is_empty()) {
            return url;
        }
        if self.use_remote
            && let Some(url) = self.remote_url.as_deref().filter(|u| !u.is_empty())
        {
            return url;
        }
        &self.bundled_url
    }

    /// Load `tether.json` from `dir`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_or_default(dir: &Path) -> Self {
        match Self::load(dir) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "invalid configuration file, using defaults");
                Self::default()
            }
        }
    }

    /// Load `tether.json` from `dir`. Returns `Ok(None)` if it does not exist.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Write the configuration to `dir/tether.json`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

/// Bridge protocol settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Global object the client stub is installed under (`window.<namespace>`).
    pub namespace: String,
    /// Name of the native object exposed to the page.
    pub native_object: String,
    /// Seconds before an unanswered call is failed. `0` disables the limit.
    pub call_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: "Tether".into(),
            native_object: "AndroidBridge".into(),
            call_timeout_secs: 300,
        }
    }
}

impl BridgeConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }
}

/// Developer tooling switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Turns on every developer aid at startup.
    pub enabled: bool,
    pub log_bridge_calls: bool,
    pub shake_to_open_menu: bool,
    /// Address offered by the dev menu's "Change Server URL" entry.
    pub dev_server_url: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_bridge_calls: false,
            shake_to_open_menu: false,
            dev_server_url: "http://localhost:5173".into(),
        }
    }
}

/// Push notification vendor settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub app_id: Option<String>,
}

/// WebView appearance and behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebViewConfig {
    pub background_color: String,
    /// Allow attaching browser devtools to the page.
    pub remote_debugging: bool,
}

impl Default for WebViewConfig {
    fn default() -> Self {
        Self {
            background_color: "#0F172A".into(),
            remote_debugging: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_page_is_the_default_start_url() {
        let config = AppConfig::default();
        assert_eq!(config.start_url(), "file:///android_asset/www/index.html");
    }

    #[test]
    fn remote_url_requires_use_remote() {
        let mut config = AppConfig {
            remote_url: Some("https://app.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(config.start_url(), config.bundled_url);

        config.use_remote = true;
        assert_eq!(config.start_url(), "https://app.example.com/");
    }

    #[test]
    fn dev_server_overrides_everything() {
        let config = AppConfig {
            remote_url: Some("https://app.example.com/".into()),
            use_remote: true,
            dev_server_url: Some("http://10.0.2.2:5173".into()),
            ..Default::default()
        };
        assert_eq!(config.start_url(), "http://10.0.2.2:5173");
    }

    #[test]
    fn zero_timeout_disables_the_limit() {
        let bridge = BridgeConfig {
            call_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(bridge.call_timeout(), None);
        assert_eq!(
            BridgeConfig::default().call_timeout(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"use_remote": true, "bridge": {"namespace": "App"}}"#)
                .expect("parse");
        assert!(config.use_remote);
        assert_eq!(config.bridge.namespace, "App");
        assert_eq!(config.bridge.native_object, "AndroidBridge");
        assert_eq!(config.webview.background_color, "#0F172A");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            dev_server_url: Some("http://192.168.1.20:5173".into()),
            ..Default::default()
        };
        config.save(dir.path()).expect("save");

        let loaded = AppConfig::load(dir.path()).expect("load").expect("present");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(AppConfig::load(dir.path()).expect("load").is_none());
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }
}
