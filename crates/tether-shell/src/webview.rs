// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WebView settings and the control surface the shell drives it through.

use serde::Serialize;

use tether_core::config::AppConfig;
use tether_core::types::Color;

/// Fallback when the configured background colour does not parse.
const DEFAULT_BACKGROUND: u32 = 0xFF0F_172A;

/// What the shell needs from the hosting WebView.
///
/// Implementations forward to the UI thread themselves; every method may be
/// called from any thread.
pub trait WebViewControl: Send + Sync {
    fn load_url(&self, url: &str);

    fn reload(&self);

    /// Drop the HTTP cache, including disk entries.
    fn clear_cache(&self);

    fn clear_history(&self);

    fn can_go_back(&self) -> bool;

    fn go_back(&self);

    /// Evaluate `script` in the page's main frame.
    fn evaluate_script(&self, script: &str);

    fn set_remote_debugging(&self, enabled: bool);

    /// Page currently shown, if any.
    fn current_url(&self) -> Option<String>;
}

/// Mixed-content policy for HTTPS pages loading HTTP resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MixedContent {
    AlwaysAllow,
    CompatibilityMode,
    NeverAllow,
}

/// Settings applied once when the WebView is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebViewSettings {
    pub javascript: bool,
    pub file_access: bool,
    pub content_access: bool,
    pub dom_storage: bool,
    pub zoom: bool,
    pub wide_viewport: bool,
    pub overview_mode: bool,
    pub mixed_content: MixedContent,
    pub media_requires_gesture: bool,
    /// ARGB shown before the first paint.
    pub background_argb: u32,
    pub remote_debugging: bool,
}

impl WebViewSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let background_argb = Color::parse(&config.webview.background_color).map_or_else(
            || {
                tracing::warn!(
                    color = %config.webview.background_color,
                    "invalid WebView background colour, using default"
                );
                DEFAULT_BACKGROUND
            },
            Color::to_argb,
        );
        Self {
            javascript: true,
            file_access: true,
            content_access: true,
            dom_storage: true,
            zoom: false,
            wide_viewport: true,
            overview_mode: true,
            // Dev servers are plain HTTP.
            mixed_content: MixedContent::AlwaysAllow,
            media_requires_gesture: false,
            background_argb,
            remote_debugging: config.webview.remote_debugging,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shell_page_requirements() {
        let settings = WebViewSettings::from_config(&AppConfig::default());
        assert!(settings.javascript && settings.dom_storage && settings.file_access);
        assert!(!settings.zoom);
        assert!(!settings.media_requires_gesture);
        assert_eq!(settings.mixed_content, MixedContent::AlwaysAllow);
        assert_eq!(settings.background_argb, 0xFF0F_172A);
    }

    #[test]
    fn configured_background_and_debugging() {
        let mut config = AppConfig::default();
        config.webview.background_color = "#FFFFFF".into();
        config.webview.remote_debugging = false;
        let settings = WebViewSettings::from_config(&config);
        assert_eq!(settings.background_argb, 0xFFFF_FFFF);
        assert!(!settings.remote_debugging);

        config.webview.background_color = "white".into();
        assert_eq!(
            WebViewSettings::from_config(&config).background_argb,
            DEFAULT_BACKGROUND
        );
    }
}
