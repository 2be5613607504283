// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Developer menu opened by shaking the device.
//
// The host presents the items and any follow-up dialog; the actions
// themselves run here against the WebView and the platform bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tether_bridge::HandlerContext;
use tether_core::error::Result;

use crate::webview::WebViewControl;

pub const MENU_TITLE: &str = "Tether Dev Menu";

const CLEAR_WEB_STORAGE: &str = "localStorage.clear(); sessionStorage.clear();";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevMenuItem {
    Reload,
    HardReload,
    CopyDeviceInfo,
    ChangeServerUrl,
    ToggleRemoteDebugging,
    ShowPerformance,
    ClearStorage,
    About,
}

impl DevMenuItem {
    /// Menu order.
    pub const ALL: [Self; 8] = [
        Self::Reload,
        Self::HardReload,
        Self::CopyDeviceInfo,
        Self::ChangeServerUrl,
        Self::ToggleRemoteDebugging,
        Self::ShowPerformance,
        Self::ClearStorage,
        Self::About,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Reload => "Reload",
            Self::HardReload => "Hard Reload (Clear Cache)",
            Self::CopyDeviceInfo => "Copy Device Info",
            Self::ChangeServerUrl => "Change Server URL",
            Self::ToggleRemoteDebugging => "Toggle Remote Debugging",
            Self::ShowPerformance => "Show Performance",
            Self::ClearStorage => "Clear Storage",
            Self::About => "About",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// What the host shows after an item ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    Toast(String),
    /// Informational dialog with a single dismiss button.
    Message { title: String, body: String },
    /// Ask for a dev server address, then call
    /// [`DevMenu::apply_server_url`].
    PromptServerUrl { current: String },
    /// Ask before wiping web storage, then call
    /// [`DevMenu::clear_storage`].
    ConfirmClearStorage,
}

pub struct DevMenu {
    ctx: HandlerContext,
    webview: Arc<dyn WebViewControl>,
    default_server_url: String,
    remote_debugging: AtomicBool,
}

impl DevMenu {
    pub fn new(
        ctx: HandlerContext,
        webview: Arc<dyn WebViewControl>,
        default_server_url: impl Into<String>,
        remote_debugging: bool,
    ) -> Self {
        Self {
            ctx,
            webview,
            default_server_url: default_server_url.into(),
            remote_debugging: AtomicBool::new(remote_debugging),
        }
    }

    /// Items to present, or `None` while developer mode is off.
    pub fn show(&self) -> Option<&'static [DevMenuItem]> {
        if !self.ctx.debug().is_enabled() {
            tracing::debug!("dev menu requested while disabled");
            return None;
        }
        Some(&DevMenuItem::ALL)
    }

    pub fn execute(&self, item: DevMenuItem) -> Result<MenuOutcome> {
        tracing::info!(item = item.label(), "dev menu action");
        Ok(match item {
            DevMenuItem::Reload => {
                self.webview.reload();
                MenuOutcome::Toast("Reloading...".into())
            }
            DevMenuItem::HardReload => {
                self.webview.clear_cache();
                self.webview.reload();
                MenuOutcome::Toast("Cache cleared, reloading...".into())
            }
            DevMenuItem::CopyDeviceInfo => {
                self.ctx.platform().set_clipboard_text(&self.device_info())?;
                MenuOutcome::Toast("Device info copied".into())
            }
            DevMenuItem::ChangeServerUrl => MenuOutcome::PromptServerUrl {
                current: self.server_url(),
            },
            DevMenuItem::ToggleRemoteDebugging => {
                let enabled = !self.remote_debugging.fetch_xor(true, Ordering::Relaxed);
                self.webview.set_remote_debugging(enabled);
                MenuOutcome::Toast(if enabled {
                    "Remote debugging enabled, open chrome://inspect".into()
                } else {
                    "Remote debugging disabled".into()
                })
            }
            DevMenuItem::ShowPerformance => MenuOutcome::Message {
                title: "Performance".into(),
                body: self.performance(),
            },
            DevMenuItem::ClearStorage => MenuOutcome::ConfirmClearStorage,
            DevMenuItem::About => MenuOutcome::Message {
                title: "About".into(),
                body: self.about(),
            },
        })
    }

    /// Switch the page to a new dev server. Blank input changes nothing.
    pub fn apply_server_url(&self, url: &str) -> Option<MenuOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        self.ctx.debug().set_server_url(Some(url.to_owned()));
        self.webview.load_url(url);
        Some(MenuOutcome::Toast(format!("Connecting to {url}...")))
    }

    /// Wipe the page's caches, history and web storage, then reload.
    pub fn clear_storage(&self) -> MenuOutcome {
        self.webview.clear_cache();
        self.webview.clear_history();
        self.webview.evaluate_script(CLEAR_WEB_STORAGE);
        self.webview.reload();
        MenuOutcome::Toast("Storage cleared".into())
    }

    fn server_url(&self) -> String {
        self.ctx
            .debug()
            .server_url()
            .unwrap_or_else(|| self.default_server_url.clone())
    }

    fn device_info(&self) -> String {
        let device = self.ctx.platform().device_info();
        let current = self.webview.current_url().unwrap_or_default();
        [
            "=== Tether Device Info ===".to_owned(),
            format!("Platform: {}", device.platform),
            format!("OS Version: {}", device.version),
            format!("Model: {}", device.model),
            format!("Current URL: {current}"),
            format!("Dev Server: {}", self.server_url()),
        ]
        .join("\n")
    }

    fn performance(&self) -> String {
        let processors = std::thread::available_parallelism().map_or(1, |n| n.get());
        format!(
            "Processors: {processors}\nPending host requests: {}",
            self.ctx.pending().len()
        )
    }

    fn about(&self) -> String {
        let version = match self.ctx.platform().app_version() {
            Ok(v) => format!("{}\n\nVersion: {}\nBuild: {}", v.name, v.version, v.build),
            Err(e) => {
                tracing::warn!(error = %e, "app version unavailable");
                "Tether".to_owned()
            }
        };
        format!("{version}\n\nShake to open this menu")
    }
}

impl std::fmt::Debug for DevMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevMenu")
            .field("remote_debugging", &self.remote_debugging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tether_bridge::testing::FakePlatform;

    use super::*;
    use crate::webview::recording::RecordingWebView;

    fn menu(platform: &Arc<FakePlatform>) -> (DevMenu, Arc<RecordingWebView>) {
        let ctx = platform.context();
        ctx.debug().enable();
        let webview = Arc::new(RecordingWebView::default());
        webview.load_url("http://localhost:5173/");
        let menu = DevMenu::new(
            ctx,
            Arc::clone(&webview) as Arc<dyn WebViewControl>,
            "http://localhost:5173",
            true,
        );
        (menu, webview)
    }

    #[tokio::test]
    async fn hidden_while_developer_mode_is_off() {
        let platform = FakePlatform::new();
        let (menu, _) = menu(&platform);
        assert_eq!(menu.show().map(<[_]>::len), Some(8));
        menu.ctx.debug().disable();
        assert_eq!(menu.show(), None);
    }

    #[test]
    fn items_are_addressable_by_index() {
        assert_eq!(DevMenuItem::from_index(0), Some(DevMenuItem::Reload));
        assert_eq!(DevMenuItem::from_index(7), Some(DevMenuItem::About));
        assert_eq!(DevMenuItem::from_index(8), None);
    }

    #[tokio::test]
    async fn hard_reload_clears_the_cache_first() {
        let platform = FakePlatform::new();
        let (menu, webview) = menu(&platform);
        menu.execute(DevMenuItem::HardReload).expect("ran");
        let state = webview.state();
        assert_eq!((state.cache_clears, state.reloads), (1, 1));
    }

    #[tokio::test]
    async fn device_info_goes_to_the_clipboard() {
        let platform = FakePlatform::new();
        let (menu, _) = menu(&platform);
        assert_eq!(
            menu.execute(DevMenuItem::CopyDeviceInfo).expect("ran"),
            MenuOutcome::Toast("Device info copied".into())
        );
        let copied = platform.state().clipboard.clone().expect("copied");
        assert!(copied.contains("Model: Pixel Fake"));
        assert!(copied.contains("Current URL: http://localhost:5173/"));
    }

    #[tokio::test]
    async fn server_url_change_loads_and_remembers_it() {
        let platform = FakePlatform::new();
        let (menu, webview) = menu(&platform);
        assert_eq!(
            menu.execute(DevMenuItem::ChangeServerUrl).expect("ran"),
            MenuOutcome::PromptServerUrl {
                current: "http://localhost:5173".into()
            }
        );

        assert_eq!(menu.apply_server_url("   "), None);
        assert_eq!(
            menu.apply_server_url(" http://10.0.2.2:3000 "),
            Some(MenuOutcome::Toast("Connecting to http://10.0.2.2:3000...".into()))
        );
        assert_eq!(webview.current_url().as_deref(), Some("http://10.0.2.2:3000"));
        assert_eq!(
            menu.ctx.debug().server_url().as_deref(),
            Some("http://10.0.2.2:3000")
        );
    }

    #[tokio::test]
    async fn remote_debugging_toggles() {
        let platform = FakePlatform::new();
        let (menu, webview) = menu(&platform);
        menu.execute(DevMenuItem::ToggleRemoteDebugging).expect("ran");
        assert_eq!(webview.state().remote_debugging, Some(false));
        menu.execute(DevMenuItem::ToggleRemoteDebugging).expect("ran");
        assert_eq!(webview.state().remote_debugging, Some(true));
    }

    #[tokio::test]
    async fn clear_storage_needs_confirmation() {
        let platform = FakePlatform::new();
        let (menu, webview) = menu(&platform);
        assert_eq!(
            menu.execute(DevMenuItem::ClearStorage).expect("ran"),
            MenuOutcome::ConfirmClearStorage
        );
        assert!(webview.state().scripts.is_empty());

        menu.clear_storage();
        let state = webview.state();
        assert_eq!(state.scripts, [CLEAR_WEB_STORAGE]);
        assert_eq!((state.cache_clears, state.history_clears, state.reloads), (1, 1, 1));
    }

    #[tokio::test]
    async fn about_names_the_app() {
        let platform = FakePlatform::new();
        let (menu, _) = menu(&platform);
        let MenuOutcome::Message { title, body } = menu.execute(DevMenuItem::About).expect("ran")
        else {
            panic!("expected a message");
        };
        assert_eq!(title, "About");
        assert!(body.starts_with("Tether Test\n\nVersion: 1.2.3\nBuild: 42"));
    }
}
