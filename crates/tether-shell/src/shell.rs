// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The platform-neutral half of a host activity.
//
// A host creates one `Shell`, applies `webview_settings`, loads
// `start_url`, evaluates the bootstrap on every page start and finish, and
// forwards bridge calls, OS results, sensor samples and lifecycle events.
// Rendered responses come out of the `UiReceiver` returned by `Shell::new`
// and must be evaluated on the UI thread in order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use tether_bridge::handlers::biometric::{BiometricEvent, report_biometric_event};
use tether_bridge::platform::manifest::results_reply;
use tether_bridge::{
    BridgeResponse, CallbackId, Dispatcher, HandlerContext, PlatformBridge, RequestToken, UiQueue,
    UiReceiver, bootstrap_script, default_registry,
};
use tether_core::config::AppConfig;
use tether_core::error::Result;
use tether_core::{DebugSettings, SplashConfig, SplashManager};

use crate::dev_menu::{DevMenu, DevMenuItem};
use crate::shake::ShakeDetector;
use crate::webview::{WebViewControl, WebViewSettings};

/// What the host should do with a back press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    /// The WebView went back one page.
    WentBack,
    /// Nothing left to go back to; let the system finish the activity.
    Exit,
}

struct Attached {
    webview: Arc<dyn WebViewControl>,
    dev_menu: Arc<DevMenu>,
}

pub struct Shell {
    config: AppConfig,
    splash: SplashConfig,
    dispatcher: Arc<Dispatcher>,
    bootstrap: String,
    shake: ShakeDetector,
    attached: Mutex<Option<Attached>>,
}

impl Shell {
    /// Build the bridge for `platform`. Spawned work runs on `runtime`.
    pub fn new(
        config: AppConfig,
        splash: SplashConfig,
        platform: Arc<dyn PlatformBridge>,
        runtime: Handle,
    ) -> Result<(Self, UiReceiver)> {
        let debug = Arc::new(DebugSettings::from_config(&config.debug));
        let bootstrap = bootstrap_script(&config.bridge, &platform.device_info().platform);
        let ctx = HandlerContext::new(platform, runtime)
            .with_splash(Arc::new(SplashManager::new()))
            .with_debug(debug);

        let (queue, responses) = UiQueue::new();
        let dispatcher = Dispatcher::new(default_registry()?, ctx, Arc::new(queue))
            .with_timeout(config.bridge.call_timeout());

        info!(
            platform = dispatcher.context().platform().platform_name(),
            actions = dispatcher.registry().len(),
            "shell created"
        );
        let shell = Self {
            config,
            splash,
            dispatcher: Arc::new(dispatcher),
            bootstrap,
            shake: ShakeDetector::new(),
            attached: Mutex::new(None),
        };
        Ok((shell, responses))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn context(&self) -> &HandlerContext {
        self.dispatcher.context()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn webview_settings(&self) -> WebViewSettings {
        WebViewSettings::from_config(&self.config)
    }

    /// First page to load. A dev server chosen at runtime wins over the
    /// configuration.
    pub fn start_url(&self) -> String {
        self.context()
            .debug()
            .server_url()
            .unwrap_or_else(|| self.config.start_url().to_owned())
    }

    /// Hand the shell the live WebView. Replaces any earlier one.
    pub fn attach_webview(&self, webview: Arc<dyn WebViewControl>) {
        let dev_menu = Arc::new(DevMenu::new(
            self.context().clone(),
            Arc::clone(&webview),
            self.config.debug.dev_server_url.clone(),
            self.config.webview.remote_debugging,
        ));
        *self.lock_attached() = Some(Attached { webview, dev_menu });
    }

    pub fn dev_menu(&self) -> Option<Arc<DevMenu>> {
        self.lock_attached().as_ref().map(|a| Arc::clone(&a.dev_menu))
    }

    // -----------------------------------------------------------------------
    // Page loading
    // -----------------------------------------------------------------------

    /// Script to evaluate when `url` starts loading.
    pub fn on_page_started(&self, url: &str) -> &str {
        debug!(url, "page started, injecting bridge");
        &self.bootstrap
    }

    /// Script to evaluate when `url` finished loading. Evaluating the
    /// bootstrap twice keeps the first instance.
    pub fn on_page_finished(&self, url: &str) -> &str {
        debug!(url, "page finished, ensuring bridge");
        &self.bootstrap
    }

    // -----------------------------------------------------------------------
    // Bridge traffic
    // -----------------------------------------------------------------------

    /// `window.<native>.call(action, payload, id)` from the page.
    pub fn handle_call(&self, action: &str, payload: &str, callback_id: &str) {
        self.dispatcher
            .dispatch(action, payload, CallbackId::new(callback_id));
    }

    /// Answer call `callback_id` with a failure without dispatching it.
    pub fn reject_call(&self, callback_id: &str, message: &str) {
        self.dispatcher
            .reject(CallbackId::new(callback_id), message);
    }

    /// Statement that delivers `response` to the page.
    pub fn render_response(&self, response: &BridgeResponse) -> String {
        response.to_script(&self.config.bridge.namespace)
    }

    /// Outcome of a host request (dialog, picker, prompt, location fix).
    ///
    /// `json` is the result on success and `{"error": ..}` or a bare message
    /// otherwise. Returns whether a waiting call took the result.
    pub fn on_host_result(&self, code: i32, success: bool, json: &str) -> bool {
        let Some(token) = RequestToken::from_code(code) else {
            warn!(code, "host result with an invalid request code");
            return false;
        };
        let pending = self.context().pending();

        let value = if json.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(json) {
                Ok(value) => value,
                Err(_) if !success => Value::String(json.to_owned()),
                Err(e) => {
                    warn!(%token, error = %e, "unparseable host result");
                    return pending.complete(token, Err(format!("Invalid host result: {e}")));
                }
            }
        };

        if !success {
            return pending.complete(token, Err(error_message(&value)));
        }
        if let Some(event) = BiometricEvent::from_host(&value) {
            return report_biometric_event(pending, token, event);
        }
        pending.complete(token, Ok(value))
    }

    /// `onRequestPermissionsResult` for a request made with `code`.
    pub fn on_permissions_result(
        &self,
        code: i32,
        permissions: &[String],
        grants: &[i32],
        sdk_int: i32,
    ) -> bool {
        let Some(token) = RequestToken::from_code(code) else {
            warn!(code, "permission result with an invalid request code");
            return false;
        };
        self.context()
            .pending()
            .complete(token, Ok(results_reply(permissions, grants, sdk_int)))
    }

    // -----------------------------------------------------------------------
    // Splash
    // -----------------------------------------------------------------------

    pub fn splash_config(&self) -> &SplashConfig {
        &self.splash
    }

    /// Called by the splash host once it is on screen. `hide` runs on
    /// `splash.hide`, or after the configured delay when auto-hide is set.
    pub fn register_splash(&self, hide: impl FnOnce() + Send + 'static) {
        self.context().splash().register_hide_callback(hide);
        if let Some(delay) = self.splash.auto_hide_delay() {
            let ctx = self.context().clone();
            drop(self.context().runtime().spawn(async move {
                tokio::time::sleep(delay).await;
                debug!(?delay, "auto-hiding splash");
                ctx.splash().hide();
            }));
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Returns `true` if the host must register its accelerometer listener.
    pub fn on_resume(&self) -> bool {
        if self.context().debug().shake_to_open_menu() {
            self.shake.start()
        } else {
            false
        }
    }

    /// Returns `true` if the host must unregister its accelerometer
    /// listener.
    pub fn on_pause(&self) -> bool {
        self.shake.stop()
    }

    pub fn on_destroy(&self) {
        self.shake.stop();
        self.context().splash().unregister_hide_callback();
        self.context().splash().clear_pending();
        *self.lock_attached() = None;
        info!(pending = self.context().pending().len(), "shell destroyed");
    }

    pub fn on_back_pressed(&self) -> BackAction {
        let webview = self.lock_attached().as_ref().map(|a| Arc::clone(&a.webview));
        match webview {
            Some(webview) if webview.can_go_back() => {
                webview.go_back();
                BackAction::WentBack
            }
            _ => BackAction::Exit,
        }
    }

    /// Feed one accelerometer sample. Returns the dev menu items when the
    /// sample completes a shake and the menu may open.
    pub fn on_accelerometer(
        &self,
        x: f32,
        y: f32,
        z: f32,
        at: Duration,
    ) -> Option<&'static [DevMenuItem]> {
        if !self.shake.on_sample(x, y, z, at) {
            return None;
        }
        self.dev_menu()?.show()
    }

    fn lock_attached(&self) -> std::sync::MutexGuard<'_, Option<Attached>> {
        self.attached.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("start_url", &self.start_url())
            .field("dispatcher", &self.dispatcher)
            .field("shake", &self.shake)
            .finish_non_exhaustive()
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        other => other
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_owned(),
    }
}
