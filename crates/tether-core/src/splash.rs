// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Splash screen configuration and the hide handshake between the splash
// host and the `splash.hide` bridge action.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

/// Asset file the splash configuration is read from.
pub const SPLASH_CONFIG_FILE: &str = "splash_config.json";

/// What the splash host renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum SplashKind {
    #[default]
    Static,
    Lottie,
    Animated,
}

impl From<String> for SplashKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "lottie" => Self::Lottie,
            "animated" => Self::Animated,
            _ => Self::Static,
        }
    }
}

/// Transition used when the splash leaves the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Transition {
    #[default]
    Fade,
    Slide,
    Zoom,
}

impl From<String> for Transition {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "slide" => Self::Slide,
            "zoom" => Self::Zoom,
            _ => Self::Fade,
        }
    }
}

/// Entrance animation for the logo or text. `fade-scale` and `fade_scale`
/// are the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Animation {
    #[default]
    None,
    Fade,
    FadeScale,
    Bounce,
    SlideUp,
    Pulse,
}

impl From<String> for Animation {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "fade" => Self::Fade,
            "fade_scale" => Self::FadeScale,
            "bounce" => Self::Bounce,
            "slide_up" => Self::SlideUp,
            "pulse" => Self::Pulse,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub animation: Animation,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            width: 150,
            height: 150,
            animation: Animation::FadeScale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LottieConfig {
    pub src: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub auto_play: bool,
}

impl Default for LottieConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            width: 300,
            height: 300,
            looping: false,
            auto_play: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    pub content: String,
    pub color: String,
    pub font_size: u32,
    pub animation: Animation,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            color: "#FFFFFF".into(),
            font_size: 16,
            animation: Animation::None,
        }
    }
}

/// Contents of `splash_config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplashConfig {
    #[serde(rename = "type")]
    pub kind: SplashKind,
    pub background_color: String,
    pub logo: Option<LogoConfig>,
    pub lottie: Option<LottieConfig>,
    pub text: Option<TextConfig>,
    /// Milliseconds the splash stays up when `auto_hide` is set.
    pub duration: u64,
    pub transition: Transition,
    pub auto_hide: bool,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            kind: SplashKind::Static,
            background_color: "#0F172A".into(),
            logo: None,
            lottie: None,
            text: None,
            duration: 3000,
            transition: Transition::Fade,
            auto_hide: false,
        }
    }
}

impl SplashConfig {
    /// Parse a configuration document. Any error yields the defaults.
    pub fn parse(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid splash configuration, using defaults");
            Self::default()
        })
    }

    /// Read `splash_config.json` from an asset directory.
    pub fn load(assets_dir: &Path) -> Self {
        match std::fs::read_to_string(assets_dir.join(SPLASH_CONFIG_FILE)) {
            Ok(json) => Self::parse(&json),
            Err(_) => Self::default(),
        }
    }

    /// How long to wait before hiding without a `splash.hide` call.
    pub fn auto_hide_delay(&self) -> Option<Duration> {
        self.auto_hide.then(|| Duration::from_millis(self.duration))
    }
}

type HideCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SplashState {
    callback: Option<HideCallback>,
    pending_hide: bool,
}

/// Hand-off between the splash host and web code asking to hide it.
///
/// A hide requested before the splash registered its callback is remembered
/// and applied on registration.
#[derive(Default)]
pub struct SplashManager {
    state: Mutex<SplashState>,
}

impl SplashManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the splash host once it can be dismissed.
    pub fn register_hide_callback(&self, callback: impl FnOnce() + Send + 'static) {
        let fire_now = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if state.pending_hide {
                state.pending_hide = false;
                true
            } else {
                state.callback = Some(Box::new(callback));
                return;
            }
        };
        if fire_now {
            tracing::debug!("splash hide was requested early, hiding on registration");
            callback();
        }
    }

    /// Called when the splash host is destroyed.
    pub fn unregister_hide_callback(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.callback = None;
        state.pending_hide = false;
    }

    /// Hide the splash now, or as soon as it registers.
    pub fn hide(&self) {
        let callback = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            match state.callback.take() {
                Some(cb) => {
                    state.pending_hide = false;
                    Some(cb)
                }
                None => {
                    state.pending_hide = true;
                    None
                }
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn has_pending_hide(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).pending_hide
    }

    pub fn clear_pending(&self) {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).pending_hide = false;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(SplashConfig::parse("{}"), SplashConfig::default());
        assert_eq!(SplashConfig::parse("not json"), SplashConfig::default());
    }

    #[test]
    fn full_document() {
        let config = SplashConfig::parse(
            r##"{
                "type": "LOTTIE",
                "backgroundColor": "#000000",
                "logo": {"src": "splash/logo.png", "animation": "slide-up"},
                "lottie": {"src": "splash/intro.json", "loop": true},
                "text": {"content": "Loading", "fontSize": 20, "animation": "Fade_Scale"},
                "duration": 1500,
                "transition": "zoom",
                "autoHide": true
            }"##,
        );
        assert_eq!(config.kind, SplashKind::Lottie);
        assert_eq!(config.background_color, "#000000");

        let logo = config.logo.as_ref().expect("logo");
        assert_eq!(logo.animation, Animation::SlideUp);
        assert_eq!((logo.width, logo.height), (150, 150));

        let lottie = config.lottie.as_ref().expect("lottie");
        assert!(lottie.looping);
        assert!(lottie.auto_play);

        let text = config.text.as_ref().expect("text");
        assert_eq!(text.font_size, 20);
        assert_eq!(text.color, "#FFFFFF");
        assert_eq!(text.animation, Animation::FadeScale);

        assert_eq!(config.transition, Transition::Zoom);
        assert_eq!(config.auto_hide_delay(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn unknown_names_fall_back() {
        let config = SplashConfig::parse(r#"{"type": "hologram", "transition": "warp"}"#);
        assert_eq!(config.kind, SplashKind::Static);
        assert_eq!(config.transition, Transition::Fade);
        assert_eq!(config.auto_hide_delay(), None);
    }

    #[test]
    fn load_reads_the_asset_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(SPLASH_CONFIG_FILE), r#"{"duration": 10}"#)
            .expect("write");
        assert_eq!(SplashConfig::load(dir.path()).duration, 10);
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn hide_fires_registered_callback_once() {
        let manager = SplashManager::new();
        let (hits, cb) = counter();
        manager.register_hide_callback(cb);

        manager.hide();
        manager.hide();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // The second hide had nobody to notify and is remembered.
        assert!(manager.has_pending_hide());
    }

    #[test]
    fn early_hide_applies_on_registration() {
        let manager = SplashManager::new();
        manager.hide();
        assert!(manager.has_pending_hide());

        let (hits, cb) = counter();
        manager.register_hide_callback(cb);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!manager.has_pending_hide());
    }

    #[test]
    fn unregister_drops_callback_and_pending() {
        let manager = SplashManager::new();
        let (hits, cb) = counter();
        manager.register_hide_callback(cb);
        manager.unregister_hide_callback();
        manager.hide();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        manager.clear_pending();
        assert!(!manager.has_pending_hide());
    }
}
