// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where device APIs are unavailable.
//
// Device info and storage work (storage is a SQLite file in the data
// directory); every other capability returns `PlatformUnavailable`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tether_core::error::{Result, TetherError};
use tether_core::types::{
    CameraFacing, Color, LocationAccuracy, MediaKind, Permission, PermissionStatus,
    StatusBarStyle,
};

use crate::correlator::RequestToken;
use crate::platform::traits::*;
use crate::storage::{KvStore, STORE_FILE};

/// Bridge returned on non-mobile platforms.
pub struct StubBridge {
    store: KvStore,
}

impl StubBridge {
    /// Stub whose storage lives in `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            store: KvStore::open(data_dir.join(STORE_FILE))?,
        })
    }

    /// Stub with throwaway storage.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            store: KvStore::open_in_memory()?,
        })
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }
}

fn unavailable<T>(what: &str) -> Result<T> {
    tracing::warn!("{what} called on stub bridge");
    Err(TetherError::PlatformUnavailable)
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeHaptics for StubBridge {
    fn has_vibrator(&self) -> bool {
        false
    }

    fn vibrate(&self, _duration: Duration, _amplitude: u8) -> Result<()> {
        unavailable("NativeHaptics::vibrate")
    }
}

impl NativeDevice for StubBridge {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            platform: std::env::consts::OS.into(),
            version: std::env::consts::ARCH.into(),
            model: "desktop".into(),
        }
    }

    fn app_version(&self) -> Result<AppVersion> {
        Ok(AppVersion {
            version: env!("CARGO_PKG_VERSION").into(),
            build: 0,
            name: "Tether".into(),
        })
    }
}

impl NativeStorage for StubBridge {
    fn storage_get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key)
    }

    fn storage_set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value)
    }
}

impl NativeClipboard for StubBridge {
    fn set_clipboard_text(&self, _text: &str) -> Result<()> {
        unavailable("NativeClipboard::set_clipboard_text")
    }

    fn clipboard_text(&self) -> Result<Option<String>> {
        unavailable("NativeClipboard::clipboard_text")
    }

    fn clipboard_has_text(&self) -> Result<bool> {
        unavailable("NativeClipboard::clipboard_has_text")
    }
}

impl NativeUrls for StubBridge {
    fn open_url(&self, _url: &str) -> Result<()> {
        unavailable("NativeUrls::open_url")
    }

    fn can_open_url(&self, _url: &str) -> Result<bool> {
        Ok(false)
    }
}

impl NativeSystemStatus for StubBridge {
    fn battery_status(&self) -> Result<BatteryStatus> {
        Ok(BatteryStatus {
            level: -1,
            charging: false,
            state: BatteryState::Unknown,
        })
    }

    fn network_status(&self) -> Result<NetworkStatus> {
        unavailable("NativeSystemStatus::network_status")
    }
}

impl NativeTorch for StubBridge {
    fn has_flash(&self) -> bool {
        false
    }

    fn set_torch(&self, _on: bool) -> Result<()> {
        Err(TetherError::platform("No camera available"))
    }
}

impl NativeBiometrics for StubBridge {
    fn biometric_availability(&self) -> Result<BiometricAvailability> {
        Ok(BiometricAvailability::unavailable("No biometric hardware"))
    }

    fn authenticate(&self, _token: RequestToken, _prompt: &BiometricPrompt) -> Result<()> {
        unavailable("NativeBiometrics::authenticate")
    }
}

impl NativeSystemBars for StubBridge {
    fn set_status_bar_style(&self, _style: StatusBarStyle, _color: Option<Color>) -> Result<()> {
        unavailable("NativeSystemBars::set_status_bar_style")
    }

    fn set_status_bar_visible(&self, _visible: bool) -> Result<()> {
        unavailable("NativeSystemBars::set_status_bar_visible")
    }
}

impl NativeKeyboard for StubBridge {
    fn set_keyboard_visible(&self, _visible: bool) -> Result<()> {
        unavailable("NativeKeyboard::set_keyboard_visible")
    }
}

impl NativeDialogs for StubBridge {
    fn show_toast(&self, message: &str, _long: bool) -> Result<()> {
        // Nowhere to draw; the log is the closest thing to a toast.
        tracing::info!(message, "toast");
        Ok(())
    }

    fn share_text(&self, _text: &str, _title: Option<&str>) -> Result<()> {
        unavailable("NativeDialogs::share_text")
    }

    fn show_alert(
        &self,
        _token: RequestToken,
        _title: Option<&str>,
        _message: Option<&str>,
        _buttons: &[DialogButton],
    ) -> Result<()> {
        unavailable("NativeDialogs::show_alert")
    }

    fn show_action_sheet(
        &self,
        _token: RequestToken,
        _title: Option<&str>,
        _options: &[DialogButton],
    ) -> Result<()> {
        unavailable("NativeDialogs::show_action_sheet")
    }

    fn show_date_picker(&self, _token: RequestToken, _request: &DatePickerRequest) -> Result<()> {
        unavailable("NativeDialogs::show_date_picker")
    }
}

impl NativeMedia for StubBridge {
    fn capture_photo(&self, _token: RequestToken, _facing: CameraFacing) -> Result<()> {
        unavailable("NativeMedia::capture_photo")
    }

    fn pick_media(&self, _token: RequestToken, _kind: MediaKind, _multiple: bool) -> Result<()> {
        unavailable("NativeMedia::pick_media")
    }

    fn read_uri(&self, uri: &str) -> Result<Vec<u8>> {
        match uri.strip_prefix("file://") {
            Some(path) => Ok(std::fs::read(path)?),
            None => unavailable("NativeMedia::read_uri"),
        }
    }
}

impl NativeLocation for StubBridge {
    fn request_location(&self, _token: RequestToken, _accuracy: LocationAccuracy) -> Result<()> {
        unavailable("NativeLocation::request_location")
    }
}

impl NativeNotifications for StubBridge {
    fn post_notification(&self, _id: i32, _title: &str, _body: &str) -> Result<()> {
        unavailable("NativeNotifications::post_notification")
    }

    fn cancel_notification(&self, _id: i32) -> Result<()> {
        unavailable("NativeNotifications::cancel_notification")
    }

    fn cancel_all_notifications(&self) -> Result<()> {
        unavailable("NativeNotifications::cancel_all_notifications")
    }
}

impl NativeQrScanner for StubBridge {
    fn scan_qr(&self, _token: RequestToken) -> Result<()> {
        unavailable("NativeQrScanner::scan_qr")
    }
}

impl NativePermissions for StubBridge {
    fn permission_status(&self, _permission: Permission) -> PermissionStatus {
        PermissionStatus {
            granted: false,
            can_ask: false,
        }
    }

    fn request_permissions(&self, _token: RequestToken, _permissions: &[Permission]) -> Result<()> {
        unavailable("NativePermissions::request_permissions")
    }
}

impl NativeAudioRecorder for StubBridge {
    fn recordings_dir(&self) -> Result<PathBuf> {
        Ok(std::env::temp_dir())
    }

    fn start_recording(&self, _path: &Path) -> Result<()> {
        unavailable("NativeAudioRecorder::start_recording")
    }

    fn stop_recording(&self) -> Result<()> {
        unavailable("NativeAudioRecorder::stop_recording")
    }
}

impl NativeContacts for StubBridge {
    fn pick_contact(&self, _token: RequestToken) -> Result<()> {
        unavailable("NativeContacts::pick_contact")
    }

    fn query_contacts(&self, _filter: Option<&str>, _limit: u32) -> Result<Vec<ContactSummary>> {
        unavailable("NativeContacts::query_contacts")
    }
}

impl NativePush for StubBridge {
    fn push_login(&self, _external_id: &str) -> Result<()> {
        unavailable("NativePush::push_login")
    }

    fn push_logout(&self) -> Result<()> {
        unavailable("NativePush::push_logout")
    }

    fn push_add_tags(&self, _tags: &BTreeMap<String, String>) -> Result<()> {
        unavailable("NativePush::push_add_tags")
    }

    fn push_remove_tag(&self, _key: &str) -> Result<()> {
        unavailable("NativePush::push_remove_tag")
    }

    fn push_tags(&self) -> Result<BTreeMap<String, String>> {
        unavailable("NativePush::push_tags")
    }

    fn push_request_permission(&self, _token: RequestToken) -> Result<()> {
        unavailable("NativePush::push_request_permission")
    }

    fn push_permission(&self) -> Result<bool> {
        Ok(false)
    }

    fn push_subscription(&self) -> Result<PushSubscription> {
        Ok(PushSubscription {
            subscription_id: None,
            opted_in: false,
        })
    }

    fn push_set_opted_in(&self, _opted_in: bool) -> Result<()> {
        unavailable("NativePush::push_set_opted_in")
    }

    fn push_add_email(&self, _email: &str) -> Result<()> {
        unavailable("NativePush::push_add_email")
    }

    fn push_remove_email(&self, _email: &str) -> Result<()> {
        unavailable("NativePush::push_remove_email")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_works_on_the_stub() {
        let stub = StubBridge::in_memory().expect("stub");
        stub.storage_set("k", "v").expect("set");
        assert_eq!(stub.storage_get("k").expect("get").as_deref(), Some("v"));
    }

    #[test]
    fn device_capabilities_are_unavailable() {
        let stub = StubBridge::in_memory().expect("stub");
        assert!(matches!(
            stub.set_clipboard_text("x"),
            Err(TetherError::PlatformUnavailable)
        ));
        assert!(!stub.has_vibrator());
        assert!(!stub.permission_status(Permission::Camera).granted);
    }

    #[test]
    fn storage_file_lands_in_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stub = StubBridge::new(&dir.path().join("nested")).expect("stub");
        stub.storage_set("k", "v").expect("set");
        assert!(dir.path().join("nested").join(STORE_FILE).exists());
    }
}
