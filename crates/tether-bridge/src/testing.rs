// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory platform for tests.
//
// Every capability works against `FakeState`. Asynchronous capabilities
// record the request and its token; a test plays the host by completing
// the token through `HandlerContext::pending`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tether_core::error::{Result, TetherError};
use tether_core::types::{
    CameraFacing, Color, LocationAccuracy, MediaKind, Permission, PermissionStatus,
    StatusBarStyle,
};

use crate::context::HandlerContext;
use crate::correlator::RequestToken;
use crate::platform::traits::*;

/// An asynchronous request the fake "showed".
#[derive(Debug, Clone, PartialEq)]
pub struct HostRequest {
    pub token: RequestToken,
    pub kind: &'static str,
    pub detail: String,
}

#[derive(Debug)]
pub struct FakeState {
    pub has_vibrator: bool,
    pub vibrations: Vec<(Duration, u8)>,
    pub storage: HashMap<String, String>,
    pub clipboard: Option<String>,
    pub opened_urls: Vec<String>,
    pub openable_urls: bool,
    pub battery: BatteryStatus,
    pub network: NetworkStatus,
    pub has_flash: bool,
    pub torch_on: bool,
    pub biometric: BiometricAvailability,
    pub status_bar: Option<(StatusBarStyle, Option<Color>)>,
    pub status_bar_visible: bool,
    pub keyboard_visible: bool,
    pub toasts: Vec<(String, bool)>,
    pub shares: Vec<(String, Option<String>)>,
    pub host_requests: Vec<HostRequest>,
    pub files: HashMap<String, Vec<u8>>,
    pub notifications: BTreeMap<i32, (String, String)>,
    pub permissions: HashMap<Permission, PermissionStatus>,
    pub recordings_dir: PathBuf,
    pub recording: Option<PathBuf>,
    pub contacts: Vec<ContactSummary>,
    pub push_user: Option<String>,
    pub push_tags: BTreeMap<String, String>,
    pub push_permission: bool,
    pub push_opted_in: bool,
    pub push_emails: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            has_vibrator: true,
            vibrations: Vec::new(),
            storage: HashMap::new(),
            clipboard: None,
            opened_urls: Vec::new(),
            openable_urls: true,
            battery: BatteryStatus {
                level: 80,
                charging: false,
                state: BatteryState::Discharging,
            },
            network: NetworkStatus {
                connected: true,
                kind: NetworkType::Wifi,
            },
            has_flash: true,
            torch_on: false,
            biometric: BiometricAvailability {
                available: true,
                kind: "biometric".into(),
                error: None,
            },
            status_bar: None,
            status_bar_visible: true,
            keyboard_visible: false,
            toasts: Vec::new(),
            shares: Vec::new(),
            host_requests: Vec::new(),
            files: HashMap::new(),
            notifications: BTreeMap::new(),
            permissions: HashMap::new(),
            recordings_dir: std::env::temp_dir(),
            recording: None,
            contacts: Vec::new(),
            push_user: None,
            push_tags: BTreeMap::new(),
            push_permission: false,
            push_opted_in: true,
            push_emails: Vec::new(),
        }
    }
}

/// Recording platform. Permissions not set explicitly are denied but
/// askable.
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn grant(&self, permission: Permission) {
        self.state().permissions.insert(
            permission,
            PermissionStatus {
                granted: true,
                can_ask: true,
            },
        );
    }

    /// Handler context on the current tokio runtime.
    pub fn context(self: &Arc<Self>) -> HandlerContext {
        HandlerContext::new(
            Arc::clone(self) as Arc<dyn PlatformBridge>,
            tokio::runtime::Handle::current(),
        )
    }

    pub fn host_requests(&self) -> Vec<HostRequest> {
        self.state().host_requests.clone()
    }

    /// Token of the most recent request of `kind`.
    pub fn last_token(&self, kind: &str) -> Option<RequestToken> {
        self.state()
            .host_requests
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .map(|r| r.token)
    }

    fn record(&self, token: RequestToken, kind: &'static str, detail: String) -> Result<()> {
        self.state().host_requests.push(HostRequest {
            token,
            kind,
            detail,
        });
        Ok(())
    }
}

impl PlatformBridge for FakePlatform {
    fn platform_name(&self) -> &str {
        "Fake"
    }
}

impl NativeHaptics for FakePlatform {
    fn has_vibrator(&self) -> bool {
        self.state().has_vibrator
    }

    fn vibrate(&self, duration: Duration, amplitude: u8) -> Result<()> {
        self.state().vibrations.push((duration, amplitude));
        Ok(())
    }
}

impl NativeDevice for FakePlatform {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            platform: "android".into(),
            version: "14".into(),
            model: "Pixel Fake".into(),
        }
    }

    fn app_version(&self) -> Result<AppVersion> {
        Ok(AppVersion {
            version: "1.2.3".into(),
            build: 42,
            name: "Tether Test".into(),
        })
    }
}

impl NativeStorage for FakePlatform {
    fn storage_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state().storage.get(key).cloned())
    }

    fn storage_set(&self, key: &str, value: &str) -> Result<()> {
        self.state().storage.insert(key.into(), value.into());
        Ok(())
    }
}

impl NativeClipboard for FakePlatform {
    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        self.state().clipboard = Some(text.into());
        Ok(())
    }

    fn clipboard_text(&self) -> Result<Option<String>> {
        Ok(self.state().clipboard.clone())
    }

    fn clipboard_has_text(&self) -> Result<bool> {
        Ok(self.state().clipboard.is_some())
    }
}

impl NativeUrls for FakePlatform {
    fn open_url(&self, url: &str) -> Result<()> {
        self.state().opened_urls.push(url.into());
        Ok(())
    }

    fn can_open_url(&self, _url: &str) -> Result<bool> {
        Ok(self.state().openable_urls)
    }
}

impl NativeSystemStatus for FakePlatform {
    fn battery_status(&self) -> Result<BatteryStatus> {
        Ok(self.state().battery)
    }

    fn network_status(&self) -> Result<NetworkStatus> {
        Ok(self.state().network)
    }
}

impl NativeTorch for FakePlatform {
    fn has_flash(&self) -> bool {
        self.state().has_flash
    }

    fn set_torch(&self, on: bool) -> Result<()> {
        self.state().torch_on = on;
        Ok(())
    }
}

impl NativeBiometrics for FakePlatform {
    fn biometric_availability(&self) -> Result<BiometricAvailability> {
        Ok(self.state().biometric.clone())
    }

    fn authenticate(&self, token: RequestToken, prompt: &BiometricPrompt) -> Result<()> {
        self.record(token, "authenticate", prompt.title.clone())
    }
}

impl NativeSystemBars for FakePlatform {
    fn set_status_bar_style(&self, style: StatusBarStyle, color: Option<Color>) -> Result<()> {
        self.state().status_bar = Some((style, color));
        Ok(())
    }

    fn set_status_bar_visible(&self, visible: bool) -> Result<()> {
        self.state().status_bar_visible = visible;
        Ok(())
    }
}

impl NativeKeyboard for FakePlatform {
    fn set_keyboard_visible(&self, visible: bool) -> Result<()> {
        self.state().keyboard_visible = visible;
        Ok(())
    }
}

impl NativeDialogs for FakePlatform {
    fn show_toast(&self, message: &str, long: bool) -> Result<()> {
        self.state().toasts.push((message.into(), long));
        Ok(())
    }

    fn share_text(&self, text: &str, title: Option<&str>) -> Result<()> {
        self.state()
            .shares
            .push((text.into(), title.map(str::to_owned)));
        Ok(())
    }

    fn show_alert(
        &self,
        token: RequestToken,
        _title: Option<&str>,
        _message: Option<&str>,
        buttons: &[DialogButton],
    ) -> Result<()> {
        let labels: Vec<&str> = buttons.iter().map(|b| b.text.as_str()).collect();
        self.record(token, "alert", labels.join("|"))
    }

    fn show_action_sheet(
        &self,
        token: RequestToken,
        _title: Option<&str>,
        options: &[DialogButton],
    ) -> Result<()> {
        let labels: Vec<&str> = options.iter().map(|b| b.text.as_str()).collect();
        self.record(token, "actionSheet", labels.join("|"))
    }

    fn show_date_picker(&self, token: RequestToken, request: &DatePickerRequest) -> Result<()> {
        self.record(token, "datePicker", format!("{:?}", request.initial_ms))
    }
}

impl NativeMedia for FakePlatform {
    fn capture_photo(&self, token: RequestToken, facing: CameraFacing) -> Result<()> {
        self.record(token, "capturePhoto", format!("{facing:?}"))
    }

    fn pick_media(&self, token: RequestToken, kind: MediaKind, multiple: bool) -> Result<()> {
        self.record(token, "pickMedia", format!("{} {multiple}", kind.mime_type()))
    }

    fn read_uri(&self, uri: &str) -> Result<Vec<u8>> {
        self.state()
            .files
            .get(uri)
            .cloned()
            .ok_or_else(|| TetherError::platform(format!("Unable to read {uri}")))
    }
}

impl NativeLocation for FakePlatform {
    fn request_location(&self, token: RequestToken, accuracy: LocationAccuracy) -> Result<()> {
        self.record(token, "location", format!("{accuracy:?}"))
    }
}

impl NativeNotifications for FakePlatform {
    fn post_notification(&self, id: i32, title: &str, body: &str) -> Result<()> {
        self.state()
            .notifications
            .insert(id, (title.into(), body.into()));
        Ok(())
    }

    fn cancel_notification(&self, id: i32) -> Result<()> {
        self.state().notifications.remove(&id);
        Ok(())
    }

    fn cancel_all_notifications(&self) -> Result<()> {
        self.state().notifications.clear();
        Ok(())
    }
}

impl NativeQrScanner for FakePlatform {
    fn scan_qr(&self, token: RequestToken) -> Result<()> {
        self.record(token, "scanQr", String::new())
    }
}

impl NativePermissions for FakePlatform {
    fn permission_status(&self, permission: Permission) -> PermissionStatus {
        self.state()
            .permissions
            .get(&permission)
            .copied()
            .unwrap_or(PermissionStatus {
                granted: false,
                can_ask: true,
            })
    }

    fn request_permissions(&self, token: RequestToken, permissions: &[Permission]) -> Result<()> {
        let names: Vec<&str> = permissions.iter().map(|p| p.name()).collect();
        self.record(token, "permissions", names.join(","))
    }
}

impl NativeAudioRecorder for FakePlatform {
    fn recordings_dir(&self) -> Result<PathBuf> {
        Ok(self.state().recordings_dir.clone())
    }

    fn start_recording(&self, path: &Path) -> Result<()> {
        std::fs::write(path, b"fake audio")?;
        self.state().recording = Some(path.to_path_buf());
        Ok(())
    }

    fn stop_recording(&self) -> Result<()> {
        self.state().recording = None;
        Ok(())
    }
}

impl NativeContacts for FakePlatform {
    fn pick_contact(&self, token: RequestToken) -> Result<()> {
        self.record(token, "pickContact", String::new())
    }

    fn query_contacts(&self, filter: Option<&str>, limit: u32) -> Result<Vec<ContactSummary>> {
        let mut found: Vec<ContactSummary> = self
            .state()
            .contacts
            .iter()
            .filter(|c| filter.is_none_or(|f| c.name.contains(f)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(limit as usize);
        Ok(found)
    }
}

impl NativePush for FakePlatform {
    fn push_login(&self, external_id: &str) -> Result<()> {
        self.state().push_user = Some(external_id.into());
        Ok(())
    }

    fn push_logout(&self) -> Result<()> {
        self.state().push_user = None;
        Ok(())
    }

    fn push_add_tags(&self, tags: &BTreeMap<String, String>) -> Result<()> {
        self.state()
            .push_tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn push_remove_tag(&self, key: &str) -> Result<()> {
        self.state().push_tags.remove(key);
        Ok(())
    }

    fn push_tags(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.state().push_tags.clone())
    }

    fn push_request_permission(&self, token: RequestToken) -> Result<()> {
        self.record(token, "pushPermission", String::new())
    }

    fn push_permission(&self) -> Result<bool> {
        Ok(self.state().push_permission)
    }

    fn push_subscription(&self) -> Result<PushSubscription> {
        let state = self.state();
        Ok(PushSubscription {
            subscription_id: state.push_user.as_ref().map(|u| format!("sub-{u}")),
            opted_in: state.push_opted_in,
        })
    }

    fn push_set_opted_in(&self, opted_in: bool) -> Result<()> {
        self.state().push_opted_in = opted_in;
        Ok(())
    }

    fn push_add_email(&self, email: &str) -> Result<()> {
        self.state().push_emails.push(email.into());
        Ok(())
    }

    fn push_remove_email(&self, email: &str) -> Result<()> {
        self.state().push_emails.retain(|e| e != email);
        Ok(())
    }
}
