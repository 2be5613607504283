// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// Each bridge action reaches the device through exactly one of these
// traits. Capabilities that finish in an OS callback (dialogs, pickers,
// permission prompts, location fixes) take a `RequestToken` and return as
// soon as the request is shown; the host later reports the outcome for that
// token through `PendingRequests::complete`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tether_core::error::Result;
use tether_core::types::{
    ButtonStyle, CameraFacing, Color, DatePickerMode, HapticStyle, LocationAccuracy, MediaKind,
    Permission, PermissionStatus, StatusBarStyle,
};

use crate::correlator::RequestToken;

/// Unified bridge that groups all native capabilities.
///
/// Platforms without a capability return
/// `TetherError::PlatformUnavailable` from it.
pub trait PlatformBridge:
    NativeHaptics
    + NativeDevice
    + NativeStorage
    + NativeClipboard
    + NativeUrls
    + NativeSystemStatus
    + NativeTorch
    + NativeBiometrics
    + NativeSystemBars
    + NativeKeyboard
    + NativeDialogs
    + NativeMedia
    + NativeLocation
    + NativeNotifications
    + NativeQrScanner
    + NativePermissions
    + NativeAudioRecorder
    + NativeContacts
    + NativePush
    + Send
    + Sync
{
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Vibration motor.
pub trait NativeHaptics {
    fn has_vibrator(&self) -> bool;

    /// One-shot vibration. `amplitude` ranges 1-255.
    fn vibrate(&self, duration: Duration, amplitude: u8) -> Result<()>;

    fn haptic(&self, style: HapticStyle) -> Result<()> {
        let (duration, amplitude) = style.pattern();
        self.vibrate(duration, amplitude)
    }
}

/// Static device and package information.
pub trait NativeDevice {
    fn device_info(&self) -> DeviceInfo;

    fn app_version(&self) -> Result<AppVersion>;
}

/// Small persistent string store private to the app.
pub trait NativeStorage {
    fn storage_get(&self, key: &str) -> Result<Option<String>>;

    fn storage_set(&self, key: &str, value: &str) -> Result<()>;
}

/// Plain-text system clipboard.
pub trait NativeClipboard {
    fn set_clipboard_text(&self, text: &str) -> Result<()>;

    /// Current text, or None if the clipboard holds no plain text.
    fn clipboard_text(&self) -> Result<Option<String>>;

    fn clipboard_has_text(&self) -> Result<bool>;
}

/// Hand URLs to other applications.
pub trait NativeUrls {
    fn open_url(&self, url: &str) -> Result<()>;

    /// Whether any installed application handles the URL.
    fn can_open_url(&self, url: &str) -> Result<bool>;
}

/// Battery and connectivity state.
pub trait NativeSystemStatus {
    fn battery_status(&self) -> Result<BatteryStatus>;

    fn network_status(&self) -> Result<NetworkStatus>;
}

/// Camera flash used as a torch.
pub trait NativeTorch {
    fn has_flash(&self) -> bool;

    fn set_torch(&self, on: bool) -> Result<()>;
}

/// Biometric authentication.
pub trait NativeBiometrics {
    fn biometric_availability(&self) -> Result<BiometricAvailability>;

    /// Show the system prompt. The host reports a `BiometricEvent` for the
    /// token on success or on a terminal error.
    fn authenticate(&self, token: RequestToken, prompt: &BiometricPrompt) -> Result<()>;
}

/// Status bar appearance.
pub trait NativeSystemBars {
    fn set_status_bar_style(&self, style: StatusBarStyle, color: Option<Color>) -> Result<()>;

    fn set_status_bar_visible(&self, visible: bool) -> Result<()>;
}

/// Soft keyboard.
pub trait NativeKeyboard {
    fn set_keyboard_visible(&self, visible: bool) -> Result<()>;
}

/// Toasts, the share sheet and modal dialogs.
pub trait NativeDialogs {
    fn show_toast(&self, message: &str, long: bool) -> Result<()>;

    fn share_text(&self, text: &str, title: Option<&str>) -> Result<()>;

    /// Reply: `{"buttonIndex": n}`.
    fn show_alert(
        &self,
        token: RequestToken,
        title: Option<&str>,
        message: Option<&str>,
        buttons: &[DialogButton],
    ) -> Result<()>;

    /// Reply: `{"index": n}`, `-1` when dismissed.
    fn show_action_sheet(
        &self,
        token: RequestToken,
        title: Option<&str>,
        options: &[DialogButton],
    ) -> Result<()>;

    /// Reply: `{"millis": epoch_ms}` or `{"cancelled": true}`.
    fn show_date_picker(&self, token: RequestToken, request: &DatePickerRequest) -> Result<()>;
}

/// Camera capture and the media picker.
pub trait NativeMedia {
    /// Reply: `{"uri": ..}`; error `"Camera cancelled"` when dismissed.
    fn capture_photo(&self, token: RequestToken, facing: CameraFacing) -> Result<()>;

    /// Reply: `{"uris": [..]}`; error `"No image selected"` when dismissed.
    fn pick_media(&self, token: RequestToken, kind: MediaKind, multiple: bool) -> Result<()>;

    /// Read the bytes behind a content URI returned by the host.
    fn read_uri(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Device position.
pub trait NativeLocation {
    /// Reply: a `LocationReply`.
    fn request_location(&self, token: RequestToken, accuracy: LocationAccuracy) -> Result<()>;
}

/// Local notifications.
pub trait NativeNotifications {
    fn post_notification(&self, id: i32, title: &str, body: &str) -> Result<()>;

    fn cancel_notification(&self, id: i32) -> Result<()>;

    fn cancel_all_notifications(&self) -> Result<()>;
}

/// Camera-based QR scanner.
pub trait NativeQrScanner {
    /// Reply: `{"data": .., "format": ..}`; error `"Scan cancelled"`.
    fn scan_qr(&self, token: RequestToken) -> Result<()>;
}

/// Runtime permission state and the system permission dialog.
pub trait NativePermissions {
    /// Permissions the OS does not gate report `PermissionStatus::IMPLICIT`.
    fn permission_status(&self, permission: Permission) -> PermissionStatus;

    /// Reply: `{"results": {"<name>": bool, ..}}`.
    fn request_permissions(&self, token: RequestToken, permissions: &[Permission]) -> Result<()>;
}

/// Microphone recording to a file.
pub trait NativeAudioRecorder {
    /// Directory new recordings are written to.
    fn recordings_dir(&self) -> Result<PathBuf>;

    fn start_recording(&self, path: &Path) -> Result<()>;

    fn stop_recording(&self) -> Result<()>;
}

/// Address book.
pub trait NativeContacts {
    /// Reply: a serialized `ContactDetails`; error `"No contact selected"`.
    fn pick_contact(&self, token: RequestToken) -> Result<()>;

    /// Contacts whose display name contains `filter`, sorted by name.
    fn query_contacts(&self, filter: Option<&str>, limit: u32) -> Result<Vec<ContactSummary>>;
}

/// Push notification vendor SDK.
pub trait NativePush {
    fn push_login(&self, external_id: &str) -> Result<()>;

    fn push_logout(&self) -> Result<()>;

    fn push_add_tags(&self, tags: &BTreeMap<String, String>) -> Result<()>;

    fn push_remove_tag(&self, key: &str) -> Result<()>;

    fn push_tags(&self) -> Result<BTreeMap<String, String>>;

    /// Reply: `{"granted": bool}`.
    fn push_request_permission(&self, token: RequestToken) -> Result<()>;

    fn push_permission(&self) -> Result<bool>;

    fn push_subscription(&self) -> Result<PushSubscription>;

    fn push_set_opted_in(&self, opted_in: bool) -> Result<()>;

    fn push_add_email(&self, email: &str) -> Result<()>;

    fn push_remove_email(&self, email: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Info structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    /// OS release (e.g. "14").
    pub version: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppVersion {
    pub version: String,
    pub build: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryState {
    Charging,
    Discharging,
    Full,
    NotCharging,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Percentage 0-100, or -1 when unknown.
    pub level: i32,
    pub charging: bool,
    pub state: BatteryState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Wifi,
    Cellular,
    Ethernet,
    Other,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub connected: bool,
    #[serde(rename = "type")]
    pub kind: NetworkType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricAvailability {
    pub available: bool,
    /// "biometric", "fingerprint" or "none".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BiometricAvailability {
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            available: false,
            kind: "none".into(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiometricPrompt {
    pub title: String,
    pub reason: String,
    pub cancel_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogButton {
    pub text: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatePickerRequest {
    pub mode: DatePickerMode,
    /// Milliseconds since the Unix epoch, UTC.
    pub initial_ms: Option<i64>,
    pub min_ms: Option<i64>,
    pub max_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Host reply to a location request: a fresh fix and, when none could be
/// obtained, the last known position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReply {
    #[serde(default)]
    pub current: Option<LocationFix>,
    #[serde(default)]
    pub last_known: Option<LocationFix>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub has_phone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub number: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub email: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phones: Vec<ContactPhone>,
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub subscription_id: Option<String>,
    pub opted_in: bool,
}
