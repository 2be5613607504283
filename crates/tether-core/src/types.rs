// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the bridge, its handlers and the hosts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime permissions web code can ask about by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    Camera,
    Location,
    LocationCoarse,
    Microphone,
    Contacts,
    Calendar,
    Storage,
    Phone,
    Sms,
    Notifications,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Self::Camera,
        Self::Location,
        Self::LocationCoarse,
        Self::Microphone,
        Self::Contacts,
        Self::Calendar,
        Self::Storage,
        Self::Phone,
        Self::Sms,
        Self::Notifications,
    ];

    /// Name used on the web side (`"camera"`, `"locationCoarse"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Location => "location",
            Self::LocationCoarse => "locationCoarse",
            Self::Microphone => "microphone",
            Self::Contacts => "contacts",
            Self::Calendar => "calendar",
            Self::Storage => "storage",
            Self::Phone => "phone",
            Self::Sms => "sms",
            Self::Notifications => "notifications",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Grant state of one permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    pub granted: bool,
    /// Whether a request would still show the system dialog.
    pub can_ask: bool,
}

impl PermissionStatus {
    /// Status for permissions the OS grants implicitly.
    pub const IMPLICIT: Self = Self {
        granted: true,
        can_ask: false,
    };

    /// `"granted"`, `"denied"` or `"blocked"` (denied with "don't ask again").
    pub fn label(&self) -> &'static str {
        if self.granted {
            "granted"
        } else if self.can_ask {
            "denied"
        } else {
            "blocked"
        }
    }
}

/// Haptic feedback intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HapticStyle {
    Light,
    #[default]
    Medium,
    Heavy,
    Soft,
    Rigid,
}

impl HapticStyle {
    /// Unknown names fall back to `Medium`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::Light,
            "heavy" => Self::Heavy,
            "soft" => Self::Soft,
            "rigid" => Self::Rigid,
            _ => Self::Medium,
        }
    }

    /// One-shot vibration duration and amplitude (1-255).
    pub fn pattern(&self) -> (Duration, u8) {
        match self {
            Self::Light => (Duration::from_millis(30), 50),
            Self::Medium => (Duration::from_millis(50), 128),
            Self::Heavy => (Duration::from_millis(100), 255),
            Self::Soft => (Duration::from_millis(20), 30),
            Self::Rigid => (Duration::from_millis(50), 200),
        }
    }
}

/// Status bar icon appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusBarStyle {
    /// Dark icons for a light background.
    Light,
    /// Light icons for a dark background.
    #[default]
    Dark,
}

impl StatusBarStyle {
    pub fn from_name(name: &str) -> Self {
        if name == "light" { Self::Light } else { Self::Dark }
    }
}

/// ARGB colour parsed from `#RRGGBB` or `#AARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Self::from_argb(0xFF00_0000 | value)),
            8 => Some(Self::from_argb(value)),
            _ => None,
        }
    }

    pub fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { a, r, g, b }
    }

    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }
}

/// Desired precision of a location fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationAccuracy {
    #[default]
    High,
    Balanced,
    Low,
}

impl LocationAccuracy {
    pub fn from_name(name: &str) -> Self {
        match name {
            "low" => Self::Low,
            "balanced" => Self::Balanced,
            _ => Self::High,
        }
    }
}

/// Media filter for the gallery picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Any,
}

impl MediaKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "video" => Self::Video,
            "any" => Self::Any,
            _ => Self::Image,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Video => "video/*",
            Self::Any => "*/*",
        }
    }
}

/// Camera lens to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl CameraFacing {
    pub fn from_name(name: &str) -> Self {
        if name == "front" { Self::Front } else { Self::Back }
    }
}

/// Which pickers the date picker shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePickerMode {
    #[default]
    Date,
    Time,
    DateTime,
}

impl DatePickerMode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            _ => Self::Date,
        }
    }
}

/// Role of a button in an alert or action sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    Default,
    Cancel,
    Destructive,
}

impl ButtonStyle {
    pub fn from_name(name: &str) -> Self {
        match name {
            "cancel" => Self::Cancel,
            "destructive" => Self::Destructive,
            _ => Self::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_names_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(Permission::from_name(permission.name()), Some(permission));
        }
        assert_eq!(Permission::from_name("teleport"), None);
    }

    #[test]
    fn permission_serializes_as_web_name() {
        let json = serde_json::to_string(&Permission::LocationCoarse).expect("serialize");
        assert_eq!(json, "\"locationCoarse\"");
    }

    #[test]
    fn status_labels() {
        let granted = PermissionStatus { granted: true, can_ask: true };
        let denied = PermissionStatus { granted: false, can_ask: true };
        let blocked = PermissionStatus { granted: false, can_ask: false };
        assert_eq!(granted.label(), "granted");
        assert_eq!(denied.label(), "denied");
        assert_eq!(blocked.label(), "blocked");
    }

    #[test]
    fn heavy_haptic_uses_full_amplitude() {
        let (duration, amplitude) = HapticStyle::from_name("heavy").pattern();
        assert_eq!(amplitude, 255);
        assert_eq!(duration, Duration::from_millis(100));
        assert_eq!(HapticStyle::from_name("bogus"), HapticStyle::Medium);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(
            Color::parse("#0F172A"),
            Some(Color { a: 0xFF, r: 0x0F, g: 0x17, b: 0x2A })
        );
        assert_eq!(Color::parse("#800F172A").map(|c| c.a), Some(0x80));
        assert_eq!(Color::parse("0F172A"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#+12345"), None);
        assert_eq!(Color::parse("#GGGGGG"), None);
    }
}
