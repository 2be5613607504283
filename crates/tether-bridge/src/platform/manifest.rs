// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping between web permission names and Android manifest permissions.

use serde_json::{Map, Value};

use tether_core::types::Permission;

/// `PackageManager.PERMISSION_GRANTED`.
pub const PERMISSION_GRANTED: i32 = 0;

/// API level that introduced `POST_NOTIFICATIONS` and `READ_MEDIA_IMAGES`.
const TIRAMISU: i32 = 33;

/// Manifest permission gating `permission` on a device running `sdk_int`.
///
/// `None` means the OS grants it implicitly.
pub fn manifest_permission(permission: Permission, sdk_int: i32) -> Option<&'static str> {
    Some(match permission {
        Permission::Camera => "android.permission.CAMERA",
        Permission::Location => "android.permission.ACCESS_FINE_LOCATION",
        Permission::LocationCoarse => "android.permission.ACCESS_COARSE_LOCATION",
        Permission::Microphone => "android.permission.RECORD_AUDIO",
        Permission::Contacts => "android.permission.READ_CONTACTS",
        Permission::Calendar => "android.permission.READ_CALENDAR",
        Permission::Storage if sdk_int >= TIRAMISU => "android.permission.READ_MEDIA_IMAGES",
        Permission::Storage => "android.permission.READ_EXTERNAL_STORAGE",
        Permission::Phone => "android.permission.CALL_PHONE",
        Permission::Sms => "android.permission.SEND_SMS",
        Permission::Notifications if sdk_int >= TIRAMISU => {
            "android.permission.POST_NOTIFICATIONS"
        }
        Permission::Notifications => return None,
    })
}

/// Web name for a manifest permission, falling back to the manifest name.
pub fn web_name(manifest: &str, sdk_int: i32) -> String {
    Permission::ALL
        .into_iter()
        .find(|p| manifest_permission(*p, sdk_int) == Some(manifest))
        .map_or_else(|| manifest.to_owned(), |p| p.name().to_owned())
}

/// Build the `{"results": {..}}` reply from `onRequestPermissionsResult`.
pub fn results_reply(permissions: &[String], grants: &[i32], sdk_int: i32) -> Value {
    let results: Map<String, Value> = permissions
        .iter()
        .enumerate()
        .map(|(i, manifest)| {
            let granted = grants.get(i) == Some(&PERMISSION_GRANTED);
            (web_name(manifest, sdk_int), Value::Bool(granted))
        })
        .collect();
    serde_json::json!({ "results": results })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notifications_are_implicit_before_tiramisu() {
        assert_eq!(manifest_permission(Permission::Notifications, 32), None);
        assert_eq!(
            manifest_permission(Permission::Notifications, 33),
            Some("android.permission.POST_NOTIFICATIONS")
        );
    }

    #[test]
    fn storage_permission_depends_on_api_level() {
        assert_eq!(
            manifest_permission(Permission::Storage, 30),
            Some("android.permission.READ_EXTERNAL_STORAGE")
        );
        assert_eq!(
            manifest_permission(Permission::Storage, 34),
            Some("android.permission.READ_MEDIA_IMAGES")
        );
    }

    #[test]
    fn results_use_web_names() {
        let reply = results_reply(
            &[
                "android.permission.CAMERA".into(),
                "android.permission.RECORD_AUDIO".into(),
                "com.example.CUSTOM".into(),
            ],
            &[0, -1],
            34,
        );
        assert_eq!(
            reply,
            json!({"results": {"camera": true, "microphone": false, "com.example.CUSTOM": false}})
        );
    }
}
