// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// ## Architecture notes
//
// Capabilities that complete synchronously through plain SDK calls (Build
// fields, PackageManager, SharedPreferences, ClipboardManager, Vibrator,
// Intent launching, permission checks) are implemented here directly.
//
// Everything that needs AndroidX, Play Services, the push SDK or an
// Activity result goes through the static helper class
// `dev.tether.NativeHost`:
//
// * `String call(String method, String argsJson)` answers synchronously with
//   `{"ok": <value>}` or `{"error": "<message>"}`;
// * `void start(int token, String method, String argsJson)` shows UI and
//   returns; the outcome is reported later through
//   `NativeBridge.nativeHostResult(token, success, json)`.
//
// Every host Activity, including each recreated one, must call
// `NativeBridge.nativeInit(activity)` before its first bridge call so the
// bridge talks to the live Activity; `nativeDestroy(activity)` detaches it.

#![cfg(target_os = "android")]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use jni::objects::{GlobalRef, JByteArray, JClass, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use tether_core::error::{Result, TetherError};
use tether_core::types::{
    ButtonStyle, CameraFacing, Color, DatePickerMode, LocationAccuracy, MediaKind, Permission,
    PermissionStatus, StatusBarStyle,
};

use crate::correlator::RequestToken;
use crate::platform::AttachedHost;
use crate::platform::manifest::{PERMISSION_GRANTED, manifest_permission};
use crate::platform::traits::*;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// SharedPreferences file backing `storage.get` / `storage.set`.
const PREFS_FILE: &str = "tether";

/// Binary name of the Java helper class.
const HOST_CLASS: &str = "dev.tether.NativeHost";

/// `Intent.FLAG_ACTIVITY_NEW_TASK`.
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

static VM: OnceLock<JavaVM> = OnceLock::new();
static HOST: OnceLock<GlobalRef> = OnceLock::new();
/// Application context; outlives every Activity and backs `ndk_context`.
static APP_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();
/// The Activity currently hosting the WebView. Replaced on recreation.
static ACTIVITY: AttachedHost<GlobalRef> = AttachedHost::new();

/// Record the hosting Activity, and on first use the JavaVM, the
/// application context and the helper class.
///
/// Must run on a thread whose class loader sees the application classes,
/// normally the main thread inside `nativeInit`. Every recreated Activity
/// calls this again and replaces the previous one.
pub fn install(env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> Result<()> {
    if HOST.get().is_none() {
        install_process(env, activity)?;
    }

    let activity_ref = env
        .new_global_ref(activity)
        .map_err(|e| jni_err("new_global_ref(activity)", e))?;
    let previous = ACTIVITY.attach(activity_ref);
    tracing::info!(replaced = previous.is_some(), "Android activity attached");
    Ok(())
}

/// Forget `activity` if it is the one currently attached. A recreated
/// Activity may already have replaced it.
pub fn release_activity(env: &mut JNIEnv<'_>, activity: &JObject<'_>) {
    let released =
        ACTIVITY.release_if(|held| env.is_same_object(held.as_obj(), activity).unwrap_or(false));
    if released {
        tracing::info!("Android activity released");
    }
}

fn install_process(env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> Result<()> {
    let vm = env.get_java_vm().map_err(|e| jni_err("get_java_vm", e))?;
    let app_context = env
        .call_method(activity, "getApplicationContext", "()Landroid/content/Context;", &[])
        .map_err(|e| jni_err("getApplicationContext", e))?
        .l()
        .map_err(|e| jni_err("getApplicationContext->l", e))?;
    let app_ref = env
        .new_global_ref(app_context)
        .map_err(|e| jni_err("new_global_ref(application)", e))?;

    // SAFETY: the VM lives for the process and the application context is
    // pinned by the global reference stored in APP_CONTEXT below. This runs
    // once, guarded by HOST.
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            app_ref.as_obj().as_raw().cast(),
        );
    }

    // Load the helper through the Activity's class loader: `FindClass` on a
    // native thread only sees system classes.
    let class_loader = env
        .call_method(activity, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .map_err(|e| jni_err("getClassLoader", e))?
        .l()
        .map_err(|e| jni_err("getClassLoader->l", e))?;
    let j_name = env
        .new_string(HOST_CLASS)
        .map_err(|e| jni_err("new_string(host class)", e))?;
    let host_class = env
        .call_method(
            &class_loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&j_name)],
        )
        .map_err(|e| jni_err("loadClass(NativeHost)", e))?
        .l()
        .map_err(|e| jni_err("loadClass->l", e))?;
    let host_ref = env
        .new_global_ref(host_class)
        .map_err(|e| jni_err("new_global_ref(NativeHost)", e))?;

    let _ = VM.set(vm);
    let _ = APP_CONTEXT.set(app_ref);
    let _ = HOST.set(host_ref);
    tracing::info!("Android bridge installed");
    Ok(())
}

/// JNIEnv for the current thread, attaching it permanently if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    let vm = VM
        .get()
        .ok_or_else(|| TetherError::platform("Android bridge not installed"))?;
    vm.attach_current_thread_permanently()
        .map_err(|e| jni_err("attach_current_thread_permanently", e))
}

/// The Activity currently hosting the WebView.
fn activity() -> Result<GlobalRef> {
    ACTIVITY
        .current()
        .ok_or_else(|| TetherError::platform("No Android activity attached"))
}

fn host_class() -> Result<&'static JClass<'static>> {
    let class = HOST
        .get()
        .ok_or_else(|| TetherError::platform("Android bridge not installed"))?;
    Ok(class.as_obj().into())
}

/// Map a JNI error to `TetherError::Platform`, clearing any pending Java
/// exception so the thread stays usable.
fn jni_err(context: &str, e: jni::errors::Error) -> TetherError {
    if let Ok(mut env) = VM
        .get()
        .ok_or(jni::errors::Error::NullPtr("vm"))
        .and_then(|vm| vm.get_env())
        && env.exception_check().unwrap_or(false)
    {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
    TetherError::platform(format!("{context}: {e}"))
}

fn java_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let s: String = env
        .get_string(&JString::from(obj))
        .map_err(|e| jni_err("get_string", e))?
        .into();
    Ok(Some(s))
}

fn sdk_int(env: &mut JNIEnv<'_>) -> Result<i32> {
    env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .map_err(|e| jni_err("Build.VERSION.SDK_INT", e))?
        .i()
        .map_err(|e| jni_err("SDK_INT->i", e))
}

fn system_service<'a>(
    env: &mut JNIEnv<'a>,
    activity: &JObject<'_>,
    name: &str,
) -> Result<JObject<'a>> {
    let j_name = env
        .new_string(name)
        .map_err(|e| jni_err("new_string(service)", e))?;
    let service = env
        .call_method(
            activity,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::Object(&j_name)],
        )
        .map_err(|e| jni_err("getSystemService", e))?
        .l()
        .map_err(|e| jni_err("getSystemService->l", e))?;
    if service.is_null() {
        return Err(TetherError::platform(format!("{name} service unavailable")));
    }
    Ok(service)
}

// ---------------------------------------------------------------------------
// NativeHost helper calls
// ---------------------------------------------------------------------------

/// Synchronous `NativeHost.call`.
fn host_call(method: &str, args: Value) -> Result<Value> {
    let mut env = jni_env()?;
    let class = host_class()?;

    let j_method = env
        .new_string(method)
        .map_err(|e| jni_err("new_string(method)", e))?;
    let j_args = env
        .new_string(args.to_string())
        .map_err(|e| jni_err("new_string(args)", e))?;

    let reply = env
        .call_static_method(
            class,
            "call",
            "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
            &[JValue::Object(&j_method), JValue::Object(&j_args)],
        )
        .map_err(|e| jni_err(&format!("NativeHost.call({method})"), e))?
        .l()
        .map_err(|e| jni_err("call->l", e))?;
    let reply = java_string(&mut env, reply)?
        .ok_or_else(|| TetherError::platform(format!("NativeHost.call({method}) returned null")))?;

    let mut reply: Value = serde_json::from_str(&reply)?;
    if let Some(message) = reply.get("error").and_then(Value::as_str) {
        return Err(TetherError::platform(message));
    }
    Ok(reply.get_mut("ok").map(Value::take).unwrap_or(Value::Null))
}

fn host_call_as<T: DeserializeOwned>(method: &str, args: Value) -> Result<T> {
    Ok(serde_json::from_value(host_call(method, args)?)?)
}

/// Asynchronous `NativeHost.start`; the outcome arrives for `token`.
fn host_start(token: RequestToken, method: &str, args: Value) -> Result<()> {
    let mut env = jni_env()?;
    let class = host_class()?;

    let j_method = env
        .new_string(method)
        .map_err(|e| jni_err("new_string(method)", e))?;
    let j_args = env
        .new_string(args.to_string())
        .map_err(|e| jni_err("new_string(args)", e))?;

    env.call_static_method(
        class,
        "start",
        "(ILjava/lang/String;Ljava/lang/String;)V",
        &[
            JValue::Int(token.code()),
            JValue::Object(&j_method),
            JValue::Object(&j_args),
        ],
    )
    .map_err(|e| jni_err(&format!("NativeHost.start({method})"), e))?;

    tracing::debug!(%token, method, "Android: host request started");
    Ok(())
}

fn button_json(buttons: &[DialogButton]) -> Value {
    buttons
        .iter()
        .map(|b| {
            let style = match b.style {
                ButtonStyle::Default => "default",
                ButtonStyle::Cancel => "cancel",
                ButtonStyle::Destructive => "destructive",
            };
            json!({ "text": b.text, "style": style })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the Tether platform bridge.
///
/// Zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Does not touch JNI; the first call happens when a capability is used.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeHaptics: android.os.Vibrator
// ---------------------------------------------------------------------------

impl NativeHaptics for AndroidBridge {
    fn has_vibrator(&self) -> bool {
        let probe = || -> Result<bool> {
            let mut env = jni_env()?;
            let activity = activity()?;
            let vibrator = system_service(&mut env, activity.as_obj(), "vibrator")?;
            env.call_method(&vibrator, "hasVibrator", "()Z", &[])
                .map_err(|e| jni_err("hasVibrator", e))?
                .z()
                .map_err(|e| jni_err("hasVibrator->z", e))
        };
        probe().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Android: vibrator probe failed");
            false
        })
    }

    fn vibrate(&self, duration: Duration, amplitude: u8) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let vibrator = system_service(&mut env, activity.as_obj(), "vibrator")?;
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);

        // VibrationEffect.createOneShot(millis, amplitude), API 26+.
        let effect = env
            .call_static_method(
                "android/os/VibrationEffect",
                "createOneShot",
                "(JI)Landroid/os/VibrationEffect;",
                &[JValue::Long(millis), JValue::Int(i32::from(amplitude.max(1)))],
            )
            .map_err(|e| jni_err("VibrationEffect.createOneShot", e))?
            .l()
            .map_err(|e| jni_err("createOneShot->l", e))?;

        env.call_method(
            &vibrator,
            "vibrate",
            "(Landroid/os/VibrationEffect;)V",
            &[JValue::Object(&effect)],
        )
        .map_err(|e| jni_err("Vibrator.vibrate", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeDevice: android.os.Build, PackageManager
// ---------------------------------------------------------------------------

impl NativeDevice for AndroidBridge {
    fn device_info(&self) -> DeviceInfo {
        let read = || -> Result<DeviceInfo> {
            let mut env = jni_env()?;
            let model = env
                .get_static_field("android/os/Build", "MODEL", "Ljava/lang/String;")
                .map_err(|e| jni_err("Build.MODEL", e))?
                .l()
                .map_err(|e| jni_err("MODEL->l", e))?;
            let model = java_string(&mut env, model)?.unwrap_or_default();
            let release = env
                .get_static_field("android/os/Build$VERSION", "RELEASE", "Ljava/lang/String;")
                .map_err(|e| jni_err("Build.VERSION.RELEASE", e))?
                .l()
                .map_err(|e| jni_err("RELEASE->l", e))?;
            let version = java_string(&mut env, release)?.unwrap_or_default();
            Ok(DeviceInfo {
                platform: "android".into(),
                version,
                model,
            })
        };
        read().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Android: reading Build fields failed");
            DeviceInfo {
                platform: "android".into(),
                version: String::new(),
                model: String::new(),
            }
        })
    }

    fn app_version(&self) -> Result<AppVersion> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let pm = env
            .call_method(
                activity.as_obj(),
                "getPackageManager",
                "()Landroid/content/pm/PackageManager;",
                &[],
            )
            .map_err(|e| jni_err("getPackageManager", e))?
            .l()
            .map_err(|e| jni_err("getPackageManager->l", e))?;
        let package = env
            .call_method(activity.as_obj(), "getPackageName", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("getPackageName", e))?
            .l()
            .map_err(|e| jni_err("getPackageName->l", e))?;
        let info = env
            .call_method(
                &pm,
                "getPackageInfo",
                "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                &[JValue::Object(&package), JValue::Int(0)],
            )
            .map_err(|e| jni_err("getPackageInfo", e))?
            .l()
            .map_err(|e| jni_err("getPackageInfo->l", e))?;

        let version_name = env
            .get_field(&info, "versionName", "Ljava/lang/String;")
            .map_err(|e| jni_err("PackageInfo.versionName", e))?
            .l()
            .map_err(|e| jni_err("versionName->l", e))?;
        let version = java_string(&mut env, version_name)?.unwrap_or_else(|| "1.0.0".into());

        let build = if sdk_int(&mut env)? >= 28 {
            env.call_method(&info, "getLongVersionCode", "()J", &[])
                .map_err(|e| jni_err("getLongVersionCode", e))?
                .j()
                .map_err(|e| jni_err("getLongVersionCode->j", e))?
        } else {
            let code = env
                .get_field(&info, "versionCode", "I")
                .map_err(|e| jni_err("PackageInfo.versionCode", e))?
                .i()
                .map_err(|e| jni_err("versionCode->i", e))?;
            i64::from(code)
        };

        let app_info = env
            .call_method(
                activity.as_obj(),
                "getApplicationInfo",
                "()Landroid/content/pm/ApplicationInfo;",
                &[],
            )
            .map_err(|e| jni_err("getApplicationInfo", e))?
            .l()
            .map_err(|e| jni_err("getApplicationInfo->l", e))?;
        let label = env
            .call_method(
                &app_info,
                "loadLabel",
                "(Landroid/content/pm/PackageManager;)Ljava/lang/CharSequence;",
                &[JValue::Object(&pm)],
            )
            .map_err(|e| jni_err("loadLabel", e))?
            .l()
            .map_err(|e| jni_err("loadLabel->l", e))?;
        let label = env
            .call_method(&label, "toString", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("label.toString", e))?
            .l()
            .map_err(|e| jni_err("toString->l", e))?;
        let name = java_string(&mut env, label)?.unwrap_or_default();

        Ok(AppVersion {
            version,
            build,
            name,
        })
    }
}

// ---------------------------------------------------------------------------
// NativeStorage: SharedPreferences
// ---------------------------------------------------------------------------

/// `activity.getSharedPreferences("tether", MODE_PRIVATE)`.
fn shared_preferences<'a>(env: &mut JNIEnv<'a>, activity: &JObject<'_>) -> Result<JObject<'a>> {
    let j_name = env
        .new_string(PREFS_FILE)
        .map_err(|e| jni_err("new_string(prefs_name)", e))?;
    env.call_method(
        activity,
        "getSharedPreferences",
        "(Ljava/lang/String;I)Landroid/content/SharedPreferences;",
        &[JValue::Object(&j_name), JValue::Int(0)],
    )
    .map_err(|e| jni_err("getSharedPreferences", e))?
    .l()
    .map_err(|e| jni_err("getSharedPreferences->l", e))
}

impl NativeStorage for AndroidBridge {
    fn storage_get(&self, key: &str) -> Result<Option<String>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let prefs = shared_preferences(&mut env, activity.as_obj())?;

        let j_key = env
            .new_string(key)
            .map_err(|e| jni_err("new_string(key)", e))?;
        let value = env
            .call_method(
                &prefs,
                "getString",
                "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
                &[JValue::Object(&j_key), JValue::Object(&JObject::null())],
            )
            .map_err(|e| jni_err("getString", e))?
            .l()
            .map_err(|e| jni_err("getString->l", e))?;
        java_string(&mut env, value)
    }

    fn storage_set(&self, key: &str, value: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let prefs = shared_preferences(&mut env, activity.as_obj())?;

        let editor = env
            .call_method(
                &prefs,
                "edit",
                "()Landroid/content/SharedPreferences$Editor;",
                &[],
            )
            .map_err(|e| jni_err("SharedPreferences.edit", e))?
            .l()
            .map_err(|e| jni_err("edit->l", e))?;

        let j_key = env
            .new_string(key)
            .map_err(|e| jni_err("new_string(key)", e))?;
        let j_value = env
            .new_string(value)
            .map_err(|e| jni_err("new_string(value)", e))?;
        env.call_method(
            &editor,
            "putString",
            "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/SharedPreferences$Editor;",
            &[JValue::Object(&j_key), JValue::Object(&j_value)],
        )
        .map_err(|e| jni_err("editor.putString", e))?;

        // apply() writes asynchronously and never blocks the bridge thread.
        env.call_method(&editor, "apply", "()V", &[])
            .map_err(|e| jni_err("editor.apply", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeClipboard: android.content.ClipboardManager
// ---------------------------------------------------------------------------

impl NativeClipboard for AndroidBridge {
    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let clipboard = system_service(&mut env, activity.as_obj(), "clipboard")?;

        let j_label = env
            .new_string("Tether")
            .map_err(|e| jni_err("new_string(label)", e))?;
        let j_text = env
            .new_string(text)
            .map_err(|e| jni_err("new_string(text)", e))?;
        let clip = env
            .call_static_method(
                "android/content/ClipData",
                "newPlainText",
                "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Landroid/content/ClipData;",
                &[JValue::Object(&j_label), JValue::Object(&j_text)],
            )
            .map_err(|e| jni_err("ClipData.newPlainText", e))?
            .l()
            .map_err(|e| jni_err("newPlainText->l", e))?;

        env.call_method(
            &clipboard,
            "setPrimaryClip",
            "(Landroid/content/ClipData;)V",
            &[JValue::Object(&clip)],
        )
        .map_err(|e| jni_err("setPrimaryClip", e))?;
        Ok(())
    }

    fn clipboard_text(&self) -> Result<Option<String>> {
        if !self.clipboard_has_text()? {
            return Ok(None);
        }
        let mut env = jni_env()?;
        let activity = activity()?;
        let clipboard = system_service(&mut env, activity.as_obj(), "clipboard")?;

        let clip = env
            .call_method(
                &clipboard,
                "getPrimaryClip",
                "()Landroid/content/ClipData;",
                &[],
            )
            .map_err(|e| jni_err("getPrimaryClip", e))?
            .l()
            .map_err(|e| jni_err("getPrimaryClip->l", e))?;
        if clip.is_null() {
            return Ok(None);
        }
        let item = env
            .call_method(
                &clip,
                "getItemAt",
                "(I)Landroid/content/ClipData$Item;",
                &[JValue::Int(0)],
            )
            .map_err(|e| jni_err("getItemAt", e))?
            .l()
            .map_err(|e| jni_err("getItemAt->l", e))?;
        let text = env
            .call_method(&item, "getText", "()Ljava/lang/CharSequence;", &[])
            .map_err(|e| jni_err("Item.getText", e))?
            .l()
            .map_err(|e| jni_err("getText->l", e))?;
        if text.is_null() {
            return Ok(None);
        }
        let text = env
            .call_method(&text, "toString", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("text.toString", e))?
            .l()
            .map_err(|e| jni_err("toString->l", e))?;
        java_string(&mut env, text)
    }

    fn clipboard_has_text(&self) -> Result<bool> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let clipboard = system_service(&mut env, activity.as_obj(), "clipboard")?;

        let has_clip = env
            .call_method(&clipboard, "hasPrimaryClip", "()Z", &[])
            .map_err(|e| jni_err("hasPrimaryClip", e))?
            .z()
            .map_err(|e| jni_err("hasPrimaryClip->z", e))?;
        if !has_clip {
            return Ok(false);
        }
        let description = env
            .call_method(
                &clipboard,
                "getPrimaryClipDescription",
                "()Landroid/content/ClipDescription;",
                &[],
            )
            .map_err(|e| jni_err("getPrimaryClipDescription", e))?
            .l()
            .map_err(|e| jni_err("getPrimaryClipDescription->l", e))?;
        if description.is_null() {
            return Ok(false);
        }
        let j_mime = env
            .new_string("text/plain")
            .map_err(|e| jni_err("new_string(mime)", e))?;
        env.call_method(
            &description,
            "hasMimeType",
            "(Ljava/lang/String;)Z",
            &[JValue::Object(&j_mime)],
        )
        .map_err(|e| jni_err("hasMimeType", e))?
        .z()
        .map_err(|e| jni_err("hasMimeType->z", e))
    }
}

// ---------------------------------------------------------------------------
// NativeUrls: Intent.ACTION_VIEW
// ---------------------------------------------------------------------------

fn view_intent<'a>(env: &mut JNIEnv<'a>, url: &str) -> Result<JObject<'a>> {
    let j_url = env
        .new_string(url)
        .map_err(|e| jni_err("new_string(url)", e))?;
    let uri = env
        .call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&j_url)],
        )
        .map_err(|e| jni_err("Uri.parse", e))?
        .l()
        .map_err(|e| jni_err("Uri.parse->l", e))?;
    let j_action = env
        .new_string("android.intent.action.VIEW")
        .map_err(|e| jni_err("new_string(action)", e))?;
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;Landroid/net/Uri;)V",
        &[JValue::Object(&j_action), JValue::Object(&uri)],
    )
    .map_err(|e| jni_err("new Intent(ACTION_VIEW)", e))
}

impl NativeUrls for AndroidBridge {
    fn open_url(&self, url: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let intent = view_intent(&mut env, url)?;

        env.call_method(
            &intent,
            "addFlags",
            "(I)Landroid/content/Intent;",
            &[JValue::Int(FLAG_ACTIVITY_NEW_TASK)],
        )
        .map_err(|e| jni_err("Intent.addFlags", e))?;
        env.call_method(
            activity.as_obj(),
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&intent)],
        )
        .map_err(|e| jni_err("startActivity", e))?;

        tracing::info!(url, "Android: opened URL");
        Ok(())
    }

    fn can_open_url(&self, url: &str) -> Result<bool> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let intent = view_intent(&mut env, url)?;

        let pm = env
            .call_method(
                activity.as_obj(),
                "getPackageManager",
                "()Landroid/content/pm/PackageManager;",
                &[],
            )
            .map_err(|e| jni_err("getPackageManager", e))?
            .l()
            .map_err(|e| jni_err("getPackageManager->l", e))?;
        let component = env
            .call_method(
                &intent,
                "resolveActivity",
                "(Landroid/content/pm/PackageManager;)Landroid/content/ComponentName;",
                &[JValue::Object(&pm)],
            )
            .map_err(|e| jni_err("resolveActivity", e))?
            .l()
            .map_err(|e| jni_err("resolveActivity->l", e))?;
        Ok(!component.is_null())
    }
}

// ---------------------------------------------------------------------------
// Capabilities served by NativeHost
// ---------------------------------------------------------------------------

impl NativeSystemStatus for AndroidBridge {
    fn battery_status(&self) -> Result<BatteryStatus> {
        host_call_as("batteryStatus", Value::Null)
    }

    fn network_status(&self) -> Result<NetworkStatus> {
        host_call_as("networkStatus", Value::Null)
    }
}

impl NativeTorch for AndroidBridge {
    fn has_flash(&self) -> bool {
        host_call_as("hasFlash", Value::Null).unwrap_or(false)
    }

    fn set_torch(&self, on: bool) -> Result<()> {
        host_call("setTorch", json!({ "on": on })).map(drop)
    }
}

impl NativeBiometrics for AndroidBridge {
    fn biometric_availability(&self) -> Result<BiometricAvailability> {
        host_call_as("biometricAvailability", Value::Null)
    }

    fn authenticate(&self, token: RequestToken, prompt: &BiometricPrompt) -> Result<()> {
        host_start(
            token,
            "authenticate",
            json!({
                "title": prompt.title,
                "reason": prompt.reason,
                "cancelText": prompt.cancel_text,
            }),
        )
    }
}

impl NativeSystemBars for AndroidBridge {
    fn set_status_bar_style(&self, style: StatusBarStyle, color: Option<Color>) -> Result<()> {
        let style = match style {
            StatusBarStyle::Light => "light",
            StatusBarStyle::Dark => "dark",
        };
        // Android colours are signed 32-bit ARGB ints.
        let color = color.map(|c| c.to_argb() as i32);
        host_call("setStatusBarStyle", json!({ "style": style, "color": color })).map(drop)
    }

    fn set_status_bar_visible(&self, visible: bool) -> Result<()> {
        host_call("setStatusBarVisible", json!({ "visible": visible })).map(drop)
    }
}

impl NativeKeyboard for AndroidBridge {
    fn set_keyboard_visible(&self, visible: bool) -> Result<()> {
        host_call("setKeyboardVisible", json!({ "visible": visible })).map(drop)
    }
}

impl NativeDialogs for AndroidBridge {
    fn show_toast(&self, message: &str, long: bool) -> Result<()> {
        host_call("toast", json!({ "message": message, "long": long })).map(drop)
    }

    fn share_text(&self, text: &str, title: Option<&str>) -> Result<()> {
        host_call("share", json!({ "text": text, "title": title })).map(drop)
    }

    fn show_alert(
        &self,
        token: RequestToken,
        title: Option<&str>,
        message: Option<&str>,
        buttons: &[DialogButton],
    ) -> Result<()> {
        host_start(
            token,
            "alert",
            json!({ "title": title, "message": message, "buttons": button_json(buttons) }),
        )
    }

    fn show_action_sheet(
        &self,
        token: RequestToken,
        title: Option<&str>,
        options: &[DialogButton],
    ) -> Result<()> {
        host_start(
            token,
            "actionSheet",
            json!({ "title": title, "options": button_json(options) }),
        )
    }

    fn show_date_picker(&self, token: RequestToken, request: &DatePickerRequest) -> Result<()> {
        let mode = match request.mode {
            DatePickerMode::Date => "date",
            DatePickerMode::Time => "time",
            DatePickerMode::DateTime => "datetime",
        };
        host_start(
            token,
            "datePicker",
            json!({
                "mode": mode,
                "initial": request.initial_ms,
                "min": request.min_ms,
                "max": request.max_ms,
            }),
        )
    }
}

impl NativeMedia for AndroidBridge {
    fn capture_photo(&self, token: RequestToken, facing: CameraFacing) -> Result<()> {
        let front = facing == CameraFacing::Front;
        host_start(token, "capturePhoto", json!({ "front": front }))
    }

    fn pick_media(&self, token: RequestToken, kind: MediaKind, multiple: bool) -> Result<()> {
        host_start(
            token,
            "pickMedia",
            json!({ "mimeType": kind.mime_type(), "multiple": multiple }),
        )
    }

    fn read_uri(&self, uri: &str) -> Result<Vec<u8>> {
        let mut env = jni_env()?;
        let class = host_class()?;
        let j_uri = env
            .new_string(uri)
            .map_err(|e| jni_err("new_string(uri)", e))?;
        let bytes = env
            .call_static_method(
                class,
                "readUri",
                "(Ljava/lang/String;)[B",
                &[JValue::Object(&j_uri)],
            )
            .map_err(|e| jni_err("NativeHost.readUri", e))?
            .l()
            .map_err(|e| jni_err("readUri->l", e))?;
        if bytes.is_null() {
            return Err(TetherError::platform(format!("Unable to read {uri}")));
        }
        env.convert_byte_array(JByteArray::from(bytes))
            .map_err(|e| jni_err("convert_byte_array", e))
    }
}

impl NativeLocation for AndroidBridge {
    fn request_location(&self, token: RequestToken, accuracy: LocationAccuracy) -> Result<()> {
        let accuracy = match accuracy {
            LocationAccuracy::High => "high",
            LocationAccuracy::Balanced => "balanced",
            LocationAccuracy::Low => "low",
        };
        host_start(token, "location", json!({ "accuracy": accuracy }))
    }
}

impl NativeNotifications for AndroidBridge {
    fn post_notification(&self, id: i32, title: &str, body: &str) -> Result<()> {
        host_call(
            "postNotification",
            json!({ "id": id, "title": title, "body": body }),
        )
        .map(drop)
    }

    fn cancel_notification(&self, id: i32) -> Result<()> {
        host_call("cancelNotification", json!({ "id": id })).map(drop)
    }

    fn cancel_all_notifications(&self) -> Result<()> {
        host_call("cancelAllNotifications", Value::Null).map(drop)
    }
}

impl NativeQrScanner for AndroidBridge {
    fn scan_qr(&self, token: RequestToken) -> Result<()> {
        host_start(token, "scanQr", Value::Null)
    }
}

// ---------------------------------------------------------------------------
// NativePermissions: Activity permission APIs
// ---------------------------------------------------------------------------

impl NativePermissions for AndroidBridge {
    fn permission_status(&self, permission: Permission) -> PermissionStatus {
        let check = || -> Result<PermissionStatus> {
            let mut env = jni_env()?;
            let activity = activity()?;
            let Some(manifest) = manifest_permission(permission, sdk_int(&mut env)?) else {
                return Ok(PermissionStatus::IMPLICIT);
            };
            let j_perm = env
                .new_string(manifest)
                .map_err(|e| jni_err("new_string(permission)", e))?;

            let granted = env
                .call_method(
                    activity.as_obj(),
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&j_perm)],
                )
                .map_err(|e| jni_err("checkSelfPermission", e))?
                .i()
                .map_err(|e| jni_err("checkSelfPermission->i", e))?
                == PERMISSION_GRANTED;
            let rationale = env
                .call_method(
                    activity.as_obj(),
                    "shouldShowRequestPermissionRationale",
                    "(Ljava/lang/String;)Z",
                    &[JValue::Object(&j_perm)],
                )
                .map_err(|e| jni_err("shouldShowRequestPermissionRationale", e))?
                .z()
                .map_err(|e| jni_err("shouldShowRequestPermissionRationale->z", e))?;

            Ok(PermissionStatus {
                granted,
                can_ask: !rationale || !granted,
            })
        };
        check().unwrap_or_else(|e| {
            tracing::error!(%permission, error = %e, "Android: permission check failed");
            PermissionStatus {
                granted: false,
                can_ask: true,
            }
        })
    }

    fn request_permissions(&self, token: RequestToken, permissions: &[Permission]) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let sdk = sdk_int(&mut env)?;
        let manifest: Vec<&str> = permissions
            .iter()
            .filter_map(|p| manifest_permission(*p, sdk))
            .collect();

        let len = i32::try_from(manifest.len())
            .map_err(|_| TetherError::invalid("too many permissions"))?;
        let array = env
            .new_object_array(len, "java/lang/String", JObject::null())
            .map_err(|e| jni_err("new_object_array", e))?;
        for (i, name) in (0..).zip(&manifest) {
            let j_name = env
                .new_string(name)
                .map_err(|e| jni_err("new_string(permission)", e))?;
            env.set_object_array_element(&array, i, j_name)
                .map_err(|e| jni_err("set_object_array_element", e))?;
        }

        // The result comes back through onRequestPermissionsResult with the
        // token as request code.
        env.call_method(
            activity.as_obj(),
            "requestPermissions",
            "([Ljava/lang/String;I)V",
            &[JValue::Object(&array), JValue::Int(token.code())],
        )
        .map_err(|e| jni_err("requestPermissions", e))?;

        tracing::info!(%token, permissions = ?manifest, "Android: permission dialog requested");
        Ok(())
    }
}

impl NativeAudioRecorder for AndroidBridge {
    fn recordings_dir(&self) -> Result<PathBuf> {
        let dir: String = host_call_as("recordingsDir", Value::Null)?;
        Ok(PathBuf::from(dir))
    }

    fn start_recording(&self, path: &Path) -> Result<()> {
        host_call(
            "startRecording",
            json!({ "path": path.to_string_lossy() }),
        )
        .map(drop)
    }

    fn stop_recording(&self) -> Result<()> {
        host_call("stopRecording", Value::Null).map(drop)
    }
}

impl NativeContacts for AndroidBridge {
    fn pick_contact(&self, token: RequestToken) -> Result<()> {
        host_start(token, "pickContact", Value::Null)
    }

    fn query_contacts(&self, filter: Option<&str>, limit: u32) -> Result<Vec<ContactSummary>> {
        host_call_as("queryContacts", json!({ "filter": filter, "limit": limit }))
    }
}

impl NativePush for AndroidBridge {
    fn push_login(&self, external_id: &str) -> Result<()> {
        host_call("pushLogin", json!({ "externalId": external_id })).map(drop)
    }

    fn push_logout(&self) -> Result<()> {
        host_call("pushLogout", Value::Null).map(drop)
    }

    fn push_add_tags(&self, tags: &BTreeMap<String, String>) -> Result<()> {
        host_call("pushAddTags", json!({ "tags": tags })).map(drop)
    }

    fn push_remove_tag(&self, key: &str) -> Result<()> {
        host_call("pushRemoveTag", json!({ "key": key })).map(drop)
    }

    fn push_tags(&self) -> Result<BTreeMap<String, String>> {
        host_call_as("pushTags", Value::Null)
    }

    fn push_request_permission(&self, token: RequestToken) -> Result<()> {
        host_start(token, "pushRequestPermission", Value::Null)
    }

    fn push_permission(&self) -> Result<bool> {
        host_call_as("pushPermission", Value::Null)
    }

    fn push_subscription(&self) -> Result<PushSubscription> {
        host_call_as("pushSubscription", Value::Null)
    }

    fn push_set_opted_in(&self, opted_in: bool) -> Result<()> {
        host_call("pushSetOptedIn", json!({ "optedIn": opted_in })).map(drop)
    }

    fn push_add_email(&self, email: &str) -> Result<()> {
        host_call("pushAddEmail", json!({ "email": email })).map(drop)
    }

    fn push_remove_email(&self, email: &str) -> Result<()> {
        host_call("pushRemoveEmail", json!({ "email": email })).map(drop)
    }
}

/// `Build.VERSION.SDK_INT` of the running device.
pub fn device_sdk_int() -> Result<i32> {
    let mut env = jni_env()?;
    sdk_int(&mut env)
}
