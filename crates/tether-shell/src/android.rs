// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points for the Android activity.
//
// The Java class `dev.tether.NativeBridge` declares the `native*` methods
// below and the static callbacks Rust drives the WebView through:
//
// * `evaluate(String)`, `loadUrl(String)`, `reload()`, `clearCache()`,
//   `clearHistory()`, `goBack()`, `setRemoteDebugging(boolean)`; each posts
//   to the main looper;
// * `canGoBack()` and `currentUrl()`, answered from the last state the
//   main thread published;
// * `showDevMenu(String, String[])`, `showMessage(String, String)`,
//   `promptServerUrl(String)`, `confirmClearStorage()`, whose answers come
//   back through `nativeDevMenuSelected`, `nativeServerUrlEntered` and
//   `nativeClearStorageConfirmed`.
//
// `addJavascriptInterface` calls `nativeCall` on a binder thread; every
// other entry point runs on the main thread.

#![cfg(target_os = "android")]

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use jni::objects::{GlobalRef, JClass, JIntArray, JObject, JObjectArray, JString, JValue};
use jni::sys::{JNI_FALSE, JNI_TRUE, jboolean, jfloat, jint, jlong, jstring};
use jni::{JNIEnv, JavaVM};

use tether_bridge::platform::android::{device_sdk_int, install, release_activity};
use tether_bridge::{UiReceiver, platform_bridge};
use tether_core::SplashConfig;
use tether_core::config::AppConfig;
use tether_core::error::{Result, TetherError};

use crate::dev_menu::{DevMenuItem, MenuOutcome};
use crate::shell::{BackAction, Shell};
use crate::webview::WebViewControl;

struct Host {
    shell: Shell,
    _runtime: tokio::runtime::Runtime,
}

static VM: OnceLock<JavaVM> = OnceLock::new();
static BRIDGE_CLASS: OnceLock<GlobalRef> = OnceLock::new();
static HOST: OnceLock<Host> = OnceLock::new();

fn jni_err(context: &str, e: jni::errors::Error) -> TetherError {
    TetherError::platform(format!("{context}: {e}"))
}

fn rust_string(env: &mut JNIEnv<'_>, s: &JString<'_>) -> Result<String> {
    if s.is_null() {
        return Ok(String::new());
    }
    Ok(env.get_string(s).map_err(|e| jni_err("get_string", e))?.into())
}

fn host() -> Option<&'static Host> {
    let host = HOST.get();
    if host.is_none() {
        tracing::warn!("NativeBridge used before nativeInit");
    }
    host
}

fn throw(env: &mut JNIEnv<'_>, e: &TetherError) {
    tracing::error!(error = %e, "native bridge failure");
    let _ = env.throw_new("java/lang/IllegalStateException", e.to_string());
}

fn to_jboolean(value: bool) -> jboolean {
    if value { JNI_TRUE } else { JNI_FALSE }
}

// ---------------------------------------------------------------------------
// Calls into NativeBridge
// ---------------------------------------------------------------------------

/// Run `f` with an attached env and the NativeBridge class. Failures are
/// logged; callers have nobody to report them to.
fn with_bridge_class<T>(
    what: &str,
    f: impl FnOnce(&mut JNIEnv<'static>, &JClass<'static>) -> jni::errors::Result<T>,
) -> Option<T> {
    let result = (|| {
        let vm = VM
            .get()
            .ok_or_else(|| TetherError::platform("JavaVM not recorded"))?;
        let mut env = vm
            .attach_current_thread_permanently()
            .map_err(|e| jni_err("attach_current_thread_permanently", e))?;
        let class: &JClass<'static> = BRIDGE_CLASS
            .get()
            .ok_or_else(|| TetherError::platform("NativeBridge class not recorded"))?
            .as_obj()
            .into();
        match f(&mut env, class) {
            Ok(value) => Ok(value),
            Err(e) => {
                if env.exception_check().unwrap_or(false) {
                    let _ = env.exception_describe();
                    let _ = env.exception_clear();
                }
                Err(jni_err(what, e))
            }
        }
    })();
    result
        .inspect_err(|e| tracing::error!(call = what, error = %e, "NativeBridge call failed"))
        .ok()
}

fn call_void(method: &'static str, arg: Option<&str>) {
    with_bridge_class(method, |env, class| {
        match arg {
            Some(text) => {
                let j_text = env.new_string(text)?;
                env.call_static_method(
                    class,
                    method,
                    "(Ljava/lang/String;)V",
                    &[JValue::Object(&j_text)],
                )?;
            }
            None => {
                env.call_static_method(class, method, "()V", &[])?;
            }
        }
        Ok(())
    });
}

/// `WebViewControl` over the static NativeBridge callbacks.
struct AndroidWebView;

impl WebViewControl for AndroidWebView {
    fn load_url(&self, url: &str) {
        call_void("loadUrl", Some(url));
    }

    fn reload(&self) {
        call_void("reload", None);
    }

    fn clear_cache(&self) {
        call_void("clearCache", None);
    }

    fn clear_history(&self) {
        call_void("clearHistory", None);
    }

    fn can_go_back(&self) -> bool {
        with_bridge_class("canGoBack", |env, class| {
            env.call_static_method(class, "canGoBack", "()Z", &[])?.z()
        })
        .unwrap_or(false)
    }

    fn go_back(&self) {
        call_void("goBack", None);
    }

    fn evaluate_script(&self, script: &str) {
        call_void("evaluate", Some(script));
    }

    fn set_remote_debugging(&self, enabled: bool) {
        with_bridge_class("setRemoteDebugging", |env, class| {
            env.call_static_method(
                class,
                "setRemoteDebugging",
                "(Z)V",
                &[JValue::Bool(to_jboolean(enabled))],
            )
            .map(drop)
        });
    }

    fn current_url(&self) -> Option<String> {
        with_bridge_class("currentUrl", |env, class| {
            let url = env
                .call_static_method(class, "currentUrl", "()Ljava/lang/String;", &[])?
                .l()?;
            if url.is_null() {
                return Ok(None);
            }
            Ok(Some(env.get_string(&JString::from(url))?.into()))
        })
        .flatten()
    }
}

fn show_dev_menu(items: &[DevMenuItem]) {
    with_bridge_class("showDevMenu", |env, class| {
        let string_class = env.find_class("java/lang/String")?;
        let labels = env.new_object_array(items.len() as i32, string_class, JObject::null())?;
        for (i, item) in items.iter().enumerate() {
            let label = env.new_string(item.label())?;
            env.set_object_array_element(&labels, i as i32, label)?;
        }
        let title = env.new_string(crate::dev_menu::MENU_TITLE)?;
        env.call_static_method(
            class,
            "showDevMenu",
            "(Ljava/lang/String;[Ljava/lang/String;)V",
            &[JValue::Object(&title), JValue::Object(&labels)],
        )
        .map(drop)
    });
}

fn present(shell: &Shell, outcome: MenuOutcome) {
    match outcome {
        MenuOutcome::Toast(message) => {
            if let Err(e) = shell.context().platform().show_toast(&message, false) {
                tracing::warn!(error = %e, "dev menu toast failed");
            }
        }
        MenuOutcome::Message { title, body } => {
            with_bridge_class("showMessage", |env, class| {
                let j_title = env.new_string(&title)?;
                let j_body = env.new_string(&body)?;
                env.call_static_method(
                    class,
                    "showMessage",
                    "(Ljava/lang/String;Ljava/lang/String;)V",
                    &[JValue::Object(&j_title), JValue::Object(&j_body)],
                )
                .map(drop)
            });
        }
        MenuOutcome::PromptServerUrl { current } => call_void("promptServerUrl", Some(&current)),
        MenuOutcome::ConfirmClearStorage => call_void("confirmClearStorage", None),
    }
}

/// Evaluate rendered responses in the page, in delivery order.
fn pump_responses(mut responses: UiReceiver) {
    while let Some(response) = responses.blocking_recv() {
        let Some(host) = HOST.get() else { continue };
        call_void("evaluate", Some(&host.shell.render_response(&response)));
    }
    tracing::info!("response queue closed");
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

fn init(
    env: &mut JNIEnv<'_>,
    class: &JClass<'_>,
    activity: &JObject<'_>,
    data_dir: &JString<'_>,
    splash_json: &JString<'_>,
) -> Result<String> {
    if let Some(host) = HOST.get() {
        // Activity recreated; the Rust side survives but must talk to the
        // new Activity from now on.
        install(env, activity)?;
        host.shell.attach_webview(Arc::new(AndroidWebView));
        return Ok(host.shell.start_url());
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    install(env, activity)?;
    let vm = env.get_java_vm().map_err(|e| jni_err("get_java_vm", e))?;
    let class_ref = env
        .new_global_ref(class)
        .map_err(|e| jni_err("new_global_ref(NativeBridge)", e))?;
    let _ = VM.set(vm);
    let _ = BRIDGE_CLASS.set(class_ref);

    let data_dir = PathBuf::from(rust_string(env, data_dir)?);
    let config = AppConfig::load_or_default(&data_dir);
    let splash = SplashConfig::parse(&rust_string(env, splash_json)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tether-worker")
        .build()?;
    let platform = platform_bridge(&data_dir)?;
    let (shell, responses) = Shell::new(config, splash, platform, runtime.handle().clone())?;
    shell.attach_webview(Arc::new(AndroidWebView));
    let start_url = shell.start_url();

    if HOST
        .set(Host {
            shell,
            _runtime: runtime,
        })
        .is_err()
    {
        return Err(TetherError::platform("native bridge initialised twice"));
    }
    std::thread::Builder::new()
        .name("tether-responses".into())
        .spawn(move || pump_responses(responses))?;

    tracing::info!(url = %start_url, "Tether shell ready");
    Ok(start_url)
}

/// `static native String nativeInit(Activity, String dataDir, String splashJson)`
///
/// Returns the URL to load first.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeInit<'local>(
    mut env: JNIEnv<'local>,
    class: JClass<'local>,
    activity: JObject<'local>,
    data_dir: JString<'local>,
    splash_json: JString<'local>,
) -> jstring {
    let url = match init(&mut env, &class, &activity, &data_dir, &splash_json) {
        Ok(url) => url,
        Err(e) => {
            throw(&mut env, &e);
            return std::ptr::null_mut();
        }
    };
    match env.new_string(url) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            throw(&mut env, &jni_err("new_string(start url)", e));
            std::ptr::null_mut()
        }
    }
}

/// `static native void nativeCall(String action, String payload, String callbackId)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeCall<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    action: JString<'local>,
    payload: JString<'local>,
    callback_id: JString<'local>,
) {
    let Some(host) = host() else { return };
    let callback_id = match rust_string(&mut env, &callback_id) {
        Ok(id) => id,
        Err(e) => {
            // No id to answer; the page's call stays pending.
            tracing::error!(error = %e, "bridge call without a readable callback id");
            return;
        }
    };
    let strings = (|| {
        Ok::<_, TetherError>((
            rust_string(&mut env, &action)?,
            rust_string(&mut env, &payload)?,
        ))
    })();
    match strings {
        Ok((action, payload)) => host.shell.handle_call(&action, &payload, &callback_id),
        Err(e) => host
            .shell
            .reject_call(&callback_id, &format!("Unreadable bridge call: {e}")),
    }
}

/// `static native String nativePageScript(String url, boolean finished)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativePageScript<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    url: JString<'local>,
    finished: jboolean,
) -> jstring {
    let Some(host) = host() else {
        return std::ptr::null_mut();
    };
    let url = rust_string(&mut env, &url).unwrap_or_default();
    let script = if finished == JNI_TRUE {
        host.shell.on_page_finished(&url)
    } else {
        host.shell.on_page_started(&url)
    };
    env.new_string(script)
        .map(JString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// `static native void nativeHostResult(int token, boolean success, String json)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeHostResult<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    token: jint,
    success: jboolean,
    json: JString<'local>,
) {
    let Some(host) = host() else { return };
    match rust_string(&mut env, &json) {
        Ok(json) => {
            if !host.shell.on_host_result(token, success == JNI_TRUE, &json) {
                tracing::debug!(token, "host result had no waiting request");
            }
        }
        Err(e) => {
            tracing::error!(token, error = %e, "unreadable host result");
            host.shell.on_host_result(token, false, "Unreadable host result");
        }
    }
}

/// `static native void nativePermissionsResult(int requestCode, String[] permissions, int[] grants)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativePermissionsResult<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    request_code: jint,
    permissions: JObjectArray<'local>,
    grants: JIntArray<'local>,
) {
    let Some(host) = host() else { return };
    let read = (|| -> Result<(Vec<String>, Vec<i32>)> {
        let len = env
            .get_array_length(&permissions)
            .map_err(|e| jni_err("get_array_length(permissions)", e))?;
        let mut names = Vec::with_capacity(len.max(0) as usize);
        for i in 0..len {
            let element = env
                .get_object_array_element(&permissions, i)
                .map_err(|e| jni_err("get_object_array_element", e))?;
            names.push(rust_string(&mut env, &JString::from(element))?);
        }
        let count = env
            .get_array_length(&grants)
            .map_err(|e| jni_err("get_array_length(grants)", e))?;
        let mut values = vec![0; count.max(0) as usize];
        env.get_int_array_region(&grants, 0, &mut values)
            .map_err(|e| jni_err("get_int_array_region", e))?;
        Ok((names, values))
    })();

    match read.and_then(|(names, values)| Ok((names, values, device_sdk_int()?))) {
        Ok((names, values, sdk)) => {
            host.shell.on_permissions_result(request_code, &names, &values, sdk);
        }
        Err(e) => {
            tracing::error!(request_code, error = %e, "unreadable permission result");
            host.shell
                .on_host_result(request_code, false, "Permission result unreadable");
        }
    }
}

/// `static native boolean nativeAccelerometer(float x, float y, float z, long timestampNanos)`
///
/// Returns `true` when the sample opened the dev menu.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeAccelerometer<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    x: jfloat,
    y: jfloat,
    z: jfloat,
    timestamp_nanos: jlong,
) -> jboolean {
    let Some(host) = host() else {
        return JNI_FALSE;
    };
    let at = Duration::from_nanos(u64::try_from(timestamp_nanos).unwrap_or(0));
    match host.shell.on_accelerometer(x, y, z, at) {
        Some(items) => {
            show_dev_menu(items);
            JNI_TRUE
        }
        None => JNI_FALSE,
    }
}

/// `static native void nativeDevMenuSelected(int index)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeDevMenuSelected<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    index: jint,
) {
    let Some(host) = host() else { return };
    let Some(menu) = host.shell.dev_menu() else { return };
    let Some(item) = usize::try_from(index).ok().and_then(DevMenuItem::from_index) else {
        tracing::warn!(index, "unknown dev menu item");
        return;
    };
    match menu.execute(item) {
        Ok(outcome) => present(&host.shell, outcome),
        Err(e) => present(&host.shell, MenuOutcome::Toast(e.to_string())),
    }
}

/// `static native void nativeServerUrlEntered(String url)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeServerUrlEntered<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    url: JString<'local>,
) {
    let Some(host) = host() else { return };
    let Some(menu) = host.shell.dev_menu() else { return };
    let url = rust_string(&mut env, &url).unwrap_or_default();
    if let Some(outcome) = menu.apply_server_url(&url) {
        present(&host.shell, outcome);
    }
}

/// `static native void nativeClearStorageConfirmed()`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeClearStorageConfirmed<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    let Some(host) = host() else { return };
    if let Some(menu) = host.shell.dev_menu() {
        present(&host.shell, menu.clear_storage());
    }
}

/// `static native boolean nativeResume()`: `true` means register the
/// accelerometer listener.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeResume<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    host().map_or(JNI_FALSE, |h| to_jboolean(h.shell.on_resume()))
}

/// `static native boolean nativePause()`: `true` means unregister the
/// accelerometer listener.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativePause<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    host().map_or(JNI_FALSE, |h| to_jboolean(h.shell.on_pause()))
}

/// `static native void nativeDestroy(Activity activity)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeDestroy<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    activity: JObject<'local>,
) {
    release_activity(&mut env, &activity);
    if let Some(host) = host() {
        host.shell.on_destroy();
    }
}

/// `static native boolean nativeBackPressed()`: `false` means the activity
/// should finish.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeBackPressed<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    let went_back = host().is_some_and(|h| h.shell.on_back_pressed() == BackAction::WentBack);
    to_jboolean(went_back)
}

/// `static native void nativeSplashShown()`: the splash asks Java to
/// dismiss it through `hideSplash()` once web code or the timer says so.
#[unsafe(no_mangle)]
pub extern "system" fn Java_dev_tether_NativeBridge_nativeSplashShown<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    if let Some(host) = host() {
        host.shell.register_splash(|| call_void("hideSplash", None));
    }
}
