// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client stub injected into every page.

use tether_core::config::BridgeConfig;

const TEMPLATE: &str = r#"(function() {
  if (window.__NS__ && window.__NS__._initialized) {
    return;
  }

  var callbacks = {};
  var callbackId = 0;

  window.__NS__ = {
    _platform: '__PLATFORM__',
    _initialized: true,
    _callbacks: callbacks,

    isNative: function() {
      return typeof window.__NATIVE__ !== 'undefined';
    },

    call: function(action, payload) {
      return new Promise(function(resolve, reject) {
        if (!window.__NATIVE__) {
          reject(new Error('__NATIVE__ not available'));
          return;
        }

        var id = ++callbackId;
        callbacks[id] = { resolve: resolve, reject: reject };

        try {
          var payloadStr = payload ? JSON.stringify(payload) : '';
          window.__NATIVE__.call(action, payloadStr, String(id));
        } catch (e) {
          delete callbacks[id];
          reject(e);
        }
      });
    },

    _handleResponse: function(id, success, data) {
      var callback = callbacks[id];
      if (!callback) {
        return;
      }
      delete callbacks[id];
      if (success) {
        callback.resolve(data);
      } else {
        callback.reject(new Error(data && data.error ? data.error : 'Unknown error'));
      }
    }
  };
})();"#;

/// Bootstrap script for `window.<namespace>`, calling through
/// `window.<native_object>.call(action, payload, id)`.
///
/// Safe to evaluate repeatedly: later evaluations keep the first instance
/// and its pending callbacks.
pub fn bootstrap_script(config: &BridgeConfig, platform: &str) -> String {
    TEMPLATE
        .replace("__NS__", &identifier(&config.namespace, "Tether"))
        .replace("__NATIVE__", &identifier(&config.native_object, "AndroidBridge"))
        .replace("__PLATFORM__", &identifier(platform, "unknown"))
}

/// Keep `name` only if it is a plain JavaScript identifier.
fn identifier(name: &str, fallback: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_owned()
    } else {
        tracing::warn!(name, fallback, "not a JavaScript identifier, using fallback");
        fallback.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_uses_configured_names() {
        let config = BridgeConfig {
            namespace: "Shell".into(),
            native_object: "NativeShell".into(),
            ..Default::default()
        };
        let script = bootstrap_script(&config, "android");
        assert!(script.contains("window.Shell = {"));
        assert!(script.contains("window.NativeShell.call(action, payloadStr, String(id));"));
        assert!(script.contains("'NativeShell not available'"));
        assert!(script.contains("_platform: 'android'"));
        assert!(!script.contains("__NS__"));
    }

    #[test]
    fn script_guards_against_double_installation() {
        let script = bootstrap_script(&BridgeConfig::default(), "android");
        assert!(script.starts_with("(function() {\n  if (window.Tether && window.Tether._initialized)"));
    }

    #[test]
    fn invalid_names_fall_back() {
        let config = BridgeConfig {
            namespace: "x'); alert(1); ('".into(),
            ..Default::default()
        };
        let script = bootstrap_script(&config, "desktop");
        assert!(script.contains("window.Tether = {"));
        assert!(!script.contains("alert(1)"));
    }
}
