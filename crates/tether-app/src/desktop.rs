// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop window host. The Dioxus WebView plays the part of the Android
// WebView: page calls go out through `dioxus.send`, response statements
// come back through `dioxus.recv` and are evaluated in page scope.

use std::sync::{Arc, Mutex};

use dioxus::desktop::{Config, WindowBuilder};
use dioxus::prelude::*;
use serde::Deserialize;
use serde_json::Value;

use tether_bridge::UiReceiver;
use tether_shell::Shell;

/// Native object name the desktop shim installs in the page.
pub const NATIVE_OBJECT: &str = "TetherDesktop";

#[derive(Clone)]
struct DesktopHost {
    shell: Arc<Shell>,
    responses: Arc<Mutex<Option<UiReceiver>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesktopCall {
    action: String,
    payload: String,
    callback_id: String,
}

/// Open the window and block until it closes.
pub fn launch(shell: Arc<Shell>, responses: UiReceiver) {
    let host = DesktopHost {
        shell,
        responses: Arc::new(Mutex::new(Some(responses))),
    };

    LaunchBuilder::desktop()
        .with_cfg(Config::new().with_window(WindowBuilder::new().with_title("Tether")))
        .with_context(host)
        .launch(app);
}

fn shim(bootstrap: &str) -> String {
    format!(
        r#"
window.{NATIVE_OBJECT} = {{
  call: function (action, payload, callbackId) {{
    dioxus.send({{ action: action, payload: payload, callbackId: callbackId }});
  }}
}};
{bootstrap}
while (true) {{
  const script = await dioxus.recv();
  (0, eval)(script);
}}
"#
    )
}

fn app() -> Element {
    let host = use_context::<DesktopHost>();
    let mut log = use_signal(Vec::<String>::new);

    use_hook(move || {
        let bootstrap = host.shell.on_page_finished("tether://desktop").to_owned();
        let channel = document::eval(&shim(&bootstrap));

        let calls_shell = Arc::clone(&host.shell);
        let mut calls = channel.clone();
        spawn(async move {
            while let Ok(call) = calls.recv::<DesktopCall>().await {
                tracing::debug!(action = %call.action, "desktop call");
                calls_shell.handle_call(&call.action, &call.payload, &call.callback_id);
            }
        });

        let taken = host.responses.lock().ok().and_then(|mut slot| slot.take());
        if let Some(mut responses) = taken {
            let shell = Arc::clone(&host.shell);
            let replies = channel;
            spawn(async move {
                while let Some(response) = responses.recv().await {
                    if let Err(e) = replies.send(Value::String(shell.render_response(&response))) {
                        tracing::warn!(error = ?e, "page went away, dropping responses");
                        break;
                    }
                }
            });
        }
    });

    let run = move |action: &'static str, payload: &'static str| {
        spawn(async move {
            let script = format!(
                "return await window.Tether.call('{action}', {payload})\
                 .then(d => ({{ ok: true, data: d }}), e => ({{ ok: false, data: String(e && e.message || e) }}));"
            );
            let line = match document::eval(&script).join::<Value>().await {
                Ok(result) => format!("{action}: {result}"),
                Err(e) => format!("{action}: eval failed: {e:?}"),
            };
            log.write().insert(0, line);
        });
    };

    rsx! {
        div { style: "font-family: sans-serif; padding: 16px;",
            h1 { "Tether" }
            p { style: "color: #666;", "Bridge calls from this page go through the native dispatcher." }

            div { style: "display: flex; flex-wrap: wrap; gap: 8px; margin: 16px 0;",
                button { onclick: move |_| run("device.info", "null"), "Device info" }
                button { onclick: move |_| run("app.version", "null"), "App version" }
                button {
                    onclick: move |_| run("storage.set", "{ key: 'greeting', value: 'hello' }"),
                    "Store greeting"
                }
                button {
                    onclick: move |_| run("storage.get", "{ key: 'greeting' }"),
                    "Read greeting"
                }
                button { onclick: move |_| run("network.status", "null"), "Network" }
                button { onclick: move |_| run("teleport", "null"), "Unknown action" }
            }

            h3 { "Responses" }
            ul { style: "font-family: monospace; font-size: 13px;",
                for (i, line) in log.read().iter().enumerate() {
                    li { key: "{i}", "{line}" }
                }
            }
        }
    }
}
