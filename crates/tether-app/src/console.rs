// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless bridge console: one JSON request per input line, one JSON
// reply per output line.
//
//   {"action": "storage.set", "payload": {"key": "k", "value": "v"}}
//   {"action":"storage.set","success":true,"data":null}

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use tether_bridge::client::pump_responses;
use tether_bridge::{BridgeClient, LocalTransport, Transport, UiReceiver};
use tether_shell::Shell;

#[derive(Debug, Deserialize)]
pub struct ConsoleRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Run one input line. Blank lines and `#` comments produce no reply.
pub async fn handle_line<T: Transport>(client: &BridgeClient<T>, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let reply = match serde_json::from_str::<ConsoleRequest>(line) {
        Ok(request) => match client.call(&request.action, request.payload.as_ref()).await {
            Ok(data) => json!({ "action": request.action, "success": true, "data": data }),
            Err(e) => json!({ "action": request.action, "success": false, "error": e.to_string() }),
        },
        Err(e) => json!({ "success": false, "error": format!("Invalid request: {e}") }),
    };
    Some(reply)
}

/// Serve `input` until it ends.
pub async fn run<R, W>(
    shell: &Shell,
    responses: UiReceiver,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let client = Arc::new(BridgeClient::new(LocalTransport::new(Arc::clone(
        shell.dispatcher(),
    ))));
    let pump = tokio::spawn(pump_responses(Arc::clone(&client), responses));

    let mut lines = input.lines();
    let mut served = 0usize;
    while let Some(line) = lines.next_line().await? {
        let Some(reply) = handle_line(&client, &line).await else {
            continue;
        };
        served += 1;
        output.write_all(format!("{reply}\n").as_bytes()).await?;
        output.flush().await?;
    }

    pump.abort();
    tracing::info!(served, "console input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tether_bridge::PlatformBridge;
    use tether_bridge::platform::stub::StubBridge;
    use tether_core::{AppConfig, SplashConfig};
    use tokio::io::BufReader;
    use tokio::runtime::Handle;

    use super::*;

    async fn serve(input: &str) -> Vec<Value> {
        let platform: Arc<dyn PlatformBridge> = Arc::new(StubBridge::in_memory().expect("stub"));
        let (shell, responses) = Shell::new(
            AppConfig::default(),
            SplashConfig::default(),
            platform,
            Handle::current(),
        )
        .expect("shell");

        let mut output = Vec::new();
        run(&shell, responses, BufReader::new(input.as_bytes()), &mut output)
            .await
            .expect("served");
        String::from_utf8(output)
            .expect("utf-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn storage_round_trip() {
        let replies = serve(concat!(
            "# comment\n",
            r#"{"action":"storage.set","payload":{"key":"theme","value":"dark"}}"#,
            "\n\n",
            r#"{"action":"storage.get","payload":{"key":"theme"}}"#,
            "\n",
        ))
        .await;
        assert_eq!(
            replies,
            [
                json!({ "action": "storage.set", "success": true, "data": null }),
                json!({ "action": "storage.get", "success": true, "data": { "value": "dark" } }),
            ]
        );
    }

    #[tokio::test]
    async fn failures_are_reported_per_line() {
        let replies = serve(concat!(
            r#"{"action":"nope"}"#,
            "\n",
            "not json\n",
            r#"{"action":"storage.get"}"#,
            "\n",
        ))
        .await;
        assert_eq!(replies.len(), 3);
        assert_eq!(
            replies[0],
            json!({ "action": "nope", "success": false, "error": "Handler not found: nope" })
        );
        assert_eq!(replies[1]["success"], false);
        assert!(
            replies[1]["error"]
                .as_str()
                .expect("message")
                .starts_with("Invalid request:")
        );
        assert_eq!(replies[2]["error"], "Missing key parameter");
    }
}
