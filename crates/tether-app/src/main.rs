// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether desktop host.
//
// Runs the same bridge the Android shell embeds, either as a line-oriented
// JSON console on stdin/stdout or (with the `desktop` feature) inside a
// Dioxus window.
//
//   tether [--data-dir DIR] [--desktop]

mod console;
mod data_dir;
#[cfg(feature = "desktop")]
mod desktop;

use std::path::PathBuf;
use std::sync::Arc;

use tether_bridge::platform::platform_bridge;
use tether_core::{AppConfig, SplashConfig};
use tether_shell::Shell;

#[derive(Debug, Default)]
struct Args {
    data_dir: Option<PathBuf>,
    desktop: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = args.next().ok_or("--data-dir needs a path")?;
                parsed.data_dir = Some(PathBuf::from(dir));
            }
            "--desktop" => parsed.desktop = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(parsed)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Tether starting");

    let args = parse_args(std::env::args().skip(1))?;
    let dir = data_dir::data_dir(args.data_dir.as_deref())?;
    #[allow(unused_mut)]
    let mut config = AppConfig::load_or_default(&dir);
    let splash = SplashConfig::load(&dir);

    #[cfg(feature = "desktop")]
    if args.desktop {
        config.bridge.native_object = desktop::NATIVE_OBJECT.into();
    }
    #[cfg(not(feature = "desktop"))]
    if args.desktop {
        return Err("built without the `desktop` feature".into());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let platform = platform_bridge(&dir)?;
    let (shell, responses) = Shell::new(config, splash, platform, runtime.handle().clone())?;
    let shell = Arc::new(shell);
    tracing::info!(data_dir = %dir.display(), start_url = %shell.start_url(), "shell ready");

    #[cfg(feature = "desktop")]
    if args.desktop {
        desktop::launch(Arc::clone(&shell), responses);
        shell.on_destroy();
        return Ok(());
    }

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    runtime.block_on(console::run(&shell, responses, input, tokio::io::stdout()))?;
    shell.on_destroy();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_parse() {
        let parsed = args(&["--desktop", "--data-dir", "/tmp/t"]).expect("valid");
        assert!(parsed.desktop);
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/t")));
        assert!(!args(&[]).expect("empty").desktop);
    }

    #[test]
    fn bad_flags_are_rejected() {
        assert_eq!(args(&["--data-dir"]).unwrap_err(), "--data-dir needs a path");
        assert_eq!(args(&["--verbose"]).unwrap_err(), "unknown argument: --verbose");
    }
}
