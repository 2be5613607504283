// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop data directory resolution.

use std::path::{Path, PathBuf};

/// Application data directory under `base`, created if needed.
///
/// `base` defaults to the XDG data directory. Android hosts pass the
/// activity's files directory to the shell instead.
pub fn data_dir(base: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = match base {
        Some(base) => base.to_path_buf(),
        None => xdg_data_home().join("tether"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn xdg_data_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
