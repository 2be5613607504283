// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The object currently hosting the bridge. On Android this is the Activity,
// which the system destroys and recreates (rotation, theme change, process
// restore) while the Rust side lives on.

use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct AttachedHost<T> {
    slot: RwLock<Option<T>>,
}

impl<T: Clone> AttachedHost<T> {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Make `host` current. Returns the host it replaced.
    pub fn attach(&self, host: T) -> Option<T> {
        self.slot.write().unwrap_or_else(|p| p.into_inner()).replace(host)
    }

    pub fn current(&self) -> Option<T> {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Detach the current host if `is_current` says it is the one going
    /// away. A host destroyed after its replacement attached leaves the
    /// replacement in place.
    pub fn release_if(&self, is_current: impl FnOnce(&T) -> bool) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        if slot.as_ref().is_some_and(is_current) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
