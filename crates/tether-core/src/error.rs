// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tether.
//
// The `Display` output of most variants is delivered verbatim to web code as
// the `error` field of a failed bridge response, so those variants print
// their message without a prefix.

use thiserror::Error;

/// Top-level error type for all Tether operations.
#[derive(Debug, Error)]
pub enum TetherError {
    // -- Bridge protocol --
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    #[error("duplicate bridge action: {0}")]
    DuplicateAction(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    // -- Platform --
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Cancelled(String),

    #[error("{0}")]
    Platform(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Encoding --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("QR code generation failed: {0}")]
    QrCode(String),

    // -- Storage / persistence --
    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TetherError {
    /// Shorthand for a payload validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Shorthand for a platform API failure.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TetherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_unprefixed() {
        let err = TetherError::invalid("Missing 'text' parameter");
        assert_eq!(err.to_string(), "Missing 'text' parameter");
    }

    #[test]
    fn handler_not_found_names_the_action() {
        let err = TetherError::HandlerNotFound("teleport".into());
        assert_eq!(err.to_string(), "Handler not found: teleport");
    }
}
