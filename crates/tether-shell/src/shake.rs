// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shake gesture detection from raw accelerometer samples.

use std::sync::Mutex;
use std::time::Duration;

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Acceleration above gravity, in m/s², that counts as a shake.
pub const SHAKE_THRESHOLD: f32 = 12.0;

/// Minimum spacing between two reported shakes.
pub const SHAKE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct ShakeState {
    listening: bool,
    last_shake: Option<Duration>,
}

/// Turns accelerometer samples into shake events.
///
/// The host owns the sensor subscription; `start` and `stop` report whether
/// it has to register or unregister its listener, so repeated lifecycle
/// callbacks never double-register.
#[derive(Debug, Default)]
pub struct ShakeDetector {
    state: Mutex<ShakeState>,
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin listening. Returns `true` if the sensor listener must be
    /// registered now.
    pub fn start(&self) -> bool {
        let mut state = self.state();
        if state.listening {
            return false;
        }
        state.listening = true;
        tracing::debug!("shake detection started");
        true
    }

    /// Stop listening. Returns `true` if the sensor listener must be
    /// unregistered now.
    pub fn stop(&self) -> bool {
        let mut state = self.state();
        if !state.listening {
            return false;
        }
        state.listening = false;
        tracing::debug!("shake detection stopped");
        true
    }

    pub fn is_listening(&self) -> bool {
        self.state().listening
    }

    /// Feed one sample in m/s². `at` is the sample's monotonic timestamp.
    /// Returns `true` when the sample completes a shake.
    pub fn on_sample(&self, x: f32, y: f32, z: f32, at: Duration) -> bool {
        let acceleration = (x * x + y * y + z * z).sqrt() - STANDARD_GRAVITY;
        if acceleration <= SHAKE_THRESHOLD {
            return false;
        }

        let mut state = self.state();
        if !state.listening {
            return false;
        }
        if let Some(last) = state.last_shake
            && at.saturating_sub(last) <= SHAKE_DEBOUNCE
        {
            return false;
        }
        state.last_shake = Some(at);
        tracing::debug!(acceleration, "shake detected");
        true
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ShakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn listening() -> ShakeDetector {
        let detector = ShakeDetector::new();
        assert!(detector.start());
        detector
    }

    #[test]
    fn resting_device_is_not_a_shake() {
        let detector = listening();
        assert!(!detector.on_sample(0.0, 0.0, STANDARD_GRAVITY, ms(0)));
        assert!(!detector.on_sample(0.0, 0.0, STANDARD_GRAVITY + SHAKE_THRESHOLD - 0.5, ms(10)));
    }

    #[test]
    fn strong_sample_is_a_shake() {
        let detector = listening();
        assert!(detector.on_sample(15.0, 15.0, 9.8, ms(1_000)));
    }

    #[test]
    fn shakes_are_debounced() {
        let detector = listening();
        assert!(detector.on_sample(30.0, 0.0, 0.0, ms(1_000)));
        assert!(!detector.on_sample(30.0, 0.0, 0.0, ms(1_200)));
        assert!(!detector.on_sample(30.0, 0.0, 0.0, ms(1_500)));
        assert!(detector.on_sample(30.0, 0.0, 0.0, ms(1_501)));
    }

    #[test]
    fn samples_are_ignored_while_stopped() {
        let detector = ShakeDetector::new();
        assert!(!detector.on_sample(30.0, 0.0, 0.0, ms(1_000)));
        assert!(detector.start());
        assert!(detector.on_sample(30.0, 0.0, 0.0, ms(2_000)));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let detector = ShakeDetector::new();
        assert!(detector.start());
        assert!(!detector.start());
        assert!(detector.is_listening());
        assert!(detector.stop());
        assert!(!detector.stop());
        assert!(!detector.is_listening());
    }
}
