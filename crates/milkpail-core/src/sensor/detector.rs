//! Shake detector.
//!
//! A magnitude threshold plus a debounce interval. The detector holds no
//! clock of its own: every sample carries a monotonic timestamp and the
//! caller feeds samples in order.
//!
//! ```text
//! magnitude > threshold && now - last_shake >= min_interval  =>  shake
//! ```

use serde::{Deserialize, Serialize};

use super::AccelSample;

pub const DEFAULT_ACCELERATION_THRESHOLD: f32 = 1.4;
pub const DEFAULT_TIME_THRESHOLD: f32 = 0.45;

/// Detector tuning: how hard and how often a shake must be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Magnitude a sample must exceed to count as a shake.
    pub acceleration_threshold: f32,
    /// Minimum seconds between two accepted shakes.
    pub time_threshold: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            acceleration_threshold: DEFAULT_ACCELERATION_THRESHOLD,
            time_threshold: DEFAULT_TIME_THRESHOLD,
        }
    }
}

impl Sensitivity {
    pub fn new(acceleration_threshold: f32, time_threshold: f32) -> Self {
        Self {
            acceleration_threshold,
            time_threshold,
        }
    }

    /// Debounce interval in whole milliseconds, never below 1.
    pub fn interval_ms(&self) -> u64 {
        let ms = (self.time_threshold * 1000.0).round();
        if ms < 1.0 {
            1
        } else {
            ms as u64
        }
    }
}

/// A shake accepted by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeEvent {
    pub t_ms: u64,
    pub magnitude: f32,
}

/// Euclidean norm of an acceleration vector.
pub fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    let (x, y, z) = (x as f64, y as f64, z as f64);
    (x * x + y * y + z * z).sqrt() as f32
}

#[derive(Debug, Clone)]
pub struct ShakeDetector {
    sensitivity: Sensitivity,
    last_shake_ms: Option<u64>,
    started: bool,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(Sensitivity::default())
    }
}

impl ShakeDetector {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            last_shake_ms: None,
            started: false,
        }
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Retune while running. The debounce window keeps its anchor.
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.sensitivity = sensitivity;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn last_shake_ms(&self) -> Option<u64> {
        self.last_shake_ms
    }

    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
    }

    /// Stop listening and forget the last shake.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.last_shake_ms = None;
        self.started = false;
    }

    /// Feed one sample. Returns the shake it completes, if any.
    pub fn process(&mut self, sample: &AccelSample) -> Option<ShakeEvent> {
        if !self.started {
            return None;
        }

        let magnitude = sample.magnitude();
        if magnitude <= self.sensitivity.acceleration_threshold {
            return None;
        }

        if let Some(last) = self.last_shake_ms {
            if sample.t_ms.saturating_sub(last) < self.sensitivity.interval_ms() {
                return None;
            }
        }

        self.last_shake_ms = Some(sample.t_ms);
        tracing::debug!(t_ms = sample.t_ms, magnitude, "shake accepted");
        Some(ShakeEvent {
            t_ms: sample.t_ms,
            magnitude,
        })
    }
}
