//! Sensor input: accelerometer samples, heart-rate events, and the filters
//! that turn them into shakes and bpm readings.

mod detector;
mod heart_rate;
mod source;

pub use detector::{
    magnitude, Sensitivity, ShakeDetector, ShakeEvent, DEFAULT_ACCELERATION_THRESHOLD,
    DEFAULT_TIME_THRESHOLD,
};
pub use heart_rate::HeartRateMonitor;
pub use source::{Capabilities, LogSource, SampleSource};

use serde::{Deserialize, Serialize};

/// One linear-acceleration sample stamped with a monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub t_ms: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub fn magnitude(&self) -> f32 {
        magnitude(self.x, self.y, self.z)
    }
}

/// A single line of a sensor recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorReading {
    Accel(AccelSample),
    HeartRate { t_ms: u64, values: Vec<f32> },
}

impl SensorReading {
    pub fn t_ms(&self) -> u64 {
        match self {
            SensorReading::Accel(s) => s.t_ms,
            SensorReading::HeartRate { t_ms, .. } => *t_ms,
        }
    }
}
