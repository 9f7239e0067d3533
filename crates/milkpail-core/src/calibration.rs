//! Sensitivity calibration.
//!
//! The user shakes at their natural rhythm for 15 seconds while a very
//! permissive detector runs. Afterwards the magnitude distribution gives a
//! threshold and the rhythm of detected shakes gives a debounce interval:
//!
//! ```text
//! threshold = clamp(p50 + 0.45 * (p90 - p50), 0.8, 4.0)
//! interval  = clamp(median(gaps in [0.05, 2.0] s) * 0.55, 0.18, 1.0)
//! ```
//!
//! Whichever half lacks data keeps the current value.
//!
//! Test mode ([`replay_detection`]) runs a recording through the detector
//! with candidate settings, without saving anything.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::Event;
use crate::sensor::{AccelSample, SampleSource, SensorReading, Sensitivity, ShakeDetector};

pub const CALIBRATION_SECONDS: u32 = 15;
pub const MIN_MAGNITUDE_SAMPLES: usize = 40;
pub const MIN_SHAKE_TIMESTAMPS: usize = 3;

/// Detector settings while recording, low enough to catch every candidate.
pub const RECORDING_SENSITIVITY: Sensitivity = Sensitivity {
    acceleration_threshold: 0.35,
    time_threshold: 0.12,
};

const THRESHOLD_WEIGHT: f32 = 0.45;
const THRESHOLD_CLAMP: (f32, f32) = (0.8, 4.0);
const GAP_WINDOW_SECS: (f32, f32) = (0.05, 2.0);
const MIN_GAP_SECS: f32 = 0.01;
const INTERVAL_FACTOR: f32 = 0.55;
const INTERVAL_CLAMP: (f32, f32) = (0.18, 1.0);

/// Value at `ratio` of an ascending slice, without interpolation.
pub fn percentile(sorted: &[f32], ratio: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (ratio.clamp(0.0, 1.0) * (sorted.len() - 1) as f32) as usize;
    sorted[index]
}

pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Derive detector settings from a recorded session.
pub fn suggest_sensitivity(
    magnitudes: &[f32],
    shake_timestamps_ms: &[u64],
    current: Sensitivity,
) -> Sensitivity {
    if magnitudes.len() < MIN_MAGNITUDE_SAMPLES {
        return current;
    }

    let mut sorted = magnitudes.to_vec();
    sorted.sort_by(f32::total_cmp);
    let p50 = percentile(&sorted, 0.50);
    let p90 = percentile(&sorted, 0.90);
    let acceleration =
        (p50 + (p90 - p50) * THRESHOLD_WEIGHT).clamp(THRESHOLD_CLAMP.0, THRESHOLD_CLAMP.1);

    if shake_timestamps_ms.len() < MIN_SHAKE_TIMESTAMPS {
        return Sensitivity::new(acceleration, current.time_threshold);
    }

    let gaps: Vec<f32> = shake_timestamps_ms
        .windows(2)
        .map(|w| (w[1].saturating_sub(w[0]) as f32 / 1000.0).max(MIN_GAP_SECS))
        .filter(|gap| (GAP_WINDOW_SECS.0..=GAP_WINDOW_SECS.1).contains(gap))
        .collect();
    if gaps.is_empty() {
        return Sensitivity::new(acceleration, current.time_threshold);
    }

    let interval = (median(&gaps) * INTERVAL_FACTOR).clamp(INTERVAL_CLAMP.0, INTERVAL_CLAMP.1);
    Sensitivity::new(acceleration, interval)
}

/// Outcome of a completed calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub previous: Sensitivity,
    pub suggestion: Sensitivity,
    /// Number of magnitude samples recorded.
    pub samples: usize,
    /// Number of shakes the recording detector saw.
    pub shakes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Recording { started_ms: u64 },
    Done,
}

/// A 15-second guided recording.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    current: Sensitivity,
    detector: ShakeDetector,
    magnitudes: Vec<f32>,
    shake_timestamps_ms: Vec<u64>,
    phase: Phase,
}

impl CalibrationSession {
    /// `current` is what the suggestion falls back to.
    pub fn new(current: Sensitivity) -> Self {
        Self {
            current,
            detector: ShakeDetector::new(RECORDING_SENSITIVITY),
            magnitudes: Vec::new(),
            shake_timestamps_ms: Vec::new(),
            phase: Phase::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Begin recording. Ignored while already recording.
    pub fn start(&mut self, t_ms: u64) {
        if self.is_recording() {
            return;
        }
        self.magnitudes.clear();
        self.shake_timestamps_ms.clear();
        self.detector.start();
        self.phase = Phase::Recording { started_ms: t_ms };
        tracing::info!(t_ms, "calibration started");
    }

    /// Whole seconds left, counting down once per elapsed second.
    pub fn seconds_left(&self, now_ms: u64) -> u32 {
        match self.phase {
            Phase::Recording { started_ms } => {
                let elapsed = (now_ms.saturating_sub(started_ms) / 1000) as u32;
                CALIBRATION_SECONDS.saturating_sub(elapsed)
            }
            Phase::Idle | Phase::Done => 0,
        }
    }

    /// Advance the clock. Returns the completion event once time is up.
    pub fn advance(&mut self, now_ms: u64) -> Option<Event> {
        if self.is_recording() && self.seconds_left(now_ms) == 0 {
            let report = self.finish();
            return Some(Event::CalibrationCompleted { report });
        }
        None
    }

    /// Record one sample. A sample at or past the deadline ends the run
    /// before it is counted.
    pub fn on_sample(&mut self, sample: &AccelSample) -> Option<Event> {
        if let Some(done) = self.advance(sample.t_ms) {
            return Some(done);
        }
        if !self.is_recording() {
            return None;
        }
        self.magnitudes.push(sample.magnitude());
        if let Some(shake) = self.detector.process(sample) {
            self.shake_timestamps_ms.push(shake.t_ms);
        }
        None
    }

    /// Stop recording and compute the suggestion from whatever was captured.
    pub fn finish(&mut self) -> CalibrationReport {
        self.detector.stop();
        self.phase = Phase::Done;
        let suggestion =
            suggest_sensitivity(&self.magnitudes, &self.shake_timestamps_ms, self.current);
        tracing::info!(
            samples = self.magnitudes.len(),
            shakes = self.shake_timestamps_ms.len(),
            acceleration = suggestion.acceleration_threshold,
            interval = suggestion.time_threshold,
            "calibration finished"
        );
        CalibrationReport {
            previous: self.current,
            suggestion,
            samples: self.magnitudes.len(),
            shakes: self.shake_timestamps_ms.len(),
        }
    }

    /// Abandon the run and discard what was recorded.
    pub fn cancel(&mut self) {
        self.detector.stop();
        self.magnitudes.clear();
        self.shake_timestamps_ms.clear();
        self.phase = Phase::Idle;
    }
}

/// Run a recording through a calibration session. Heart-rate readings are
/// ignored. A recording shorter than the calibration window finishes with
/// whatever was captured.
///
/// # Errors
/// Fails with `SensorUnavailable` when the source has no accelerometer.
pub fn replay_calibration<S: SampleSource>(
    source: &mut S,
    current: Sensitivity,
) -> Result<CalibrationReport> {
    source.capabilities().require_accelerometer()?;

    let mut session = CalibrationSession::new(current);
    while let Some(reading) = source.next_reading()? {
        let SensorReading::Accel(sample) = reading else {
            continue;
        };
        if !session.is_recording() {
            session.start(sample.t_ms);
        }
        if let Some(Event::CalibrationCompleted { report }) = session.on_sample(&sample) {
            return Ok(report);
        }
    }

    tracing::warn!("recording ended before the calibration window closed");
    Ok(session.finish())
}

/// Result of a test-mode run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub sensitivity: Sensitivity,
    pub samples: usize,
    pub shakes: u32,
    pub peak_magnitude: f32,
    /// Last raw sample seen.
    pub last: Option<AccelSample>,
}

/// Count shakes over a recording with the given settings.
///
/// # Errors
/// Fails with `SensorUnavailable` when the source has no accelerometer.
pub fn replay_detection<S: SampleSource>(
    source: &mut S,
    sensitivity: Sensitivity,
) -> Result<(DetectionSummary, Vec<Event>)> {
    source.capabilities().require_accelerometer()?;

    let mut detector = ShakeDetector::new(sensitivity);
    detector.start();
    let mut summary = DetectionSummary {
        sensitivity,
        ..DetectionSummary::default()
    };
    let mut events = Vec::new();

    while let Some(reading) = source.next_reading()? {
        let SensorReading::Accel(sample) = reading else {
            continue;
        };
        summary.samples += 1;
        summary.peak_magnitude = summary.peak_magnitude.max(sample.magnitude());
        summary.last = Some(sample);
        if let Some(shake) = detector.process(&sample) {
            summary.shakes += 1;
            events.push(Event::ShakeDetected {
                t_ms: shake.t_ms,
                magnitude: shake.magnitude,
                count: summary.shakes,
            });
        }
    }
    detector.stop();

    Ok((summary, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Sensitivity {
        Sensitivity::new(1.4, 0.45)
    }

    #[test]
    fn percentile_uses_floor_index() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert_eq!(percentile(&sorted, 0.9), 4.0);
        assert_eq!(percentile(&sorted, 1.5), 5.0);
        assert_eq!(percentile(&sorted, -1.0), 1.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn too_few_samples_keeps_current() {
        let mags = vec![2.0; 39];
        assert_eq!(suggest_sensitivity(&mags, &[0, 500, 1000], current()), current());
    }

    #[test]
    fn threshold_from_percentiles() {
        // 0.0 .. 9.9 in 100 steps: p50 = 4.9, p90 = 8.9
        let mags: Vec<f32> = (0..100).map(|i| i as f32 / 10.0).collect();
        let s = suggest_sensitivity(&mags, &[], current());
        let expected = (4.9f32 + (8.9 - 4.9) * 0.45).clamp(0.8, 4.0);
        assert!((s.acceleration_threshold - expected).abs() < 1e-5);
        assert_eq!(s.acceleration_threshold, 4.0);
        assert_eq!(s.time_threshold, 0.45);
    }

    #[test]
    fn threshold_clamped_low() {
        let mags = vec![0.1; 50];
        let s = suggest_sensitivity(&mags, &[], current());
        assert_eq!(s.acceleration_threshold, 0.8);
    }

    #[test]
    fn interval_from_median_gap() {
        let mags = vec![2.0; 40];
        let s = suggest_sensitivity(&mags, &[0, 400, 800, 1400], current());
        // gaps 0.4, 0.4, 0.6 -> median 0.4 -> 0.22
        assert!((s.acceleration_threshold - 2.0).abs() < 1e-6);
        assert!((s.time_threshold - 0.22).abs() < 1e-6);
    }

    #[test]
    fn gaps_outside_window_are_ignored() {
        let mags = vec![2.0; 40];
        // gaps 0.02 (too short), 3.0 (too long)
        let s = suggest_sensitivity(&mags, &[0, 20, 3020], current());
        assert_eq!(s.time_threshold, 0.45);
    }

    #[test]
    fn interval_clamped() {
        let mags = vec![2.0; 40];
        let fast = suggest_sensitivity(&mags, &[0, 100, 200, 300], current());
        assert_eq!(fast.time_threshold, 0.18);
        let slow = suggest_sensitivity(&mags, &[0, 1900, 3800], current());
        assert_eq!(slow.time_threshold, 1.0);
    }

    fn accel(t_ms: u64, x: f32) -> AccelSample {
        AccelSample {
            t_ms,
            x,
            y: 0.0,
            z: 0.0,
        }
    }

    #[test]
    fn session_finishes_after_fifteen_seconds() {
        let mut session = CalibrationSession::new(current());
        session.start(1_000);
        assert_eq!(session.seconds_left(1_000), 15);
        assert_eq!(session.seconds_left(2_500), 14);

        // 50 Hz, a 2.0 spike every 500 ms
        let mut done = None;
        let mut t = 1_000;
        while done.is_none() {
            let x = if (t - 1_000) % 500 == 0 { 2.0 } else { 0.2 };
            done = session.on_sample(&accel(t, x));
            t += 20;
        }
        assert!(session.is_done());
        let report = match done {
            Some(Event::CalibrationCompleted { report }) => report,
            other => panic!("unexpected: {other:?}"),
        };
        // samples from 1000..16000 exclusive
        assert_eq!(report.samples, 750);
        assert_eq!(report.shakes, 30);
        // gap 0.5 s -> 0.275
        assert!((report.suggestion.time_threshold - 0.275).abs() < 1e-5);
        assert_eq!(report.previous, current());
    }

    #[test]
    fn replay_short_recording_finishes_early() {
        use crate::sensor::LogSource;

        let readings = (0..60)
            .map(|i| SensorReading::Accel(accel(i * 20, if i % 25 == 0 { 2.0 } else { 0.2 })))
            .collect();
        let mut src = LogSource::from_readings(readings);
        let report = replay_calibration(&mut src, current()).unwrap();
        assert_eq!(report.samples, 60);
        assert_eq!(report.shakes, 3);
    }

    #[test]
    fn detection_counts_with_given_settings() {
        use crate::sensor::LogSource;

        let readings = vec![
            SensorReading::Accel(accel(0, 2.0)),
            SensorReading::Accel(accel(100, 2.0)),
            SensorReading::HeartRate {
                t_ms: 150,
                values: vec![80.0],
            },
            SensorReading::Accel(accel(600, 4.0)),
        ];
        let mut src = LogSource::from_readings(readings.clone());
        let (summary, events) = replay_detection(&mut src, Sensitivity::new(1.4, 0.45)).unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.shakes, 2);
        assert_eq!(summary.peak_magnitude, 4.0);
        assert_eq!(events.len(), 2);

        let mut src = LogSource::from_readings(readings);
        let (loose, _) = replay_detection(&mut src, Sensitivity::new(1.4, 0.05)).unwrap();
        assert_eq!(loose.shakes, 3);
    }

    #[test]
    fn cancel_discards_data() {
        let mut session = CalibrationSession::new(current());
        session.start(0);
        session.on_sample(&accel(10, 2.0));
        session.cancel();
        assert!(!session.is_recording());
        assert!(session.advance(20_000).is_none());
        let report = session.finish();
        assert_eq!(report.samples, 0);
        assert_eq!(report.suggestion, current());
    }
}
