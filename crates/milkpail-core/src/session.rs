//! Free-play session.
//!
//! Like every engine in this crate the session is clock-driven by its
//! caller: sample timestamps advance time and nothing runs in the
//! background.
//!
//! ```text
//! Idle -> Running -> Finished
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::feedback::{Cue, FeedbackGate};
use crate::sensor::{
    AccelSample, HeartRateMonitor, SampleSource, SensorReading, Sensitivity,
    ShakeDetector,
};
use crate::storage::PlayRecord;

/// Shakes needed before the start tone plays.
pub const START_TONE_AFTER_SHAKES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone)]
pub struct PlaySession {
    state: SessionState,
    detector: ShakeDetector,
    heart: HeartRateMonitor,
    heart_rate_enabled: bool,
    gate: FeedbackGate,
    started_ms: u64,
    elapsed_secs: u32,
    shake_count: u32,
    heart_rates: Vec<u32>,
    start_tone_played: bool,
}

impl PlaySession {
    pub fn new(sensitivity: Sensitivity, sound_enabled: bool) -> Self {
        Self {
            state: SessionState::Idle,
            detector: ShakeDetector::new(sensitivity),
            heart: HeartRateMonitor::new(),
            heart_rate_enabled: true,
            gate: FeedbackGate::new(sound_enabled),
            started_ms: 0,
            elapsed_secs: 0,
            shake_count: 0,
            heart_rates: Vec::new(),
            start_tone_played: false,
        }
    }

    /// Disable heart-rate tracking (no sensor or no permission).
    pub fn with_heart_rate(mut self, enabled: bool) -> Self {
        self.heart_rate_enabled = enabled;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn shake_count(&self) -> u32 {
        self.shake_count
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn heart_rate_enabled(&self) -> bool {
        self.heart_rate_enabled
    }

    /// Latest bpm, or 0 when none has arrived.
    pub fn current_bpm(&self) -> u32 {
        self.heart.last_bpm().unwrap_or(0)
    }

    pub fn average_heart_rate(&self) -> f64 {
        if self.heart_rates.is_empty() {
            return 0.0;
        }
        self.heart_rates.iter().map(|&b| b as f64).sum::<f64>() / self.heart_rates.len() as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) a session. All counters are reset.
    pub fn start(&mut self, t_ms: u64) -> Vec<Event> {
        if self.state == SessionState::Running {
            return Vec::new();
        }
        self.state = SessionState::Running;
        self.started_ms = t_ms;
        self.elapsed_secs = 0;
        self.shake_count = 0;
        self.heart_rates.clear();
        self.heart = HeartRateMonitor::new();
        self.start_tone_played = false;
        self.detector.start();
        tracing::info!(t_ms, "play session started");
        vec![Event::SessionStarted { t_ms }]
    }

    /// Update the whole-second elapsed counter.
    pub fn tick(&mut self, now_ms: u64) {
        if self.state != SessionState::Running {
            return;
        }
        self.elapsed_secs = (now_ms.saturating_sub(self.started_ms) / 1000) as u32;
    }

    pub fn on_sample(&mut self, sample: &AccelSample) -> Vec<Event> {
        if self.state != SessionState::Running {
            return Vec::new();
        }
        self.tick(sample.t_ms);

        let Some(shake) = self.detector.process(sample) else {
            return Vec::new();
        };
        self.shake_count += 1;
        let mut events = vec![Event::ShakeDetected {
            t_ms: shake.t_ms,
            magnitude: shake.magnitude,
            count: self.shake_count,
        }];
        if self.shake_count >= START_TONE_AFTER_SHAKES && !self.start_tone_played {
            self.start_tone_played = true;
            events.extend(self.gate.cue(Cue::StartTone, shake.t_ms));
        }
        events
    }

    pub fn on_heart_rate(&mut self, t_ms: u64, values: &[f32]) -> Option<Event> {
        if self.state != SessionState::Running || !self.heart_rate_enabled {
            return None;
        }
        self.tick(t_ms);
        let bpm = self.heart.accept(values)?;
        self.heart_rates.push(bpm);
        Some(Event::HeartRate { t_ms, bpm })
    }

    pub fn on_reading(&mut self, reading: &SensorReading) -> Vec<Event> {
        match reading {
            SensorReading::Accel(sample) => self.on_sample(sample),
            SensorReading::HeartRate { t_ms, values } => {
                self.on_heart_rate(*t_ms, values).into_iter().collect()
            }
        }
    }

    /// End the session and build its record.
    ///
    /// `wall_clock_ms` stamps the record; `now_ms` is on the sample clock.
    ///
    /// # Errors
    /// Fails if the session is not running.
    pub fn finish(&mut self, now_ms: u64, wall_clock_ms: i64) -> Result<(PlayRecord, Vec<Event>)> {
        if self.state != SessionState::Running {
            return Err(ValidationError::InvalidState(format!(
                "cannot finish a session that is {:?}",
                self.state
            ))
            .into());
        }
        self.tick(now_ms);
        self.detector.stop();
        self.state = SessionState::Finished;

        let safe_elapsed = self.elapsed_secs.max(1);
        let record = PlayRecord {
            timestamp_millis: wall_clock_ms,
            spend_seconds: self.elapsed_secs as i32,
            count: self.shake_count as i32,
            frequency: self.shake_count as f64 / safe_elapsed as f64,
            heart_rate: self.average_heart_rate(),
        };
        tracing::info!(
            elapsed_secs = self.elapsed_secs,
            count = self.shake_count,
            "play session finished"
        );

        let mut events = Vec::new();
        events.extend(self.gate.cue(Cue::EndTone, now_ms));
        events.push(Event::SessionFinished {
            record: record.clone(),
        });
        Ok((record, events))
    }
}

/// Everything a replayed session produced.
#[derive(Debug, Clone)]
pub struct PlayOutcome {
    pub record: PlayRecord,
    pub events: Vec<Event>,
}

/// Run a whole session over a recording: start at the first reading, finish
/// at the last one.
///
/// # Errors
/// Fails with `SensorUnavailable` when the source has no accelerometer.
pub fn replay_session<S: SampleSource>(
    source: &mut S,
    sensitivity: Sensitivity,
    sound_enabled: bool,
    wall_clock_ms: i64,
) -> Result<PlayOutcome> {
    let capabilities = source.capabilities();
    capabilities.require_accelerometer()?;

    let mut session =
        PlaySession::new(sensitivity, sound_enabled).with_heart_rate(capabilities.heart_rate);
    let mut events = Vec::new();
    let mut last_t = None;

    while let Some(reading) = source.next_reading()? {
        let t = reading.t_ms();
        if last_t.is_none() {
            events.extend(session.start(t));
        }
        last_t = Some(t);
        events.extend(session.on_reading(&reading));
    }

    let end = last_t.unwrap_or(0);
    let (record, finish_events) = session.finish(end, wall_clock_ms)?;
    events.extend(finish_events);
    Ok(PlayOutcome { record, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::LogSource;

    fn shake(t_ms: u64) -> AccelSample {
        AccelSample {
            t_ms,
            x: 3.0,
            y: 0.0,
            z: 0.0,
        }
    }

    fn session() -> PlaySession {
        PlaySession::new(Sensitivity::default(), true)
    }

    #[test]
    fn ignores_input_before_start() {
        let mut s = session();
        assert!(s.on_sample(&shake(100)).is_empty());
        assert!(s.on_heart_rate(100, &[80.0]).is_none());
        assert_eq!(s.shake_count(), 0);
    }

    #[test]
    fn start_tone_after_third_shake_only_once() {
        let mut s = session();
        s.start(0);
        let mut tones = 0;
        for i in 0..6 {
            let events = s.on_sample(&shake(i * 500));
            tones += events
                .iter()
                .filter(|e| matches!(e, Event::Cue { cue: Cue::StartTone, .. }))
                .count();
            if i == 2 {
                assert_eq!(tones, 1);
            }
        }
        assert_eq!(tones, 1);
        assert_eq!(s.shake_count(), 6);
    }

    #[test]
    fn muted_session_has_no_tones() {
        let mut s = PlaySession::new(Sensitivity::default(), false);
        s.start(0);
        let mut events = Vec::new();
        for i in 0..4 {
            events.extend(s.on_sample(&shake(i * 500)));
        }
        let (_, end) = s.finish(2_000, 0).unwrap();
        events.extend(end);
        assert!(!events.iter().any(|e| matches!(e, Event::Cue { .. })));
    }

    #[test]
    fn record_uses_safe_elapsed_for_frequency() {
        let mut s = session();
        s.start(1_000);
        s.on_sample(&shake(1_000));
        s.on_sample(&shake(1_600));
        let (record, _) = s.finish(1_900, 42).unwrap();
        assert_eq!(record.spend_seconds, 0);
        assert_eq!(record.count, 2);
        assert_eq!(record.frequency, 2.0);
        assert_eq!(record.timestamp_millis, 42);
    }

    #[test]
    fn heart_rate_average() {
        let mut s = session();
        s.start(0);
        s.on_heart_rate(100, &[0.0, 0.0, 80.0]);
        s.on_heart_rate(200, &[0.0, 0.0, 90.0]);
        s.on_heart_rate(300, &[0.0, 0.0, 0.0]);
        let (record, _) = s.finish(10_000, 0).unwrap();
        assert_eq!(record.heart_rate, 85.0);
        assert_eq!(record.spend_seconds, 10);
    }

    #[test]
    fn heart_rate_disabled_records_zero() {
        let mut s = session().with_heart_rate(false);
        s.start(0);
        assert!(s.on_heart_rate(100, &[0.0, 0.0, 80.0]).is_none());
        let (record, _) = s.finish(5_000, 0).unwrap();
        assert_eq!(record.heart_rate, 0.0);
    }

    #[test]
    fn finish_twice_fails() {
        let mut s = session();
        s.start(0);
        s.finish(1_000, 0).unwrap();
        assert!(s.finish(2_000, 0).is_err());
    }

    #[test]
    fn replay_requires_accelerometer() {
        let mut src = LogSource::from_readings(vec![SensorReading::HeartRate {
            t_ms: 0,
            values: vec![80.0],
        }]);
        assert!(replay_session(&mut src, Sensitivity::default(), true, 0).is_err());
    }

    #[test]
    fn replay_counts_shakes_over_recording() {
        let mut readings: Vec<SensorReading> = (0..10)
            .map(|i| SensorReading::Accel(shake(i * 1_000)))
            .collect();
        readings.push(SensorReading::Accel(AccelSample {
            t_ms: 20_000,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }));
        let mut src = LogSource::from_readings(readings);
        let outcome = replay_session(&mut src, Sensitivity::default(), true, 7).unwrap();
        assert_eq!(outcome.record.count, 10);
        assert_eq!(outcome.record.spend_seconds, 20);
        assert_eq!(outcome.record.frequency, 0.5);
        assert!(matches!(
            outcome.events.last(),
            Some(Event::SessionFinished { .. })
        ));
    }
}
