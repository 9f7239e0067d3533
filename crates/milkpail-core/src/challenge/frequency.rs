//! Frequency challenge: keep shaking to a vibration metronome.
//!
//! While running, the watch buzzes every `max(1000 / target, 60)` ms. The
//! challenge ends once no shake has been seen for more than four seconds.

use super::{Challenge, ChallengeKind, ChallengeOutcome, ChallengeStatus, Countdown};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::feedback::{Cue, FeedbackGate};
use crate::sensor::{AccelSample, Sensitivity, ShakeDetector};
use crate::storage::FREQUENCY_TARGET_RANGE;

const MIN_PULSE_INTERVAL_MS: u64 = 60;
const IDLE_LIMIT_MS: u64 = super::IDLE_LIMIT_SECONDS as u64 * 1000;
/// Seconds subtracted from the result, roughly the idle time before giving up.
const GRACE_SECONDS: u32 = 3;

/// Target shakes per second, 1 to 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyTarget(u32);

impl FrequencyTarget {
    pub fn new(per_second: u32) -> Result<Self> {
        let (min, max) = FREQUENCY_TARGET_RANGE;
        if !(min..=max).contains(&per_second) {
            return Err(ValidationError::OutOfRange {
                field: "target",
                min: min as f64,
                max: max as f64,
                value: per_second as f64,
            }
            .into());
        }
        Ok(Self(per_second))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self((self.0 + 1).min(FREQUENCY_TARGET_RANGE.1))
    }

    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(FREQUENCY_TARGET_RANGE.0))
    }

    /// Metronome period.
    pub fn pulse_interval_ms(&self) -> u64 {
        (1000 / self.0.max(1) as u64).max(MIN_PULSE_INTERVAL_MS)
    }
}

impl Default for FrequencyTarget {
    fn default() -> Self {
        Self(FREQUENCY_TARGET_RANGE.0)
    }
}

/// Let the user feel a target before committing: vibration pulses at the
/// challenge cadence for `duration_ms`, no detector involved.
pub fn preview_pulses(target: FrequencyTarget, start_ms: u64, duration_ms: u64) -> Vec<Event> {
    let interval = target.pulse_interval_ms();
    (0..)
        .map(|i: u64| start_ms.saturating_add(i.saturating_mul(interval)))
        .take_while(|t| *t < start_ms.saturating_add(duration_ms))
        .map(|t_ms| Event::Cue {
            cue: Cue::VibratePulse,
            t_ms,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct FrequencyChallenge {
    target: FrequencyTarget,
    gate: FeedbackGate,
    detector: ShakeDetector,
    status: ChallengeStatus,
    countdown: Option<Countdown>,
    running_since: u64,
    last_shake_ms: u64,
    next_pulse_ms: u64,
    elapsed_secs: u32,
    shake_count: u32,
    outcome: Option<ChallengeOutcome>,
}

impl FrequencyChallenge {
    pub fn new(target: FrequencyTarget, sensitivity: Sensitivity, sound_enabled: bool) -> Self {
        Self {
            target,
            gate: FeedbackGate::new(sound_enabled),
            detector: ShakeDetector::new(sensitivity),
            status: ChallengeStatus::Idle,
            countdown: None,
            running_since: 0,
            last_shake_ms: 0,
            next_pulse_ms: 0,
            elapsed_secs: 0,
            shake_count: 0,
            outcome: None,
        }
    }

    pub fn target(&self) -> FrequencyTarget {
        self.target
    }

    pub fn shake_count(&self) -> u32 {
        self.shake_count
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    fn begin_running(&mut self, t_ms: u64, events: &mut Vec<Event>) {
        self.status = ChallengeStatus::Running;
        self.countdown = None;
        self.running_since = t_ms;
        self.last_shake_ms = t_ms;
        self.next_pulse_ms = t_ms;
        self.detector.start();
        tracing::info!(target_per_sec = self.target.get(), t_ms, "frequency challenge running");
        events.push(Event::ChallengeStarted {
            kind: ChallengeKind::Frequency,
            t_ms,
        });
    }

    fn end(&mut self, t_ms: u64, events: &mut Vec<Event>) {
        self.status = ChallengeStatus::Ended;
        self.detector.stop();
        let outcome = ChallengeOutcome::Frequency {
            target: self.target.get(),
            actual_secs: self.elapsed_secs.saturating_sub(GRACE_SECONDS),
            shake_count: self.shake_count,
        };
        tracing::info!(?outcome, "frequency challenge ended");
        events.extend(self.gate.cue(Cue::EndTone, t_ms));
        events.push(Event::ChallengeEnded {
            outcome: outcome.clone(),
            t_ms,
        });
        self.outcome = Some(outcome);
    }
}

impl Challenge for FrequencyChallenge {
    fn kind(&self) -> ChallengeKind {
        ChallengeKind::Frequency
    }

    fn status(&self) -> ChallengeStatus {
        self.status
    }

    fn start(&mut self, t_ms: u64) -> Vec<Event> {
        if self.status != ChallengeStatus::Idle {
            return Vec::new();
        }
        let (countdown, event) = Countdown::begin(t_ms);
        self.countdown = Some(countdown);
        self.status = ChallengeStatus::Countdown;
        vec![event]
    }

    fn advance(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(countdown) = self.countdown.as_mut() {
            if let Some(started) = countdown.advance(now_ms, &mut events) {
                self.begin_running(started, &mut events);
            }
        }

        let interval = self.target.pulse_interval_ms();
        while self.status == ChallengeStatus::Running && self.next_pulse_ms <= now_ms {
            let t = self.next_pulse_ms;
            self.elapsed_secs = ((t - self.running_since) / 1000) as u32;
            if t.saturating_sub(self.last_shake_ms) > IDLE_LIMIT_MS {
                self.end(t, &mut events);
                break;
            }
            events.extend(self.gate.cue(Cue::VibratePulse, t));
            self.next_pulse_ms = t.saturating_add(interval);
            if self.next_pulse_ms == t {
                break;
            }
        }

        events
    }

    fn on_sample(&mut self, sample: &AccelSample) -> Vec<Event> {
        let mut events = self.advance(sample.t_ms);
        if self.status != ChallengeStatus::Running {
            return events;
        }
        if let Some(shake) = self.detector.process(sample) {
            self.shake_count += 1;
            self.last_shake_ms = shake.t_ms;
            events.push(Event::ShakeDetected {
                t_ms: shake.t_ms,
                magnitude: shake.magnitude,
                count: self.shake_count,
            });
        }
        events
    }

    fn stop(&mut self, _now_ms: u64) -> Vec<Event> {
        if !self.status.is_over() {
            self.detector.stop();
            self.countdown = None;
            self.status = ChallengeStatus::Abandoned;
            tracing::info!("frequency challenge abandoned");
        }
        Vec::new()
    }

    fn outcome(&self) -> Option<&ChallengeOutcome> {
        self.outcome.as_ref()
    }
}
