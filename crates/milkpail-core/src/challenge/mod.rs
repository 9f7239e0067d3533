//! Timed challenges.
//!
//! Each challenge is a clock-driven state machine sharing the same outer
//! shape:
//!
//! ```text
//! Idle -> Countdown (6 s) -> Running -> Ended
//!                 \______________\____-> Abandoned
//! ```
//!
//! Time only moves through [`Challenge::advance`] and the timestamps of the
//! samples fed to [`Challenge::on_sample`].

mod duration;
mod edge;
mod frequency;

pub use duration::DurationChallenge;
pub use edge::{EdgeChallenge, EdgePhase, MILKING_SECONDS, RESTING_SECONDS};
pub use frequency::{preview_pulses, FrequencyChallenge, FrequencyTarget};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::Event;
use crate::sensor::{AccelSample, SampleSource, SensorReading};

pub const COUNTDOWN_SECONDS: u32 = 6;

/// Seconds without a shake after which a self-ending challenge gives up.
pub const IDLE_LIMIT_SECONDS: u32 = 4;

/// Upper bound on how long a replay keeps the clock running after the
/// recording ends, waiting for a challenge to end on its own.
const RUN_OUT_LIMIT_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Frequency,
    Edge,
    Duration,
}

impl ChallengeKind {
    /// Frequency and edge challenges end when the user stops shaking;
    /// a duration challenge runs until stopped.
    pub fn ends_on_its_own(&self) -> bool {
        matches!(self, ChallengeKind::Frequency | ChallengeKind::Edge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Idle,
    Countdown,
    Running,
    Ended,
    Abandoned,
}

impl ChallengeStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, ChallengeStatus::Ended | ChallengeStatus::Abandoned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeOutcome {
    Frequency {
        target: u32,
        /// Running time minus the grace seconds spent idle before giving up.
        actual_secs: u32,
        shake_count: u32,
    },
    Edge {
        /// Full milking + resting rounds survived.
        rounds: u32,
        shake_count: u32,
    },
    Duration {
        elapsed_secs: u32,
        shake_count: u32,
    },
}

pub trait Challenge {
    fn kind(&self) -> ChallengeKind;

    fn status(&self) -> ChallengeStatus;

    /// Begin the countdown.
    fn start(&mut self, t_ms: u64) -> Vec<Event>;

    /// Move the clock forward without a sample.
    fn advance(&mut self, now_ms: u64) -> Vec<Event>;

    /// Move the clock to the sample and feed it to the detector.
    fn on_sample(&mut self, sample: &AccelSample) -> Vec<Event>;

    /// The user ends the challenge. Only a running duration challenge
    /// produces a result this way; anything else is abandoned.
    fn stop(&mut self, now_ms: u64) -> Vec<Event>;

    fn outcome(&self) -> Option<&ChallengeOutcome>;
}

/// Pre-start countdown, announcing each second.
#[derive(Debug, Clone)]
pub(crate) struct Countdown {
    started_ms: u64,
    seconds: u32,
    announced: u32,
}

impl Countdown {
    pub(crate) fn begin(started_ms: u64) -> (Self, Event) {
        let countdown = Self {
            started_ms,
            seconds: COUNTDOWN_SECONDS,
            announced: COUNTDOWN_SECONDS,
        };
        let event = Event::Countdown {
            seconds_left: COUNTDOWN_SECONDS,
            t_ms: started_ms,
        };
        (countdown, event)
    }

    pub(crate) fn ends_at(&self) -> u64 {
        self.started_ms.saturating_add(self.seconds as u64 * 1000)
    }

    /// Announce every second passed by `now_ms`. Returns the running start
    /// time once the countdown is over.
    pub(crate) fn advance(&mut self, now_ms: u64, events: &mut Vec<Event>) -> Option<u64> {
        while self.announced > 1 {
            let t = self
                .started_ms
                .saturating_add((self.seconds - self.announced + 1) as u64 * 1000);
            if t > now_ms {
                break;
            }
            self.announced -= 1;
            events.push(Event::Countdown {
                seconds_left: self.announced,
                t_ms: t,
            });
        }
        (now_ms >= self.ends_at()).then(|| self.ends_at())
    }
}

/// Everything a replayed challenge produced.
#[derive(Debug, Clone)]
pub struct ChallengeRun {
    pub events: Vec<Event>,
    pub outcome: Option<ChallengeOutcome>,
}

/// Drive a challenge over a recording.
///
/// The countdown starts at the first reading. Heart-rate readings only
/// advance the clock. When `stop_at` is given the user stops there;
/// otherwise a self-ending challenge is given time to end on its own after
/// the recording runs out and a duration challenge is stopped at the last
/// reading.
///
/// # Errors
/// Fails with `SensorUnavailable` when the source has no accelerometer.
pub fn replay_challenge<C, S>(
    challenge: &mut C,
    source: &mut S,
    stop_at: Option<u64>,
) -> Result<ChallengeRun>
where
    C: Challenge + ?Sized,
    S: SampleSource,
{
    source.capabilities().require_accelerometer()?;

    let mut events = Vec::new();
    let mut last_t: Option<u64> = None;

    while let Some(reading) = source.next_reading()? {
        let t = reading.t_ms();
        if let Some(stop) = stop_at {
            if t > stop {
                break;
            }
        }
        if last_t.is_none() {
            events.extend(challenge.start(t));
        }
        last_t = Some(t);
        match &reading {
            SensorReading::Accel(sample) => events.extend(challenge.on_sample(sample)),
            SensorReading::HeartRate { .. } => events.extend(challenge.advance(t)),
        }
        if challenge.status().is_over() {
            break;
        }
    }

    let last = last_t.unwrap_or(0);
    if !challenge.status().is_over() {
        match stop_at {
            Some(stop) => {
                events.extend(challenge.advance(stop));
                events.extend(challenge.stop(stop));
            }
            None if challenge.kind().ends_on_its_own() => {
                let mut t = last;
                let limit = last.saturating_add(RUN_OUT_LIMIT_MS);
                while !challenge.status().is_over() && t < limit {
                    t = t.saturating_add(1000);
                    events.extend(challenge.advance(t));
                }
                if !challenge.status().is_over() {
                    events.extend(challenge.stop(t));
                }
            }
            None => events.extend(challenge.stop(last)),
        }
    }

    Ok(ChallengeRun {
        events,
        outcome: challenge.outcome().cloned(),
    })
}
