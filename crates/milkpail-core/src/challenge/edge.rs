//! Edge challenge: alternate 10 s of milking with 5 s of rest.
//!
//! Shakes only count while milking. Four milking seconds in a row without a
//! new shake end the challenge; the result is the number of full rounds
//! completed before that.

use serde::{Deserialize, Serialize};

use super::{
    Challenge, ChallengeKind, ChallengeOutcome, ChallengeStatus, Countdown, IDLE_LIMIT_SECONDS,
};
use crate::events::Event;
use crate::feedback::{Cue, FeedbackGate};
use crate::sensor::{AccelSample, Sensitivity, ShakeDetector};

pub const MILKING_SECONDS: u32 = 10;
pub const RESTING_SECONDS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePhase {
    Milking,
    Resting,
}

impl EdgePhase {
    pub fn seconds(&self) -> u32 {
        match self {
            EdgePhase::Milking => MILKING_SECONDS,
            EdgePhase::Resting => RESTING_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeChallenge {
    gate: FeedbackGate,
    detector: ShakeDetector,
    status: ChallengeStatus,
    countdown: Option<Countdown>,
    next_tick_ms: u64,
    phase: EdgePhase,
    phase_seconds_left: u32,
    round: u32,
    idle_seconds: u32,
    count_at_last_tick: u32,
    shake_count: u32,
    outcome: Option<ChallengeOutcome>,
}

impl EdgeChallenge {
    pub fn new(sensitivity: Sensitivity, sound_enabled: bool) -> Self {
        Self {
            gate: FeedbackGate::new(sound_enabled),
            detector: ShakeDetector::new(sensitivity),
            status: ChallengeStatus::Idle,
            countdown: None,
            next_tick_ms: 0,
            phase: EdgePhase::Milking,
            phase_seconds_left: MILKING_SECONDS,
            round: 1,
            idle_seconds: 0,
            count_at_last_tick: 0,
            shake_count: 0,
            outcome: None,
        }
    }

    pub fn phase(&self) -> EdgePhase {
        self.phase
    }

    pub fn phase_seconds_left(&self) -> u32 {
        self.phase_seconds_left
    }

    /// Current round, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn shake_count(&self) -> u32 {
        self.shake_count
    }

    fn begin_running(&mut self, t_ms: u64, events: &mut Vec<Event>) {
        self.status = ChallengeStatus::Running;
        self.countdown = None;
        self.next_tick_ms = t_ms.saturating_add(1000);
        self.detector.start();
        tracing::info!(t_ms, "edge challenge running");
        events.push(Event::ChallengeStarted {
            kind: ChallengeKind::Edge,
            t_ms,
        });
        events.push(Event::PhaseChanged {
            phase: self.phase,
            round: self.round,
            t_ms,
        });
    }

    /// One second of running time.
    fn tick(&mut self, t_ms: u64, events: &mut Vec<Event>) {
        if self.phase == EdgePhase::Milking {
            if self.shake_count == self.count_at_last_tick {
                self.idle_seconds += 1;
            } else {
                self.idle_seconds = 0;
            }
            self.count_at_last_tick = self.shake_count;
            if self.idle_seconds >= IDLE_LIMIT_SECONDS {
                self.end(t_ms, events);
                return;
            }
        }

        self.phase_seconds_left = self.phase_seconds_left.saturating_sub(1);
        if self.phase_seconds_left > 0 {
            return;
        }

        self.phase = match self.phase {
            EdgePhase::Milking => EdgePhase::Resting,
            EdgePhase::Resting => {
                self.round += 1;
                self.idle_seconds = 0;
                self.count_at_last_tick = self.shake_count;
                EdgePhase::Milking
            }
        };
        self.phase_seconds_left = self.phase.seconds();
        tracing::debug!(phase = ?self.phase, round = self.round, t_ms, "edge phase changed");
        events.push(Event::PhaseChanged {
            phase: self.phase,
            round: self.round,
            t_ms,
        });
    }

    fn end(&mut self, t_ms: u64, events: &mut Vec<Event>) {
        self.status = ChallengeStatus::Ended;
        self.detector.stop();
        let outcome = ChallengeOutcome::Edge {
            rounds: self.round.saturating_sub(1),
            shake_count: self.shake_count,
        };
        tracing::info!(?outcome, "edge challenge ended");
        events.extend(self.gate.cue(Cue::EndTone, t_ms));
        events.push(Event::ChallengeEnded {
            outcome: outcome.clone(),
            t_ms,
        });
        self.outcome = Some(outcome);
    }
}

impl Challenge for EdgeChallenge {
    fn kind(&self) -> ChallengeKind {
        ChallengeKind::Edge
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

        while self.status == ChallengeStatus::Running && self.next_tick_ms <= now_ms {
            let t = self.next_tick_ms;
            self.tick(t, &mut events);
            self.next_tick_ms = t.saturating_add(1000);
            if self.next_tick_ms == t {
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
        // The detector keeps its rhythm through rest; only milking shakes count.
        if let Some(shake) = self.detector.process(sample) {
            if self.phase == EdgePhase::Milking {
                self.shake_count += 1;
                events.push(Event::ShakeDetected {
                    t_ms: shake.t_ms,
                    magnitude: shake.magnitude,
                    count: self.shake_count,
                });
            }
        }
        events
    }

    fn stop(&mut self, _now_ms: u64) -> Vec<Event> {
        if !self.status.is_over() {
            self.detector.stop();
            self.countdown = None;
            self.status = ChallengeStatus::Abandoned;
            tracing::info!("edge challenge abandoned");
        }
        Vec::new()
    }

    fn outcome(&self) -> Option<&ChallengeOutcome> {
        self.outcome.as_ref()
    }
}
