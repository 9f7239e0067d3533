//! Duration challenge: shake for as long as you like, stop when done.

use super::{Challenge, ChallengeKind, ChallengeOutcome, ChallengeStatus, Countdown};
use crate::events::Event;
use crate::feedback::{Cue, FeedbackGate};
use crate::sensor::{AccelSample, Sensitivity, ShakeDetector};

#[derive(Debug, Clone)]
pub struct DurationChallenge {
    gate: FeedbackGate,
    detector: ShakeDetector,
    status: ChallengeStatus,
    countdown: Option<Countdown>,
    running_since: u64,
    elapsed_secs: u32,
    shake_count: u32,
    outcome: Option<ChallengeOutcome>,
}

impl DurationChallenge {
    pub fn new(sensitivity: Sensitivity, sound_enabled: bool) -> Self {
        Self {
            gate: FeedbackGate::new(sound_enabled),
            detector: ShakeDetector::new(sensitivity),
            status: ChallengeStatus::Idle,
            countdown: None,
            running_since: 0,
            elapsed_secs: 0,
            shake_count: 0,
            outcome: None,
        }
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn shake_count(&self) -> u32 {
        self.shake_count
    }
}

impl Challenge for DurationChallenge {
    fn kind(&self) -> ChallengeKind {
        ChallengeKind::Duration
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
                self.countdown = None;
                self.status = ChallengeStatus::Running;
                self.running_since = started;
                self.detector.start();
                tracing::info!(t_ms = started, "duration challenge running");
                events.push(Event::ChallengeStarted {
                    kind: ChallengeKind::Duration,
                    t_ms: started,
                });
            }
        }

        if self.status == ChallengeStatus::Running {
            self.elapsed_secs = (now_ms.saturating_sub(self.running_since) / 1000) as u32;
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
            events.push(Event::ShakeDetected {
                t_ms: shake.t_ms,
                magnitude: shake.magnitude,
                count: self.shake_count,
            });
        }
        events
    }

    fn stop(&mut self, now_ms: u64) -> Vec<Event> {
        match self.status {
            ChallengeStatus::Running => {
                let mut events = self.advance(now_ms);
                self.status = ChallengeStatus::Ended;
                self.detector.stop();
                let outcome = ChallengeOutcome::Duration {
                    elapsed_secs: self.elapsed_secs,
                    shake_count: self.shake_count,
                };
                tracing::info!(?outcome, "duration challenge ended");
                events.extend(self.gate.cue(Cue::EndTone, now_ms));
                events.push(Event::ChallengeEnded {
                    outcome: outcome.clone(),
                    t_ms: now_ms,
                });
                self.outcome = Some(outcome);
                events
            }
            ChallengeStatus::Idle | ChallengeStatus::Countdown => {
                self.countdown = None;
                self.status = ChallengeStatus::Abandoned;
                tracing::info!("duration challenge abandoned");
                Vec::new()
            }
            ChallengeStatus::Ended | ChallengeStatus::Abandoned => Vec::new(),
        }
    }

    fn outcome(&self) -> Option<&ChallengeOutcome> {
        self.outcome.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shake(t_ms: u64) -> AccelSample {
        AccelSample {
            t_ms,
            x: 3.0,
            y: 0.0,
            z: 0.0,
        }
    }

    #[test]
    fn runs_until_stopped() {
        let mut c = DurationChallenge::new(Sensitivity::default(), true);
        c.start(0);
        for t in (6_000..20_000).step_by(1_000) {
            c.on_sample(&shake(t));
        }
        // long silence does not end it
        c.advance(60_000);
        assert_eq!(c.status(), ChallengeStatus::Running);

        let events = c.stop(66_500);
        assert_eq!(c.status(), ChallengeStatus::Ended);
        assert_eq!(
            c.outcome(),
            Some(&ChallengeOutcome::Duration {
                elapsed_secs: 60,
                shake_count: 14
            })
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Cue { cue: Cue::EndTone, .. })));
    }

    #[test]
    fn stop_during_countdown_abandons() {
        let mut c = DurationChallenge::new(Sensitivity::default(), true);
        c.start(0);
        assert!(c.stop(3_000).is_empty());
        assert_eq!(c.status(), ChallengeStatus::Abandoned);
        assert!(c.outcome().is_none());
    }
}
