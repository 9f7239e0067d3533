use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationReport;
use crate::challenge::{ChallengeKind, ChallengeOutcome, EdgePhase};
use crate::feedback::Cue;
use crate::storage::PlayRecord;

/// Every state change in a session, challenge or calibration produces an Event.
/// The CLI prints them; feedback sinks pick out the cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        t_ms: u64,
    },
    ShakeDetected {
        t_ms: u64,
        magnitude: f32,
        /// Running total after this shake.
        count: u32,
    },
    HeartRate {
        t_ms: u64,
        bpm: u32,
    },
    Cue {
        cue: Cue,
        t_ms: u64,
    },
    SessionFinished {
        record: PlayRecord,
    },
    /// Pre-start countdown, once per second.
    Countdown {
        seconds_left: u32,
        t_ms: u64,
    },
    ChallengeStarted {
        kind: ChallengeKind,
        t_ms: u64,
    },
    /// Edge challenge switched between milking and resting.
    PhaseChanged {
        phase: EdgePhase,
        round: u32,
        t_ms: u64,
    },
    ChallengeEnded {
        outcome: ChallengeOutcome,
        t_ms: u64,
    },
    CalibrationCompleted {
        report: CalibrationReport,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Event::ShakeDetected {
            t_ms: 10,
            magnitude: 2.0,
            count: 1,
        })
        .unwrap();
        assert_eq!(json["type"], "shake_detected");
        assert_eq!(json["count"], 1);

        let json = serde_json::to_value(Event::Cue {
            cue: Cue::StartTone,
            t_ms: 0,
        })
        .unwrap();
        assert_eq!(json["type"], "cue");
        assert_eq!(json["cue"], "start_tone");
    }
}
