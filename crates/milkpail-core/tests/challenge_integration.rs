//! Integration tests for challenges replayed from sensor logs.

use milkpail_core::{
    replay_challenge, AccelSample, Challenge, ChallengeOutcome, ChallengeStatus,
    DurationChallenge, EdgeChallenge, Event, FrequencyChallenge, FrequencyTarget, LogSource,
    SensorReading, Sensitivity,
};

fn accel(t_ms: u64, x: f32) -> SensorReading {
    SensorReading::Accel(AccelSample {
        t_ms,
        x,
        y: 0.0,
        z: 0.0,
    })
}

fn source(shake_times: impl IntoIterator<Item = u64>, tail: u64) -> LogSource {
    let mut readings = vec![accel(0, 0.0)];
    readings.extend(shake_times.into_iter().map(|t| accel(t, 3.0)));
    readings.push(accel(tail, 0.0));
    LogSource::from_readings(readings)
}

#[test]
fn test_frequency_challenge_runs_out_after_log() {
    let mut src = source((6_000..=8_000).step_by(500), 8_100);
    let mut challenge = FrequencyChallenge::new(
        FrequencyTarget::new(1).unwrap(),
        Sensitivity::default(),
        true,
    );

    let run = replay_challenge(&mut challenge, &mut src, None).unwrap();
    assert_eq!(
        run.outcome,
        Some(ChallengeOutcome::Frequency {
            target: 1,
            actual_secs: 4,
            shake_count: 5,
        })
    );

    let countdowns = run
        .events
        .iter()
        .filter(|e| matches!(e, Event::Countdown { .. }))
        .count();
    assert_eq!(countdowns, 6);
    assert!(matches!(
        run.events.last(),
        Some(Event::ChallengeEnded { t_ms: 13_000, .. })
    ));
}

#[test]
fn test_edge_challenge_without_shakes() {
    let mut src = source(std::iter::empty(), 1_000);
    let mut challenge = EdgeChallenge::new(Sensitivity::default(), false);

    let run = replay_challenge(&mut challenge, &mut src, None).unwrap();
    assert_eq!(challenge.status(), ChallengeStatus::Ended);
    assert_eq!(
        run.outcome,
        Some(ChallengeOutcome::Edge {
            rounds: 0,
            shake_count: 0
        })
    );
}

#[test]
fn test_duration_challenge_stops_where_asked() {
    let mut src = source((6_000..=10_000).step_by(1_000), 20_000);
    let mut challenge = DurationChallenge::new(Sensitivity::default(), true);

    let run = replay_challenge(&mut challenge, &mut src, Some(15_500)).unwrap();
    assert_eq!(
        run.outcome,
        Some(ChallengeOutcome::Duration {
            elapsed_secs: 9,
            shake_count: 5
        })
    );
}

#[test]
fn test_duration_challenge_stops_at_end_of_log() {
    let mut src = source((6_000..=10_000).step_by(1_000), 20_000);
    let mut challenge = DurationChallenge::new(Sensitivity::default(), true);

    let run = replay_challenge(&mut challenge, &mut src, None).unwrap();
    assert_eq!(
        run.outcome,
        Some(ChallengeOutcome::Duration {
            elapsed_secs: 14,
            shake_count: 5
        })
    );
}

#[test]
fn test_log_shorter_than_countdown_abandons_duration() {
    let mut src = source(std::iter::empty(), 3_000);
    let mut challenge = DurationChallenge::new(Sensitivity::default(), true);

    let run = replay_challenge(&mut challenge, &mut src, None).unwrap();
    assert!(run.outcome.is_none());
    assert_eq!(challenge.status(), ChallengeStatus::Abandoned);
}

#[test]
fn test_challenge_events_serialize_with_tags() {
    let event = Event::ChallengeEnded {
        outcome: ChallengeOutcome::Duration {
            elapsed_secs: 3,
            shake_count: 7,
        },
        t_ms: 42,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "challenge_ended");
    assert_eq!(json["outcome"]["kind"], "duration");
    assert_eq!(json["outcome"]["shake_count"], 7);
}
