use std::path::{Path, PathBuf};

use clap::Subcommand;
use milkpail_core::challenge::preview_pulses;
use milkpail_core::{
    replay_challenge, Challenge, ChallengeOutcome, ChallengeStatus, Config, DurationChallenge,
    EdgeChallenge, FrequencyChallenge, FrequencyTarget,
};
use serde::Serialize;

use super::{emit_events, open_log, print_json, CommandResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Keep shaking to a vibration metronome
    Frequency {
        /// Sensor log (JSON lines), `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
        /// Shakes per second (1-30); remembered for next time
        #[arg(long)]
        target: Option<u32>,
        /// Print every event as a JSON line
        #[arg(long)]
        events: bool,
    },
    /// Feel a frequency target without running the detector
    Preview {
        /// Shakes per second (1-30); defaults to the last used target
        #[arg(long)]
        target: Option<u32>,
        /// How long to pulse
        #[arg(long, default_value_t = 3000)]
        millis: u64,
    },
    /// Alternate 10 s of milking and 5 s of rest
    Edge {
        /// Sensor log (JSON lines), `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
        /// Print every event as a JSON line
        #[arg(long)]
        events: bool,
    },
    /// Shake as long as you like
    Duration {
        /// Sensor log (JSON lines), `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
        /// Sample-clock time at which to stop (default: end of log)
        #[arg(long)]
        stop_at: Option<u64>,
        /// Print every event as a JSON line
        #[arg(long)]
        events: bool,
    },
}

#[derive(Serialize)]
struct ChallengeSummary {
    status: ChallengeStatus,
    outcome: Option<ChallengeOutcome>,
}

/// Use the requested target and remember it, or fall back to the last one.
fn target_from(
    config: &mut Config,
    requested: Option<u32>,
) -> Result<FrequencyTarget, Box<dyn std::error::Error>> {
    match requested {
        Some(value) => {
            let target = FrequencyTarget::new(value)?;
            config.challenge.frequency_target = target.get();
            config.save()?;
            Ok(target)
        }
        None => Ok(FrequencyTarget::new(config.challenge.frequency_target)?),
    }
}

fn run_replay<C: Challenge>(
    challenge: &mut C,
    input: &Path,
    stop_at: Option<u64>,
    echo: bool,
) -> CommandResult {
    let mut source = open_log(input)?;
    let run = replay_challenge(challenge, &mut source, stop_at)?;
    emit_events(&run.events, echo)?;
    print_json(&ChallengeSummary {
        status: challenge.status(),
        outcome: run.outcome,
    })
}

pub fn run(action: ChallengeAction) -> CommandResult {
    let mut config = Config::load()?;
    let sensitivity = config.sensitivity();
    let sound = config.sound_enabled();

    match action {
        ChallengeAction::Frequency {
            input,
            target,
            events,
        } => {
            let target = target_from(&mut config, target)?;
            let mut challenge = FrequencyChallenge::new(target, sensitivity, sound);
            run_replay(&mut challenge, &input, None, events)
        }
        ChallengeAction::Preview { target, millis } => {
            let target = target_from(&mut config, target)?;
            let pulses = preview_pulses(target, 0, millis);
            emit_events(&pulses, true)
        }
        ChallengeAction::Edge { input, events } => {
            let mut challenge = EdgeChallenge::new(sensitivity, sound);
            run_replay(&mut challenge, &input, None, events)
        }
        ChallengeAction::Duration {
            input,
            stop_at,
            events,
        } => {
            let mut challenge = DurationChallenge::new(sensitivity, sound);
            run_replay(&mut challenge, &input, stop_at, events)
        }
    }
}
