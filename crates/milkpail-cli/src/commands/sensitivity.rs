use clap::{Subcommand, ValueEnum};
use milkpail_core::format::format_two_decimals;
use milkpail_core::Config;

use super::CommandResult;

#[derive(Clone, Copy, ValueEnum)]
pub enum Knob {
    /// Acceleration threshold, steps of 0.1
    Acceleration,
    /// Time threshold, steps of 0.01 s
    Time,
    /// Frequency challenge target, steps of 1
    Target,
}

#[derive(Subcommand)]
pub enum SensitivityAction {
    /// Show the current detector settings
    Show,
    /// Restore default detector settings
    Reset,
    /// Step a setting up or down, clamped to its range
    Nudge {
        #[arg(value_enum)]
        knob: Knob,
        /// Number of steps, negative to lower
        #[arg(allow_negative_numbers = true)]
        steps: i32,
    },
    /// Toggle start and end tones
    Sound,
}

fn show(config: &Config) {
    println!(
        "acceleration {}  time {}s  target {}/s  sound {}",
        format_two_decimals(config.sensitivity.acceleration_threshold),
        format_two_decimals(config.sensitivity.time_threshold),
        config.challenge.frequency_target,
        if config.sound_enabled() { "on" } else { "off" },
    );
}

pub fn run(action: SensitivityAction) -> CommandResult {
    let mut config = Config::load()?;

    match action {
        SensitivityAction::Show => {}
        SensitivityAction::Reset => {
            config.reset_sensitivity();
            config.save()?;
        }
        SensitivityAction::Nudge { knob, steps } => {
            match knob {
                Knob::Acceleration => {
                    config.nudge_acceleration(steps);
                }
                Knob::Time => {
                    config.nudge_time(steps);
                }
                Knob::Target => {
                    config.nudge_frequency_target(steps);
                }
            }
            config.save()?;
        }
        SensitivityAction::Sound => {
            config.toggle_sound();
            config.save()?;
        }
    }
    show(&config);
    Ok(())
}
