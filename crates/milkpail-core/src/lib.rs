//! # Milkpail Core Library
//!
//! Core logic for Milkpail, a shake-counting game for wrist wearables. All
//! operations are exposed through the standalone `milkpail` CLI, which
//! replays recorded sensor logs through the same engines a device would
//! drive live.
//!
//! ## Architecture
//!
//! - **Sensor**: Shake detection over accelerometer samples, heart-rate
//!   extraction, and the [`SampleSource`] seam for where samples come from
//! - **Engines**: Free play, calibration and the three challenges are
//!   clock-driven state machines; callers feed timestamped samples and get
//!   [`Event`]s back
//! - **Storage**: SQLite key-value store for play records and TOML
//!   configuration
//! - **Stats**: Reports, daily averages and the weekly verdict
//!
//! ## Key Components
//!
//! - [`ShakeDetector`]: Threshold + debounce shake detector
//! - [`PlaySession`]: Free-play session producing a [`PlayRecord`]
//! - [`CalibrationSession`]: Suggests detector settings from a recording
//! - [`Challenge`]: Frequency, edge and duration challenges
//! - [`Database`]: Record persistence
//! - [`Config`]: Application configuration management

pub mod calibration;
pub mod challenge;
pub mod error;
pub mod events;
pub mod feedback;
pub mod format;
pub mod sensor;
pub mod session;
pub mod stats;
pub mod storage;

pub use calibration::{
    replay_calibration, replay_detection, suggest_sensitivity, CalibrationReport,
    CalibrationSession, DetectionSummary,
};
pub use challenge::{
    replay_challenge, Challenge, ChallengeKind, ChallengeOutcome, ChallengeStatus,
    DurationChallenge, EdgeChallenge, EdgePhase, FrequencyChallenge, FrequencyTarget,
};
pub use error::{ConfigError, CoreError, DatabaseError, SensorKind, ValidationError};
pub use events::Event;
pub use feedback::{Cue, FeedbackGate, FeedbackSink};
pub use sensor::{
    AccelSample, Capabilities, HeartRateMonitor, LogSource, SampleSource, SensorReading,
    Sensitivity, ShakeDetector, ShakeEvent,
};
pub use session::{replay_session, PlayOutcome, PlaySession, SessionState};
pub use stats::{Overview, Report, ReportPeriod, Title, WeeklyVerdict};
pub use storage::{Config, Database, PlayRecord};
