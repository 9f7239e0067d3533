//! Tone and vibration cues.
//!
//! Sessions and challenges only decide *when* a cue fires; producing the
//! sound or the buzz is left to a [`FeedbackSink`].

use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Short acknowledgement tone once a session is clearly under way.
    StartTone,
    /// Longer tone when a session or challenge ends.
    EndTone,
    /// Single vibration pulse (frequency challenge cadence).
    VibratePulse,
}

impl Cue {
    pub fn duration_ms(&self) -> u64 {
        match self {
            Cue::StartTone => 120,
            Cue::EndTone => 180,
            Cue::VibratePulse => 40,
        }
    }

    /// Tones respect the sound preference; vibration always fires.
    pub fn is_tone(&self) -> bool {
        matches!(self, Cue::StartTone | Cue::EndTone)
    }
}

/// Sound preference applied to cues before they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackGate {
    pub sound_enabled: bool,
}

impl FeedbackGate {
    pub fn new(sound_enabled: bool) -> Self {
        Self { sound_enabled }
    }

    /// The cue as an event, or `None` when it is muted.
    pub fn cue(&self, cue: Cue, t_ms: u64) -> Option<Event> {
        if cue.is_tone() && !self.sound_enabled {
            return None;
        }
        Some(Event::Cue { cue, t_ms })
    }
}

pub trait FeedbackSink {
    fn play(&mut self, cue: Cue, t_ms: u64);
}

/// Writes cues to the log instead of hardware.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FeedbackSink for TracingSink {
    fn play(&mut self, cue: Cue, t_ms: u64) {
        tracing::info!(?cue, t_ms, duration_ms = cue.duration_ms(), "feedback");
    }
}

/// Keeps every cue, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cues: Vec<(Cue, u64)>,
}

impl FeedbackSink for RecordingSink {
    fn play(&mut self, cue: Cue, t_ms: u64) {
        self.cues.push((cue, t_ms));
    }
}

/// Forward every cue event to `sink`.
pub fn dispatch<S: FeedbackSink + ?Sized>(events: &[Event], sink: &mut S) {
    for event in events {
        if let Event::Cue { cue, t_ms } = event {
            sink.play(*cue, *t_ms);
        }
    }
}
