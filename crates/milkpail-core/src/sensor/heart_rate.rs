//! Heart-rate extraction.
//!
//! Vendor heart-rate sensors do not agree on which slot of the event
//! carries the bpm value. Slot 2 wins when it looks like a pulse; otherwise
//! the plausible value closest to the last reading is used.

const PLAUSIBLE_MIN: f32 = 25.0;
const PLAUSIBLE_MAX: f32 = 240.0;
const PREFERRED_MIN: f32 = 40.0;
const PREFERRED_MAX: f32 = 200.0;
const DEFAULT_TARGET_BPM: u32 = 90;

fn plausible(v: f32) -> bool {
    (PLAUSIBLE_MIN..=PLAUSIBLE_MAX).contains(&v)
}

fn preferred(v: f32) -> bool {
    (PREFERRED_MIN..=PREFERRED_MAX).contains(&v)
}

#[derive(Debug, Clone, Default)]
pub struct HeartRateMonitor {
    last_bpm: Option<u32>,
}

impl HeartRateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_bpm(&self) -> Option<u32> {
        self.last_bpm
    }

    /// Pick a bpm out of a raw event without updating state.
    pub fn extract(&self, values: &[f32]) -> Option<u32> {
        if let Some(&third) = values.get(2) {
            if plausible(third) {
                return Some(third.round() as u32);
            }
        }

        let candidates: Vec<f32> = values.iter().copied().filter(|v| plausible(*v)).collect();
        if candidates.is_empty() {
            return None;
        }

        let preferred_pool: Vec<f32> = candidates.iter().copied().filter(|v| preferred(*v)).collect();
        let pool = if preferred_pool.is_empty() {
            candidates
        } else {
            preferred_pool
        };

        let target = self.last_bpm.unwrap_or(DEFAULT_TARGET_BPM) as f32;
        pool.into_iter()
            .min_by(|a, b| {
                (a - target)
                    .abs()
                    .partial_cmp(&(b - target).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|v| v.round() as u32)
    }

    /// Extract and remember a reading. Returns the accepted bpm.
    pub fn accept(&mut self, values: &[f32]) -> Option<u32> {
        let bpm = self.extract(values)?;
        if bpm == 0 {
            return None;
        }
        self.last_bpm = Some(bpm);
        Some(bpm)
    }
}
