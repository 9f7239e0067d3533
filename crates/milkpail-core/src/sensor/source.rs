//! Sensor reading sources.
//!
//! A source yields readings in timestamp order. [`LogSource`] replays a
//! recorded JSON-lines log, one [`SensorReading`] per line:
//!
//! ```text
//! {"type":"accel","t_ms":1000,"x":0.1,"y":1.9,"z":0.3}
//! {"type":"heart_rate","t_ms":1200,"values":[0.0,0.0,88.0]}
//! ```

use std::collections::VecDeque;
use std::io::BufRead;

use super::SensorReading;
use crate::error::{CoreError, Result, SensorKind};

/// Which sensors a device (or a recording of one) provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub accelerometer: bool,
    pub heart_rate: bool,
}

impl Capabilities {
    /// Fails with [`CoreError::SensorUnavailable`] when shakes cannot be detected.
    pub fn require_accelerometer(&self) -> Result<()> {
        if self.accelerometer {
            Ok(())
        } else {
            Err(CoreError::SensorUnavailable {
                sensor: SensorKind::Accelerometer,
            })
        }
    }
}

pub trait SampleSource {
    fn capabilities(&self) -> Capabilities;

    /// Next reading, or `None` once the source is exhausted.
    fn next_reading(&mut self) -> Result<Option<SensorReading>>;
}

/// Replays a recorded sensor log.
#[derive(Debug, Clone, Default)]
pub struct LogSource {
    readings: VecDeque<SensorReading>,
    capabilities: Capabilities,
}

impl LogSource {
    /// Parse a whole log. Blank lines are skipped; anything else that does
    /// not decode is reported with its 1-based line number.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut readings = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let reading: SensorReading =
                serde_json::from_str(trimmed).map_err(|e| CoreError::MalformedLog {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            readings.push(reading);
        }
        Ok(Self::from_readings(readings))
    }

    /// Build a source from in-memory readings. Capabilities reflect what
    /// the readings contain: a recording without accelerometer data came
    /// from a device without one.
    pub fn from_readings(readings: Vec<SensorReading>) -> Self {
        let capabilities = Capabilities {
            accelerometer: readings
                .iter()
                .any(|r| matches!(r, SensorReading::Accel(_))),
            heart_rate: readings
                .iter()
                .any(|r| matches!(r, SensorReading::HeartRate { .. })),
        };
        let mut readings = readings;
        readings.sort_by_key(|r| r.t_ms());
        Self {
            readings: readings.into(),
            capabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl SampleSource for LogSource {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn next_reading(&mut self) -> Result<Option<SensorReading>> {
        Ok(self.readings.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::AccelSample;

    #[test]
    fn parses_mixed_log() {
        let log = "\
{\"type\":\"accel\",\"t_ms\":10,\"x\":0.1,\"y\":0.2,\"z\":0.3}

{\"type\":\"heart_rate\",\"t_ms\":5,\"values\":[0.0,0.0,80.0]}
";
        let mut src = LogSource::from_reader(log.as_bytes()).unwrap();
        assert_eq!(src.len(), 2);
        assert!(src.capabilities().accelerometer);
        assert!(src.capabilities().heart_rate);
        // sorted by timestamp
        assert_eq!(src.next_reading().unwrap().unwrap().t_ms(), 5);
        assert_eq!(src.next_reading().unwrap().unwrap().t_ms(), 10);
        assert!(src.next_reading().unwrap().is_none());
    }

    #[test]
    fn reports_bad_line_number() {
        let log = "{\"type\":\"accel\",\"t_ms\":1,\"x\":0,\"y\":0,\"z\":0}\nnot json\n";
        let err = LogSource::from_reader(log.as_bytes()).unwrap_err();
        match err {
            CoreError::MalformedLog { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn heart_rate_only_log_has_no_accelerometer() {
        let src = LogSource::from_readings(vec![SensorReading::HeartRate {
            t_ms: 0,
            values: vec![70.0],
        }]);
        assert!(matches!(
            src.capabilities().require_accelerometer(),
            Err(CoreError::SensorUnavailable {
                sensor: SensorKind::Accelerometer
            })
        ));
    }

    #[test]
    fn accel_only_log_disables_heart_rate() {
        let src = LogSource::from_readings(vec![SensorReading::Accel(AccelSample {
            t_ms: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        })]);
        assert!(src.capabilities().require_accelerometer().is_ok());
        assert!(!src.capabilities().heart_rate);
    }
}
