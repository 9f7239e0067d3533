//! Min / max / average over a field of a record set.

use serde::{Deserialize, Serialize};

use crate::storage::PlayRecord;

/// Statistics for an integer field. The average truncates toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntStats {
    pub max: i32,
    pub min: i32,
    pub average: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DoubleStats {
    pub max: f64,
    pub min: f64,
    pub average: f64,
}

impl IntStats {
    /// All zeros for an empty set.
    pub fn of<F>(records: &[PlayRecord], field: F) -> Self
    where
        F: Fn(&PlayRecord) -> i32,
    {
        if records.is_empty() {
            return Self::default();
        }
        let values: Vec<i32> = records.iter().map(field).collect();
        let sum: i64 = values.iter().map(|&v| v as i64).sum();
        Self {
            max: values.iter().copied().max().unwrap_or(0),
            min: values.iter().copied().min().unwrap_or(0),
            average: (sum / values.len() as i64) as i32,
        }
    }
}

impl DoubleStats {
    /// All zeros for an empty set.
    pub fn of<F>(records: &[PlayRecord], field: F) -> Self
    where
        F: Fn(&PlayRecord) -> f64,
    {
        if records.is_empty() {
            return Self::default();
        }
        let values: Vec<f64> = records.iter().map(field).collect();
        Self {
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            average: values.iter().sum::<f64>() / values.len() as f64,
        }
    }
}
