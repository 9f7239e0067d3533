//! Play records and their flat JSON encoding.
//!
//! The whole history is one JSON array stored under a single key. Loading
//! never fails: a corrupt blob reads as an empty history and missing fields
//! read as zero.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One finished free-play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    /// Wall-clock end of the session, ms since the Unix epoch.
    pub timestamp_millis: i64,
    pub spend_seconds: i32,
    pub count: i32,
    /// Shakes per second.
    pub frequency: f64,
    /// Average bpm, 0 when no heart rate was available.
    pub heart_rate: f64,
}

fn field_i64(obj: &serde_json::Map<String, Value>, key: &str) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn field_f64(obj: &serde_json::Map<String, Value>, key: &str) -> f64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Decode a stored history blob.
pub fn decode_records(raw: &str) -> Vec<PlayRecord> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("stored records are not a JSON array, treating as empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored records are corrupt, treating as empty");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| PlayRecord {
            timestamp_millis: field_i64(obj, "timestampMillis"),
            spend_seconds: field_i64(obj, "spendSeconds") as i32,
            count: field_i64(obj, "count") as i32,
            frequency: field_f64(obj, "frequency"),
            heart_rate: field_f64(obj, "heartRate"),
        })
        .collect()
}

/// Encode a history for storage.
pub fn encode_records(records: &[PlayRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_field_names() {
        let rec = PlayRecord {
            timestamp_millis: 1,
            spend_seconds: 2,
            count: 3,
            frequency: 1.5,
            heart_rate: 80.0,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["timestampMillis"], 1);
        assert_eq!(json["spendSeconds"], 2);
        assert_eq!(json["heartRate"], 80.0);
    }

    #[test]
    fn corrupt_blob_is_empty() {
        assert!(decode_records("{not json").is_empty());
        assert!(decode_records("{\"a\":1}").is_empty());
    }

    #[test]
    fn skips_non_objects_and_defaults_missing_fields() {
        let raw = r#"[1, "x", {"count": 7}, {"timestampMillis": 5, "frequency": 0.5}]"#;
        let records = decode_records(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].count, 7);
        assert_eq!(records[0].timestamp_millis, 0);
        assert_eq!(records[0].heart_rate, 0.0);
        assert_eq!(records[1].timestamp_millis, 5);
        assert_eq!(records[1].frequency, 0.5);
    }
}
