//! Per-cell job results and their decoding.
//!
//! The job service reports each finished job as either a JSON-encoded
//! string (`"{\"result\":\"100\",\"timestamp\":1}"`) or, for table
//! submissions, the object itself. Both shapes are normalized here into
//! a typed [`JobResult`] keyed by [`CellCoord`], so nothing downstream
//! ever branches on payload shape or splits key strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{SheetError, SheetResult};
use crate::types::CellCoord;

/// Decoded outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub result: String,
    /// Unix time the worker stored the result (0 when absent).
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl JobResult {
    pub fn new(result: impl Into<String>, timestamp: i64) -> Self {
        Self {
            result: result.into(),
            timestamp,
            trace_id: None,
        }
    }
}

/// Results of one status response after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedResults {
    pub entries: BTreeMap<CellCoord, JobResult>,
    /// Entries skipped because their key or payload could not be decoded.
    pub malformed: usize,
}

impl DecodedResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CellCoord, JobResult)> for DecodedResults {
    fn from_iter<I: IntoIterator<Item = (CellCoord, JobResult)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            malformed: 0,
        }
    }
}

/// Decode a single raw result entry.
pub fn decode_entry(raw: &Value) -> SheetResult<JobResult> {
    match raw {
        Value::String(text) => {
            serde_json::from_str(text).map_err(|e| SheetError::Decode(e.to_string()))
        }
        Value::Object(_) => {
            JobResult::deserialize(raw).map_err(|e| SheetError::Decode(e.to_string()))
        }
        other => Err(SheetError::Decode(format!(
            "expected a JSON string or object, got {other}"
        ))),
    }
}

/// Decode a raw `"row:col" -> entry` map.
///
/// Entries with an unparseable key or payload are logged and counted in
/// [`DecodedResults::malformed`]; they never abort the rest.
pub fn decode_results<'a, I>(raw: I) -> DecodedResults
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut decoded = DecodedResults::default();

    for (key, value) in raw {
        let entry = key
            .parse::<CellCoord>()
            .and_then(|coord| decode_entry(value).map(|result| (coord, result)));

        match entry {
            Ok((coord, result)) => {
                decoded.entries.insert(coord, result);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping malformed result entry");
                decoded.malformed += 1;
            }
        }
    }

    decoded
}

/// Accept integral or fractional JSON numbers; fractions are truncated.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|f| f as i64))
        .ok_or_else(|| serde::de::Error::custom("timestamp is not a representable number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn decode_string_encoded_entry() {
        let raw = json!("{\"result\":\"100\",\"timestamp\":1}");
        let decoded = decode_entry(&raw).unwrap();
        assert_eq!(decoded, JobResult::new("100", 1));
    }

    #[test]
    fn decode_object_entry_with_extra_fields() {
        let raw = json!({
            "result": "Paris",
            "timestamp": 1_700_000_000,
            "trace_id": "not-available",
            "status": "completed",
        });
        let decoded = decode_entry(&raw).unwrap();
        assert_eq!(decoded.result, "Paris");
        assert_eq!(decoded.timestamp, 1_700_000_000);
        assert_eq!(decoded.trace_id.as_deref(), Some("not-available"));
    }

    #[test]
    fn decode_fractional_timestamp_truncates() {
        let decoded = decode_entry(&json!({"result": "x", "timestamp": 12.9})).unwrap();
        assert_eq!(decoded.timestamp, 12);
    }

    #[test]
    fn decode_missing_timestamp_defaults_to_zero() {
        let decoded = decode_entry(&json!({"result": "x"})).unwrap();
        assert_eq!(decoded.timestamp, 0);
    }

    #[test]
    fn decode_rejects_bad_shapes() {
        assert_matches!(decode_entry(&json!("not json")), Err(SheetError::Decode(_)));
        assert_matches!(decode_entry(&json!({"timestamp": 1})), Err(SheetError::Decode(_)));
        assert_matches!(decode_entry(&json!({"result": 5})), Err(SheetError::Decode(_)));
        assert_matches!(decode_entry(&json!(42)), Err(SheetError::Decode(_)));
        assert_matches!(decode_entry(&Value::Null), Err(SheetError::Decode(_)));
    }

    #[test]
    fn decode_results_skips_malformed_and_keeps_the_rest() {
        let raw: serde_json::Map<String, Value> = serde_json::from_value(json!({
            "0:0": "{\"result\":\"a\",\"timestamp\":1}",
            "0:1": "{broken",
            "bad-key": "{\"result\":\"b\",\"timestamp\":1}",
            "1:0": {"result": "c", "timestamp": 2},
        }))
        .unwrap();

        let decoded = decode_results(&raw);

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.malformed, 2);
        assert_eq!(decoded.entries[&CellCoord::new(0, 0)].result, "a");
        assert_eq!(decoded.entries[&CellCoord::new(1, 0)].result, "c");
    }

    #[test]
    fn serialized_result_omits_missing_trace_id() {
        let json = serde_json::to_value(JobResult::new("x", 3)).unwrap();
        assert_eq!(json, json!({"result": "x", "timestamp": 3}));
    }
}
