//! Aggregate records: one timing report tagged with its origin.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::RunKey;

/// One entry of the aggregate document.
///
/// Serialized as `{"runMethod": ..., "benchmark": ..., "hyperfine": ...}`.
/// The `hyperfine` payload is the timing tool's report embedded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRecord {
    pub run_method: String,
    pub benchmark: String,
    pub hyperfine: Value,
}

impl AggregateRecord {
    pub fn new(key: RunKey, hyperfine: Value) -> Self {
        Self {
            run_method: key.run_method,
            benchmark: key.benchmark,
            hyperfine,
        }
    }

    pub fn key(&self) -> RunKey {
        RunKey::new(self.benchmark.clone(), self.run_method.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_field_names_and_order() {
        let record = AggregateRecord::new(RunKey::new("fib", "m2"), json!({"x": 1}));
        let encoded = serde_json::to_string(&record).unwrap();
        assert_eq!(
            encoded,
            r#"{"runMethod":"m2","benchmark":"fib","hyperfine":{"x":1}}"#
        );
    }

    #[test]
    fn test_record_key() {
        let record = AggregateRecord::new(RunKey::new("a", "b"), Value::Null);
        assert_eq!(record.key(), RunKey::new("a", "b"));
    }

    #[test]
    fn test_payload_preserves_key_order() {
        let payload: Value =
            serde_json::from_str(r#"{"results":[{"mean":1.5,"command":"./a"}]}"#).unwrap();
        let record = AggregateRecord::new(RunKey::new("a", "b"), payload);
        let encoded = serde_json::to_string(&record.hyperfine).unwrap();
        assert_eq!(encoded, r#"{"results":[{"mean":1.5,"command":"./a"}]}"#);
    }
}
