//! Companion sync channel seam.
//!
//! The real transport (device pairing, data item replication) lives outside
//! this crate. It only has to report its connection state, connect on
//! demand, and deliver batches of [`DataEvent`]s.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sunshine_core::SyncError;

/// Named fields of a data item
pub type DataMap = Map<String, Value>;

/// One delivery from the transport; may hold several data items
pub type DataEventBatch = Vec<DataEvent>;

/// A data item change keyed by its path
#[derive(Debug, Clone, PartialEq)]
pub struct DataEvent {
    pub path: String,
    pub data: DataMap,
}

impl DataEvent {
    pub fn new(path: impl Into<String>, data: DataMap) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Build an event from a JSON object. Anything but an object yields an empty map.
    pub fn with_fields(path: impl Into<String>, fields: Value) -> Self {
        let data = match fields {
            Value::Object(map) => map,
            _ => DataMap::new(),
        };
        Self::new(path, data)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.data
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    }
}

/// Connection handle to the companion transport
#[async_trait]
pub trait SyncChannel: Send + Sync {
    fn is_connected(&self) -> bool;

    fn is_connecting(&self) -> bool;

    /// Connect to the transport. Callers bound this with a timeout.
    async fn connect(&self) -> Result<(), SyncError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_fields_reads_object() {
        let event = DataEvent::with_fields(
            "/today-weather",
            json!({ "date": "Mon Jun 1", "conditionId": 500 }),
        );
        assert_eq!(event.get_str("date"), Some("Mon Jun 1"));
        assert_eq!(event.get_i32("conditionId"), Some(500));
    }

    #[test]
    fn test_with_fields_ignores_non_object() {
        let event = DataEvent::with_fields("/other", json!([1, 2, 3]));
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_typed_getters_reject_wrong_types() {
        let event = DataEvent::with_fields(
            "/today-weather",
            json!({ "date": 7, "conditionId": "500", "big": 5_000_000_000i64 }),
        );
        assert_eq!(event.get_str("date"), None);
        assert_eq!(event.get_i32("conditionId"), None);
        assert_eq!(event.get_i32("big"), None);
        assert_eq!(event.get_i32("missing"), None);
    }
}
