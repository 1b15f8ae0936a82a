use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope format version
pub const BUCKET_VERSION: u32 = 1;

/// Versioned wrapper around a synchronised bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncBucket<T> {
    pub version: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "data", alias = "payload")]
    pub payload: T,
}

impl<T> SyncBucket<T> {
    pub fn wrap(payload: T, now: DateTime<Utc>) -> Self {
        Self {
            version: BUCKET_VERSION,
            updated_at: now,
            payload,
        }
    }
}

/// Extract the payload of a stored bucket.
///
/// Accepts an envelope or a bare legacy value. A missing, null or
/// wrongly-shaped payload yields `None`.
pub fn unwrap_value(raw: Value) -> Option<Value> {
    let payload = match raw {
        Value::Object(mut map) if map.contains_key("data") || map.contains_key("payload") => {
            map.remove("data").or_else(|| map.remove("payload"))?
        }
        other => other,
    };
    if payload.is_null() {
        None
    } else {
        Some(payload)
    }
}

/// Parse and unwrap a stored bucket into `T`
pub fn unwrap_raw<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("bucket is not valid JSON: {}", e);
            return None;
        }
    };
    let payload = unwrap_value(value)?;
    match serde_json::from_value(payload) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("bucket payload has unexpected shape: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_uses_data_field() {
        let bucket = SyncBucket::wrap(vec![1, 2], Utc::now());
        let value = serde_json::to_value(&bucket).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["data"], json!([1, 2]));
        assert!(value["updatedAt"].is_i64());
    }

    #[test]
    fn test_unwrap_envelope_and_bare() {
        let wrapped = unwrap_raw::<Vec<u32>>(r#"{"version":1,"updatedAt":0,"data":[3]}"#);
        assert_eq!(wrapped, Some(vec![3]));

        let bare = unwrap_raw::<Vec<u32>>("[4, 5]");
        assert_eq!(bare, Some(vec![4, 5]));

        let payload = unwrap_raw::<Vec<u32>>(r#"{"version":1,"updatedAt":0,"payload":[6]}"#);
        assert_eq!(payload, Some(vec![6]));
    }

    #[test]
    fn test_unwrap_rejects_bad_payloads() {
        assert_eq!(unwrap_raw::<Vec<u32>>("not json"), None);
        assert_eq!(unwrap_raw::<Vec<u32>>(r#"{"data": null}"#), None);
        assert_eq!(unwrap_raw::<Vec<u32>>(r#"{"data": {"a": 1}}"#), None);
        assert_eq!(unwrap_raw::<Vec<u32>>("null"), None);
    }
}
