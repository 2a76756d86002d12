//! The `{id, heads}` object a log is published as.
//!
//! A descriptor deliberately names only the heads; everything behind them is
//! recovered by traversal, so peers can load as much or as little history as
//! they need.

use serde::{Deserialize, Serialize};

use mlog_types::{ContentId, LogId};

use crate::error::{LogError, LogResult};

/// Persisted form of a log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDescriptor {
    pub id: LogId,
    pub heads: Vec<ContentId>,
}

/// Wire shape before validation: both fields may be absent.
#[derive(Deserialize)]
struct RawDescriptor {
    id: Option<LogId>,
    heads: Option<Vec<ContentId>>,
}

impl LogDescriptor {
    pub fn to_bytes(&self) -> LogResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LogError::InvalidArgument(e.to_string()))
    }

    /// Decode descriptor bytes read from the store.
    ///
    /// Bytes that are not JSON at all are a store payload failure; a JSON
    /// object lacking `id` or `heads` is [`LogError::NotALog`].
    pub fn from_bytes(bytes: &[u8]) -> LogResult<Self> {
        let raw: RawDescriptor = serde_json::from_slice(bytes).map_err(|e| {
            LogError::StoreUnavailable(mlog_store::StoreError::Serialization(e.to_string()))
        })?;
        match (raw.id, raw.heads) {
            (Some(id), Some(heads)) if !id.as_str().is_empty() => Ok(Self { id, heads }),
            _ => Err(LogError::NotALog(
                "descriptor must contain both `id` and `heads`".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_id_and_heads() {
        let head = ContentId::from_bytes(b"head");
        let descriptor = LogDescriptor {
            id: LogId::new("A").unwrap(),
            heads: vec![head],
        };
        let json: serde_json::Value = serde_json::from_slice(&descriptor.to_bytes().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"id": "A", "heads": [head.to_hex()]}));
        assert_eq!(LogDescriptor::from_bytes(&descriptor.to_bytes().unwrap()).unwrap(), descriptor);
    }

    #[test]
    fn missing_fields_are_not_a_log() {
        for doc in [r#"{"id":"A"}"#, r#"{"heads":[]}"#, r#"{}"#, r#"{"id":"","heads":[]}"#] {
            let err = LogDescriptor::from_bytes(doc.as_bytes()).unwrap_err();
            assert!(matches!(err, LogError::NotALog(_)), "{doc}");
        }
    }

    #[test]
    fn garbage_is_a_store_payload_error() {
        let err = LogDescriptor::from_bytes(b"\x00\x01").unwrap_err();
        assert!(matches!(err, LogError::StoreUnavailable(_)));
    }
}
