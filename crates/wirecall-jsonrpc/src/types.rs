//! Wire-level primitives shared by every message shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol version marker.
///
/// The only representable value serializes as the literal `"2.0"`, and
/// deserializing anything else fails, so a decoded message can never carry
/// a wrong or missing version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("2.0")
    }
}

/// Correlation id carried by requests and echoed by responses.
///
/// A null id is an envelope-level concern (`Option<RequestId>` on failure
/// frames); it is not representable here, which keeps success responses
/// correlatable by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            RequestId::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            RequestId::String(_) => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_serializes_as_literal() {
        assert_eq!(serde_json::to_value(ProtocolVersion::V2).unwrap(), json!("2.0"));
    }

    #[test]
    fn test_version_rejects_other_values() {
        assert!(serde_json::from_value::<ProtocolVersion>(json!("1.0")).is_err());
        assert!(serde_json::from_value::<ProtocolVersion>(json!(2.0)).is_err());
        assert!(serde_json::from_value::<ProtocolVersion>(json!(null)).is_err());
    }

    #[test]
    fn test_request_id_roundtrips_untagged() {
        let num: RequestId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(num, RequestId::Number(42));
        let s: RequestId = serde_json::from_value(json!("req_7")).unwrap();
        assert_eq!(s, RequestId::String("req_7".to_string()));

        assert_eq!(serde_json::to_value(&num).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("req_7"));
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::from(7).to_string(), "7");
        assert_eq!(RequestId::from("abc").to_string(), "abc");
    }
}
