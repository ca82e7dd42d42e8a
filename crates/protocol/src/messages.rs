//! API message definitions for the wallet channel.
//!
//! This module defines the envelopes exchanged inside socket.io events. All
//! messages are serialized as JSON with the field names the wallet expects.

use crate::types::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event carrying API requests and responses.
pub const EVENT_API: &str = "api";

/// Event requesting a pairing decision from the wallet.
pub const EVENT_PAIR: &str = "pair";

/// Event reporting the pairing outcome.
pub const EVENT_PAIRED: &str = "paired";

/// Event asking the client to rotate its app key.
pub const EVENT_REKEY: &str = "rekey";

/// Event delivering the freshly generated app key.
pub const EVENT_REKEYED: &str = "rekeyed";

// ============================================================================
// API Messages
// ============================================================================

/// A single API request correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Operation selector understood by the wallet, e.g. `getOrRequestIdentity`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Operation arguments. Every request carries the requesting app's
    /// `origin` inside this object.
    pub payload: Value,
    /// Correlation identifier echoed back by the wallet.
    pub id: String,
}

impl ApiRequest {
    /// Create a new request with the given operation selector and arguments.
    pub fn new(kind: impl Into<String>, payload: Value, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload,
            id: id.into(),
        }
    }
}

/// Outgoing envelope for the `api` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    /// The request being submitted.
    pub data: ApiRequest,
    /// Name of the requesting application.
    pub plugin: String,
}

impl ApiEnvelope {
    /// Wrap a request for the given application.
    pub fn new(data: ApiRequest, plugin: impl Into<String>) -> Self {
        Self {
            data,
            plugin: plugin.into(),
        }
    }
}

/// Incoming body of an `api` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Correlation identifier of the request being answered.
    pub id: String,
    /// Raw result value; `Null` when the wallet sent none.
    #[serde(default)]
    pub result: Value,
}

// ============================================================================
// Pairing Messages
// ============================================================================

/// Body of the `pair` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingData {
    /// App key identifying this client to the wallet.
    pub appkey: String,
    /// Name of the requesting application.
    pub origin: String,
    /// Whether the wallet may answer without prompting the user.
    pub passthrough: bool,
}

/// Outgoing envelope for the `pair` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingEnvelope {
    /// The pairing request body.
    pub data: PairingData,
    /// Name of the requesting application.
    pub plugin: String,
}

impl PairingEnvelope {
    /// Build a pairing request. The application name doubles as the plugin.
    pub fn new(appkey: impl Into<String>, origin: impl Into<String>, passthrough: bool) -> Self {
        let origin = origin.into();
        Self {
            data: PairingData {
                appkey: appkey.into(),
                origin: origin.clone(),
                passthrough,
            },
            plugin: origin,
        }
    }
}

// ============================================================================
// Rekey Messages
// ============================================================================

/// Body of the `rekeyed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RekeyData {
    /// Name of the requesting application.
    pub origin: String,
    /// The freshly generated app key.
    pub appkey: String,
}

/// Outgoing envelope for the `rekeyed` event, answering a `rekey` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RekeyEnvelope {
    /// The rotation body.
    pub data: RekeyData,
    /// Name of the requesting application.
    pub plugin: String,
}

impl RekeyEnvelope {
    /// Build a rekey answer carrying the new app key.
    pub fn new(appkey: impl Into<String>, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            data: RekeyData {
                origin: origin.clone(),
                appkey: appkey.into(),
            },
            plugin: origin,
        }
    }
}

// ============================================================================
// API Result Envelope
// ============================================================================

/// Outcome of an API call, split on the wallet's error marker.
///
/// The wallet reports failures in-band: the result of a failed call is a
/// JSON object carrying an `isError` member. Deserialization splits on that
/// marker so callers match on a variant instead of probing raw JSON, and
/// serialization reproduces the original wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    /// Successful result value.
    Ok(Value),
    /// Failure reported by the wallet.
    Err(ApiError),
}

impl ApiResult {
    /// Split a raw result value on the error marker.
    ///
    /// Any JSON object containing an `isError` member is treated as an
    /// error, regardless of the member's value. Everything else, including
    /// `Null`, is a success.
    pub fn from_value(value: Value) -> Self {
        let marked = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("isError"));
        if !marked {
            return ApiResult::Ok(value);
        }

        let error = serde_json::from_value(value.clone()).unwrap_or_else(|_| ApiError {
            message: value.to_string(),
            ..ApiError::default()
        });
        ApiResult::Err(error)
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<Value, ApiError> {
        match self {
            ApiResult::Ok(value) => Ok(value),
            ApiResult::Err(error) => Err(error),
        }
    }

    /// Whether this result is the error variant.
    pub fn is_err(&self) -> bool {
        matches!(self, ApiResult::Err(_))
    }
}

impl<'de> Deserialize<'de> for ApiResult {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ApiResult::from_value(value))
    }
}

impl Serialize for ApiResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ApiResult::Ok(value) => value.serialize(serializer),
            ApiResult::Err(error) => error.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // API message tests

    #[test]
    fn test_api_envelope_wire_shape() {
        let request = ApiRequest::new(
            "getVersion",
            json!({"origin": "my-app"}),
            "1f0a6b42-9d1e-4c3a-8a5f-0b4f6f2d9e71",
        );
        let envelope = ApiEnvelope::new(request, "my-app");

        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            encoded,
            json!({
                "data": {
                    "type": "getVersion",
                    "payload": {"origin": "my-app"},
                    "id": "1f0a6b42-9d1e-4c3a-8a5f-0b4f6f2d9e71"
                },
                "plugin": "my-app"
            })
        );
    }

    #[test]
    fn test_api_request_roundtrip() {
        let request = ApiRequest::new("authenticate", json!({"nonce": "abc"}), "id-1");
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: ApiRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_api_response_deserialize() {
        let response: ApiResponse =
            serde_json::from_value(json!({"id": "abc", "result": {"hash": "h1"}})).unwrap();
        assert_eq!(response.id, "abc");
        assert_eq!(response.result, json!({"hash": "h1"}));
    }

    #[test]
    fn test_api_response_without_result() {
        let response: ApiResponse = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(response.result, Value::Null);
    }

    // Pairing message tests

    #[test]
    fn test_pairing_envelope_wire_shape() {
        let envelope = PairingEnvelope::new("appkey:deadbeef", "my-app", true);

        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            encoded,
            json!({
                "data": {
                    "appkey": "appkey:deadbeef",
                    "origin": "my-app",
                    "passthrough": true
                },
                "plugin": "my-app"
            })
        );
    }

    #[test]
    fn test_rekey_envelope_wire_shape() {
        let envelope = RekeyEnvelope::new("appkey:cafe", "my-app");

        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            encoded,
            json!({
                "data": {
                    "origin": "my-app",
                    "appkey": "appkey:cafe"
                },
                "plugin": "my-app"
            })
        );
    }

    // API result envelope tests

    #[test]
    fn test_api_result_success_scalar() {
        let result = ApiResult::from_value(json!("10.1.0"));
        assert_eq!(result, ApiResult::Ok(json!("10.1.0")));
    }

    #[test]
    fn test_api_result_success_object() {
        let value = json!({"hash": "h1", "publicKey": "EOS123"});
        let result = ApiResult::from_value(value.clone());
        assert_eq!(result, ApiResult::Ok(value));
    }

    #[test]
    fn test_api_result_success_null() {
        let result = ApiResult::from_value(Value::Null);
        assert_eq!(result, ApiResult::Ok(Value::Null));
    }

    #[test]
    fn test_api_result_error_marker() {
        let result = ApiResult::from_value(json!({
            "type": "identity_rejected",
            "message": "User rejected the provision of an Identity",
            "code": 402,
            "isError": true
        }));

        let ApiResult::Err(error) = result else {
            panic!("expected error variant");
        };
        assert_eq!(error.kind, "identity_rejected");
        assert_eq!(error.message, "User rejected the provision of an Identity");
        assert_eq!(error.code, 402);
        assert!(error.is_error);
    }

    #[test]
    fn test_api_result_error_marker_value_ignored() {
        // The marker's presence decides, not its value.
        let result = ApiResult::from_value(json!({"isError": false, "message": "nope"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_api_result_error_with_missing_fields() {
        let result = ApiResult::from_value(json!({"isError": true}));

        let ApiResult::Err(error) = result else {
            panic!("expected error variant");
        };
        assert_eq!(error.kind, "");
        assert_eq!(error.message, "");
        assert_eq!(error.code, 0);
    }

    #[test]
    fn test_api_result_deserialize_via_serde() {
        let success: ApiResult = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(success, ApiResult::Ok(json!(true)));

        let failure: ApiResult =
            serde_json::from_value(json!({"isError": true, "message": "denied"})).unwrap();
        assert!(failure.is_err());
    }

    #[test]
    fn test_api_result_serialize_preserves_wire_shape() {
        let error = ApiError {
            kind: "signature_rejected".to_string(),
            message: "User rejected the signature request".to_string(),
            code: 402,
            is_error: true,
        };

        let encoded = serde_json::to_value(ApiResult::Err(error)).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "signature_rejected",
                "message": "User rejected the signature request",
                "code": 402,
                "isError": true
            })
        );
    }

    #[test]
    fn test_api_result_into_result() {
        assert_eq!(
            ApiResult::Ok(json!(1)).into_result().unwrap(),
            json!(1)
        );
        assert!(ApiResult::Err(ApiError::default()).into_result().is_err());
    }
}
