//! JSON bodies for the bridge's HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /downlink`
///
/// Exactly one of `payload` or `command` must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownlinkRequest {
    /// Device EUI, 16 hex digits
    pub dev_eui: Option<String>,
    /// Text, integer or list of byte values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// "on" or "off"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Outcome of a downlink, tagged by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownlinkResponse {
    Success {
        downlink_id: String,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        message: String,
    },
}

/// Rejection of a malformed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
