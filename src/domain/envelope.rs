//! The canonical `{success, message, data, error}` operation result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::eos_client::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<u16>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn failure_with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            error: Some(status),
            ..Self::failure(message)
        }
    }
}

impl From<ApiError> for Envelope {
    fn from(err: ApiError) -> Self {
        Self::failure_with_status(err.message, err.status_code)
    }
}
