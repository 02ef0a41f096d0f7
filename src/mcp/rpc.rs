//! JSON-RPC protocol representations and formatting utilities
//!
//! Provides standardized mapping of internal AppErrors to valid JSON-RPC payloads.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            -32602,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::NotFound { code, message } => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::Internal { .. } => json_rpc_error(id, -32603, "Internal error"),
    }
}

/// The single conversion point for an unexpected handler fault on the tool
/// transport; carries the tool name and error detail.
pub fn dispatch_failure(id: Option<Value>, tool: &str, error: &str) -> Value {
    json_rpc_error_with_data(
        id,
        -32603,
        "Internal error",
        Some(json!({
            "code": "dispatch_failure",
            "tool": tool,
            "error": error,
        })),
    )
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_method_not_found() {
        let response = app_error_to_json_rpc(
            Some(json!(7)),
            AppError::not_found("operation_not_found", "unknown operation: eos_reboot"),
        );

        assert_eq!(response["error"]["code"], json!(-32601));
        assert_eq!(response["error"]["data"]["code"], json!("operation_not_found"));
        assert_eq!(response["id"], json!(7));
    }

    #[test]
    fn internal_error_carries_no_detail() {
        let response =
            app_error_to_json_rpc(Some(json!(1)), AppError::internal("secret detail"));

        assert_eq!(response["error"]["code"], json!(-32603));
        assert!(response["error"]["data"].is_null());
    }

    #[test]
    fn dispatch_failure_names_the_tool() {
        let response = dispatch_failure(Some(json!(2)), "eos_login", "handler fault");

        assert_eq!(response["error"]["code"], json!(-32603));
        assert_eq!(response["error"]["data"]["tool"], json!("eos_login"));
        assert_eq!(response["error"]["data"]["error"], json!("handler fault"));
    }
}
