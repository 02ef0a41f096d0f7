//! Axum HTTP handlers for the web server
//!
//! Provides the REST façade over the user directory and the Model Context
//! Protocol endpoint. REST routes call the adapter directly; the generic
//! registry lookup is reserved for the tool transport.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::domain::envelope::Envelope;
use crate::domain::utils::{parse_role, parse_status, require_non_empty};
use crate::eos_client::{ApiError, InviteRequest};
use crate::errors::AppError;
use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_value;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteBody {
    email: Option<String>,
    role: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    status: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let healthy = state.directory.health_check().await;

    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "eosApi": if healthy { "connected" } else { "disconnected" },
    }))
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body: LoginBody = parse_body(&body)?;
    let username = require_non_empty("username", body.username.as_deref())?;
    let password = require_non_empty("password", body.password.as_deref())?;

    Ok(match state.directory.login(&username, &password).await {
        // The REST client drives its own auth flow, so the raw token is
        // returned here, unlike on the tool transport.
        Ok(login) => success_response("Login successful", Some(json!(login))),
        Err(err) => upstream_failure(state.dev_mode, err),
    })
}

pub async fn current_user(State(state): State<AppState>) -> Response {
    match state.directory.current_user().await {
        Ok(user) => success_response("Current user fetched", Some(json!(user))),
        Err(err) => upstream_failure(state.dev_mode, err),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.directory.list_users().await {
        Ok(users) => success_response(
            format!("Returned {} users", users.len()),
            Some(json!(users)),
        ),
        Err(err) => upstream_failure(state.dev_mode, err),
    }
}

pub async fn invite_user(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body: InviteBody = parse_body(&body)?;
    let email = require_non_empty("email", body.email.as_deref())?;
    let role = parse_role(&require_non_empty("role", body.role.as_deref())?)?;

    let invite = InviteRequest {
        email,
        role,
        first_name: body.first_name.filter(|name| !name.trim().is_empty()),
        last_name: body.last_name.filter(|name| !name.trim().is_empty()),
    };

    Ok(match state.directory.invite_user(&invite).await {
        Ok(data) => success_response("Invitation sent", Some(data)),
        Err(err) => upstream_failure(state.dev_mode, err),
    })
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let body: UpdateStatusBody = parse_body(&body)?;
    let status = parse_status(&require_non_empty("status", body.status.as_deref())?)?;

    Ok(match state.directory.update_user_status(&user_id, status).await {
        Ok(data) => success_response("User status updated", Some(data)),
        Err(err) => upstream_failure(state.dev_mode, err),
    })
}

pub async fn delete_user(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match state.directory.delete_user(&user_id).await {
        Ok(data) => success_response("User deleted", Some(data)),
        Err(err) => upstream_failure(state.dev_mode, err),
    }
}

pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::failure("Route not found")),
    )
        .into_response()
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json_rpc_error(None, -32700, "Parse error")),
            )
                .into_response()
        }
    };

    if let Some(batch) = payload.as_array() {
        if batch.is_empty() {
            return (
                StatusCode::OK,
                Json(vec![json_rpc_error(None, -32600, "Invalid Request")]),
            )
                .into_response();
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = handle_json_rpc_value(&state, item.clone()).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return StatusCode::NO_CONTENT.into_response();
        }

        return (StatusCode::OK, Json(Value::Array(responses))).into_response();
    }

    match handle_json_rpc_value(&state, payload).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|_| AppError::bad_request("invalid_json", "request body must be valid JSON"))
}

fn success_response(message: impl Into<String>, data: Option<Value>) -> Response {
    (StatusCode::OK, Json(Envelope::ok(message, data))).into_response()
}

fn upstream_failure(dev_mode: bool, err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.status_code)
        .ok()
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut envelope = Envelope::failure_with_status(err.message, status.as_u16());
    // The upstream error payload is passed through for local debugging
    // only; production responses omit it.
    if dev_mode {
        envelope.data = err.raw_body;
    }

    (status, Json(envelope)).into_response()
}
