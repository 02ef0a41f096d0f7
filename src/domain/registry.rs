//! Fixed catalog of user-directory operations
//!
//! Binds each named, schema-described operation to a handler closure over
//! the upstream adapter. The catalog is built once and never changes; the
//! tool transport discovers and dispatches through it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::envelope::Envelope;
use crate::domain::utils::{parse_role, parse_status, require_non_empty, REDACTED_TOKEN};
use crate::eos_client::{InviteRequest, UserDirectoryService};
use crate::errors::AppError;

#[macros::mcp_tool(
    name = "eos_login",
    description = "Authenticate against the EOS user API and start a session"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosLoginTool {
    pub username: String,
    pub password: String,
}

#[macros::mcp_tool(
    name = "eos_get_current_user",
    description = "Fetch the profile of the currently authenticated user"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosGetCurrentUserTool {}

#[macros::mcp_tool(
    name = "eos_list_users",
    description = "List all users known to the EOS user API"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosListUsersTool {}

#[macros::mcp_tool(
    name = "eos_invite_user",
    description = "Invite a new user by email with a role of admin, manager or user"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosInviteUserTool {
    pub email: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[macros::mcp_tool(
    name = "eos_update_user_status",
    description = "Set a user's status to active or inactive"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosUpdateUserStatusTool {
    pub user_id: String,
    pub status: String,
}

#[macros::mcp_tool(name = "eos_delete_user", description = "Delete a user by id")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosDeleteUserTool {
    pub user_id: String,
}

#[macros::mcp_tool(
    name = "eos_health_check",
    description = "Check whether the EOS user API is reachable"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EosHealthCheckTool {}

#[derive(Debug, Deserialize)]
struct LoginParams {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InviteParams {
    email: Option<String>,
    role: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusParams {
    user_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    user_id: Option<String>,
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Envelope, AppError>> + Send>>;
type Handler = Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

pub struct OperationDescriptor {
    pub tool: Tool,
    handler: Handler,
}

impl OperationDescriptor {
    pub fn name(&self) -> &str {
        &self.tool.name
    }
}

/// Insertion-ordered, immutable catalog of operations bound to one
/// directory adapter.
pub struct OperationRegistry {
    operations: Vec<OperationDescriptor>,
}

impl OperationRegistry {
    pub fn new(directory: Arc<dyn UserDirectoryService>) -> Self {
        Self {
            operations: vec![
                login_operation(directory.clone()),
                current_user_operation(directory.clone()),
                list_users_operation(directory.clone()),
                invite_user_operation(directory.clone()),
                update_user_status_operation(directory.clone()),
                delete_user_operation(directory.clone()),
                health_check_operation(directory),
            ],
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.operations.iter().map(|op| op.tool.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name() == name)
    }

    pub async fn invoke(&self, name: &str, args: Value) -> Result<Envelope, AppError> {
        let operation = self.get(name).ok_or_else(|| {
            AppError::not_found("operation_not_found", format!("unknown operation: {name}"))
        })?;
        (operation.handler)(args).await
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, AppError> {
    serde_json::from_value(args).map_err(|_| {
        AppError::bad_request("invalid_arguments", "tool arguments must be a JSON object")
    })
}

fn login_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosLoginTool::tool(),
        handler: Box::new(move |args| {
            let directory = directory.clone();
            Box::pin(async move {
                let params: LoginParams = parse_args(args)?;
                let username = require_non_empty("username", params.username.as_deref())?;
                let password = require_non_empty("password", params.password.as_deref())?;

                match directory.login(&username, &password).await {
                    Ok(login) => {
                        // The raw credential stays inside the adapter's
                        // session; tool callers only ever see the
                        // placeholder.
                        let mut data = json!(login);
                        data["token"] = json!(REDACTED_TOKEN);
                        Ok(Envelope::ok("Login successful", Some(data)))
                    }
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn current_user_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosGetCurrentUserTool::tool(),
        handler: Box::new(move |_args| {
            let directory = directory.clone();
            Box::pin(async move {
                match directory.current_user().await {
                    Ok(user) => Ok(Envelope::ok("Current user fetched", Some(json!(user)))),
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn list_users_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosListUsersTool::tool(),
        handler: Box::new(move |_args| {
            let directory = directory.clone();
            Box::pin(async move {
                match directory.list_users().await {
                    Ok(users) => Ok(Envelope::ok(
                        format!("Returned {} users", users.len()),
                        Some(json!(users)),
                    )),
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn invite_user_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosInviteUserTool::tool(),
        handler: Box::new(move |args| {
            let directory = directory.clone();
            Box::pin(async move {
                let params: InviteParams = parse_args(args)?;
                let email = require_non_empty("email", params.email.as_deref())?;
                let role = parse_role(&require_non_empty("role", params.role.as_deref())?)?;

                let invite = InviteRequest {
                    email,
                    role,
                    first_name: params.first_name.filter(|name| !name.trim().is_empty()),
                    last_name: params.last_name.filter(|name| !name.trim().is_empty()),
                };

                match directory.invite_user(&invite).await {
                    Ok(data) => Ok(Envelope::ok("Invitation sent", Some(data))),
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn update_user_status_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosUpdateUserStatusTool::tool(),
        handler: Box::new(move |args| {
            let directory = directory.clone();
            Box::pin(async move {
                let params: UpdateStatusParams = parse_args(args)?;
                let user_id = require_non_empty("user_id", params.user_id.as_deref())?;
                let status = parse_status(&require_non_empty("status", params.status.as_deref())?)?;

                match directory.update_user_status(&user_id, status).await {
                    Ok(data) => Ok(Envelope::ok("User status updated", Some(data))),
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn delete_user_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosDeleteUserTool::tool(),
        handler: Box::new(move |args| {
            let directory = directory.clone();
            Box::pin(async move {
                let params: DeleteParams = parse_args(args)?;
                let user_id = require_non_empty("user_id", params.user_id.as_deref())?;

                match directory.delete_user(&user_id).await {
                    Ok(data) => Ok(Envelope::ok("User deleted", Some(data))),
                    Err(err) => Ok(Envelope::from(err)),
                }
            })
        }),
    }
}

fn health_check_operation(directory: Arc<dyn UserDirectoryService>) -> OperationDescriptor {
    OperationDescriptor {
        tool: EosHealthCheckTool::tool(),
        handler: Box::new(move |_args| {
            let directory = directory.clone();
            Box::pin(async move {
                let healthy = directory.health_check().await;
                let message = if healthy {
                    "EOS API reachable"
                } else {
                    "EOS API unreachable"
                };

                Ok(Envelope {
                    success: healthy,
                    message: Some(message.to_string()),
                    data: Some(json!({ "healthy": healthy })),
                    error: None,
                })
            })
        }),
    }
}
