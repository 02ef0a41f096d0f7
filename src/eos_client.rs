//! Reqwest-backed adapter for the EOS user API.
//!
//! Single choke point for all upstream calls: owns the base URL, the
//! per-request timeout and the session token, and normalizes every failure
//! into [`ApiError`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Sentinel status for failures that never produced an upstream response.
pub const NETWORK_FAILURE_STATUS: u16 = 0;

/// Uniform upstream failure shape. `status_code` is the upstream HTTP
/// status when one was received, [`NETWORK_FAILURE_STATUS`] otherwise.
#[derive(Debug, Clone, Error)]
#[error("eos api error ({status_code}): {message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
    pub raw_body: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    User,
}

impl UserRole {
    pub const VALID_ROLES: [&'static str; 3] = ["admin", "manager", "user"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub const VALID_STATUSES: [&'static str; 2] = ["active", "inactive"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// User record as the upstream returns it. Fields beyond the declared ones
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Payload of a successful login. The token here is the raw upstream
/// credential; presentation-layer redaction happens in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub user: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Bearer credential for one logical client. Set only by a successful
/// login, cleared explicitly, never expired in-process.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.write_guard() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.write_guard() = None;
    }

    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Capability interface over the user directory. Both front ends consume
/// this trait; [`EosApiClient`] is the production implementation.
#[async_trait]
pub trait UserDirectoryService: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginData, ApiError>;
    async fn current_user(&self) -> Result<User, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn invite_user(&self, invite: &InviteRequest) -> Result<Value, ApiError>;
    async fn update_user_status(&self, user_id: &str, status: UserStatus)
        -> Result<Value, ApiError>;
    async fn delete_user(&self, user_id: &str) -> Result<Value, ApiError>;
    async fn health_check(&self) -> bool;
}

/// Response envelope the EOS API wraps every payload in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct UpstreamEnvelope<T> {
    #[serde(default)]
    data: Option<T>,
}

pub struct EosApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl EosApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_session(base_url, timeout, Arc::new(Session::new()))
    }

    pub fn with_session(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method, self.url(path));

        if let Some(token) = self.session.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let raw_body: Option<Value> = response.json().await.ok();
            return Err(upstream_error(status, raw_body));
        }

        response.json::<T>().await.map_err(transport_error)
    }
}

#[async_trait]
impl UserDirectoryService for EosApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginData, ApiError> {
        let body = json!({ "username": username, "password": password });
        let envelope: UpstreamEnvelope<LoginData> =
            self.request(Method::POST, "/user/login", Some(body)).await?;

        let data = envelope.data.ok_or_else(missing_data_error)?;
        if let Some(token) = &data.token {
            self.session.set(token.clone());
        }
        Ok(data)
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        let envelope: UpstreamEnvelope<User> =
            self.request(Method::GET, "/user/profile", None).await?;
        envelope.data.ok_or_else(missing_data_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let envelope: UpstreamEnvelope<Vec<User>> =
            self.request(Method::GET, "/users", None).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn invite_user(&self, invite: &InviteRequest) -> Result<Value, ApiError> {
        let mut body = json!({ "email": invite.email, "role": invite.role.as_str() });
        if let Some(first_name) = &invite.first_name {
            body["firstName"] = json!(first_name);
        }
        if let Some(last_name) = &invite.last_name {
            body["lastName"] = json!(last_name);
        }

        let envelope: UpstreamEnvelope<Value> = self
            .request(Method::POST, "/users/invite", Some(body))
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<Value, ApiError> {
        let body = json!({ "status": status.as_str() });
        let envelope: UpstreamEnvelope<Value> = self
            .request(
                Method::PATCH,
                &format!("/users/{user_id}/status"),
                Some(body),
            )
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn delete_user(&self, user_id: &str) -> Result<Value, ApiError> {
        let envelope: UpstreamEnvelope<Value> = self
            .request(Method::DELETE, &format!("/users/{user_id}"), None)
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn health_check(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    let message = if err.is_timeout() {
        "EOS API request timed out".to_string()
    } else if err.is_decode() {
        format!("EOS API returned an unreadable response: {err}")
    } else {
        format!("EOS API unreachable: {err}")
    };

    ApiError {
        message,
        status_code: err
            .status()
            .filter(|status| !status.is_success())
            .map(|status| status.as_u16())
            .unwrap_or(NETWORK_FAILURE_STATUS),
        raw_body: None,
    }
}

fn upstream_error(status: StatusCode, raw_body: Option<Value>) -> ApiError {
    let message = raw_body
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("EOS API request failed with status {}", status.as_u16()));

    ApiError {
        message,
        status_code: status.as_u16(),
        raw_body,
    }
}

// A 2xx response whose envelope lacks the expected data payload breaks the
// upstream contract; surfaced as a bad gateway rather than a success.
fn missing_data_error() -> ApiError {
    ApiError {
        message: "EOS API response did not include the expected data".to_string(),
        status_code: 502,
        raw_body: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EosApiClient {
        EosApiClient::new(server.uri(), Duration::from_secs(2)).expect("client builds")
    }

    fn sample_user() -> Value {
        json!({
            "id": "u-1",
            "username": "mp5@eigital.com",
            "email": "mp5@eigital.com",
            "role": "admin",
            "status": "active",
            "createdAt": "2026-01-01T00:00:00.000Z",
            "updatedAt": "2026-01-02T00:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn login_stores_token_and_attaches_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/login"))
            .and(body_json(json!({ "username": "mp5@eigital.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "token": "abc", "user": sample_user() }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": sample_user()
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let login = client
            .login("mp5@eigital.com", "pw")
            .await
            .expect("login succeeds");

        assert_eq!(login.token.as_deref(), Some("abc"));
        assert!(client.session().is_authenticated());

        let user = client.current_user().await.expect("profile fetch succeeds");
        assert_eq!(user.username, "mp5@eigital.com");
    }

    #[tokio::test]
    async fn login_rejection_keeps_session_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Invalid credentials"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = client
            .login("mp5@eigital.com", "wrong")
            .await
            .expect_err("login must fail");

        assert_eq!(error.status_code, 401);
        assert_eq!(error.message, "Invalid credentials");
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn network_failure_uses_sentinel_status() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let client = EosApiClient::new(
            format!("http://127.0.0.1:{port}"),
            Duration::from_millis(500),
        )
        .expect("client builds");

        let error = client.list_users().await.expect_err("must fail");
        assert_eq!(error.status_code, NETWORK_FAILURE_STATUS);
    }

    #[tokio::test]
    async fn list_users_without_data_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let users = client_for(&server).list_users().await.expect("list succeeds");
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn invite_sends_camel_case_optional_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/invite"))
            .and(body_json(json!({
                "email": "new@eigital.com",
                "role": "manager",
                "firstName": "Ada"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "invited": true }
            })))
            .mount(&server)
            .await;

        let invite = InviteRequest {
            email: "new@eigital.com".to_string(),
            role: UserRole::Manager,
            first_name: Some("Ada".to_string()),
            last_name: None,
        };
        let data = client_for(&server)
            .invite_user(&invite)
            .await
            .expect("invite succeeds");
        assert_eq!(data["invited"], json!(true));
    }

    #[tokio::test]
    async fn update_status_patches_the_status_route() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/u-1/status"))
            .and(body_json(json!({ "status": "inactive" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let data = client_for(&server)
            .update_user_status("u-1", UserStatus::Inactive)
            .await
            .expect("update succeeds");
        assert_eq!(data, Value::Null);
    }

    #[tokio::test]
    async fn delete_user_hits_the_user_route() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/u-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "deleted": true }
            })))
            .mount(&server)
            .await;

        let data = client_for(&server)
            .delete_user("u-9")
            .await
            .expect("delete succeeds");
        assert_eq!(data["deleted"], json!(true));
    }

    #[tokio::test]
    async fn upstream_error_without_message_falls_back_to_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let error = client_for(&server).list_users().await.expect_err("must fail");
        assert_eq!(error.status_code, 503);
        assert!(error.message.contains("503"));
    }

    #[tokio::test]
    async fn health_check_reports_reachability_and_never_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        let unreachable = EosApiClient::new(
            format!("http://127.0.0.1:{port}"),
            Duration::from_millis(500),
        )
        .expect("client builds");
        assert!(!unreachable.health_check().await);
    }

    #[tokio::test]
    async fn health_check_is_false_on_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!client_for(&server).health_check().await);
    }

    #[test]
    fn session_set_clear_roundtrip() {
        let session = Session::new();
        assert!(!session.is_authenticated());

        session.set("abc");
        assert_eq!(session.bearer().as_deref(), Some("abc"));

        session.clear();
        assert!(!session.is_authenticated());
    }
}
