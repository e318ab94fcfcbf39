//! Wire types for the execution and auth/content backends.
//!
//! Field names match the backend's JSON exactly (snake_case, FastAPI
//! conventions); these types are the shared "currency" between the clients
//! and the widget layer.

use serde::{Deserialize, Serialize};

// ─── Code execution ──────────────────────────────────────────────────────────

/// POST body for `/execute` and `/execute-docker`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteCodeRequest {
    /// Source code to run.
    pub code: String,
    /// Advisory timeout in seconds; the backend is the timeout authority.
    pub timeout: u64,
}

/// Result of one execution request. One response per request; the client
/// keeps no retry state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteCodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock seconds measured by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

impl ExecuteCodeResponse {
    /// A local failure that never went over the wire (transport error,
    /// rejected request). Keeps the "never throw to the widget" boundary.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(message.into()),
            execution_time: None,
        }
    }
}

// ─── Auth / content versioning ───────────────────────────────────────────────

/// POST body for `/auth/github`: the OAuth authorization code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCodeRequest {
    pub code: String,
}

/// GitHub user record as returned by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}

/// Response of POST `/auth/github`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubAuthResponse {
    pub access_token: String,
    pub user: GitHubUser,
    pub is_admin: bool,
}

/// POST body for `/github/update-file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpdateRequest {
    pub file_path: String,
    pub content: String,
    pub commit_message: String,
}

/// Response of POST `/github/update-file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpdateResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

/// Response of GET `/github/file/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContentResponse {
    pub content: String,
}

/// FastAPI error envelope (`{"detail": "..."}`) used for non-2xx bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

/// Persisted authentication session. Created on successful auth, read on
/// every privileged call, destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: GitHubUser,
    pub is_admin: bool,
}
