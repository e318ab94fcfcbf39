//! Authenticated content-editing client (admin-only surface).
//!
//! Unlike the execution client, failures here are typed errors: the editing
//! UI is an actionable caller that must react. The session precondition is
//! checked locally — a missing token fails fast with `NotAuthenticated`
//! before any network I/O, which is a distinct condition from a session the
//! backend rejects.

use std::sync::Arc;

use livedoc_core::config::BackendConfig;
use livedoc_core::protocol::{
    AuthCodeRequest, AuthSession, FileContentResponse, FileUpdateRequest, FileUpdateResponse,
    GitHubAuthResponse, GitHubUser,
};
use livedoc_core::storage::SessionStore;

use crate::transport::error_detail;

/// Storage keys, namespaced to this application; cleared together on logout.
pub const TOKEN_KEY: &str = "livedoc.github_token";
pub const USER_KEY: &str = "livedoc.github_user";
pub const ADMIN_KEY: &str = "livedoc.is_admin";

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No stored session; sign in first. Raised locally, zero network calls.
    #[error("not authenticated: sign in with GitHub first")]
    NotAuthenticated,
    /// The backend refused the request (bad code, expired token, not admin).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

pub struct AuthenticatedFileClient {
    http: reqwest::Client,
    api_base: String,
    store: Arc<dyn SessionStore>,
}

impl AuthenticatedFileClient {
    pub fn new(cfg: &BackendConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            store,
        }
    }

    /// Exchange an OAuth authorization code for a session. The caller is
    /// responsible for persisting it via [`save_session`](Self::save_session).
    pub async fn authenticate(&self, code: &str) -> Result<GitHubAuthResponse, AuthError> {
        let url = format!("{}/auth/github", self.api_base);
        let resp = self
            .http
            .post(&url)
            .json(&AuthCodeRequest {
                code: code.to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_detail(resp, status).await,
            });
        }
        resp.json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    /// Commit new content for a file in the docs repository.
    pub async fn update_file(
        &self,
        file_path: &str,
        content: &str,
        commit_message: &str,
    ) -> Result<FileUpdateResponse, AuthError> {
        let token = self.token().ok_or(AuthError::NotAuthenticated)?;
        let url = format!("{}/github/update-file", self.api_base);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&FileUpdateRequest {
                file_path: file_path.to_string(),
                content: content.to_string(),
                commit_message: commit_message.to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_detail(resp, status).await,
            });
        }
        resp.json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    /// Fetch the current content of a file in the docs repository.
    pub async fn get_file(&self, file_path: &str) -> Result<String, AuthError> {
        let token = self.token().ok_or(AuthError::NotAuthenticated)?;
        let url = format!("{}/github/file/{}", self.api_base, file_path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_detail(resp, status).await,
            });
        }
        let body: FileContentResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(body.content)
    }

    // ─── Session accessors (pure local-storage operations) ───────────────────

    pub fn save_session(&self, token: &str, user: &GitHubUser, is_admin: bool) {
        self.store.set(TOKEN_KEY, token);
        match serde_json::to_string(user) {
            Ok(json) => self.store.set(USER_KEY, &json),
            Err(e) => tracing::warn!("failed to serialize user record: {e}"),
        }
        self.store.set(ADMIN_KEY, if is_admin { "true" } else { "false" });
    }

    pub fn clear_session(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        self.store.remove(ADMIN_KEY);
    }

    /// Never errors: absent or corrupt data reads as not-admin.
    pub fn is_admin(&self) -> bool {
        self.store.get(ADMIN_KEY).as_deref() == Some("true")
    }

    /// Never errors: absent or corrupt data reads as no user.
    pub fn current_user(&self) -> Option<GitHubUser> {
        self.store
            .get(USER_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
    }

    /// The full persisted session, if one exists and is readable.
    pub fn session(&self) -> Option<AuthSession> {
        Some(AuthSession {
            token: self.token()?,
            user: self.current_user()?,
            is_admin: self.is_admin(),
        })
    }

    fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }
}
