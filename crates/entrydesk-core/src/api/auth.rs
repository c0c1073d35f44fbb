use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::types::{ApiResponse, Credentials};
use super::{ApiClient, ApiError, ApiResult};

/// Message used when a failed login carries no server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Message reported by every logout.
pub const LOGOUT_MESSAGE: &str = "Logged out successfully";

impl ApiClient {
    /// `POST /register`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn register<T: Serialize + ?Sized>(&self, registration: &T) -> ApiResult<ApiResponse> {
        self.post(self.endpoint(&["register"]), registration).await
    }

    /// `POST /login`, then caches the returned token and user.
    ///
    /// A response without a token still counts as success; nothing is cached
    /// for the missing parts.
    ///
    /// # Errors
    /// Any failure becomes an [`ApiErrorKind::Login`](super::ApiErrorKind::Login)
    /// error whose message is the server's `message` field, or
    /// [`LOGIN_FAILED_MESSAGE`].
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<ApiResponse> {
        self.login_and_cache(credentials).await.map_err(|err| {
            error!(kind = %err.kind, status = ?err.status, "Login error: {err}");
            let message = err
                .server_message()
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            ApiError::login(message, err.status)
        })
    }

    async fn login_and_cache(&self, credentials: &Credentials) -> ApiResult<ApiResponse> {
        let response = self.post(self.endpoint(&["login"]), credentials).await?;
        info!(status = response.status, "Login success");

        match response.token() {
            Some(token) => self.session.set_token(&token).map_err(ApiError::storage)?,
            None => warn!("No token found in login response"),
        }

        if let Some(user) = response.data.get("user").filter(|u| !u.is_null()) {
            self.session.set_user(user).map_err(ApiError::storage)?;
            info!("User info cached");
        }

        Ok(response)
    }

    /// `POST /logout`, then drops the cached token.
    ///
    /// Logging out always succeeds locally: a failed or rejected request is
    /// logged and ignored, the token is removed either way, and the result
    /// is always `{"message": LOGOUT_MESSAGE}`.
    pub async fn logout(&self) -> ApiResponse {
        if let Err(err) = self.send(reqwest::Method::POST, self.endpoint(&["logout"]), None).await {
            warn!(kind = %err.kind, "Logout failed, continuing anyway");
        }

        if let Err(e) = self.session.clear_token() {
            warn!(error = %format!("{e:#}"), "Could not clear cached token");
        }

        ApiResponse::new(200, json!({ "message": LOGOUT_MESSAGE }))
    }
}
