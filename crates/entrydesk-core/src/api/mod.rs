//! HTTP client for the entries API.
//!
//! Every call goes through [`ApiClient::send`], which attaches the cached
//! bearer token before the request and, on failure, logs the error and
//! drops the token when the server answered 401. The operations themselves
//! live in `auth` and `entries`.

mod auth;
mod entries;
pub mod error;
pub mod types;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

pub use self::auth::{LOGIN_FAILED_MESSAGE, LOGOUT_MESSAGE};
pub use self::error::{ApiError, ApiErrorKind, ApiResult};
pub use self::types::{
    ApiResponse, Credentials, Entry, EntryPage, EntryQuery, EntryStatus, Registration,
};
use crate::session::Session;

/// Standard User-Agent header for entrydesk requests.
pub const USER_AGENT: &str = concat!("entrydesk/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// Entries API client.
///
/// Cloning is cheap: clones share the connection pool and the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    /// Returns a parse error if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str, session: Session) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::parse(format!("Invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::parse(format!(
                "Invalid base URL {base_url}: expected http:// or https://"
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Builds `<base>/<segments...>`. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Only fails for cannot-be-a-base URLs, which `new` rejects.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// URL of the entries listing with the query's filters applied.
    pub fn entries_url(&self, query: &EntryQuery) -> Url {
        let mut url = self.endpoint(&["entries"]);
        url.query_pairs_mut().extend_pairs(query.pairs());
        url
    }

    async fn get(&self, url: Url) -> ApiResult<ApiResponse> {
        self.send(Method::GET, url, None).await
    }

    async fn post<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> ApiResult<ApiResponse> {
        let body = encode(body)?;
        self.send(Method::POST, url, Some(&body)).await
    }

    async fn put<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> ApiResult<ApiResponse> {
        let body = encode(body)?;
        self.send(Method::PUT, url, Some(&body)).await
    }

    async fn delete(&self, url: Url) -> ApiResult<ApiResponse> {
        self.send(Method::DELETE, url, None).await
    }

    /// Sends one request with the token attached, and runs the failure hook.
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> ApiResult<ApiResponse> {
        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header(USER_AGENT_HEADER, USER_AGENT);

        // A session that cannot be read never blocks the request.
        match self.session.token() {
            Ok(Some(token)) => builder = builder.bearer_auth(token),
            Ok(None) => {}
            Err(e) => warn!(error = %format!("{e:#}"), "Could not read cached token"),
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "API request");
        let result = execute(builder).await;
        if let Err(err) = &result {
            self.on_error(&method, &url, err);
        }
        result
    }

    fn on_error(&self, method: &Method, url: &Url, err: &ApiError) {
        error!(%method, %url, kind = %err.kind, status = ?err.status, "API error: {err}");

        if err.is_unauthorized() {
            warn!("Unauthorized! The token may have expired; dropping it");
            if let Err(e) = self.session.clear_token() {
                warn!(error = %format!("{e:#}"), "Could not clear cached token");
            }
        }
    }
}

async fn execute(builder: reqwest::RequestBuilder) -> ApiResult<ApiResponse> {
    let response = builder.send().await.map_err(|e| ApiError::transport(&e))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| ApiError::transport(&e))?;
    if !status.is_success() {
        return Err(ApiError::http_status(status.as_u16(), &text));
    }

    Ok(ApiResponse::new(status.as_u16(), decode_body(&text)))
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn encode<T: Serialize + ?Sized>(body: &T) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::parse(format!("Failed to encode request: {e}")))
}
