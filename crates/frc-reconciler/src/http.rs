//! HTTP client for the Firebase Remote Config REST API.
//!
//! The remote boundary only exposes whole-document get/put, so this module
//! is deliberately small: it builds authenticated requests, classifies HTTP
//! statuses into a stable error taxonomy, and extracts the `ETag` version
//! token every fetch and replace depends on. Credential material never
//! appears in logs.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, ETAG, IF_MATCH, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tokio::sync::RwLock;

/// Default REST endpoint for the Remote Config service.
pub const DEFAULT_BASE_URL: &str = "https://firebaseremoteconfig.googleapis.com";

/// Authentication material required for Remote Config requests.
#[derive(Debug, Clone)]
pub struct Auth {
    /// OAuth2 access token scoped to `firebase.remoteconfig`. How the token
    /// is obtained is the embedder's concern.
    pub access_token: String,
}

/// Additional options governing how the HTTP client is constructed.
#[derive(Debug, Clone, Copy)]
pub struct HttpClientOptions {
    /// Whether plaintext (HTTP) endpoints are allowed. Only useful for
    /// emulators and tests.
    pub allow_plaintext: bool,
    /// Whether TLS certificate validation should be skipped.
    pub accept_invalid_certs: bool,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            allow_plaintext: false,
            accept_invalid_certs: false,
        }
    }
}

/// Error taxonomy for the REST boundary.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Credentials were rejected by the backend.
    #[error("unauthorized - access token rejected or missing remote config scope")]
    Unauthorized,
    /// The write precondition was rejected: the document changed between
    /// fetch and replace.
    #[error("write precondition rejected: the remote document has changed")]
    PreconditionFailed,
    /// Request rejected by the backend (4xx other than auth/precondition).
    #[error("request rejected by backend: status {0}")]
    Request(u16),
    /// Backend reported a temporary outage (429 or 5xx).
    #[error("transient backend error: status {0}")]
    Retryable(u16),
    /// The provided URL violates the required transport policy.
    #[error("insecure base url requires explicit opt-in: {0}")]
    InsecureUrl(String),
    /// No project was supplied and none is configured as the default.
    #[error("no project specified and no default project configured")]
    MissingProject,
    /// Credential material could not be placed in a request header.
    #[error("credential material is not a valid header value")]
    InvalidHeader,
    /// The response did not carry the `ETag` version token, so the
    /// concurrency contract cannot be honored.
    #[error("response is missing the ETag version token")]
    MissingVersionToken,
    /// Transport-level issue (DNS, TLS, socket, etc.).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client encapsulating a reusable `reqwest::Client`, base URL, default
/// project, and rotating credentials.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Underlying HTTP client (shared across requests).
    client: Client,
    /// REST base URL (scheme + host).
    base_url: String,
    /// Project used when a call does not name one explicitly.
    default_project: String,
    /// Shared header map guarded by a read/write lock for token rotation.
    headers: Arc<RwLock<HeaderMap>>,
}

impl HttpClient {
    /// Builds an HTTP client using the provided base URL, default project,
    /// and authentication information.
    pub fn new(
        base_url: impl Into<String>,
        default_project: impl Into<String>,
        auth: &Auth,
        options: HttpClientOptions,
    ) -> Result<Self, HttpError> {
        let base_url = base_url.into();
        // Guard against accidentally pointing at plaintext endpoints unless
        // the caller explicitly opted in via `allow_plaintext`.
        if !options.allow_plaintext && base_url.starts_with("http://") {
            return Err(HttpError::InsecureUrl(base_url));
        }

        let mut headers = HeaderMap::new();
        let user_agent = format!("frc-reconciler/{}", env!("CARGO_PKG_VERSION"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|_| HttpError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer_header(&auth.access_token)?);

        let client = Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(HttpError::Transport)?;

        Ok(Self {
            client,
            base_url,
            default_project: default_project.into(),
            headers: Arc::new(RwLock::new(headers)),
        })
    }

    /// Replaces the access token used for subsequent requests.
    pub async fn update_access_token(&self, access_token: &str) -> Result<(), HttpError> {
        let mut headers = self.headers.write().await;
        headers.insert(AUTHORIZATION, bearer_header(access_token)?);
        Ok(())
    }

    /// Returns the base URL currently configured for the client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a per-call project against the configured default.
    ///
    /// An empty per-call project falls back to the default; if neither is
    /// set there is no way to build a request path.
    pub fn resolve_project<'a>(&'a self, project: &'a str) -> Result<&'a str, HttpError> {
        let resolved = if project.is_empty() {
            self.default_project.as_str()
        } else {
            project
        };
        if resolved.is_empty() {
            return Err(HttpError::MissingProject);
        }
        Ok(resolved)
    }

    /// Fetches the full document for `project`.
    ///
    /// Returns the raw JSON body together with the `ETag` version token the
    /// replace path must present as its write precondition.
    pub async fn get_remote_config(&self, project: &str) -> Result<(Vec<u8>, String), HttpError> {
        self.send_request(Method::GET, project, None, None).await
    }

    /// Replaces the full document for `project`.
    ///
    /// `version_token` is sent as `If-Match` so the backend rejects the
    /// write if the document changed since it was fetched. A wildcard token
    /// is never sent; that would silently reintroduce lost-update races.
    pub async fn put_remote_config(
        &self,
        project: &str,
        body: Vec<u8>,
        version_token: &str,
    ) -> Result<(Vec<u8>, String), HttpError> {
        self.send_request(Method::PUT, project, Some(body), Some(version_token))
            .await
    }

    /// Internal helper: attaches headers, sends the request, classifies the
    /// HTTP status, and extracts the response version token.
    async fn send_request(
        &self,
        method: Method,
        project: &str,
        body: Option<Vec<u8>>,
        if_match: Option<&str>,
    ) -> Result<(Vec<u8>, String), HttpError> {
        let project = self.resolve_project(project)?;
        let url = format!("{}/v1/projects/{}/remoteConfig", self.base_url, project);
        // Clone headers under the read lock so it is not held across awaits.
        let mut headers = self.headers.read().await.clone();
        if let Some(token) = if_match {
            headers.insert(
                IF_MATCH,
                HeaderValue::from_str(token).map_err(|_| HttpError::InvalidHeader)?,
            );
        }
        let redacted_headers = redact_headers(&headers);
        let body_len = body.as_ref().map(Vec::len).unwrap_or(0);

        tracing::debug!(
            method = %method,
            url = %url,
            headers = ?redacted_headers,
            body_len = body_len,
            "remote config HTTP request"
        );

        let builder = self.client.request(method.clone(), url.clone()).headers(headers);
        let builder = match body {
            Some(bytes) => builder.body(bytes),
            None => builder,
        };
        let response = builder.send().await?;

        let status = response.status();
        let version_token = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() {
            // Buffer the error body so failures are diagnosable from logs.
            let error_body = response.bytes().await.unwrap_or_default();
            tracing::debug!(
                method = %method,
                url = %url,
                status = %status,
                body = %String::from_utf8_lossy(&error_body),
                "remote config HTTP error response"
            );
            return Err(classify_status(status));
        }

        tracing::debug!(
            method = %method,
            url = %url,
            status = %status,
            "remote config HTTP response"
        );

        // Without a token the caller could never satisfy the write
        // precondition, so treat its absence as a backend failure.
        let version_token = version_token.ok_or(HttpError::MissingVersionToken)?;
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), version_token))
    }
}

/// Maps non-success HTTP status codes to the error taxonomy.
fn classify_status(status: StatusCode) -> HttpError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        // Authentication failure: callers should not retry until the token
        // is rotated.
        return HttpError::Unauthorized;
    }
    if status == StatusCode::PRECONDITION_FAILED {
        // The If-Match token no longer matches the remote document.
        return HttpError::PreconditionFailed;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        // Quota exhaustion and 5xx are temporary; the whole fetch-mutate-
        // write unit can be retried from scratch.
        return HttpError::Retryable(status.as_u16());
    }
    HttpError::Request(status.as_u16())
}

/// Builds a `Bearer` authorization header from raw token material.
fn bearer_header(access_token: &str) -> Result<HeaderValue, HttpError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .map_err(|_| HttpError::InvalidHeader)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Returns a redacted view of request headers suitable for debug logging.
fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.as_str().to_ascii_lowercase();
            let display = if lower == "authorization" {
                "<redacted>".to_string()
            } else {
                value
                    .to_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| "<non-utf8>".to_string())
            };
            (lower, display)
        })
        .collect()
}
