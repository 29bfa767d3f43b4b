//! Document store boundary: fetch and replace the whole project document.
//!
//! The store is the only component that talks to the remote boundary. It
//! shields the reconciler from transport concerns and enforces the version
//! token contract: a replace always carries the token from the immediately
//! preceding fetch in the same operation, never a stale or wildcard one.

use async_trait::async_trait;
use thiserror::Error;

use crate::document::{DeclarationError, RemoteConfigDocument};
use crate::http::{HttpClient, HttpError};

/// Errors surfaced by reconciliation operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport, auth, or server-side failure during fetch or replace.
    /// Not locally recoverable; the caller decides whether to retry the
    /// whole operation.
    #[error("remote config backend unavailable: {0}")]
    RemoteUnavailable(String),
    /// The document changed between this operation's fetch and its write.
    /// The caller may re-fetch, re-apply, and re-write.
    #[error("remote config document was modified concurrently; re-fetch and retry")]
    ConcurrentModification,
    /// The requested key is absent from the remote document. A drift signal
    /// on read; never raised by delete.
    #[error("parameter {0:?} not found in the remote config document")]
    NotFound(String),
    /// The desired declaration failed local validation; no remote call was
    /// made.
    #[error("invalid parameter declaration: {0}")]
    InvalidDeclaration(#[from] DeclarationError),
    /// The document handed to `replace` carries no version token, meaning it
    /// did not come from a fetch in this operation.
    #[error("document carries no version token; replace requires a freshly fetched document")]
    MissingVersionToken,
}

impl From<HttpError> for SyncError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::PreconditionFailed => SyncError::ConcurrentModification,
            other => SyncError::RemoteUnavailable(other.to_string()),
        }
    }
}

/// Whole-document get/put against a project-scoped remote store.
///
/// The remote boundary has no per-key patch, so every mutation is modeled
/// as fetch-entire, modify-one-key, write-entire behind this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves the full document and its version token. The document is
    /// fetched fresh at the start of every reconciliation operation and is
    /// never cached across operations.
    async fn fetch(&self, project: &str) -> Result<RemoteConfigDocument, SyncError>;

    /// Writes the full document back, presenting the document's version
    /// token as the write precondition. On success the returned document
    /// (with its new token) supersedes the one that was written.
    async fn replace(
        &self,
        project: &str,
        document: &RemoteConfigDocument,
    ) -> Result<RemoteConfigDocument, SyncError>;
}

/// REST-backed document store.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: HttpClient,
}

impl RestStore {
    /// Wraps an HTTP client in the document store interface.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Returns the underlying HTTP client (for credential rotation).
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn fetch(&self, project: &str) -> Result<RemoteConfigDocument, SyncError> {
        let (body, version_token) = self.client.get_remote_config(project).await?;
        let mut document: RemoteConfigDocument = serde_json::from_slice(&body)
            .map_err(|err| SyncError::RemoteUnavailable(format!("malformed document: {err}")))?;
        document.version_token = version_token;
        tracing::debug!(
            project,
            parameters = document.parameters.len(),
            version_token = %document.version_token,
            "fetched remote config document"
        );
        Ok(document)
    }

    async fn replace(
        &self,
        project: &str,
        document: &RemoteConfigDocument,
    ) -> Result<RemoteConfigDocument, SyncError> {
        if document.version_token.is_empty() {
            return Err(SyncError::MissingVersionToken);
        }
        let body = serde_json::to_vec(document)
            .map_err(|err| SyncError::RemoteUnavailable(format!("unencodable document: {err}")))?;
        let (response_body, version_token) = self
            .client
            .put_remote_config(project, body, &document.version_token)
            .await?;
        let mut updated: RemoteConfigDocument = serde_json::from_slice(&response_body)
            .map_err(|err| SyncError::RemoteUnavailable(format!("malformed document: {err}")))?;
        updated.version_token = version_token;
        tracing::debug!(
            project,
            parameters = updated.parameters.len(),
            version_token = %updated.version_token,
            "replaced remote config document"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Auth, HttpClientOptions};
    use httptest::matchers::{all_of, contains, request};
    use httptest::{responders::status_code, Expectation, Server};

    fn rest_store(server: &Server) -> RestStore {
        let base_url = server.url_str("").trim_end_matches('/').to_string();
        let client = HttpClient::new(
            base_url,
            "demo",
            &Auth {
                access_token: "test-token".to_string(),
            },
            HttpClientOptions {
                allow_plaintext: true,
                accept_invalid_certs: false,
            },
        )
        .unwrap();
        RestStore::new(client)
    }

    /// A fetch deserializes the body and captures the version token.
    #[tokio::test]
    async fn fetch_parses_document_and_token() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/v1/projects/demo/remoteConfig",
            ))
            .respond_with(
                status_code(200)
                    .append_header("ETag", "etag-1")
                    .body(r#"{"parameters":{"greeting":{"defaultValue":{"value":"hello"}}}}"#),
            ),
        );

        let store = rest_store(&server);
        let document = store.fetch("demo").await.unwrap();
        assert_eq!(document.version_token, "etag-1");
        let greeting = document.parameter("greeting").unwrap();
        assert_eq!(greeting.default_value.as_ref().unwrap().value, "hello");
    }

    /// A replace presents the fetched token and adopts the new one.
    #[tokio::test]
    async fn replace_round_trips_the_token() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", "/v1/projects/demo/remoteConfig"),
                request::headers(contains(("if-match", "etag-1"))),
            ])
            .respond_with(
                status_code(200)
                    .append_header("ETag", "etag-2")
                    .body("{}"),
            ),
        );

        let store = rest_store(&server);
        let document = RemoteConfigDocument {
            version_token: "etag-1".to_string(),
            ..Default::default()
        };
        let updated = store.replace("demo", &document).await.unwrap();
        assert_eq!(updated.version_token, "etag-2");
    }

    /// A document that never came from a fetch cannot be written back.
    #[tokio::test]
    async fn replace_rejects_token_less_documents() {
        let server = Server::run();
        let store = rest_store(&server);
        let err = store
            .replace("demo", &RemoteConfigDocument::default())
            .await
            .expect_err("token-less replace must fail");
        assert!(matches!(err, SyncError::MissingVersionToken));
    }

    /// A garbled payload maps to `RemoteUnavailable`, not a panic.
    #[tokio::test]
    async fn malformed_payload_maps_to_remote_unavailable() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/v1/projects/demo/remoteConfig",
            ))
            .respond_with(
                status_code(200)
                    .append_header("ETag", "etag-1")
                    .body("not json"),
            ),
        );

        let store = rest_store(&server);
        let err = store.fetch("demo").await.expect_err("must fail to parse");
        assert!(matches!(err, SyncError::RemoteUnavailable(_)));
    }

    /// HTTP precondition failures convert to `ConcurrentModification`.
    #[test]
    fn precondition_failure_converts_to_concurrent_modification() {
        let err: SyncError = HttpError::PreconditionFailed.into();
        assert!(matches!(err, SyncError::ConcurrentModification));

        let err: SyncError = HttpError::Unauthorized.into();
        assert!(matches!(err, SyncError::RemoteUnavailable(_)));
    }
}
