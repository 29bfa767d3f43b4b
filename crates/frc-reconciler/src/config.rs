//! Environment-driven helpers for bootstrapping the reconciler.
//!
//! This module derives crate configuration from the host process
//! environment: the default project, the access token, and the endpoint /
//! TLS knobs needed to point at an emulator in tests. Obtaining the token
//! itself (credential discovery) is the embedder's concern and stays
//! outside this crate.

use std::collections::HashMap;
use std::env;

use crate::http::{Auth, HttpClientOptions, DEFAULT_BASE_URL};

/// Environment variable naming the default project.
const ENV_PROJECT: &str = "FRC_PROJECT";
/// Fallback environment variable for the project, shared with other Google
/// tooling.
const ENV_FALLBACK_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
/// Environment variable carrying the OAuth2 access token.
const ENV_ACCESS_TOKEN: &str = "FRC_ACCESS_TOKEN";
/// Environment variable overriding the REST base URL (e.g. an emulator).
const ENV_BASE_URL: &str = "FRC_BASE_URL";
/// Environment variable allowing plaintext (HTTP) endpoints.
const ENV_ALLOW_PLAINTEXT: &str = "FRC_ALLOW_PLAINTEXT";
/// Environment variable disabling TLS certificate validation.
const ENV_NO_TLS_VALIDATION: &str = "FRC_NO_TLS_VALIDATION";

/// Captures environment-derived options used to bootstrap the client.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default project used when an operation does not name one.
    pub project: Option<String>,
    /// Access token used for authentication.
    pub access_token: Option<String>,
    /// REST base URL (scheme + host).
    pub base_url: String,
    /// When `true`, plaintext endpoints are allowed.
    pub allow_plaintext: bool,
    /// When `true`, TLS certificate validation is skipped.
    pub no_tls_validation: bool,
}

impl Settings {
    /// Builds settings from the current process environment.
    ///
    /// Side-effect free apart from reading `std::env::vars`. Embedder
    /// defaults can be applied afterwards before constructing the client.
    pub fn from_os_env() -> Self {
        Self::from_env_iter(env::vars())
    }

    /// Builds settings from an iterator of key/value pairs (typically for
    /// tests).
    pub fn from_env_iter<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let project = map
            .get(ENV_PROJECT)
            // Prefer the dedicated variable when present.
            .and_then(|value| sanitize_non_empty(value))
            .or_else(|| {
                map.get(ENV_FALLBACK_PROJECT)
                    .and_then(|value| sanitize_non_empty(value))
            });
        let access_token = map
            .get(ENV_ACCESS_TOKEN)
            .and_then(|value| sanitize_non_empty(value));
        let base_url = map
            .get(ENV_BASE_URL)
            .and_then(|value| sanitize_non_empty(value))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let allow_plaintext = parse_bool(map.get(ENV_ALLOW_PLAINTEXT).map(String::as_str), false);
        let no_tls_validation =
            parse_bool(map.get(ENV_NO_TLS_VALIDATION).map(String::as_str), false);

        Self {
            project,
            access_token,
            base_url,
            allow_plaintext,
            no_tls_validation,
        }
    }

    /// Builds an [`Auth`] structure when token material is available.
    pub fn to_auth(&self) -> Option<Auth> {
        self.access_token.as_ref().map(|access_token| Auth {
            access_token: access_token.clone(),
        })
    }

    /// Derives HTTP client options from the TLS knobs.
    pub fn http_options(&self) -> HttpClientOptions {
        HttpClientOptions {
            allow_plaintext: self.allow_plaintext,
            accept_invalid_certs: self.no_tls_validation,
        }
    }
}

/// Helper trimming whitespace and discarding empty values.
fn sanitize_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses boolean values from strings, falling back to the provided default.
fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|s| s.trim().to_ascii_lowercase()) {
        Some(ref v) if ["1", "true", "t", "yes", "y"].contains(&v.as_str()) => true,
        Some(ref v) if ["0", "false", "f", "no", "n"].contains(&v.as_str()) => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensures defaults point at the production endpoint with TLS intact.
    #[test]
    fn settings_defaults() {
        let settings = Settings::from_env_iter::<Vec<(String, String)>, _, _>(vec![]);
        assert!(settings.project.is_none());
        assert!(settings.access_token.is_none());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(!settings.allow_plaintext);
        assert!(!settings.no_tls_validation);
    }

    /// Confirms environment-derived settings respect overrides.
    #[test]
    fn settings_honour_overrides() {
        let settings = Settings::from_env_iter([
            (ENV_PROJECT, "  demo-project "),
            (ENV_ACCESS_TOKEN, "token-123"),
            (ENV_BASE_URL, "http://localhost:9099/"),
            (ENV_ALLOW_PLAINTEXT, "1"),
            (ENV_NO_TLS_VALIDATION, "true"),
        ]);
        assert_eq!(settings.project.as_deref(), Some("demo-project"));
        assert_eq!(settings.access_token.as_deref(), Some("token-123"));
        assert_eq!(settings.base_url, "http://localhost:9099");
        assert!(settings.allow_plaintext);
        assert!(settings.no_tls_validation);
    }

    /// Verifies the fallback to the shared Google project variable.
    #[test]
    fn settings_fall_back_to_google_cloud_project() {
        let settings = Settings::from_env_iter([(ENV_FALLBACK_PROJECT, " shared-project ")]);
        assert_eq!(settings.project.as_deref(), Some("shared-project"));

        let dedicated = Settings::from_env_iter([
            (ENV_PROJECT, "dedicated"),
            (ENV_FALLBACK_PROJECT, "shared-project"),
        ]);
        assert_eq!(dedicated.project.as_deref(), Some("dedicated"));
    }

    /// Ensures the helper can materialise an `Auth` structure when a token
    /// exists.
    #[test]
    fn settings_build_auth() {
        let settings = Settings::from_env_iter([(ENV_ACCESS_TOKEN, "token")]);
        let auth = settings.to_auth().expect("auth should be available");
        assert_eq!(auth.access_token, "token");

        let empty = Settings::from_env_iter([(ENV_ACCESS_TOKEN, "   ")]);
        assert!(empty.to_auth().is_none());
    }

    /// Confirms boolean parsing honours common truthy/falsy spellings.
    #[test]
    fn parse_bool_permits_common_variants() {
        assert!(parse_bool(Some("true"), false));
        assert!(parse_bool(Some("Yes"), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("false"), true));
        assert!(!parse_bool(Some("0"), true));
        assert!(parse_bool(Some("maybe"), true));
    }
}
