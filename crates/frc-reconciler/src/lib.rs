//! Declarative reconciliation of Firebase Remote Config parameters.
//!
//! The remote boundary exposes the project configuration as one shared
//! document with whole-document get/put only, so every mutation here is a
//! fetch-mutate-write cycle scoped to a single parameter key. The crate
//! re-exports the building blocks needed to embed that cycle in a host
//! application: the data model, the REST store, and the reconciler that
//! drives create/read/delete against desired declarations.

pub mod config;
pub mod document;
pub mod http;
pub mod reconciler;
pub mod store;

pub use config::Settings;
pub use document::{
    DeclarationError, ParameterDefinition, ParameterValue, RemoteConfigDocument, ValueType,
};
pub use http::{Auth, HttpClient, HttpClientOptions, HttpError, DEFAULT_BASE_URL};
pub use reconciler::ParameterReconciler;
pub use store::{DocumentStore, RestStore, SyncError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensures a reconciler can be wired up entirely through the crate root.
    #[test]
    fn reconciler_types_are_reexported() {
        let mut settings = Settings::from_env_iter::<Vec<(String, String)>, _, _>(Vec::new());
        settings.access_token = Some("test-token".into());
        settings.project = Some("demo".into());

        let auth = settings.to_auth().expect("token was set");
        let client = HttpClient::new(
            settings.base_url.clone(),
            settings.project.clone().unwrap_or_default(),
            &auth,
            settings.http_options(),
        )
        .expect("client construction");
        let reconciler = ParameterReconciler::new(RestStore::new(client));
        assert_eq!(reconciler.store().client().base_url(), DEFAULT_BASE_URL);
    }

    /// Verifies the declaration helpers exported at the crate root remain
    /// usable.
    #[test]
    fn declaration_helpers_work_via_reexports() {
        let declaration = ParameterDefinition {
            value_type: Some(ValueType::Json),
            default_value: Some(ParameterValue::in_app_default()),
            ..Default::default()
        };
        assert!(declaration.validate().is_ok());
        assert!(matches!(
            ParameterDefinition::default().validate(),
            Err(DeclarationError::MissingDefaultValue)
        ));
    }
}
