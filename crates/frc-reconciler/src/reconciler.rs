//! Reconciliation of desired parameter declarations against the shared
//! remote document.
//!
//! Each operation is a single sequential fetch-mutate-write unit: fetch the
//! current document, mutate only the requested key on a local copy, and hand
//! the copy back to the store. The reconciler has no I/O of its own and no
//! in-process locking; serialization across concurrent writers rests
//! entirely on the version token precondition enforced at the store
//! boundary.
//!
//! The merge policy is full replacement, not diff-and-patch: the desired
//! declaration supersedes the remote copy for its key wholesale, including
//! the conditional-value map. A condition name omitted from the declaration
//! but present remotely is dropped on the next upsert.

use crate::document::ParameterDefinition;
use crate::store::{DocumentStore, SyncError};

/// Reconciles named parameters inside the shared project document.
#[derive(Debug, Clone)]
pub struct ParameterReconciler<S> {
    store: S,
}

impl<S> ParameterReconciler<S> {
    /// Builds a reconciler on top of the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: DocumentStore> ParameterReconciler<S> {
    /// Creates or updates the parameter stored under `key`.
    ///
    /// Create and update are identical at this layer. The written definition
    /// is built entirely from `desired`; remote-side fields are never read
    /// back into it, and fields left unset are filled by the remote system.
    /// Every other key in the document passes through untouched.
    ///
    /// Returns the definition exactly as declared as the new observed state.
    pub async fn upsert(
        &self,
        project: &str,
        key: &str,
        desired: &ParameterDefinition,
    ) -> Result<ParameterDefinition, SyncError> {
        desired.validate()?;
        let mut document = self.store.fetch(project).await?;
        document.set_parameter(key, desired.clone());
        self.store.replace(project, &document).await?;
        tracing::info!(project, key, "parameter reconciled");
        Ok(desired.clone())
    }

    /// Refreshes the observed state of the parameter stored under `key`.
    ///
    /// An absent key is reported as [`SyncError::NotFound`] so the caller
    /// can drop its stale local record (drift detection). This operation
    /// never writes; given only a key it also serves to bring an unmanaged
    /// remote parameter under management.
    pub async fn read(
        &self,
        project: &str,
        key: &str,
    ) -> Result<ParameterDefinition, SyncError> {
        let document = self.store.fetch(project).await?;
        match document.parameter(key) {
            Some(definition) => Ok(definition.clone()),
            None => {
                tracing::debug!(project, key, "parameter absent from remote document");
                Err(SyncError::NotFound(key.to_owned()))
            }
        }
    }

    /// Removes the parameter stored under `key`.
    ///
    /// Idempotent: a key that is already absent is not an error, and the
    /// document is written back either way so the caller can forget its
    /// local record unconditionally.
    pub async fn delete(&self, project: &str, key: &str) -> Result<(), SyncError> {
        let mut document = self.store.fetch(project).await?;
        let removed = document.remove_parameter(key);
        self.store.replace(project, &document).await?;
        tracing::info!(project, key, removed, "parameter deleted");
        Ok(())
    }
}
