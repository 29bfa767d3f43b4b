//! Data model for the Firebase Remote Config document and its parameters.
//!
//! The remote boundary exchanges the project document as a single JSON
//! payload, so these types mirror the REST wire shape exactly. Sections of
//! the document owned by other tooling (conditions, parameter groups,
//! version metadata) are captured in a flattened map and written back
//! untouched, which keeps every mutation scoped to the one parameter key
//! being reconciled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while validating a desired parameter declaration.
///
/// These are caught before any remote call is made, so a rejected
/// declaration never results in a fetch or a write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    /// Every parameter must declare a default value.
    #[error("parameter declaration is missing the required default value")]
    MissingDefaultValue,
    /// The declared value type is outside the enumerated set.
    #[error("unknown parameter value type: {0:?}")]
    UnknownValueType(String),
}

/// Data type hint attached to a parameter, using the REST wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "PARAMETER_VALUE_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "NUMBER")]
    Number,
    #[serde(rename = "JSON")]
    Json,
}

impl ValueType {
    /// Parses a wire-format value type name.
    ///
    /// Rejects anything outside the enumerated set so bad declarations are
    /// caught locally instead of surfacing as backend validation errors.
    pub fn parse(input: &str) -> Result<Self, DeclarationError> {
        match input {
            "PARAMETER_VALUE_TYPE_UNSPECIFIED" => Ok(Self::Unspecified),
            "STRING" => Ok(Self::String),
            "BOOLEAN" => Ok(Self::Boolean),
            "NUMBER" => Ok(Self::Number),
            "JSON" => Ok(Self::Json),
            other => Err(DeclarationError::UnknownValueType(other.to_owned())),
        }
    }

    /// Returns the wire-format name for this value type.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Unspecified => "PARAMETER_VALUE_TYPE_UNSPECIFIED",
            Self::String => "STRING",
            Self::Boolean => "BOOLEAN",
            Self::Number => "NUMBER",
            Self::Json => "JSON",
        }
    }
}

/// One default or conditional value: the atomic unit of a parameter.
///
/// When `use_in_app_default` is set the remote evaluator ignores `value`,
/// but both fields are stored verbatim; choosing between them is the
/// evaluator's concern, not ours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    /// Literal value served to clients.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// When `true`, clients fall back to their in-app default instead.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_in_app_default: bool,
}

impl ParameterValue {
    /// Builds a literal value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            use_in_app_default: false,
        }
    }

    /// Builds a value deferring to the client's in-app default.
    pub fn in_app_default() -> Self {
        Self {
            value: String::new(),
            use_in_app_default: true,
        }
    }
}

/// One parameter's full state: description, type, default, and per-condition
/// overrides.
///
/// The same type serves both the desired declaration and the observed remote
/// state. Optional fields left as `None` are omitted from the serialized
/// body so the remote system fills its own defaults, mirroring how the
/// declaration layer distinguishes "unset" from "explicitly empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Free-form description shown in the console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Data type hint applied to the default and every conditional value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Value served when no condition matches. Required on every
    /// declaration; see [`ParameterDefinition::validate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ParameterValue>,
    /// Overrides keyed by condition name. The conditions themselves are
    /// defined elsewhere in the document and are not managed here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditional_values: BTreeMap<String, ParameterValue>,
}

impl ParameterDefinition {
    /// Validates the declaration before it is sent anywhere.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        if self.default_value.is_none() {
            return Err(DeclarationError::MissingDefaultValue);
        }
        Ok(())
    }
}

/// The whole-project container exchanged atomically with the remote store.
///
/// Every mutation is a read-entire, modify-one-key, write-entire cycle; the
/// flattened `rest` map carries the document sections this crate does not
/// manage so they survive the round trip byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfigDocument {
    /// Parameters keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterDefinition>,
    /// Foreign sections (`conditions`, `parameterGroups`, `version`, ...)
    /// passed through unmodified on writes.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
    /// Opaque version token (the `ETag` header) from the fetch that produced
    /// this document. Not part of the JSON body; populated by the store.
    #[serde(skip)]
    pub version_token: String,
}

impl RemoteConfigDocument {
    /// Returns the definition stored under `key`, if any.
    pub fn parameter(&self, key: &str) -> Option<&ParameterDefinition> {
        self.parameters.get(key)
    }

    /// Replaces (or creates) the definition stored under `key`.
    pub fn set_parameter(&mut self, key: impl Into<String>, definition: ParameterDefinition) {
        self.parameters.insert(key.into(), definition);
    }

    /// Removes the definition stored under `key`, reporting whether it
    /// existed. Absence is not an error; removal is idempotent.
    pub fn remove_parameter(&mut self, key: &str) -> bool {
        self.parameters.remove(key).is_some()
    }
}
