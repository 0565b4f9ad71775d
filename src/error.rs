//! Error types for the schema registry

use std::fmt;

use thiserror::Error;

use crate::compiler::CompileError;
use crate::validation::Violation;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Which creation-time invariant a new schema would break
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A schema with the identical id already exists
    Duplicate { id: String },
    /// A greater version is already registered for the same tenant and name
    SupersededByGreaterVersion { id: String },
}

impl ConflictKind {
    /// Id of the existing schema that caused the conflict
    pub fn existing_id(&self) -> &str {
        match self {
            ConflictKind::Duplicate { id } | ConflictKind::SupersededByGreaterVersion { id } => id,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Duplicate { id } => {
                write!(f, "A JsonSchema with ID '{id}' already exists!")
            }
            ConflictKind::SupersededByGreaterVersion { id } => write!(
                f,
                "A JsonSchema with a greater version already exists! (see schema with ID: '{id}')"
            ),
        }
    }
}

/// Schema registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No JsonSchema with ID '{id}' was found!")]
    SchemaNotFound { id: String },

    #[error("No JsonSchema with name '{name}' was found!")]
    SchemaNameNotFound { name: String },

    #[error("No UiSchema on JsonSchema with ID '{schema_id}' was found!")]
    UiSchemaNotFound { schema_id: String },

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    /// Carries every violation, in evaluation order
    #[error("Constraint Violation")]
    ValidationFailed { violations: Vec<Violation> },

    #[error("Schema compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Input is not valid JSON: {detail}")]
    MalformedInput { detail: String },

    #[error("Invalid version: '{version}' (expected dot-separated non-negative integers)")]
    InvalidVersion { version: String },

    #[error("Invalid request: {detail}")]
    InvalidRequest { detail: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl RegistryError {
    /// Schema or UI schema absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SchemaNotFound { .. }
                | RegistryError::SchemaNameNotFound { .. }
                | RegistryError::UiSchemaNotFound { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Conflict(_))
    }

    /// Violations carried by a `ValidationFailed` error, empty otherwise
    pub fn violations(&self) -> &[Violation] {
        match self {
            RegistryError::ValidationFailed { violations } => violations,
            _ => &[],
        }
    }
}
