//! Schema compilation
//!
//! Turns a raw schema document into a reusable validator. Evaluation of the
//! draft 2020-12 vocabulary itself is delegated to the `jsonschema` crate;
//! this module only fixes the dialect and options, and translates its
//! errors.

use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use thiserror::Error;

use crate::messages;
use crate::validation::Violation;

/// The only dialect the registry accepts
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Why a raw document could not be turned into a validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("schema document is not valid JSON: {0}")]
    MalformedDocument(String),

    /// `found` is `null` when the document declares no dialect
    #[error("Wrong value in $schema-node. Expected: '{expected}' Found: '{found}'")]
    UnsupportedDialect { expected: String, found: String },

    #[error("{}", meta_message(location, message))]
    InvalidSchema { location: String, message: String },
}

pub(crate) fn meta_message(location: &str, message: &str) -> String {
    if location.is_empty() {
        message.to_string()
    } else {
        format!("{location}: {message}")
    }
}

/// Capability that turns raw documents into compiled schemas
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, raw_document: &str) -> Result<CompiledSchema, CompileError>;
}

/// A compiled, immutable validator for one schema document
pub struct CompiledSchema {
    validator: JSONSchema,
}

impl CompiledSchema {
    /// Evaluate an instance, returning every violation in evaluation order
    pub fn evaluate(&self, instance: &Value) -> Vec<Violation> {
        match self.validator.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .flat_map(|error| {
                    let location = error.instance_path.to_string();
                    messages::describe(&error)
                        .into_iter()
                        .map(move |message| Violation::new(location.clone(), message))
                })
                .collect(),
        }
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

/// Read the `$schema` declaration and require draft 2020-12
pub fn check_dialect(document: &Value) -> Result<(), CompileError> {
    match document.get("$schema").and_then(Value::as_str) {
        Some(DRAFT_2020_12) => Ok(()),
        other => Err(CompileError::UnsupportedDialect {
            expected: DRAFT_2020_12.to_string(),
            found: other.unwrap_or("null").to_string(),
        }),
    }
}

/// Draft 2020-12 compiler backed by the `jsonschema` crate
#[derive(Debug, Clone)]
pub struct Draft202012Compiler {
    format_assertions: bool,
}

impl Draft202012Compiler {
    pub fn new() -> Self {
        Self {
            format_assertions: true,
        }
    }

    /// Whether `format` is asserted rather than only annotated
    pub fn with_format_assertions(mut self, enabled: bool) -> Self {
        self.format_assertions = enabled;
        self
    }

    /// Compile an already parsed document
    pub fn compile_value(&self, document: &Value) -> Result<CompiledSchema, CompileError> {
        check_dialect(document)?;

        let validator = JSONSchema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(self.format_assertions)
            .compile(document)
            .map_err(|error| CompileError::InvalidSchema {
                location: error.instance_path.to_string(),
                message: messages::describe(&error).join("; "),
            })?;

        Ok(CompiledSchema { validator })
    }
}

impl Default for Draft202012Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCompiler for Draft202012Compiler {
    fn compile(&self, raw_document: &str) -> Result<CompiledSchema, CompileError> {
        let document: Value = serde_json::from_str(raw_document)
            .map_err(|e| CompileError::MalformedDocument(e.to_string()))?;
        self.compile_value(&document)
    }
}
