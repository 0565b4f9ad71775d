//! Meta-validation of incoming schema documents
//!
//! Before a document is stored it must be JSON, declare the draft 2020-12
//! dialect in `$schema`, and conform to that dialect's meta-schema. The
//! meta-schema and its vocabularies ship with the crate, so checking a
//! document never touches the network, and every violation is reported.

use std::sync::OnceLock;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::compiler::{check_dialect, meta_message, CompileError, Draft202012Compiler};
use crate::messages;
use crate::validation::{Validate, Violation};

const META_SCHEMA: &str = include_str!("../meta_schemas/draft2020-12/schema.json");

const VOCABULARIES: [(&str, &str); 7] = [
    (
        "https://json-schema.org/draft/2020-12/meta/core",
        include_str!("../meta_schemas/draft2020-12/meta/core.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/applicator",
        include_str!("../meta_schemas/draft2020-12/meta/applicator.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/unevaluated",
        include_str!("../meta_schemas/draft2020-12/meta/unevaluated.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/validation",
        include_str!("../meta_schemas/draft2020-12/meta/validation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/meta-data",
        include_str!("../meta_schemas/draft2020-12/meta/meta-data.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/format-annotation",
        include_str!("../meta_schemas/draft2020-12/meta/format-annotation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/content",
        include_str!("../meta_schemas/draft2020-12/meta/content.json"),
    ),
];

/// The draft 2020-12 meta-schema, compiled once per process
fn meta_schema() -> Result<&'static JSONSchema, &'static str> {
    static META: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    META.get_or_init(compile_meta_schema)
        .as_ref()
        .map_err(String::as_str)
}

fn compile_meta_schema() -> Result<JSONSchema, String> {
    let parse = |text: &str| serde_json::from_str::<Value>(text).map_err(|e| e.to_string());

    let mut options = JSONSchema::options();
    options.with_draft(Draft::Draft202012);
    for (id, text) in VOCABULARIES {
        options.with_document(id.to_string(), parse(text)?);
    }

    let root = parse(META_SCHEMA)?;
    options.compile(&root).map_err(|e| e.to_string())
}

/// Checks schema documents against the supported dialect
#[derive(Debug, Clone, Default)]
pub struct MetaSchemaValidator {
    compiler: Draft202012Compiler,
}

impl MetaSchemaValidator {
    pub fn new(compiler: Draft202012Compiler) -> Self {
        Self { compiler }
    }

    /// Check a document's text; empty when the document is acceptable
    pub fn validate_document(&self, document: &str) -> Vec<Violation> {
        if document.trim().is_empty() {
            return vec![Violation::new("", "must be valid JSON, but was blank")];
        }

        match serde_json::from_str::<Value>(document) {
            Ok(value) => self.validate(&value),
            Err(_) => vec![Violation::new(
                "",
                format!("must be valid JSON, but was: '{document}'"),
            )],
        }
    }
}

impl Validate for MetaSchemaValidator {
    fn validate(&self, instance: &Value) -> Vec<Violation> {
        if let Err(err) = check_dialect(instance) {
            return vec![Violation::new("", err.to_string())];
        }

        let meta = match meta_schema() {
            Ok(meta) => meta,
            Err(reason) => {
                return vec![Violation::new("", format!("meta-schema unavailable: {reason}"))]
            }
        };

        if let Err(errors) = meta.validate(instance) {
            return errors
                .flat_map(|error| {
                    let location = error.instance_path.to_string();
                    messages::describe(&error)
                        .into_iter()
                        .map(move |message| {
                            Violation::new(location.clone(), meta_message(&location, &message))
                        })
                })
                .collect();
        }

        // Conforming documents can still fail to compile, e.g. on a bad regex
        match self.compiler.compile_value(instance) {
            Ok(_) => Vec::new(),
            Err(CompileError::InvalidSchema { location, message }) => {
                vec![Violation::new(location.clone(), meta_message(&location, &message))]
            }
            Err(other) => vec![Violation::new("", other.to_string())],
        }
    }
}
