//! Instance validation
//!
//! `validate(input, schema_id)` resolves the stored schema, records the
//! validation attempt, fetches the compiled schema from the cache and
//! evaluates the instance. Violations come back in evaluation order, which
//! follows the schema's keyword declaration order and is stable across runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::CompiledSchemaCache;
use crate::compiler::CompiledSchema;
use crate::error::{RegistryError, Result};
use crate::schema::now_millis;
use crate::store::SchemaStore;

/// One violation found in an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer into the instance; the root is the empty string
    pub instance_location: String,
    /// Fixed-locale message text
    pub message: String,
}

impl Violation {
    pub fn new(instance_location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_location: instance_location.into(),
            message: message.into(),
        }
    }
}

/// Anything that checks a JSON value and reports violations in order
pub trait Validate {
    fn validate(&self, instance: &Value) -> Vec<Violation>;
}

impl Validate for CompiledSchema {
    fn validate(&self, instance: &Value) -> Vec<Violation> {
        self.evaluate(instance)
    }
}

/// Turn a violation list into `ValidationFailed`, or `Ok` when empty
pub fn ensure_valid(violations: Vec<Violation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::ValidationFailed { violations })
    }
}

/// Validates instances against stored schemas
pub struct ValidationEngine {
    store: Arc<dyn SchemaStore>,
    cache: Arc<CompiledSchemaCache>,
}

impl ValidationEngine {
    pub fn new(store: Arc<dyn SchemaStore>, cache: Arc<CompiledSchemaCache>) -> Self {
        Self { store, cache }
    }

    /// Validate JSON input against a stored schema; empty when valid
    pub fn validate(&self, input: &str, schema_id: &str) -> Result<Vec<Violation>> {
        let schema = self.resolve_schema(schema_id)?;
        Self::validate_with(input, schema.as_ref())
    }

    /// Validate JSON input against a stored schema, failing with every
    /// violation when the input does not conform
    pub fn validate_and_throw(&self, input: &str, schema_id: &str) -> Result<()> {
        ensure_valid(self.validate(input, schema_id)?)
    }

    /// Validate JSON input with any validator
    pub fn validate_with(input: &str, validator: &dyn Validate) -> Result<Vec<Violation>> {
        let instance = parse_instance(input)?;
        Ok(validator.validate(&instance))
    }

    pub fn validate_and_throw_with(input: &str, validator: &dyn Validate) -> Result<()> {
        ensure_valid(Self::validate_with(input, validator)?)
    }

    /// Look up the schema, count the attempt, and compile through the cache.
    ///
    /// The attempt is recorded before evaluation so that invalid and even
    /// malformed input is counted. The record is read again after the cache
    /// lookup; if it was deleted or replaced meanwhile, the cached entry is
    /// dropped and the schema reads as not found.
    fn resolve_schema(&self, schema_id: &str) -> Result<Arc<CompiledSchema>> {
        let record = self
            .store
            .find_by_id(schema_id)?
            .ok_or_else(|| RegistryError::SchemaNotFound {
                id: schema_id.to_string(),
            })?;

        self.store.record_validation_usage(&record.id, now_millis())?;
        debug!(schema_id = %record.id, "Recorded validation attempt");

        let compiled = self.cache.get(&record.id, &record.raw_document)?;

        // A delete landing while we compiled has already evicted the id, so
        // our entry would outlive it and shadow a later re-create
        match self.store.find_by_id(&record.id)? {
            Some(current) if current.checksum == record.checksum => Ok(compiled),
            _ => {
                self.cache.evict(&record.id);
                Err(RegistryError::SchemaNotFound {
                    id: schema_id.to_string(),
                })
            }
        }
    }
}

fn parse_instance(input: &str) -> Result<Value> {
    serde_json::from_str(input).map_err(|e| RegistryError::MalformedInput {
        detail: e.to_string(),
    })
}
