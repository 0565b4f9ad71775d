//! Schema Registry
//!
//! Create, look up and delete versioned JSON schemas per tenant. Schema
//! documents are immutable: a changed document is a new version.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::cache::CompiledSchemaCache;
use crate::conflict::ConflictGuard;
use crate::dialect::MetaSchemaValidator;
use crate::error::{RegistryError, Result};
use crate::schema::{SchemaCreateRequest, SchemaRecord};
use crate::store::{Page, PageRequest, SchemaStore};
use crate::validation::ensure_valid;
use crate::version::SchemaVersion;

/// The main schema registry
pub struct SchemaRegistry {
    store: Arc<dyn SchemaStore>,
    cache: Arc<CompiledSchemaCache>,
    guard: ConflictGuard,
    meta: MetaSchemaValidator,
}

impl SchemaRegistry {
    pub fn new(
        store: Arc<dyn SchemaStore>,
        cache: Arc<CompiledSchemaCache>,
        meta: MetaSchemaValidator,
    ) -> Self {
        Self {
            guard: ConflictGuard::new(Arc::clone(&store)),
            store,
            cache,
            meta,
        }
    }

    /// Create a new schema, or a new version of an existing one
    pub fn create(&self, tenant_id: &str, request: SchemaCreateRequest) -> Result<SchemaRecord> {
        require_text("tenant id", tenant_id)?;
        require_text("name", &request.name)?;
        SchemaVersion::parse(&request.version)?;
        ensure_valid(self.meta.validate_document(&request.value))?;

        let document: Value = serde_json::from_str(&request.value)?;
        let record = SchemaRecord::new(
            tenant_id,
            request.name,
            request.version,
            document.to_string(),
            request.description,
        );

        self.guard.check(&record)?;

        // The store rejects a racing insert of the same id on its own
        let created = self.store.insert(record)?;
        info!(tenant_id, schema_id = %created.id, "Created schema");
        Ok(created)
    }

    /// Get a schema by id, within a tenant
    pub fn get_by_id(&self, tenant_id: &str, id: &str) -> Result<SchemaRecord> {
        self.store
            .find_by_tenant_and_id(tenant_id, id)?
            .ok_or_else(|| RegistryError::SchemaNotFound { id: id.to_string() })
    }

    /// Get the greatest version of a named schema
    pub fn get_latest_by_name(&self, tenant_id: &str, name: &str) -> Result<SchemaRecord> {
        let records = self.store.find_all_by_tenant_and_name(
            tenant_id,
            &name.to_lowercase(),
            PageRequest::unpaged(),
        )?;

        records
            .into_iter()
            .filter_map(|record| {
                SchemaVersion::parse(&record.version)
                    .ok()
                    .map(|version| (version, record))
            })
            .max_by(|(left_version, left), (right_version, right)| {
                left_version
                    .cmp(right_version)
                    .then_with(|| left.created_at.cmp(&right.created_at))
            })
            .map(|(_, record)| record)
            .ok_or_else(|| RegistryError::SchemaNameNotFound {
                name: name.to_string(),
            })
    }

    /// List a tenant's schemas, ordered by id
    pub fn list(&self, tenant_id: &str, page: PageRequest) -> Result<Page<SchemaRecord>> {
        self.store.find_all_by_tenant(tenant_id, page)
    }

    /// Delete a schema; it must belong to the tenant
    pub fn delete(&self, tenant_id: &str, id: &str) -> Result<()> {
        let record = self.get_by_id(tenant_id, id)?;

        self.store.delete_by_id(&record.id)?;
        // The id may be reused by a later create with another document
        self.cache.evict(&record.id);
        info!(tenant_id, schema_id = %record.id, "Deleted schema");
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::InvalidRequest {
            detail: format!("{field} must not be blank"),
        });
    }
    Ok(())
}
