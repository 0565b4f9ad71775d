//! UI schemas
//!
//! A JSON schema may carry one UI schema. Writes replace the whole UI
//! schema; there is no merge.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::schema::{now_millis, SchemaRecord, UiSchemaRecord, UiSchemaRequest};
use crate::store::SchemaStore;

pub struct UiSchemaStorage {
    store: Arc<dyn SchemaStore>,
}

impl UiSchemaStorage {
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self { store }
    }

    /// Get the UI schema of a JSON schema
    pub fn get(&self, tenant_id: &str, schema_id: &str) -> Result<UiSchemaRecord> {
        self.fetch_schema(tenant_id, schema_id)?
            .ui_schema
            .ok_or_else(|| RegistryError::UiSchemaNotFound {
                schema_id: schema_id.to_string(),
            })
    }

    /// Create a UI schema, or replace the existing one
    pub fn create_or_replace(
        &self,
        tenant_id: &str,
        schema_id: &str,
        request: UiSchemaRequest,
    ) -> Result<UiSchemaRecord> {
        let schema = self.fetch_schema(tenant_id, schema_id)?;

        let ui_schema = UiSchemaRecord {
            id: Uuid::new_v4().to_string(),
            schema_id: schema.id.clone(),
            value: request.value,
            description: request.description,
            created_at: now_millis(),
        };
        let replaced = self
            .store
            .set_ui_schema(&schema.id, Some(ui_schema.clone()))?
            .is_some();

        info!(tenant_id, schema_id, replaced, "Stored UI schema");
        Ok(ui_schema)
    }

    /// Delete the UI schema of a JSON schema
    pub fn delete(&self, tenant_id: &str, schema_id: &str) -> Result<()> {
        let schema = self.fetch_schema(tenant_id, schema_id)?;

        if self.store.set_ui_schema(&schema.id, None)?.is_none() {
            return Err(RegistryError::UiSchemaNotFound {
                schema_id: schema_id.to_string(),
            });
        }

        info!(tenant_id, schema_id, "Deleted UI schema");
        Ok(())
    }

    fn fetch_schema(&self, tenant_id: &str, schema_id: &str) -> Result<SchemaRecord> {
        self.store
            .find_by_tenant_and_id(tenant_id, schema_id)?
            .ok_or_else(|| RegistryError::SchemaNotFound {
                id: schema_id.to_string(),
            })
    }
}
