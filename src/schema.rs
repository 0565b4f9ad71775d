//! Schema records and request types

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Compute the identifier of a schema: `lowercase("{tenant}_{name}_{version}")`
pub fn schema_id(tenant_id: &str, name: &str, version: &str) -> String {
    format!("{}_{}_{}", tenant_id, name, version).to_lowercase()
}

/// Current time, truncated to milliseconds as stored timestamps are
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A stored JSON schema.
///
/// The document is immutable once created: there is no update operation,
/// only create and delete. Only the usage statistics and the attached UI
/// schema change over the lifetime of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// `lowercase("{tenant_id}_{name}_{version}")`
    pub id: String,
    /// Tenant (municipality) owning the schema
    pub tenant_id: String,
    /// Lowercased schema name
    pub name: String,
    /// Dotted-numeric version, as submitted
    pub version: String,
    /// The schema document text
    pub raw_document: String,
    /// SHA256 of `raw_document`, taken at creation
    pub checksum: Checksum,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set once, at creation
    pub created_at: DateTime<Utc>,
    /// Number of validation attempts against this schema
    #[serde(default)]
    pub validation_usage_count: u64,
    /// Time of the most recent validation attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_for_validation: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<UiSchemaRecord>,
}

impl SchemaRecord {
    /// Create a new, never-used record for a tenant
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        raw_document: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let tenant_id = tenant_id.into();
        let name = name.into().to_lowercase();
        let version = version.into();
        let raw_document = raw_document.into();

        Self {
            id: schema_id(&tenant_id, &name, &version),
            checksum: Checksum::compute(&raw_document),
            tenant_id,
            name,
            version,
            raw_document,
            description,
            created_at: now_millis(),
            validation_usage_count: 0,
            last_used_for_validation: None,
            ui_schema: None,
        }
    }

    /// The attached UI schema, if any
    pub fn ui_schema(&self) -> Option<&UiSchemaRecord> {
        self.ui_schema.as_ref()
    }

    /// Verify the document still matches the checksum taken at creation
    pub fn verify_checksum(&self) -> bool {
        self.checksum.verify(&self.raw_document)
    }
}

/// A UI schema attached 1:1 to a JSON schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSchemaRecord {
    /// Random UUID, regenerated on every replace
    pub id: String,
    /// Id of the owning JSON schema
    pub schema_id: String,
    /// Free-form UI schema document
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new schema, or a new version of an existing one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCreateRequest {
    /// Schema name (stored lowercased)
    pub name: String,
    /// Version on the form `major[.minor[...]]`
    pub version: String,
    /// The JSON schema document text
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl SchemaCreateRequest {
    pub fn new(name: impl Into<String>, version: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request to create or replace a UI schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSchemaRequest {
    pub value: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
}
