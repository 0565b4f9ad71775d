//! Tenant Schema Registry
//!
//! A multi-tenant registry of versioned JSON Schema (draft 2020-12)
//! documents, with validation of JSON instances against stored schemas.
//!
//! ## Features
//!
//! - **Immutable Documents**: A schema is never updated; a change is a new version
//! - **Version Ordering**: Dotted numeric versions compared segment by segment
//! - **Conflict Checks**: Duplicate ids and backfilled older versions are rejected
//! - **Compiled Schema Cache**: Each schema is compiled at most once per id
//! - **Usage Statistics**: Every validation attempt is counted per schema
//! - **UI Schemas**: One free-form UI schema may be attached to each schema
//! - **Checksum Validation**: SHA256 checksums of stored documents
//!
//! ## Identifiers
//!
//! ```text
//! id = lowercase("{tenant_id}_{name}_{version}")
//!
//! 2281_person_1.0
//! 2281_person_1.2.0
//! 2260_address_3
//! ```

pub mod cache;
pub mod checksum;
pub mod compiler;
pub mod config;
pub mod conflict;
pub mod dialect;
pub mod error;
pub mod messages;
pub mod registry;
pub mod schema;
pub mod services;
pub mod store;
pub mod ui_schema;
pub mod validation;
pub mod version;

pub use cache::CompiledSchemaCache;
pub use checksum::Checksum;
pub use compiler::{CompileError, CompiledSchema, Draft202012Compiler, SchemaCompiler, DRAFT_2020_12};
pub use config::SchemaConfig;
pub use conflict::ConflictGuard;
pub use dialect::MetaSchemaValidator;
pub use error::{ConflictKind, RegistryError, Result};
pub use registry::SchemaRegistry;
pub use schema::{schema_id, SchemaCreateRequest, SchemaRecord, UiSchemaRecord, UiSchemaRequest};
pub use services::SchemaServices;
pub use store::{InMemorySchemaStore, Page, PageRequest, SchemaStore};
pub use ui_schema::UiSchemaStorage;
pub use validation::{ValidationEngine, Validate, Violation};
pub use version::SchemaVersion;
