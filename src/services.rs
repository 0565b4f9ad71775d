//! Wiring of the registry components over one shared store and cache

use std::sync::Arc;

use crate::cache::CompiledSchemaCache;
use crate::compiler::Draft202012Compiler;
use crate::config::SchemaConfig;
use crate::dialect::MetaSchemaValidator;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::store::SchemaStore;
use crate::ui_schema::UiSchemaStorage;
use crate::validation::ValidationEngine;

/// Registry, validation engine and UI-schema storage sharing one store
/// and one compiled-schema cache
pub struct SchemaServices {
    pub registry: SchemaRegistry,
    pub validation: ValidationEngine,
    pub ui_schemas: UiSchemaStorage,
}

impl SchemaServices {
    pub fn new(store: Arc<dyn SchemaStore>, compiler: Draft202012Compiler) -> Self {
        let cache = Arc::new(CompiledSchemaCache::new(Arc::new(compiler.clone())));
        Self {
            registry: SchemaRegistry::new(
                Arc::clone(&store),
                Arc::clone(&cache),
                MetaSchemaValidator::new(compiler),
            ),
            validation: ValidationEngine::new(Arc::clone(&store), cache),
            ui_schemas: UiSchemaStorage::new(store),
        }
    }

    pub fn from_config(store: Arc<dyn SchemaStore>, config: &SchemaConfig) -> Result<Self> {
        Ok(Self::new(store, config.compiler()?))
    }
}
