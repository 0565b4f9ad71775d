//! Compiled schema cache
//!
//! Schema documents never change after creation, so a document compiled
//! once for an id can be served for the rest of the process lifetime.
//! Lookups of cached entries only take shared shard locks; a miss takes a
//! per-id lock so concurrent first requests for the same id compile once.
//! Compilation failures are returned to the caller and never cached.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::compiler::{CompileError, CompiledSchema, SchemaCompiler};

/// Process-wide cache of compiled schemas, keyed by schema id
pub struct CompiledSchemaCache {
    compiler: Arc<dyn SchemaCompiler>,
    entries: DashMap<String, Arc<CompiledSchema>>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl CompiledSchemaCache {
    pub fn new(compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            compiler,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    /// Get the compiled schema for `id`, compiling `raw_document` on first use
    pub fn get(&self, id: &str, raw_document: &str) -> Result<Arc<CompiledSchema>, CompileError> {
        if let Some(hit) = self.entries.get(id) {
            debug!(schema_id = id, "Compiled schema cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        debug!(schema_id = id, "Compiled schema cache miss");
        self.compile_once(id, raw_document)
    }

    /// Drop the entry for an id whose record no longer exists
    pub fn evict(&self, id: &str) {
        if self.entries.remove(id).is_some() {
            debug!(schema_id = id, "Evicted compiled schema");
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn compile_once(&self, id: &str, raw_document: &str) -> Result<Arc<CompiledSchema>, CompileError> {
        let slot = Arc::clone(self.in_flight.entry(id.to_string()).or_default().value());
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished while we waited for the slot
        if let Some(hit) = self.entries.get(id) {
            return Ok(Arc::clone(hit.value()));
        }

        let result = self.compiler.compile(raw_document).map(Arc::new);
        if let Ok(compiled) = &result {
            self.entries.insert(id.to_string(), Arc::clone(compiled));
        }
        // Only after the entry is visible, so late arrivals find it
        self.in_flight.remove(id);

        match &result {
            Ok(_) => debug!(schema_id = id, "Compiled and cached schema"),
            Err(error) => warn!(schema_id = id, %error, "Schema compilation failed"),
        }
        result
    }
}
