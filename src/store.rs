//! Schema storage
//!
//! The `SchemaStore` trait is the registry's only view of persistence.
//! `InMemorySchemaStore` implements it over a locked map, with optional JSON
//! snapshots so the command-line tools keep state between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConflictKind, RegistryError, Result};
use crate::schema::{SchemaRecord, UiSchemaRecord};

/// Which slice of a result set to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: usize,
    /// Page size; `None` returns everything
    pub size: Option<usize>,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page,
            size: Some(size.max(1)),
        }
    }

    pub fn unpaged() -> Self {
        Self { page: 0, size: None }
    }

    /// Cut one page out of an ordered result set
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total_elements = items.len();
        let content = match self.size {
            Some(size) => items
                .into_iter()
                .skip(self.page.saturating_mul(size))
                .take(size)
                .collect(),
            None => items,
        };

        Page {
            content,
            page: self.page,
            size: self.size,
            total_elements,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::unpaged()
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: Option<usize>,
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        match self.size {
            Some(size) => self.total_elements.div_ceil(size),
            None => usize::from(self.total_elements > 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

/// Persistence collaborator for schema records.
///
/// There is no whole-record `save`. Records change only through
/// `insert`, `set_ui_schema` and `record_validation_usage`, each a single
/// atomic step, so a UI-schema write never overwrites a concurrent usage
/// increment.
pub trait SchemaStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<SchemaRecord>>;

    fn find_by_tenant_and_id(&self, tenant_id: &str, id: &str) -> Result<Option<SchemaRecord>>;

    /// All records of a tenant, ordered by id
    fn find_all_by_tenant(&self, tenant_id: &str, page: PageRequest) -> Result<Page<SchemaRecord>>;

    /// All records of a tenant sharing a (lowercased) name, ordered by id
    fn find_all_by_tenant_and_name(
        &self,
        tenant_id: &str,
        name: &str,
        page: PageRequest,
    ) -> Result<Page<SchemaRecord>>;

    fn exists_by_id(&self, id: &str) -> Result<bool>;

    /// Insert a new record.
    ///
    /// Must fail with `Conflict(Duplicate)` when the id is taken, atomically
    /// with the insert, so racing creators cannot both succeed.
    fn insert(&self, record: SchemaRecord) -> Result<SchemaRecord>;

    /// Attach, replace or (with `None`) remove the UI schema of a record in
    /// one step, returning the previous one. Fails with `SchemaNotFound`
    /// when the id is unknown.
    fn set_ui_schema(
        &self,
        id: &str,
        ui_schema: Option<UiSchemaRecord>,
    ) -> Result<Option<UiSchemaRecord>>;

    fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Increment the usage counter and set the last-used time in one atomic
    /// step. Unknown ids are ignored.
    fn record_validation_usage(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// In-process schema store
#[derive(Debug, Default)]
pub struct InMemorySchemaStore {
    records: RwLock<BTreeMap<String, SchemaRecord>>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON snapshot; a missing file yields an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let records: Vec<SchemaRecord> = serde_json::from_str(&content)?;
        debug!(path = %path.display(), count = records.len(), "Loaded schema snapshot");

        Ok(Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id.clone(), r)).collect()),
        })
    }

    /// Write all records to a JSON snapshot
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let records: Vec<SchemaRecord> = self.read()?.values().cloned().collect();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&records)?)?;
        debug!(path = %path.display(), count = records.len(), "Wrote schema snapshot");
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, SchemaRecord>>> {
        self.records
            .read()
            .map_err(|_| RegistryError::Store("schema store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, SchemaRecord>>> {
        self.records
            .write()
            .map_err(|_| RegistryError::Store("schema store lock poisoned".to_string()))
    }

    fn collect_where(
        &self,
        page: PageRequest,
        predicate: impl Fn(&SchemaRecord) -> bool,
    ) -> Result<Page<SchemaRecord>> {
        let matching: Vec<SchemaRecord> = self
            .read()?
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        Ok(page.slice(matching))
    }
}

impl SchemaStore for InMemorySchemaStore {
    fn find_by_id(&self, id: &str) -> Result<Option<SchemaRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn find_by_tenant_and_id(&self, tenant_id: &str, id: &str) -> Result<Option<SchemaRecord>> {
        Ok(self
            .read()?
            .get(id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    fn find_all_by_tenant(&self, tenant_id: &str, page: PageRequest) -> Result<Page<SchemaRecord>> {
        self.collect_where(page, |r| r.tenant_id == tenant_id)
    }

    fn find_all_by_tenant_and_name(
        &self,
        tenant_id: &str,
        name: &str,
        page: PageRequest,
    ) -> Result<Page<SchemaRecord>> {
        self.collect_where(page, |r| r.tenant_id == tenant_id && r.name == name)
    }

    fn exists_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    fn insert(&self, record: SchemaRecord) -> Result<SchemaRecord> {
        let mut records = self.write()?;
        if records.contains_key(&record.id) {
            return Err(RegistryError::Conflict(ConflictKind::Duplicate { id: record.id }));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn set_ui_schema(
        &self,
        id: &str,
        ui_schema: Option<UiSchemaRecord>,
    ) -> Result<Option<UiSchemaRecord>> {
        let mut records = self.write()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| RegistryError::SchemaNotFound { id: id.to_string() })?;
        Ok(std::mem::replace(&mut record.ui_schema, ui_schema))
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        self.write()?.remove(id);
        Ok(())
    }

    fn record_validation_usage(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(record) = self.write()?.get_mut(id) {
            record.validation_usage_count += 1;
            record.last_used_for_validation = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn record(tenant: &str, name: &str, version: &str) -> SchemaRecord {
        SchemaRecord::new(tenant, name, version, "{}", None)
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let store = InMemorySchemaStore::new();
        store.insert(record("2281", "person", "1.0")).unwrap();

        let err = store.insert(record("2281", "person", "1.0")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(ConflictKind::Duplicate { ref id }) if id == "2281_person_1.0"
        ));
    }

    #[test]
    fn test_find_by_tenant_and_id_respects_tenant() {
        let store = InMemorySchemaStore::new();
        store.insert(record("2281", "person", "1.0")).unwrap();

        assert!(store.find_by_tenant_and_id("2281", "2281_person_1.0").unwrap().is_some());
        assert!(store.find_by_tenant_and_id("2260", "2281_person_1.0").unwrap().is_none());
        assert!(store.find_by_id("2281_person_1.0").unwrap().is_some());
    }

    #[test]
    fn test_paging() {
        let store = InMemorySchemaStore::new();
        for version in ["1.0", "1.1", "1.2", "2.0", "2.1"] {
            store.insert(record("2281", "person", version)).unwrap();
        }
        store.insert(record("2260", "person", "1.0")).unwrap();

        let page = store.find_all_by_tenant("2281", PageRequest::of(1, 2)).unwrap();
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages(), 3);
        let ids: Vec<_> = page.content.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2281_person_1.2", "2281_person_2.0"]);

        let all = store
            .find_all_by_tenant_and_name("2281", "person", PageRequest::unpaged())
            .unwrap();
        assert_eq!(all.content.len(), 5);
        assert_eq!(all.total_pages(), 1);
    }

    #[test]
    fn test_concurrent_usage_increments_are_not_lost() {
        let store = Arc::new(InMemorySchemaStore::new());
        store.insert(record("2281", "person", "1.0")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store
                            .record_validation_usage("2281_person_1.0", Utc::now())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.find_by_id("2281_person_1.0").unwrap().unwrap();
        assert_eq!(stored.validation_usage_count, 400);
        assert!(stored.last_used_for_validation.is_some());
    }

    #[test]
    fn test_set_ui_schema_returns_previous() {
        let store = InMemorySchemaStore::new();
        store.insert(record("2281", "person", "1.0")).unwrap();
        let ui = UiSchemaRecord {
            id: "ui-1".to_string(),
            schema_id: "2281_person_1.0".to_string(),
            value: serde_json::json!({"ui:order": ["name"]}),
            description: None,
            created_at: Utc::now(),
        };

        assert!(store.set_ui_schema("2281_person_1.0", Some(ui.clone())).unwrap().is_none());
        assert_eq!(store.set_ui_schema("2281_person_1.0", None).unwrap(), Some(ui));
        assert!(matches!(
            store.set_ui_schema("2281_person_9.0", None),
            Err(RegistryError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/schemas.json");

        let store = InMemorySchemaStore::new();
        store.insert(record("2281", "person", "1.0")).unwrap();
        store.persist(&path).unwrap();

        let reopened = InMemorySchemaStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(
            reopened.find_by_id("2281_person_1.0").unwrap(),
            store.find_by_id("2281_person_1.0").unwrap()
        );

        let missing = InMemorySchemaStore::open(dir.path().join("absent.json")).unwrap();
        assert!(missing.is_empty().unwrap());
    }
}
