//! Creation-time conflict checks
//!
//! A new schema is rejected when its id is already taken, or when any
//! schema with the same tenant and name already has a strictly greater
//! version. The second rule forbids backfilling an older version once a
//! newer one is published, not only inserting below the current latest.

use std::sync::Arc;

use tracing::warn;

use crate::error::{ConflictKind, RegistryError, Result};
use crate::schema::SchemaRecord;
use crate::store::{PageRequest, SchemaStore};
use crate::version::SchemaVersion;

pub struct ConflictGuard {
    store: Arc<dyn SchemaStore>,
}

impl ConflictGuard {
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self { store }
    }

    /// Check that `candidate` may be created
    pub fn check(&self, candidate: &SchemaRecord) -> Result<()> {
        if self.store.exists_by_id(&candidate.id)? {
            warn!(schema_id = %candidate.id, "Schema already exists");
            return Err(RegistryError::Conflict(ConflictKind::Duplicate {
                id: candidate.id.clone(),
            }));
        }

        let new_version = SchemaVersion::parse(&candidate.version)?;
        let existing = self.store.find_all_by_tenant_and_name(
            &candidate.tenant_id,
            &candidate.name,
            PageRequest::unpaged(),
        )?;

        let greater = existing.content.iter().find(|record| {
            match SchemaVersion::parse(&record.version) {
                Ok(version) => version.is_greater_than(&new_version),
                Err(_) => {
                    warn!(schema_id = %record.id, version = %record.version, "Skipping stored schema with unparsable version");
                    false
                }
            }
        });

        if let Some(record) = greater {
            warn!(
                schema_id = %candidate.id,
                existing_id = %record.id,
                "A greater version already exists"
            );
            return Err(RegistryError::Conflict(
                ConflictKind::SupersededByGreaterVersion {
                    id: record.id.clone(),
                },
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySchemaStore;

    fn guard_with(versions: &[&str]) -> ConflictGuard {
        let store = Arc::new(InMemorySchemaStore::new());
        for version in versions {
            store
                .insert(SchemaRecord::new("2281", "person", *version, "{}", None))
                .unwrap();
        }
        ConflictGuard::new(store)
    }

    fn candidate(version: &str) -> SchemaRecord {
        SchemaRecord::new("2281", "Person", version, "{}", None)
    }

    #[test]
    fn test_duplicate_id() {
        let guard = guard_with(&["1.0"]);
        let err = guard.check(&candidate("1.0")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(ConflictKind::Duplicate { ref id }) if id == "2281_person_1.0"
        ));
    }

    #[test]
    fn test_any_greater_version_rejects() {
        let guard = guard_with(&["0.4", "0.123456789", "1.4", "0.9876.54321"]);
        let err = guard.check(&candidate("1.0")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(ConflictKind::SupersededByGreaterVersion { ref id })
                if id == "2281_person_1.4"
        ));
    }

    #[test]
    fn test_backfill_below_non_latest_rejects() {
        // 0.5 sits between 0.4 and 1.0, yet 1.0 already exists
        let guard = guard_with(&["0.4", "1.0"]);
        assert!(guard.check(&candidate("0.5")).is_err());
    }

    #[test]
    fn test_greater_or_equal_versions_pass() {
        let guard = guard_with(&["1.0", "1.1"]);
        guard.check(&candidate("1.2")).unwrap();
        guard.check(&candidate("2")).unwrap();
        // Same version spelled differently is not greater
        guard.check(&candidate("1.1.0")).unwrap();
    }

    #[test]
    fn test_other_tenant_and_name_ignored() {
        let store = Arc::new(InMemorySchemaStore::new());
        store
            .insert(SchemaRecord::new("2260", "person", "9.0", "{}", None))
            .unwrap();
        store
            .insert(SchemaRecord::new("2281", "address", "9.0", "{}", None))
            .unwrap();
        let guard = ConflictGuard::new(store);
        guard.check(&candidate("1.0")).unwrap();
    }
}
