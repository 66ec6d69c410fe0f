// # File Inventory Store
//
// File-based implementation of InventoryStore with crash recovery.
//
// ## Purpose
//
// Keeps the inventory, and the identities the store assigned, across
// daemon restarts without an external database.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "tables": {
//     "schemas": ["router", "interface", "snmp_config"],
//     "sequences": { "routers": 1, "interfaces": 2, "snmp_configs": 0 },
//     "routers": { "1": { "unique_name": "alu-01", ... } },
//     "interfaces": { "1": { "router_id": 1, "name": "1/1/1", ... } },
//     "snmp_configs": {}
//   }
// }
// ```

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::tables::InventoryTables;
use crate::Error;
use crate::model::{EntityKind, ManagedInterface, RecordId, Router, UserSnmpConfig};
use crate::traits::{InventoryStore, StoreFactory};

/// Inventory file format version
/// Used for future migration if format changes
const INVENTORY_FILE_VERSION: &str = "1.0";

/// File-based store with crash recovery
///
/// Every mutation is written through to disk before the call returns.
///
/// # Example
///
/// ```rust,no_run
/// use rtrinv_core::model::{EntityKind, Router};
/// use rtrinv_core::state::FileInventoryStore;
/// use rtrinv_core::traits::InventoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileInventoryStore::new("/var/lib/rtrinv/inventory.json").await?;
///     for kind in EntityKind::ALL {
///         store.ensure_schema(kind).await?;
///     }
///
///     // Atomically written to disk
///     store.create_router(&Router::new("alu-01")).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileInventoryStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for file-based store
#[derive(Debug)]
struct FileState {
    tables: InventoryTables,
}

/// Serializable inventory file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct InventoryFileFormat {
    version: String,
    tables: InventoryTables,
}

impl FileInventoryStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing inventory file
    /// 3. If corruption detected, try to load from backup
    /// 4. If both fail, start with empty tables
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create inventory directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tables = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState { tables })),
        })
    }

    /// Load tables from file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main inventory file
    /// 2. If it does not parse, try loading backup
    /// 3. If backup also fails, start with empty tables
    async fn load_with_recovery(path: &Path) -> Result<InventoryTables, Error> {
        match Self::load(path).await {
            Ok(tables) => {
                tracing::debug!("Loaded inventory from {}", path.display());
                Ok(tables)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Inventory file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty inventory.");
                    return Ok(InventoryTables::default());
                }

                match Self::load(&backup_path).await {
                    Ok(tables) => {
                        tracing::info!("Recovered inventory from backup");
                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                            tracing::error!(
                                "Failed to restore inventory file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(tables)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty inventory.",
                            backup_err
                        );
                        Ok(InventoryTables::default())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load tables from file
    async fn load(path: &Path) -> Result<InventoryTables, Error> {
        if !path.exists() {
            tracing::debug!("Inventory file does not exist: {}", path.display());
            return Ok(InventoryTables::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read inventory file {}: {}", path.display(), e))
        })?;

        let file: InventoryFileFormat = serde_json::from_str(&content)?;

        if file.version != INVENTORY_FILE_VERSION {
            tracing::warn!(
                "Inventory file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                INVENTORY_FILE_VERSION,
                file.version
            );
        }

        Ok(file.tables)
    }

    /// Write `tables` to file atomically
    async fn persist(&self, tables: &InventoryTables) -> Result<(), Error> {
        let file = InventoryFileFormat {
            version: INVENTORY_FILE_VERSION.to_string(),
            tables: tables.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize inventory: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!("Failed to create temp file {}: {}", temp_path.display(), e))
            })?;

            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!("Failed to write to temp file {}: {}", temp_path.display(), e))
            })?;

            out.flush().await.map_err(|e| {
                Error::store(format!("Failed to flush temp file {}: {}", temp_path.display(), e))
            })?;
        }

        // Keep the previous good file as backup
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Inventory written to file: {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation to a copy of the tables, write it through, and only
    /// then make it visible
    ///
    /// A failed write leaves the in-memory tables as they were.
    async fn mutate<T>(&self, op: impl FnOnce(&mut InventoryTables) -> Result<T, Error>) -> Result<T, Error> {
        let mut state_guard = self.state.write().await;
        let mut next = state_guard.tables.clone();
        let out = op(&mut next)?;

        self.persist(&next).await?;
        state_guard.tables = next;
        Ok(out)
    }

    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored inventory file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl InventoryStore for FileInventoryStore {
    async fn ensure_schema(&self, kind: EntityKind) -> Result<(), Error> {
        if self.state.read().await.tables.count(kind).is_ok() {
            return Ok(());
        }

        self.mutate(|t| {
            t.ensure_schema(kind);
            Ok(())
        })
        .await?;
        tracing::debug!("Created table {}", kind);
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> Result<usize, Error> {
        self.state.read().await.tables.count(kind)
    }

    async fn find_routers_by_unique_name(&self, unique_name: &str) -> Result<Vec<Router>, Error> {
        self.state.read().await.tables.find_routers_by_unique_name(unique_name)
    }

    async fn list_routers(&self) -> Result<Vec<Router>, Error> {
        self.state.read().await.tables.list_routers()
    }

    async fn find_interfaces_by_router(&self, router_id: RecordId) -> Result<Vec<ManagedInterface>, Error> {
        self.state.read().await.tables.find_interfaces_by_router(router_id)
    }

    async fn find_snmp_configs_by_router(&self, router_id: RecordId) -> Result<Vec<UserSnmpConfig>, Error> {
        self.state.read().await.tables.find_snmp_configs_by_router(router_id)
    }

    async fn create_router(&self, router: &Router) -> Result<Router, Error> {
        self.mutate(|t| t.create_router(router, Utc::now())).await
    }

    async fn save_router(&self, router: &Router) -> Result<Router, Error> {
        self.mutate(|t| t.save_router(router, Utc::now())).await
    }

    async fn create_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, Error> {
        self.mutate(|t| t.create_interface(interface, Utc::now())).await
    }

    async fn save_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, Error> {
        self.mutate(|t| t.save_interface(interface, Utc::now())).await
    }

    async fn delete_interface(&self, interface: &ManagedInterface) -> Result<(), Error> {
        self.mutate(|t| t.delete_interface(interface)).await
    }

    async fn create_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, Error> {
        self.mutate(|t| t.create_snmp_config(config, Utc::now())).await
    }

    async fn save_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, Error> {
        self.mutate(|t| t.save_snmp_config(config, Utc::now())).await
    }

    /// Mutations are already on disk; rewrite once more so the file
    /// reflects the final state even if it was removed underneath us
    async fn flush(&self) -> Result<(), Error> {
        let state_guard = self.state.read().await;
        self.persist(&state_guard.tables).await
    }
}

/// Factory for [`FileInventoryStore`]
///
/// Expects `{"path": "/var/lib/rtrinv/inventory.json"}`.
pub struct FileInventoryStoreFactory;

#[async_trait]
impl StoreFactory for FileInventoryStoreFactory {
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn InventoryStore>, Error> {
        let path = config
            .get("path")
            .and_then(|p| p.as_str())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("File store requires a non-empty \"path\""))?
            .to_string();

        Ok(Box::new(FileInventoryStore::new(path).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn migrated(path: &Path) -> FileInventoryStore {
        let store = FileInventoryStore::new(path).await.unwrap();
        for kind in EntityKind::ALL {
            store.ensure_schema(kind).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        let store = migrated(&path).await;
        assert_eq!(store.count(EntityKind::Router).await.unwrap(), 0);

        let created = store
            .create_router(&Router::new("alu-01").with_interfaces(vec![ManagedInterface::new("1/1/1", 1)]))
            .await
            .unwrap();

        // Verify file was written
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileInventoryStore::new(&path).await.unwrap();
        let found = store2.find_routers_by_unique_name("alu-01").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, created.id);
        assert_eq!(
            store2.find_interfaces_by_router(created.id.unwrap()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        let store = migrated(&path).await;
        store.create_router(&Router::new("alu-01")).await.unwrap();
        // Second write leaves the first state in the backup
        store.create_router(&Router::new("alu-02")).await.unwrap();

        let backup_path = FileInventoryStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileInventoryStore::new(&path).await.unwrap();
        assert_eq!(
            store2.count(EntityKind::Router).await.unwrap(),
            1,
            "Backup should contain previous state, not latest"
        );
    }

    #[tokio::test]
    async fn test_file_store_identity_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.json");

        {
            let store = migrated(&path).await;
            store.create_router(&Router::new("alu-01")).await.unwrap();
        }

        let store = FileInventoryStore::new(&path).await.unwrap();
        let next = store.create_router(&Router::new("alu-02")).await.unwrap();
        assert_eq!(next.id, Some(RecordId(2)));
    }

    #[tokio::test]
    async fn test_file_store_failed_write_is_not_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        let store = migrated(&path).await;
        let router = store.create_router(&Router::new("alu-01")).await.unwrap();

        // A directory at the temp path makes every write fail
        let temp_path = store.temp_path();
        fs::create_dir(&temp_path).await.unwrap();

        let interface = ManagedInterface::new("1/1/1", 1).with_router(router.id.unwrap());
        let err = store.create_interface(&interface).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(store.find_interfaces_by_router(router.id.unwrap()).await.unwrap().is_empty());

        fs::remove_dir(&temp_path).await.unwrap();
        store.flush().await.unwrap();

        let reloaded = FileInventoryStore::new(&path).await.unwrap();
        assert_eq!(reloaded.count(EntityKind::Interface).await.unwrap(), 0);

        // The failed insert did not consume an identity either
        let created = store.create_interface(&interface).await.unwrap();
        assert_eq!(created.id, Some(RecordId(1)));
    }

    #[tokio::test]
    async fn test_file_store_factory_requires_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        assert!(FileInventoryStoreFactory.create(&serde_json::json!({})).await.is_err());

        let store = FileInventoryStoreFactory
            .create(&serde_json::json!({ "path": path.to_str().unwrap() }))
            .await
            .unwrap();
        store.ensure_schema(EntityKind::Router).await.unwrap();
        assert!(path.exists());
    }
}
