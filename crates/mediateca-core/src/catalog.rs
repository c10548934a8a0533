//! The catalog: sole owner of the in-memory record list.
//!
//! Every mutation rewrites the record store and then brings the sidecar
//! files in line. Records are addressed by `location`, the catalog's unique
//! key. A catalog instance assumes it is the only writer of its store file.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::MediatecaError;
use crate::fsops::{move_file, parent_or_cwd};
use crate::models::{KindFilter, MediaRecord, SortKey};
use crate::record_store::RecordStore;
use crate::sidecar::SidecarManager;

/// In-memory record list backed by a [`RecordStore`], with a sidecar
/// summary file kept next to each media file.
pub struct Catalog {
    records: Vec<MediaRecord>,
    store: RecordStore,
    sidecars: SidecarManager,
}

impl Catalog {
    /// Load the catalog from `store`.
    pub fn open(store: RecordStore, sidecars: SidecarManager) -> Self {
        let records = store.load();
        Self {
            records,
            store,
            sidecars,
        }
    }

    /// Open the catalog at the configured store path.
    pub fn from_config(config: &AppConfig) -> Result<Self, MediatecaError> {
        let store_path = config.ensure_store_dir()?;
        Ok(Self::open(
            RecordStore::new(store_path),
            SidecarManager::new(config.catalog.sidecar_extension.clone()),
        ))
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Exact-string lookup by location.
    pub fn find_by_location(&self, location: &str) -> Option<&MediaRecord> {
        self.records.iter().find(|r| r.location == location)
    }

    /// Filter by kind and category (case-insensitive, empty matches all),
    /// then optionally sort ascending. Without a sort key, catalog order is kept.
    pub fn query(&self, kind: KindFilter, category: &str, sort: Option<SortKey>) -> Vec<MediaRecord> {
        let category = category.to_lowercase();
        let mut matched: Vec<MediaRecord> = self
            .records
            .iter()
            .filter(|r| kind.matches(r.kind()))
            .filter(|r| category.is_empty() || r.category.to_lowercase() == category)
            .cloned()
            .collect();
        if let Some(sort) = sort {
            sort.sort(&mut matched);
        }
        matched
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Register a new record. Fails if its location is already registered.
    pub fn add(&mut self, record: MediaRecord) -> Result<(), MediatecaError> {
        if self.find_by_location(&record.location).is_some() {
            return Err(MediatecaError::Duplicate(record.location));
        }

        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        if let Some(record) = self.records.last() {
            self.write_sidecar(record);
            info!(location = %record.location, kind = %record.kind(), "Media added");
        }
        Ok(())
    }

    /// Unregister the record at `location` and delete its sidecar.
    ///
    /// An unknown location is a no-op, but the store is still rewritten.
    pub fn remove(&mut self, location: &str) -> Result<Option<MediaRecord>, MediatecaError> {
        let removed = self
            .position(location)
            .map(|idx| (idx, self.records.remove(idx)));

        if let Err(e) = self.persist() {
            if let Some((idx, record)) = removed {
                self.records.insert(idx, record);
            }
            return Err(e);
        }

        match removed {
            Some((_, record)) => {
                self.drop_sidecar(&record);
                info!(location = %record.location, "Media removed");
                Ok(Some(record))
            }
            None => {
                debug!(location, "Remove of unregistered location");
                Ok(None)
            }
        }
    }

    /// Replace the record at `old_location` with `record`, in place.
    ///
    /// Returns `false` without touching anything if `old_location` is not
    /// registered. The new location is not checked for duplicates.
    pub fn edit(&mut self, old_location: &str, record: MediaRecord) -> Result<bool, MediatecaError> {
        let Some(idx) = self.position(old_location) else {
            debug!(location = old_location, "Edit of unregistered location");
            return Ok(false);
        };

        let old = std::mem::replace(&mut self.records[idx], record);
        if let Err(e) = self.persist() {
            self.records[idx] = old;
            return Err(e);
        }

        self.drop_sidecar(&old);
        let record = &self.records[idx];
        self.write_sidecar(record);
        info!(location = %record.location, "Media edited");
        Ok(true)
    }

    /// Move the media file (and its sidecar) into `new_dir`, keeping the
    /// file name. Returns the new location.
    ///
    /// Once the file has moved the in-memory location is updated even if
    /// the store rewrite then fails; the next successful mutation catches
    /// the store up.
    pub fn move_record(&mut self, location: &str, new_dir: &Path) -> Result<String, MediatecaError> {
        let idx = self.require(location)?;
        let source = PathBuf::from(location);
        if !source.exists() {
            return Err(MediatecaError::FileSystem(format!(
                "media file not found: {location}"
            )));
        }
        if !new_dir.is_dir() {
            return Err(MediatecaError::FileSystem(format!(
                "destination is not a directory: {}",
                new_dir.display()
            )));
        }

        let file_name = source.file_name().ok_or_else(|| {
            MediatecaError::FileSystem(format!("location has no file name: {location}"))
        })?;
        let target_dir = absolute(new_dir)?;
        let target = target_dir.join(file_name);

        move_file(&source, &target).map_err(|e| {
            MediatecaError::FileSystem(format!("failed to move {location}: {e}"))
        })?;

        if let Err(e) = self.sidecars.relocate(&self.records[idx], &target_dir) {
            warn!(location, error = %e, "Failed to relocate sidecar");
        }

        let new_location = target.to_string_lossy().into_owned();
        self.records[idx].location = new_location.clone();
        self.persist()?;

        info!(from = location, to = %new_location, "Media moved");
        Ok(new_location)
    }

    /// Rename the media file to `new_base_name` + its original extension,
    /// in the same directory, and retitle the record. Returns the new location.
    pub fn rename(&mut self, location: &str, new_base_name: &str) -> Result<String, MediatecaError> {
        if new_base_name.is_empty() {
            return Err(MediatecaError::FileSystem("new name must not be empty".into()));
        }
        if new_base_name.contains(['/', '\\']) {
            return Err(MediatecaError::FileSystem(format!(
                "new name must not contain path separators: {new_base_name}"
            )));
        }

        let idx = self.require(location)?;
        let old = self.records[idx].clone();
        let target = parent_or_cwd(old.path()).join(format!("{new_base_name}{}", old.extension()));
        let target = absolute(&target)?;

        move_file(old.path(), &target).map_err(|e| {
            MediatecaError::FileSystem(format!("failed to rename {location}: {e}"))
        })?;

        let new_location = target.to_string_lossy().into_owned();
        {
            let record = &mut self.records[idx];
            record.location = new_location.clone();
            record.title = new_base_name.to_string();
        }
        self.persist()?;

        self.drop_sidecar(&old);
        self.write_sidecar(&self.records[idx]);

        info!(from = location, to = %new_location, "Media renamed");
        Ok(new_location)
    }

    /// Re-read the file size of the record at `location`. A missing file
    /// leaves the stored size untouched. Returns the (possibly new) size.
    pub fn refresh_disk_size(&mut self, location: &str) -> Result<String, MediatecaError> {
        let idx = self.require(location)?;
        if !self.records[idx].refresh_disk_size() {
            debug!(location, "Media file missing, size not refreshed");
            return Ok(self.records[idx].disk_size.clone());
        }

        self.persist()?;
        let record = &self.records[idx];
        self.write_sidecar(record);
        Ok(record.disk_size.clone())
    }

    // ── Internals ───────────────────────────────────────────────

    fn persist(&self) -> Result<(), MediatecaError> {
        self.store.save(&self.records)
    }

    fn position(&self, location: &str) -> Option<usize> {
        self.records.iter().position(|r| r.location == location)
    }

    fn require(&self, location: &str) -> Result<usize, MediatecaError> {
        self.position(location)
            .ok_or_else(|| MediatecaError::NotFound(location.to_string()))
    }

    // Sidecars are derived data: once the store is written, sidecar
    // failures are logged and do not fail the operation.

    fn write_sidecar(&self, record: &MediaRecord) {
        if let Err(e) = self.sidecars.generate(record) {
            warn!(location = %record.location, error = %e, "Failed to write sidecar");
        }
    }

    fn drop_sidecar(&self, record: &MediaRecord) {
        if let Err(e) = self.sidecars.delete(record) {
            warn!(location = %record.location, error = %e, "Failed to delete sidecar");
        }
    }
}

fn absolute(p: &Path) -> Result<PathBuf, MediatecaError> {
    std::path::absolute(p).map_err(|e| MediatecaError::FileSystem(format!("{}: {e}", p.display())))
}
