//! Persisted product catalog with merge-on-write semantics.
//!
//! # File Format
//!
//! ```text
//! {
//!     "B00TEST123": {
//!         "name": "...",
//!         "imageUrl": "https://...",
//!         "url": "https://.../dp/B00TEST123",
//!         "lastPriceINR": 1669.17,
//!         "priceHistory": [
//!             { "timestamp": "2025-05-06T20:30:00.123456", "price_inr": 1669.17 }
//!         ]
//!     }
//! }
//! ```
//!
//! The whole file is rewritten on every successful scrape, through a sibling
//! temp file and a rename so readers never see a half-written catalog.
//!
//! # Corrupt Files
//!
//! A catalog that exists but does not parse is an error by default
//! ([`CorruptCatalogPolicy::Fail`]). With [`CorruptCatalogPolicy::ResetEmpty`]
//! the next write moves the damaged file aside to `<file>.corrupt-<timestamp>`
//! and starts over from an empty catalog.

use crate::error::TrackError;
use crate::models::{ProductCatalog, ProductRecord, ProductRecordDelta};
use crate::utils::ensure_parent_dir;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::btree_map::Entry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// What to do when the catalog file cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptCatalogPolicy {
    /// Refuse to read or write until the file is repaired.
    #[default]
    Fail,
    /// Move the damaged file aside and continue with an empty catalog.
    ResetEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    ReadOnly,
    ForWrite,
}

/// File-backed [`ProductCatalog`].
///
/// Merges within one process are serialized by an internal lock, so two
/// concurrent tracking requests for the same product both land in its
/// history. Separate processes writing the same file are last-writer-wins.
#[derive(Debug)]
pub struct PriceStore {
    path: PathBuf,
    policy: CorruptCatalogPolicy,
    write_lock: Mutex<()>,
}

impl PriceStore {
    pub fn new(path: impl Into<PathBuf>, policy: CorruptCatalogPolicy) -> Self {
        PriceStore {
            path: path.into(),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the catalog without modifying anything on disk.
    ///
    /// A missing file is an empty catalog. A corrupt file is an error under
    /// [`CorruptCatalogPolicy::Fail`] and reads as empty otherwise.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<ProductCatalog, TrackError> {
        self.read_catalog(LoadMode::ReadOnly).await
    }

    /// Merge one scrape result into the catalog and persist it.
    ///
    /// Returns the record for the delta's identifier as it now stands.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), identifier = %delta.identifier))]
    pub async fn merge_and_persist(
        &self,
        delta: ProductRecordDelta,
    ) -> Result<ProductRecord, TrackError> {
        let _guard = self.write_lock.lock().await;

        let mut catalog = self.read_catalog(LoadMode::ForWrite).await?;
        let is_new = !catalog.contains_key(&delta.identifier);
        let record = merge(&mut catalog, delta).clone();
        self.persist(&catalog).await?;

        info!(
            is_new,
            history_len = record.history().len(),
            last_price = %record.last_price(),
            "Merged price observation"
        );
        Ok(record)
    }

    async fn read_catalog(&self, mode: LoadMode) -> Result<ProductCatalog, TrackError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No catalog file yet; starting empty");
                return Ok(ProductCatalog::new());
            }
            Err(e) => return Err(TrackError::storage(self.path.display(), e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Catalog file is empty");
            return Ok(ProductCatalog::new());
        }

        match serde_json::from_slice::<ProductCatalog>(&bytes) {
            Ok(catalog) => {
                debug!(products = catalog.len(), "Loaded catalog");
                Ok(catalog)
            }
            Err(e) => self.recover(e, mode).await,
        }
    }

    async fn recover(
        &self,
        parse_error: serde_json::Error,
        mode: LoadMode,
    ) -> Result<ProductCatalog, TrackError> {
        match self.policy {
            CorruptCatalogPolicy::Fail => {
                error!(error = %parse_error, "Catalog file is corrupt; refusing to continue");
                Err(TrackError::PersistenceCorruption {
                    path: self.path.display().to_string(),
                    reason: parse_error.to_string(),
                })
            }
            CorruptCatalogPolicy::ResetEmpty if mode == LoadMode::ReadOnly => {
                warn!(error = %parse_error, "Catalog file is corrupt; reading as empty");
                Ok(ProductCatalog::new())
            }
            CorruptCatalogPolicy::ResetEmpty => {
                let backup = PathBuf::from(format!(
                    "{}.corrupt-{}",
                    self.path.display(),
                    Local::now().format("%Y%m%dT%H%M%S")
                ));
                fs::rename(&self.path, &backup)
                    .await
                    .map_err(|e| TrackError::storage(self.path.display(), e))?;
                warn!(
                    error = %parse_error,
                    backup = %backup.display(),
                    "Catalog file is corrupt; moved aside and starting empty"
                );
                Ok(ProductCatalog::new())
            }
        }
    }

    async fn persist(&self, catalog: &ProductCatalog) -> Result<(), TrackError> {
        ensure_parent_dir(&self.path)
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;

        let json = to_pretty_json(catalog).map_err(|e| TrackError::PersistenceCorruption {
            path: self.path.display().to_string(),
            reason: format!("failed to serialize catalog: {e}"),
        })?;

        let tmp_path = PathBuf::from(format!("{}.tmp", self.path.display()));
        fs::write(&tmp_path, &json)
            .await
            .map_err(|e| TrackError::storage(tmp_path.display(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| TrackError::storage(self.path.display(), e))?;

        info!(products = catalog.len(), bytes = json.len(), "Catalog saved");
        Ok(())
    }
}

/// Merge a delta into an in-memory catalog.
///
/// Known products get the new observation appended and their last price
/// replaced; name, image and source URL keep their first-seen values.
/// Unknown products are inserted as a fresh record.
pub fn merge(catalog: &mut ProductCatalog, delta: ProductRecordDelta) -> &ProductRecord {
    match catalog.entry(delta.identifier.clone()) {
        Entry::Occupied(entry) => {
            let record = entry.into_mut();
            record.record(delta.observation);
            record
        }
        Entry::Vacant(entry) => entry.insert(ProductRecord::from_delta(delta)),
    }
}

fn to_pretty_json(catalog: &ProductCatalog) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    catalog.serialize(&mut serializer)?;
    Ok(out)
}
