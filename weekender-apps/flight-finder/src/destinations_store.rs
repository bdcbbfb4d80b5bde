//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Destinations Store
//!
//! Durable, self-healing selection of active destinations.
//!
//! The file is a JSON object mapping catalog codes to booleans:
//!
//! ```text
//! {
//!   "Country:FR": true,
//!   "Country:IT": false,
//!   ...
//! }
//! ```
//!
//! Every read repairs the file against the catalog: missing codes get their
//! default, unknown codes are dropped, non-boolean values become `false`.
//! Any other shape (or a missing/corrupt file) resets to the defaults.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::destinations_catalog::DestinationCatalog;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("destination config must be a JSON object")]
    NotAMapping,

    #[error("destination not found: {0}")]
    UnknownDestination(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Selection state keyed by catalog code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationConfig(BTreeMap<String, bool>);

impl DestinationConfig {
    pub fn from_map(entries: BTreeMap<String, bool>) -> Self {
        Self(entries)
    }

    pub fn get(&self, code: &str) -> Option<bool> {
        self.0.get(code).copied()
    }

    pub fn set(&mut self, code: &str, active: bool) {
        self.0.insert(code.to_string(), active);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    /// Active codes in catalog order.
    pub fn selected_codes(&self, catalog: &DestinationCatalog) -> Vec<String> {
        catalog
            .list_codes()
            .into_iter()
            .filter(|code| self.get(code) == Some(true))
            .map(str::to_string)
            .collect()
    }

    /// Entries sorted active first, then by display name.
    pub fn display_order(&self, catalog: &DestinationCatalog) -> Vec<(String, bool)> {
        let mut items: Vec<(String, bool, String)> = self
            .iter()
            .map(|(code, active)| (code.to_string(), active, catalog.display_name(code)))
            .collect();
        items.sort_by(|a, b| (!a.1, &a.2).cmp(&(!b.1, &b.2)));
        items
            .into_iter()
            .map(|(code, active, _)| (code, active))
            .collect()
    }

    pub fn into_map(self) -> BTreeMap<String, bool> {
        self.0
    }
}

/// File-backed destination selection.
///
/// `toggle` and the bulk operations hold an internal lock across
/// load-modify-save, so they never lose each other's updates. Every write,
/// locked or not, atomically replaces the whole file through its own temp
/// file; a plain `save` racing with them is last-write-wins, as are separate
/// processes writing the same file.
pub struct DestinationStore {
    path: PathBuf,
    catalog: Arc<DestinationCatalog>,
    write_lock: Mutex<()>,
}

impl DestinationStore {
    pub fn new(path: impl Into<PathBuf>, catalog: Arc<DestinationCatalog>) -> Self {
        Self {
            path: path.into(),
            catalog,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_standard_catalog(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(DestinationCatalog::standard().clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &DestinationCatalog {
        &self.catalog
    }

    /// Read the selection, repairing and persisting it when needed. Never fails.
    pub fn load(&self) -> DestinationConfig {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "{} not found, creating it with the default destinations",
                    self.path.display()
                );
                return self.reset_file();
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.path.display(), e);
                return self.reset_file();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to decode {}: {}", self.path.display(), e);
                return self.reset_file();
            }
        };

        let Value::Object(map) = value else {
            tracing::warn!(
                "{} does not hold a JSON object, recreating it",
                self.path.display()
            );
            return self.reset_file();
        };

        let (config, repaired) = self.repair(map);
        if repaired {
            if let Err(e) = self.write(config.0.clone()) {
                tracing::error!("Failed to persist repaired destinations: {}", e);
            }
        }
        config
    }

    /// Persist an untyped selection.
    ///
    /// Unknown codes are dropped and non-boolean values for known codes become `false`.
    pub fn save_value(&self, value: &Value) -> Result<(), StoreError> {
        let Value::Object(map) = value else {
            tracing::error!("Refusing to save a non-object destination config");
            return Err(StoreError::NotAMapping);
        };

        let mut filtered = BTreeMap::new();
        for (code, active) in map {
            if !self.catalog.is_valid(code) {
                tracing::warn!("Ignoring unknown destination: {}", code);
                continue;
            }
            let active = match active {
                Value::Bool(b) => *b,
                other => {
                    tracing::warn!("Coercing non-boolean value for {} to false: {}", code, other);
                    false
                }
            };
            filtered.insert(code.clone(), active);
        }

        self.write(filtered)
    }

    pub fn save(&self, config: &DestinationConfig) -> Result<(), StoreError> {
        self.save_value(&serde_json::to_value(config)?)
    }

    pub fn selected_codes(&self) -> Vec<String> {
        let config = self.load();
        let selected = config.selected_codes(&self.catalog);
        tracing::info!("Active destinations: {} of {}", selected.len(), config.len());
        selected
    }

    /// Flip one destination and return its new value.
    pub fn toggle(&self, code: &str) -> Result<bool, StoreError> {
        let _guard = self.lock();
        let mut config = self.load();
        let Some(current) = config.get(code) else {
            return Err(StoreError::UnknownDestination(code.to_string()));
        };
        config.set(code, !current);
        self.save(&config)?;
        Ok(!current)
    }

    pub fn select_all(&self) -> Result<DestinationConfig, StoreError> {
        self.replace_all(|_| true)
    }

    pub fn deselect_all(&self) -> Result<DestinationConfig, StoreError> {
        self.replace_all(|_| false)
    }

    pub fn reset_to_default(&self) -> Result<DestinationConfig, StoreError> {
        let catalog = Arc::clone(&self.catalog);
        self.replace_all(move |code| catalog.default_value(code).unwrap_or(false))
    }

    fn replace_all(&self, value_for: impl Fn(&str) -> bool) -> Result<DestinationConfig, StoreError> {
        let _guard = self.lock();
        let config = DestinationConfig::from_map(
            self.catalog
                .list_codes()
                .into_iter()
                .map(|code| (code.to_string(), value_for(code)))
                .collect(),
        );
        self.save(&config)?;
        Ok(config)
    }

    fn repair(&self, mut map: Map<String, Value>) -> (DestinationConfig, bool) {
        let mut repaired = false;

        let obsolete: Vec<String> = map
            .keys()
            .filter(|k| !self.catalog.is_valid(k))
            .cloned()
            .collect();
        if !obsolete.is_empty() {
            tracing::info!("Dropping obsolete destinations: {:?}", obsolete);
            for key in &obsolete {
                map.remove(key);
            }
            repaired = true;
        }

        let mut entries = BTreeMap::new();
        for entry in self.catalog.entries() {
            let active = match map.get(&entry.code) {
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    tracing::warn!(
                        "Coercing non-boolean value for {}: {} -> false",
                        entry.code,
                        other
                    );
                    repaired = true;
                    false
                }
                None => {
                    tracing::info!("Adding missing destination: {}", entry.code);
                    repaired = true;
                    entry.is_default_selected
                }
            };
            entries.insert(entry.code.clone(), active);
        }

        (DestinationConfig::from_map(entries), repaired)
    }

    fn reset_file(&self) -> DestinationConfig {
        let defaults = self.catalog.default_selection();
        if let Err(e) = self.write(defaults.clone()) {
            tracing::error!("Failed to write default destinations: {}", e);
        }
        DestinationConfig::from_map(defaults)
    }

    /// Write through a uniquely named sibling temp file then rename, so a
    /// crash never leaves a truncated file behind and overlapping writers
    /// never share a temp file.
    fn write(&self, entries: BTreeMap<String, bool>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&entries)?;

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        tracing::info!("Saved destination config: {} destinations", entries.len());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
