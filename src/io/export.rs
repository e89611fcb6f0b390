//! Export and import of stored layouts.
//!
//! An export bundle is a single JSON document carrying named layout
//! configurations and a UTC stamp, suitable for moving layouts between
//! installations or checking them into version control.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::recovery;
use crate::io::store::{LayoutStore, StoreError};
use crate::model::config::{LayoutConfig, LayoutKey};

/// A bundle of exported layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutExport {
    pub exported_at: DateTime<Utc>,
    pub layouts: IndexMap<LayoutKey, LayoutConfig>,
}

/// Bundle every stored layout.
pub fn export_layouts(store: &dyn LayoutStore) -> LayoutExport {
    let mut layouts = IndexMap::new();
    for key in store.keys() {
        if let Some(config) = store.resolve(&key) {
            layouts.insert(key, config);
        }
    }
    LayoutExport {
        exported_at: Utc::now(),
        layouts,
    }
}

/// Bundle a single stored layout. `None` when the key has no stored
/// configuration.
pub fn export_layout(store: &dyn LayoutStore, key: &LayoutKey) -> Option<LayoutExport> {
    let config = store.resolve(key)?;
    let mut layouts = IndexMap::new();
    layouts.insert(key.clone(), config);
    Some(LayoutExport {
        exported_at: Utc::now(),
        layouts,
    })
}

/// Write a bundle as pretty-printed JSON, atomically.
pub fn write_export(path: &Path, export: &LayoutExport) -> Result<(), StoreError> {
    let content =
        serde_json::to_vec_pretty(export).map_err(|e| StoreError::ExportFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
    recovery::atomic_write(path, &content).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), layouts = export.layouts.len(), "layouts exported");
    Ok(())
}

/// Read a bundle back from disk.
pub fn read_export(path: &Path) -> Result<LayoutExport, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::ExportFormat {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Store every layout of a bundle, replacing stored configurations with
/// the same keys. Returns the number of layouts imported.
pub fn import_layouts(
    store: &mut dyn LayoutStore,
    export: &LayoutExport,
) -> Result<usize, StoreError> {
    let mut imported = 0;
    for (key, config) in &export.layouts {
        store.replace(key, config.clone())?;
        imported += 1;
    }
    Ok(imported)
}
