//! Layout persistence boundary.
//!
//! Editor commands mutate a persisted layout-configuration store keyed by
//! opaque string layout keys. The store contract is deliberately narrow:
//! resolve the current configuration for a key, replace it, release it.
//! Whatever transaction machinery wraps these calls lives in the host
//! framework; the in-memory component tree is not rolled back when a
//! store write fails.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::config::{LayoutConfig, LayoutKey};

/// Error type for layout store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid layout key `{key}`: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize layout `{key}`: {source}")]
    Serialize {
        key: String,
        source: toml::ser::Error,
    },
    #[error("invalid export bundle {path}: {source}")]
    ExportFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted layout configurations, keyed by opaque layout keys.
pub trait LayoutStore {
    /// The currently stored configuration for a key.
    fn resolve(&self, key: &LayoutKey) -> Option<LayoutConfig>;

    /// Store a configuration for a key, replacing any previous one.
    fn replace(&mut self, key: &LayoutKey, config: LayoutConfig) -> Result<(), StoreError>;

    /// Drop the stored configuration for a key, returning it.
    fn release(&mut self, key: &LayoutKey) -> Result<Option<LayoutConfig>, StoreError>;

    /// All keys with a stored configuration, in store order.
    fn keys(&self) -> Vec<LayoutKey>;
}

/// In-memory store for tests and per-session scratch layouts.
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    layouts: IndexMap<LayoutKey, LayoutConfig>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn resolve(&self, key: &LayoutKey) -> Option<LayoutConfig> {
        self.layouts.get(key).cloned()
    }

    fn replace(&mut self, key: &LayoutKey, config: LayoutConfig) -> Result<(), StoreError> {
        self.layouts.insert(key.clone(), config);
        Ok(())
    }

    fn release(&mut self, key: &LayoutKey) -> Result<Option<LayoutConfig>, StoreError> {
        Ok(self.layouts.shift_remove(key))
    }

    fn keys(&self) -> Vec<LayoutKey> {
        self.layouts.keys().cloned().collect()
    }
}

/// File-backed store: one `<key>.toml` per layout under a store directory.
///
/// Unparseable files are backed up as `.bak`, logged to the recovery log,
/// and skipped; they never fail opening the store.
#[derive(Debug)]
pub struct FileLayoutStore {
    dir: PathBuf,
    cache: IndexMap<LayoutKey, LayoutConfig>,
}

impl FileLayoutStore {
    /// Open (or create) a store directory and load every stored layout.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        let mut cache = IndexMap::new();

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("toml")
            })
            .collect();
        entries.sort();

        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = LayoutKey::new(stem);
            let content = fs::read_to_string(&path).map_err(|e| StoreError::Read {
                path: path.clone(),
                source: e,
            })?;
            match toml::from_str::<LayoutConfig>(&content) {
                Ok(config) => {
                    cache.insert(key, config);
                }
                Err(e) => {
                    // Corrupted: back up, preserve in the recovery log, skip.
                    let bak = path.with_extension("toml.bak");
                    let _ = fs::copy(&path, &bak);
                    warn!(path = %path.display(), error = %e, "skipping unparseable layout file");
                    recovery::log_recovery(
                        dir,
                        RecoveryEntry {
                            timestamp: chrono::Utc::now(),
                            category: RecoveryCategory::Parse,
                            description: format!("layout {} unreadable", key),
                            fields: vec![
                                ("Layout".to_string(), key.as_str().to_string()),
                                ("Error".to_string(), e.to_string()),
                            ],
                            body: content,
                        },
                    );
                }
            }
        }

        Ok(FileLayoutStore {
            dir: dir.to_path_buf(),
            cache,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn layout_path(&self, key: &LayoutKey) -> PathBuf {
        self.dir.join(format!("{}.toml", key.as_str()))
    }

    /// Layout keys name files, so path-like keys are rejected.
    fn validate_key(key: &LayoutKey) -> Result<(), StoreError> {
        let s = key.as_str();
        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.contains('/') || s.contains('\\') {
            Some("must not contain path separators")
        } else if s == "." || s == ".." || s.starts_with('.') {
            Some("must not start with a dot")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(StoreError::InvalidKey {
                key: s.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl LayoutStore for FileLayoutStore {
    fn resolve(&self, key: &LayoutKey) -> Option<LayoutConfig> {
        self.cache.get(key).cloned()
    }

    fn replace(&mut self, key: &LayoutKey, config: LayoutConfig) -> Result<(), StoreError> {
        Self::validate_key(key)?;
        let content = toml::to_string_pretty(&config).map_err(|e| StoreError::Serialize {
            key: key.as_str().to_string(),
            source: e,
        })?;
        let path = self.layout_path(key);
        if let Err(e) = recovery::atomic_write(&path, content.as_bytes()) {
            recovery::log_recovery(
                &self.dir,
                RecoveryEntry {
                    timestamp: chrono::Utc::now(),
                    category: RecoveryCategory::Write,
                    description: format!("layout {} write failed", key),
                    fields: vec![
                        ("Layout".to_string(), key.as_str().to_string()),
                        ("Error".to_string(), e.to_string()),
                    ],
                    body: content,
                },
            );
            return Err(StoreError::Write { path, source: e });
        }
        debug!(key = %key, "layout stored");
        self.cache.insert(key.clone(), config);
        Ok(())
    }

    fn release(&mut self, key: &LayoutKey) -> Result<Option<LayoutConfig>, StoreError> {
        Self::validate_key(key)?;
        let Some(config) = self.cache.shift_remove(key) else {
            return Ok(None);
        };
        // Preserve the released content before dropping the file.
        if let Ok(content) = toml::to_string_pretty(&config) {
            recovery::log_layout_release(&self.dir, key.as_str(), &content);
        }
        let path = self.layout_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::Write { path, source: e })?;
        }
        debug!(key = %key, "layout released");
        Ok(Some(config))
    }

    fn keys(&self) -> Vec<LayoutKey> {
        self.cache.keys().cloned().collect()
    }
}
