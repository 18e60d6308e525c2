//! Remembered shell preferences.
//!
//! The shell keeps the last table it showed and the page size between runs.
//! Each preference is a [`Pref`] grouped under a scope; values are
//! bincode-encoded and kept in a [`PrefStore`].

mod memory;
mod sqlite;

pub use memory::MemoryPrefs;
pub use sqlite::SqlitePrefs;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Scope of the per-table preferences cleared by `--reset`.
pub const TABLE_SCOPE: &str = "table";

/// A remembered preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pref {
    /// Model name of the last table shown.
    LastEntity,
    /// Rows per page.
    PageSize,
}

impl Pref {
    pub const ALL: [Pref; 2] = [Pref::LastEntity, Pref::PageSize];

    pub fn scope(self) -> &'static str {
        match self {
            Pref::LastEntity | Pref::PageSize => TABLE_SCOPE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pref::LastEntity => "entity",
            Pref::PageSize => "page_size",
        }
    }

    /// Resolves a stored `(scope, name)` pair.
    pub fn from_parts(scope: &str, name: &str) -> Option<Pref> {
        Self::ALL
            .into_iter()
            .find(|p| p.scope() == scope && p.name() == name)
    }
}

impl std::fmt::Display for Pref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.scope(), self.name())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(bincode::Error),
    #[error("deserialization error for {pref}: {source}")]
    Deserialization { pref: Pref, source: bincode::Error },
}

/// Byte storage for preferences.
#[async_trait]
pub trait PrefStore: Send + Sync {
    async fn load(&self, pref: Pref) -> Result<Option<Vec<u8>>, SettingsError>;

    async fn store(&self, pref: Pref, value: Vec<u8>) -> Result<(), SettingsError>;

    /// Removes every preference in `scope`, returning how many were stored.
    async fn clear_scope(&self, scope: &str) -> Result<usize, SettingsError>;
}

/// Typed access over a [`PrefStore`].
#[derive(Clone)]
pub struct SettingsProvider {
    store: Arc<dyn PrefStore>,
}

impl SettingsProvider {
    pub fn new(store: impl PrefStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Opens the on-disk store, falling back to process memory when there is
    /// no data directory or the database cannot be opened.
    pub async fn open_default() -> Self {
        let Some(path) = crate::paths::settings_db() else {
            log::warn!("No data directory; preferences will not persist");
            return Self::new(MemoryPrefs::new());
        };

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            log::warn!("Cannot create {}: {}", parent.display(), e);
        }

        match SqlitePrefs::open(&path).await {
            Ok(store) => {
                log::debug!("Preferences at {}", path.display());
                Self::new(store)
            }
            Err(e) => {
                log::warn!("Cannot open preferences at {}: {}", path.display(), e);
                Self::new(MemoryPrefs::new())
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, pref: Pref) -> Result<Option<T>, SettingsError> {
        match self.store.load(pref).await? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|source| SettingsError::Deserialization { pref, source }),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + Sync>(&self, pref: Pref, value: &T) -> Result<(), SettingsError> {
        let bytes = bincode::serialize(value).map_err(SettingsError::Serialization)?;
        self.store.store(pref, bytes).await
    }

    pub async fn reset(&self, scope: &str) -> Result<usize, SettingsError> {
        self.store.clear_scope(scope).await
    }
}
