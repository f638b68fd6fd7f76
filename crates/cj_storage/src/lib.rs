use cj_core::{Error, ObservationStore, Result};
use std::path::Path;
use std::str::FromStr;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Sqlite,
    /// Nothing survives the process; useful for dry runs.
    Memory,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

/// The one place stores are constructed; callers only see the trait object.
pub async fn create_storage(kind: StorageKind, db_path: &Path) -> Result<Box<dyn ObservationStore>> {
    match kind {
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let storage = SQLiteStorage::new_with_path(db_path).await.map_err(|e| {
                Error::Storage(format!("SQLite database should be writable at {}: {}", db_path.display(), e))
            })?;
            Ok(Box::new(storage))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::Config(format!(
            "SQLite support is not compiled in, cannot open {}",
            db_path.display()
        ))),
        StorageKind::Memory => Ok(Box::new(InMemoryStorage::new())),
    }
}

pub mod prelude {
    pub use super::{create_storage, StorageKind};
    pub use super::backends::*;
    pub use cj_core::{InsertOutcome, Observation, ObservationStore};
}
