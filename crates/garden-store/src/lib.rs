//! The data store contract (`IDataStore`): a keyed, append/overwrite-only
//! table of `Data` with change detection on `put`.

pub mod error;
pub mod in_memory;
pub mod sqlite;

use async_trait::async_trait;
use garden_core::Data;

pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// The result of a `put`: whether the stored value actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    pub changed: bool,
}

/// A filter over `get`: `entity` is required, the rest narrow the match.
#[derive(Debug, Clone, Default)]
pub struct GetQuery<'a> {
    pub entity: &'a str,
    pub name: Option<&'a str>,
    pub version: Option<&'a str>,
    pub lineage: Option<&'a str>,
}

impl<'a> GetQuery<'a> {
    pub fn new(entity: &'a str) -> Self {
        Self {
            entity,
            name: None,
            version: None,
            lineage: None,
        }
    }

    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn lineage(mut self, lineage: &'a str) -> Self {
        self.lineage = Some(lineage);
        self
    }
}

/// Keyed data persistence, writes keyed by `(entity, name, version, lineage)`.
///
/// Ordering of `get` results is unspecified. Implementations never delete
/// rows; `put` creates or overwrites the row at a key.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn put(&self, data: Data) -> Result<PutOutcome, StoreError>;
    async fn get(&self, query: GetQuery<'_>) -> Result<Vec<Data>, StoreError>;
}
