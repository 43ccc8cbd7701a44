use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use garden_core::Data;

use crate::{DataStore, GetQuery, PutOutcome, StoreError};

type Key = (String, String, String, String);

/// Holds entity data in memory. Matches the original's `InMemoryStore`: a
/// single map keyed on `(entity, name, version, lineage)`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<Key, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(key: &Key, query: &GetQuery<'_>) -> bool {
        if key.0 != query.entity {
            return false;
        }
        if let Some(name) = query.name {
            if key.1 != name {
                return false;
            }
        }
        if let Some(version) = query.version {
            if key.2 != version {
                return false;
            }
        }
        if let Some(lineage) = query.lineage {
            if key.3 != lineage {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn put(&self, data: Data) -> Result<PutOutcome, StoreError> {
        let key = (data.entity, data.name, data.version, data.lineage);
        let mut guard = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        let changed = guard.get(&key) != Some(&data.value);
        guard.insert(key, data.value);
        Ok(PutOutcome { changed })
    }

    async fn get(&self, query: GetQuery<'_>) -> Result<Vec<Data>, StoreError> {
        let guard = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .iter()
            .filter(|(key, _)| Self::matches(key, &query))
            .map(|(key, value)| Data {
                entity: key.0.clone(),
                name: key.1.clone(),
                version: key.2.clone(),
                lineage: key.3.clone(),
                value: value.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(entity: &str, name: &str, version: &str, lineage: &str, value: &str) -> Data {
        Data {
            entity: entity.into(),
            name: name.into(),
            version: version.into(),
            lineage: lineage.into(),
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_exactly_that_row() {
        let store = InMemoryStore::new();
        let d = data("joe", "flour", "1", "L", "wheat");
        store.put(d.clone()).await.unwrap();
        let rows = store
            .get(GetQuery::new("joe").name("flour").version("1").lineage("L"))
            .await
            .unwrap();
        assert_eq!(rows, vec![d]);
    }

    #[tokio::test]
    async fn put_twice_reports_changed_then_unchanged() {
        let store = InMemoryStore::new();
        let first = store.put(data("joe", "flour", "1", "L", "wheat")).await.unwrap();
        assert!(first.changed);
        let second = store.put(data("joe", "flour", "1", "L", "wheat")).await.unwrap();
        assert!(!second.changed);
        let third = store.put(data("joe", "flour", "1", "L", "rye")).await.unwrap();
        assert!(third.changed);
    }

    #[tokio::test]
    async fn get_with_only_entity_returns_every_match() {
        let store = InMemoryStore::new();
        store.put(data("joe", "flour", "1", "L1", "wheat")).await.unwrap();
        store.put(data("joe", "eggs", "1", "L2", "brown")).await.unwrap();
        store.put(data("ann", "flour", "1", "L3", "rye")).await.unwrap();
        let rows = store.get(GetQuery::new("joe")).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
