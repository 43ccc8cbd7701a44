use std::sync::Mutex;

use async_trait::async_trait;
use garden_core::Data;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{DataStore, GetQuery, PutOutcome, StoreError};

/// The SQLite profile of `IDataStore`: one table, one UNIQUE index over
/// `(entity, name, version, lineage)` implementing the change-detection
/// contract. Matches `SqliteStore` in the original implementation exactly,
/// including the select-before-insert/update shape of `put`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema
    /// exists.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// An in-process, non-persistent SQLite database — useful for tests
    /// that want the real schema and query paths without a file.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute_batch(
            "create table if not exists data (
                id integer primary key,
                entrydate timestamp default current_timestamp,
                entity text,
                name text,
                version text,
                lineage text,
                value text,
                unique (entity, name, version, lineage)
            )",
        )?;
        Ok(())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn put(&self, data: Data) -> Result<PutOutcome, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let existing: Option<String> = conn
            .query_row(
                "select value from data where entity = ?1 and name = ?2 and version = ?3 and lineage = ?4",
                params![data.entity, data.name, data.version, data.lineage],
                |row| row.get(0),
            )
            .optional()?;

        let changed = match &existing {
            None => {
                conn.execute(
                    "insert into data (entity, name, version, lineage, value) values (?1, ?2, ?3, ?4, ?5)",
                    params![data.entity, data.name, data.version, data.lineage, data.value],
                )?;
                true
            }
            Some(previous) => {
                conn.execute(
                    "update data set value = ?1 where entity = ?2 and name = ?3 and version = ?4 and lineage = ?5",
                    params![data.value, data.entity, data.name, data.version, data.lineage],
                )?;
                previous != &data.value
            }
        };
        Ok(PutOutcome { changed })
    }

    async fn get(&self, query: GetQuery<'_>) -> Result<Vec<Data>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let mut sql = String::from("select entity, name, version, lineage, value from data where entity = ?1");
        let mut args: Vec<&str> = vec![query.entity];
        if let Some(name) = query.name {
            sql.push_str(&format!(" and name = ?{}", args.len() + 1));
            args.push(name);
        }
        if let Some(version) = query.version {
            sql.push_str(&format!(" and version = ?{}", args.len() + 1));
            args.push(version);
        }
        if let Some(lineage) = query.lineage {
            sql.push_str(&format!(" and lineage = ?{}", args.len() + 1));
            args.push(lineage);
        }

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok(Data {
                entity: row.get(0)?,
                name: row.get(1)?,
                version: row.get(2)?,
                lineage: row.get(3)?,
                value: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
