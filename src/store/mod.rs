use chrono::{DateTime, Utc};

use crate::models::Paste;

pub mod memory;
pub mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Persistence for pastes. Pastes are never updated in place.
pub trait PasteStore {
    /// Insert a new paste.
    async fn create(&mut self, paste: &Paste) -> crate::AppResult<()>;

    /// Get a paste by id, expired or not.
    async fn get(&mut self, id: &str) -> crate::AppResult<Paste>;

    /// Delete a paste by id. Deleting a missing paste is not an error.
    async fn delete(&mut self, id: &str) -> crate::AppResult<()>;

    /// Delete every paste whose expiry is at or before `now`, returning how
    /// many were removed.
    async fn delete_expired(&mut self, now: DateTime<Utc>) -> crate::AppResult<u64>;
}

#[derive(Clone)]
pub enum AnyStore {
    Sql(SqlStore),
    Memory(MemoryStore),
}

impl PasteStore for AnyStore {
    async fn create(&mut self, paste: &Paste) -> crate::AppResult<()> {
        match self {
            AnyStore::Sql(sql) => sql.create(paste).await,
            AnyStore::Memory(memory) => memory.create(paste).await,
        }
    }

    async fn get(&mut self, id: &str) -> crate::AppResult<Paste> {
        match self {
            AnyStore::Sql(sql) => sql.get(id).await,
            AnyStore::Memory(memory) => memory.get(id).await,
        }
    }

    async fn delete(&mut self, id: &str) -> crate::AppResult<()> {
        match self {
            AnyStore::Sql(sql) => sql.delete(id).await,
            AnyStore::Memory(memory) => memory.delete(id).await,
        }
    }

    async fn delete_expired(&mut self, now: DateTime<Utc>) -> crate::AppResult<u64> {
        match self {
            AnyStore::Sql(sql) => sql.delete_expired(now).await,
            AnyStore::Memory(memory) => memory.delete_expired(now).await,
        }
    }
}

impl From<SqlStore> for AnyStore {
    fn from(value: SqlStore) -> Self {
        AnyStore::Sql(value)
    }
}

impl From<MemoryStore> for AnyStore {
    fn from(value: MemoryStore) -> Self {
        AnyStore::Memory(value)
    }
}
