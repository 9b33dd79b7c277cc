use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::PasteStore;
use crate::error::AppError;
use crate::models::Paste;

/// Keeps pastes in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pastes: Arc<RwLock<HashMap<String, Paste>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasteStore for MemoryStore {
    async fn create(&mut self, paste: &Paste) -> crate::AppResult<()> {
        match self.pastes.write().await.entry(paste.id.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateId),
            Entry::Vacant(entry) => {
                entry.insert(paste.clone());
                Ok(())
            }
        }
    }

    async fn get(&mut self, id: &str) -> crate::AppResult<Paste> {
        self.pastes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn delete(&mut self, id: &str) -> crate::AppResult<()> {
        self.pastes.write().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&mut self, now: DateTime<Utc>) -> crate::AppResult<u64> {
        let mut pastes = self.pastes.write().await;
        let before = pastes.len();
        pastes.retain(|_, paste| !paste.is_expired(now));
        Ok((before - pastes.len()) as u64)
    }
}
