use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppResult, models::ConsumedRecord};

/// Source of a user's consumption history
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Consumed items for a user, most recent first
    async fn list_consumed(&self, user_id: Uuid) -> AppResult<Vec<ConsumedRecord>>;
}

/// Maps session tokens to user ids
#[async_trait::async_trait]
pub trait SessionResolver: Send + Sync {
    /// `None` for unknown or expired tokens
    async fn resolve(&self, token: &str) -> AppResult<Option<Uuid>>;
}

/// In-memory history and session store
#[derive(Default)]
pub struct MemoryStore {
    consumed: RwLock<HashMap<Uuid, Vec<ConsumedRecord>>>,
    sessions: RwLock<HashMap<String, Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an item as consumed; later records are listed first
    pub async fn add_consumed(&self, user_id: Uuid, record: ConsumedRecord) {
        let mut consumed = self.consumed.write().await;
        consumed.entry(user_id).or_default().push(record);
    }

    pub async fn add_session(&self, token: impl Into<String>, user_id: Uuid) {
        self.sessions.write().await.insert(token.into(), user_id);
    }
}

#[async_trait::async_trait]
impl HistoryProvider for MemoryStore {
    async fn list_consumed(&self, user_id: Uuid) -> AppResult<Vec<ConsumedRecord>> {
        let consumed = self.consumed.read().await;
        let mut records = consumed.get(&user_id).cloned().unwrap_or_default();
        records.reverse();
        Ok(records)
    }
}

#[async_trait::async_trait]
impl SessionResolver for MemoryStore {
    async fn resolve(&self, token: &str) -> AppResult<Option<Uuid>> {
        Ok(self.sessions.read().await.get(token).copied())
    }
}
