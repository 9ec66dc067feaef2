use std::collections::HashMap;

use async_trait::async_trait;
use fieldgate_core::AppResult;
use serde_json::Value;
use tokio::sync::RwLock;

/// Row-lookup collaborator used to resolve polymorphic parents.
///
/// This is the engine's only I/O-shaped dependency; everything else is pure
/// computation over the registry. Implementations are injected so hosts can
/// back it with their storage layer and tests with an in-memory store.
#[async_trait]
pub trait RowLookup: Send + Sync {
    /// Fetches one row by table name and id, or `None` when absent.
    async fn fetch_row(&self, table: &str, id: &str) -> AppResult<Option<Value>>;
}

/// In-memory [`RowLookup`] implementation for tests and embedded use.
#[derive(Default)]
pub struct InMemoryRowStore {
    rows: RwLock<HashMap<(String, String), Value>>,
}

impl InMemoryRowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a row.
    pub async fn insert_row(&self, table: impl Into<String>, id: impl Into<String>, row: Value) {
        self.rows
            .write()
            .await
            .insert((table.into(), id.into()), row);
    }

    /// Removes a row, returning whether it was present.
    pub async fn remove_row(&self, table: &str, id: &str) -> bool {
        self.rows
            .write()
            .await
            .remove(&(table.to_owned(), id.to_owned()))
            .is_some()
    }
}

#[async_trait]
impl RowLookup for InMemoryRowStore {
    async fn fetch_row(&self, table: &str, id: &str) -> AppResult<Option<Value>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&(table.to_owned(), id.to_owned()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{InMemoryRowStore, RowLookup};

    #[tokio::test]
    async fn store_round_trips_rows() {
        let store = InMemoryRowStore::new();
        store
            .insert_row("work_orders", "42", json!({"id": 42}))
            .await;

        let found = store.fetch_row("work_orders", "42").await;
        assert!(found.is_ok_and(|row| row == Some(json!({"id": 42}))));

        let missing = store.fetch_row("work_orders", "43").await;
        assert!(missing.is_ok_and(|row| row.is_none()));
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let store = InMemoryRowStore::new();
        store.insert_row("roles", "1", json!({"id": 1})).await;
        assert!(store.remove_row("roles", "1").await);
        assert!(!store.remove_row("roles", "1").await);
    }
}
