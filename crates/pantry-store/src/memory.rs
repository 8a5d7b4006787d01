use crate::{ItemStore, Record, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Fixed in-memory tables, used in tests and for local runs without AWS.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, Vec<Record>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every lookup reports `message` as a backend error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            tables: BTreeMap::new(),
            failure: Some(message.into()),
        }
    }

    pub fn with_item(mut self, table_name: impl Into<String>, record: Record) -> Self {
        self.tables.entry(table_name.into()).or_default().push(record);
        self
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_item(&self, table_name: &str, key: Record) -> Result<Option<Record>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Backend(message.clone()));
        }
        let table = self.tables.get(table_name).ok_or_else(|| {
            StoreError::Backend(format!("Requested resource not found: table {table_name}"))
        })?;
        Ok(table
            .iter()
            .find(|record| {
                key.iter()
                    .all(|(name, value)| record.get(name) == Some(value))
            })
            .cloned())
    }
}
