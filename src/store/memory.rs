use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, Filter};
use crate::error::Result;
use crate::models::Record;

pub struct MemoryCollection<T> {
    records: RwLock<Vec<T>>,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<T: Record> Collection<T> for MemoryCollection<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: T) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn find(&self, predicate: Filter<'_, T>) -> Result<Option<T>> {
        Ok(self.records.read().await.iter().find(|r| predicate(*r)).cloned())
    }

    async fn remove(&self, id: &str) -> Result<Option<T>> {
        let mut records = self.records.write().await;
        let position = records.iter().position(|r| r.id() == id);
        Ok(position.map(|index| records.remove(index)))
    }

    async fn replace(&self, id: &str, record: T) -> Result<()> {
        let mut records = self.records.write().await;
        records.retain(|r| r.id() != id);
        records.push(record);
        Ok(())
    }
}
