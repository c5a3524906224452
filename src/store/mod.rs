//! Record collections for wardrobe items, reference photos and generations.
//!
//! Each collection is independent and exposes append/find/remove. The JSON
//! backend persists one document per collection; the memory backend is a
//! drop-in for tests.

pub mod json;
pub mod memory;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GenerationRecord, Record, ReferencePhoto, WardrobeItem};

pub use json::JsonCollection;
pub use memory::MemoryCollection;

/// Predicate used by [`Collection::find`].
pub type Filter<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<T>>;

    async fn append(&self, record: T) -> Result<()>;

    /// First record matching `predicate`, in insertion order.
    async fn find(&self, predicate: Filter<'_, T>) -> Result<Option<T>>;

    /// Removes the record with `id`, returning it if it existed.
    async fn remove(&self, id: &str) -> Result<Option<T>>;

    /// Drops the record with `id` (if any) and appends `record` in a single
    /// mutation, so readers never see both or neither.
    async fn replace(&self, id: &str, record: T) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<T>> {
        self.find(&|record: &T| record.id() == id).await
    }
}

#[derive(Clone)]
pub struct Catalog {
    pub wardrobe: Arc<dyn Collection<WardrobeItem>>,
    pub references: Arc<dyn Collection<ReferencePhoto>>,
    pub generations: Arc<dyn Collection<GenerationRecord>>,
}

impl Catalog {
    pub async fn open_json(dir: &Path) -> Result<Self> {
        Ok(Self {
            wardrobe: Arc::new(JsonCollection::open(dir.join("wardrobe.json")).await?),
            references: Arc::new(JsonCollection::open(dir.join("references.json")).await?),
            generations: Arc::new(JsonCollection::open(dir.join("generations.json")).await?),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            wardrobe: Arc::new(MemoryCollection::default()),
            references: Arc::new(MemoryCollection::default()),
            generations: Arc::new(MemoryCollection::default()),
        }
    }
}
