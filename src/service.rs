//! Wardrobe and reference management plus the recommend/generate entry
//! points shared by the HTTP and MCP surfaces.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::{LocalFileStorage, upload_suffix};
use crate::config::{AppConfig, FallbackPolicy};
use crate::error::{Result, TryOnError};
use crate::generation::{GenerateRequest, GenerationOutcome, Generator};
use crate::keywords::KeywordTable;
use crate::models::{Category, GenerationRecord, ReferencePhoto, WardrobeItem, new_id};
use crate::provider::{DisabledProvider, GeminiProvider, ImageProvider};
use crate::recommender::{Recommendation, recommend};
use crate::store::Catalog;

pub struct TryOnService {
    catalog: Catalog,
    storage: Arc<LocalFileStorage>,
    keywords: Arc<KeywordTable>,
    generator: Generator,
    model: String,
}

impl TryOnService {
    pub fn new(
        catalog: Catalog,
        storage: Arc<LocalFileStorage>,
        provider: Arc<dyn ImageProvider>,
        policy: FallbackPolicy,
        timeout: Duration,
    ) -> Self {
        let model = provider.model().to_string();
        let generator = Generator::new(catalog.clone(), storage.clone(), provider, policy, timeout);
        Self {
            catalog,
            storage,
            keywords: Arc::new(KeywordTable::builtin()),
            generator,
            model,
        }
    }

    /// Open the JSON-backed catalog under the storage dir and pick the
    /// provider from the configured credentials.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = Arc::new(LocalFileStorage::new(
            config.storage_dir.clone(),
            config.public_base_url.clone(),
        ));
        storage.ensure_dirs().await?;
        let catalog = Catalog::open_json(&config.db_dir()).await?;
        let provider: Arc<dyn ImageProvider> = match config.gemini_api_key.as_deref() {
            Some(api_key) => {
                let client = GeminiProvider::new(
                    api_key.to_string(),
                    config.model.clone(),
                    config.provider_timeout,
                )
                .map_err(|err| TryOnError::Config(format!("failed to build HTTP client: {err}")))?;
                Arc::new(client)
            }
            None => {
                tracing::warn!("no GEMINI_API_KEY configured, provider calls will fail");
                Arc::new(DisabledProvider)
            }
        };
        Ok(Self::new(
            catalog,
            storage,
            provider,
            config.fallback,
            config.provider_timeout,
        ))
    }

    pub fn storage(&self) -> &LocalFileStorage {
        &self.storage
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn upload_clothing(
        &self,
        item_type: &str,
        tags: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<WardrobeItem> {
        let category = Category::parse(item_type)?;
        let filename = self.save_upload(file_name, bytes, LocalFileStorage::clothes_key).await?;
        let item = WardrobeItem {
            id: new_id(),
            category,
            url: self.storage.get_public_url(&LocalFileStorage::clothes_key(&filename)),
            filename,
            tags: parse_tags(tags),
            created_at: Utc::now(),
        };
        self.catalog.wardrobe.append(item.clone()).await?;
        tracing::info!(id = %item.id, category = category.as_str(), "clothing uploaded");
        Ok(item)
    }

    pub async fn upload_reference(&self, file_name: &str, bytes: &[u8]) -> Result<ReferencePhoto> {
        let filename = self.save_upload(file_name, bytes, LocalFileStorage::reference_key).await?;
        let reference = ReferencePhoto {
            id: new_id(),
            url: self.storage.get_public_url(&LocalFileStorage::reference_key(&filename)),
            filename,
            created_at: Utc::now(),
        };
        self.catalog.references.append(reference.clone()).await?;
        tracing::info!(id = %reference.id, "reference uploaded");
        Ok(reference)
    }

    async fn save_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        key_for: fn(&str) -> String,
    ) -> Result<String> {
        if bytes.is_empty() {
            return Err(TryOnError::InvalidInput("uploaded file is empty".to_string()));
        }
        let filename = format!("{}{}", new_id(), upload_suffix(file_name));
        self.storage.put(&key_for(&filename), bytes).await?;
        Ok(filename)
    }

    /// Wardrobe items in upload order, optionally limited to one category.
    pub async fn list_clothing(&self, category: Option<Category>) -> Result<Vec<WardrobeItem>> {
        let items = self.catalog.wardrobe.list().await?;
        Ok(match category {
            Some(category) => items.into_iter().filter(|item| item.category == category).collect(),
            None => items,
        })
    }

    pub async fn list_references(&self) -> Result<Vec<ReferencePhoto>> {
        self.catalog.references.list().await
    }

    pub async fn list_generations(&self) -> Result<Vec<GenerationRecord>> {
        self.catalog.generations.list().await
    }

    /// Removes the record and its file. Generations that used it are kept.
    pub async fn delete_clothing(&self, id: &str) -> Result<WardrobeItem> {
        let item = self
            .catalog
            .wardrobe
            .remove(id)
            .await?
            .ok_or_else(|| TryOnError::not_found("item", id))?;
        self.storage.remove(&LocalFileStorage::clothes_key(&item.filename)).await?;
        tracing::info!(id = %item.id, "clothing deleted");
        Ok(item)
    }

    pub async fn delete_reference(&self, id: &str) -> Result<ReferencePhoto> {
        let reference = self
            .catalog
            .references
            .remove(id)
            .await?
            .ok_or_else(|| TryOnError::not_found("reference", id))?;
        self.storage.remove(&LocalFileStorage::reference_key(&reference.filename)).await?;
        tracing::info!(id = %reference.id, "reference deleted");
        Ok(reference)
    }

    pub async fn recommend(&self, theme: &str) -> Result<Recommendation> {
        let wardrobe = self.catalog.wardrobe.list().await?;
        recommend(&self.keywords, &wardrobe, theme)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerationOutcome> {
        self.generator.generate(request).await
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
