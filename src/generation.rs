//! Try-on generation pipeline.
//!
//! One request resolves its reference, top and bottom, derives a cache key
//! and either returns the existing record for that key or makes a single
//! provider attempt. Provider failures are surfaced with their class, or
//! replaced by a placeholder composite when the fallback policy says so.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::{LocalFileStorage, derive_cache_key, mime_type_for_path};
use crate::config::FallbackPolicy;
use crate::error::{Result, TryOnError};
use crate::image_processing::ensure_png;
use crate::models::{
    FallbackReason, GenerationRecord, ProviderKind, ReferencePhoto, WardrobeItem, new_id,
};
use crate::placeholder;
use crate::provider::{
    ImageProvider, LabeledImage, ProviderOutcome, ProviderRequest, TRYON_ASPECT_RATIO,
};
use crate::store::Catalog;

const PLACEHOLDER_MODEL: &str = "placeholder";

const TRYON_INSTRUCTIONS: &str = "\
Create one photorealistic try-on photo.

Images, in order:
- reference: the person. Keep their face, hair, skin tone and body proportions unchanged.
- top: the upper garment. Reproduce it exactly, including colors, patterns and logos.
- bottom: the lower garment. Reproduce it exactly, including colors, patterns and logos.

Show the person from the reference wearing exactly the top and the bottom,
full body or three-quarter view.
Do not alter the person's identity and do not add other clothing items.
Use a neutral background, realistic lighting and a clean result. No nudity.";

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Explicit reference photo; the most recent upload is used when absent.
    pub reference_id: Option<String>,
    pub top_id: String,
    pub bottom_id: String,
    pub theme: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub output_url: String,
    pub provider: ProviderKind,
    pub cached: bool,
    pub generation: GenerationRecord,
}

impl GenerationOutcome {
    fn new(generation: GenerationRecord, cached: bool) -> Self {
        Self {
            output_url: generation.output_url.clone(),
            provider: generation.provider,
            cached,
            generation,
        }
    }
}

/// One async mutex per cache key; unused entries are pruned on each acquire.
#[derive(Default)]
struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key.to_string()).or_default().clone()
    }
}

enum CacheLookup {
    Hit(GenerationRecord),
    Stale(String),
    Miss,
}

struct Resolved {
    reference: ReferencePhoto,
    top: WardrobeItem,
    bottom: WardrobeItem,
}

impl Resolved {
    fn sources(&self) -> [(&'static str, String); 3] {
        [
            ("reference", LocalFileStorage::reference_key(&self.reference.filename)),
            ("top", LocalFileStorage::clothes_key(&self.top.filename)),
            ("bottom", LocalFileStorage::clothes_key(&self.bottom.filename)),
        ]
    }
}

pub struct Generator {
    catalog: Catalog,
    storage: Arc<LocalFileStorage>,
    provider: Arc<dyn ImageProvider>,
    policy: FallbackPolicy,
    timeout: Duration,
    locks: KeyedLocks,
}

impl Generator {
    pub fn new(
        catalog: Catalog,
        storage: Arc<LocalFileStorage>,
        provider: Arc<dyn ImageProvider>,
        policy: FallbackPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            storage,
            provider,
            policy,
            timeout,
            locks: KeyedLocks::default(),
        }
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerationOutcome> {
        let resolved = self.resolve(request).await?;
        self.verify_sources(&resolved).await?;

        let theme = request.theme.trim().to_string();
        let cache_key = derive_cache_key(
            &resolved.reference.id,
            &resolved.top.id,
            &resolved.bottom.id,
            &theme,
        );

        let lock = self.locks.lock_for(&cache_key);
        let _guard = lock.lock().await;

        let stale_id = match self.lookup(&cache_key).await? {
            CacheLookup::Hit(existing) => {
                tracing::info!(
                    cache_key = %cache_key,
                    provider = existing.provider.as_str(),
                    "generation cache hit"
                );
                return Ok(GenerationOutcome::new(existing, true));
            }
            CacheLookup::Stale(id) => Some(id),
            CacheLookup::Miss => None,
        };

        let provider_request = self.build_request(&resolved, &theme).await?;
        let attempt = self.provider.generate(&provider_request);
        let outcome = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => ProviderOutcome::Retryable(format!(
                "provider did not respond within {}s",
                self.timeout.as_secs_f32()
            )),
        };
        let outcome = match outcome {
            ProviderOutcome::Success(bytes) => match ensure_png(bytes) {
                Ok(png) => ProviderOutcome::Success(png),
                Err(err) => {
                    ProviderOutcome::Fatal(format!("provider returned an unusable image: {err}"))
                }
            },
            other => other,
        };

        let (bytes, provider, model, fallback_reason) = match outcome {
            ProviderOutcome::Success(png) => {
                (png, ProviderKind::External, self.provider.model().to_string(), None)
            }
            ProviderOutcome::Retryable(reason) => {
                if !self.policy.on_retryable {
                    tracing::warn!(
                        cache_key = %cache_key,
                        reason = %reason,
                        "provider retryable failure"
                    );
                    return Err(TryOnError::ProviderRetryable(reason));
                }
                let png = self.render_placeholder(provider_request, &theme).await?;
                (
                    png,
                    ProviderKind::Placeholder,
                    PLACEHOLDER_MODEL.to_string(),
                    Some(FallbackReason::Retryable(reason)),
                )
            }
            ProviderOutcome::Fatal(reason) => {
                if !self.policy.on_fatal {
                    tracing::error!(cache_key = %cache_key, reason = %reason, "provider failed");
                    return Err(TryOnError::ProviderFatal(reason));
                }
                let png = self.render_placeholder(provider_request, &theme).await?;
                (
                    png,
                    ProviderKind::Placeholder,
                    PLACEHOLDER_MODEL.to_string(),
                    Some(FallbackReason::Fatal(reason)),
                )
            }
        };
        if let Some(reason) = &fallback_reason {
            tracing::warn!(
                cache_key = %cache_key,
                reason = ?reason,
                "provider failed, using placeholder"
            );
        }

        let output_key = LocalFileStorage::output_key(&cache_key);
        self.storage.put(&output_key, &bytes).await?;

        let record = GenerationRecord {
            id: new_id(),
            cache_key: Some(cache_key.clone()),
            ref_id: resolved.reference.id,
            top_id: resolved.top.id,
            bottom_id: resolved.bottom.id,
            theme,
            provider,
            model,
            output_url: self.storage.get_public_url(&output_key),
            output_key,
            fallback_reason,
            created_at: Utc::now(),
        };
        match stale_id {
            Some(stale_id) => self.catalog.generations.replace(&stale_id, record.clone()).await?,
            None => self.catalog.generations.append(record.clone()).await?,
        }
        tracing::info!(
            cache_key = %cache_key,
            provider = provider.as_str(),
            generation_id = %record.id,
            "generation stored"
        );
        Ok(GenerationOutcome::new(record, false))
    }

    async fn resolve(&self, request: &GenerateRequest) -> Result<Resolved> {
        let reference = match request.reference_id.as_deref() {
            Some(id) => self
                .catalog
                .references
                .get(id)
                .await?
                .ok_or_else(|| TryOnError::not_found("reference_id", id))?,
            None => self
                .catalog
                .references
                .list()
                .await?
                .pop()
                .ok_or(TryOnError::NoReference)?,
        };
        let top = self
            .catalog
            .wardrobe
            .get(&request.top_id)
            .await?
            .ok_or_else(|| TryOnError::not_found("top_id", &request.top_id))?;
        let bottom = self
            .catalog
            .wardrobe
            .get(&request.bottom_id)
            .await?
            .ok_or_else(|| TryOnError::not_found("bottom_id", &request.bottom_id))?;
        Ok(Resolved {
            reference,
            top,
            bottom,
        })
    }

    async fn verify_sources(&self, resolved: &Resolved) -> Result<()> {
        for (label, key) in resolved.sources() {
            if !self.storage.exists(&key).await? {
                return Err(TryOnError::MissingArtifact(format!("{label} file {key}")));
            }
        }
        Ok(())
    }

    /// Existing record for `cache_key`. A record whose artifact is gone is
    /// reported as stale and left in place until its replacement is stored.
    async fn lookup(&self, cache_key: &str) -> Result<CacheLookup> {
        let existing = self
            .catalog
            .generations
            .find(&|record: &GenerationRecord| record.cache_key.as_deref() == Some(cache_key))
            .await?;
        let Some(existing) = existing else {
            return Ok(CacheLookup::Miss);
        };
        if self.storage.exists(&existing.output_key).await? {
            return Ok(CacheLookup::Hit(existing));
        }
        tracing::warn!(
            cache_key = %cache_key,
            generation_id = %existing.id,
            "cached artifact missing, regenerating"
        );
        Ok(CacheLookup::Stale(existing.id))
    }

    async fn build_request(&self, resolved: &Resolved, theme: &str) -> Result<ProviderRequest> {
        let mut images = Vec::with_capacity(3);
        for (label, key) in resolved.sources() {
            let data = self
                .storage
                .get(&key)
                .await?
                .ok_or_else(|| TryOnError::MissingArtifact(format!("{label} file {key}")))?;
            images.push(LabeledImage {
                label: label.to_string(),
                mime_type: mime_type_for_path(&key).to_string(),
                data,
            });
        }
        let theme_line = if theme.is_empty() { "none" } else { theme };
        Ok(ProviderRequest {
            instructions: format!("{TRYON_INSTRUCTIONS}\n\nTHEME (optional): {theme_line}"),
            images,
            aspect_ratio: TRYON_ASPECT_RATIO.to_string(),
        })
    }

    async fn render_placeholder(&self, request: ProviderRequest, theme: &str) -> Result<Vec<u8>> {
        let mut sources = request.images.into_iter().map(|image| image.data);
        let (Some(reference), Some(top), Some(bottom)) =
            (sources.next(), sources.next(), sources.next())
        else {
            return Err(TryOnError::Image("placeholder needs three source images".to_string()));
        };
        let theme = theme.to_string();
        tokio::task::spawn_blocking(move || placeholder::render(&reference, &top, &bottom, &theme))
            .await
            .map_err(|err| TryOnError::Image(format!("placeholder render task failed: {err}")))?
    }
}
