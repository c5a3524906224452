use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TryOnError};

/// Anything kept in a record collection.
pub trait Record: Clone + Send + Sync + Serialize + serde::de::DeserializeOwned + 'static {
    fn id(&self) -> &str;
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
}

impl Category {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "top" => Ok(Category::Top),
            "bottom" => Ok(Category::Bottom),
            _ => Err(TryOnError::InvalidInput(
                "item_type must be 'top' or 'bottom'".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub filename: String,
    pub tags: Vec<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Record for WardrobeItem {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePhoto {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Record for ReferencePhoto {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    External,
    Placeholder,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::External => "external",
            ProviderKind::Placeholder => "placeholder",
        }
    }
}

/// Classification of the provider failure that led to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "reason", rename_all = "lowercase")]
pub enum FallbackReason {
    Retryable(String),
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: String,
    pub cache_key: Option<String>,
    pub ref_id: String,
    pub top_id: String,
    pub bottom_id: String,
    pub theme: String,
    pub provider: ProviderKind,
    pub model: String,
    pub output_key: String,
    pub output_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub created_at: DateTime<Utc>,
}

impl Record for GenerationRecord {
    fn id(&self) -> &str {
        &self.id
    }
}
