use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use super::{Collection, Filter};
use crate::error::Result;
use crate::models::Record;

/// A collection stored as one pretty-printed JSON array, rewritten on every
/// mutation.
pub struct JsonCollection<T> {
    path: PathBuf,
    records: RwLock<Vec<T>>,
}

impl<T: Record> JsonCollection<T> {
    /// Opens the document at `path`. A missing file starts empty. An
    /// unparsable one is moved aside to `<name>.corrupt` and also starts
    /// empty, so the next write cannot destroy it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<T>>(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    let aside = corrupt_path(&path);
                    fs::rename(&path, &aside).await?;
                    tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %err,
                        "corrupt collection file, starting empty"
                    );
                    Vec::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &payload).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Collection<T> for JsonCollection<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: T) -> Result<()> {
        let mut records = self.records.write().await;
        let mut updated = records.clone();
        updated.push(record);
        self.persist(&updated).await?;
        *records = updated;
        Ok(())
    }

    async fn find(&self, predicate: Filter<'_, T>) -> Result<Option<T>> {
        Ok(self.records.read().await.iter().find(|r| predicate(*r)).cloned())
    }

    async fn remove(&self, id: &str) -> Result<Option<T>> {
        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let mut updated = records.clone();
        let removed = updated.remove(index);
        self.persist(&updated).await?;
        *records = updated;
        Ok(Some(removed))
    }

    async fn replace(&self, id: &str, record: T) -> Result<()> {
        let mut records = self.records.write().await;
        let mut updated: Vec<T> = records.iter().filter(|r| r.id() != id).cloned().collect();
        updated.push(record);
        self.persist(&updated).await?;
        *records = updated;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferencePhoto;
    use chrono::Utc;
    use tempfile::TempDir;

    fn photo(id: &str) -> ReferencePhoto {
        ReferencePhoto {
            id: id.to_string(),
            filename: format!("{id}.png"),
            url: format!("/static/user/{id}.png"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("references.json");

        let collection = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        collection.append(photo("one")).await.unwrap();
        collection.append(photo("two")).await.unwrap();
        collection.append(photo("three")).await.unwrap();
        assert_eq!(collection.remove("two").await.unwrap().unwrap().id, "two");
        drop(collection);

        let reopened = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        let ids: Vec<String> = reopened.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["one", "three"]);
        assert!(reopened.get("three").await.unwrap().is_some());
        assert!(reopened.get("two").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_kept_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("generations.json");
        std::fs::write(&path, b"{not json").unwrap();

        let collection = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        assert!(collection.list().await.unwrap().is_empty());
        collection.append(photo("fresh")).await.unwrap();

        let aside = dir.path().join("generations.json.corrupt");
        assert_eq!(std::fs::read(&aside).unwrap(), b"{not json");
        let reopened = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        assert_eq!(reopened.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_persists_single_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("references.json");
        let collection = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        collection.append(photo("old")).await.unwrap();
        collection.append(photo("other")).await.unwrap();

        collection.replace("old", photo("new")).await.unwrap();
        drop(collection);

        let reopened = JsonCollection::<ReferencePhoto>::open(&path).await.unwrap();
        let ids: Vec<String> = reopened.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["other", "new"]);
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_none() {
        let dir = TempDir::new().unwrap();
        let collection = JsonCollection::<ReferencePhoto>::open(dir.path().join("r.json"))
            .await
            .unwrap();
        assert!(collection.remove("nope").await.unwrap().is_none());
        assert!(!dir.path().join("r.json").exists());
    }
}
