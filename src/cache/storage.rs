use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;

pub const CLOTHES_DIR: &str = "clothes";
pub const USER_DIR: &str = "user";
pub const OUTPUTS_DIR: &str = "outputs";

#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [CLOTHES_DIR, USER_DIR, OUTPUTS_DIR] {
            fs::create_dir_all(self.base_dir.join(dir)).await?;
        }
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes to a sibling temp file and renames it into place, so concurrent
    /// readers see either the old bytes or the new ones.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, data).await?;
        if let Err(err) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns false when there was nothing to remove.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.resolve_path(key)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_public_url(&self, key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        format!("{base}/{key}")
    }

    pub fn clothes_key(filename: &str) -> String {
        format!("{CLOTHES_DIR}/{filename}")
    }

    pub fn reference_key(filename: &str) -> String {
        format!("{USER_DIR}/{filename}")
    }

    pub fn output_key(cache_key: &str) -> String {
        format!("{OUTPUTS_DIR}/{cache_key}.png")
    }

    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let normalized = key.trim_start_matches('/');
        self.base_dir.join(Path::new(normalized))
    }
}
