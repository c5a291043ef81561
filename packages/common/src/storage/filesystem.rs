use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::BlobStore;

/// Filesystem-backed blob store.
///
/// Blobs are stored as flat files under `base_path`; the locator for a blob
/// is `{public_base_url}/{key}`, where the key is the sanitized upload
/// filename plus a random suffix. The directory is expected to be served
/// publicly at `public_base_url` (the server mounts it under `/blobs`).
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating directories as needed.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: &str,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Extract the storage key from a locator minted by this store.
    fn key_from_locator(&self, locator: &str) -> Result<String, StorageError> {
        let key = locator
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                StorageError::InvalidLocator(format!(
                    "locator does not belong to this store: {locator}"
                ))
            })?;

        // Keys are flat filenames; anything path-like is not ours.
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::InvalidLocator(format!(
                "malformed storage key in locator: {locator}"
            )));
        }

        Ok(key.to_string())
    }

    fn locator_for_key(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        // Random suffixes make collisions vanishingly rare; loop anyway.
        let (key, blob_path) = loop {
            let key = storage_key(name);
            let path = self.base_path.join(&key);
            if !fs::try_exists(&path).await? {
                break (key, path);
            }
        };

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(self.locator_for_key(&key))
    }

    async fn delete(&self, locator: &str) -> Result<bool, StorageError> {
        let key = self.key_from_locator(locator)?;
        match fs::remove_file(self.base_path.join(&key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, locator: &str) -> Result<bool, StorageError> {
        let key = self.key_from_locator(locator)?;
        Ok(fs::try_exists(self.base_path.join(&key)).await?)
    }
}

/// Derive a storage key from an upload filename: sanitized stem and
/// extension with a random suffix in between.
pub(crate) fn storage_key(name: &str) -> String {
    let name = name.trim();
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() && !e.is_empty() => (s, Some(e)),
        _ => (name, None),
    };

    let stem = sanitize(stem);
    let stem = if stem.is_empty() { "blob" } else { &stem };

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];

    match ext.map(sanitize).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{stem}-{suffix}.{ext}"),
        None => format!("{stem}-{suffix}"),
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
