use async_trait::async_trait;
use s3::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;

use super::error::StorageError;
use super::traits::BlobStore;

/// S3-compatible blob store (AWS S3, MinIO, or any custom endpoint).
///
/// Objects are uploaded with public-read in mind: `public_base_url` must be
/// the externally reachable prefix under which the bucket's objects are
/// served (a CDN, a public bucket URL, or a MinIO endpoint).
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_base_url: String,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: &str,
        secret_key: &str,
        public_base_url: &str,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn key_from_locator(&self, locator: &str) -> Result<String, StorageError> {
        let key = locator
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                StorageError::InvalidLocator(format!(
                    "locator does not belong to this store: {locator}"
                ))
            })?;

        if key.is_empty() || key.contains("..") {
            return Err(StorageError::InvalidLocator(format!(
                "malformed storage key in locator: {locator}"
            )));
        }

        Ok(key.to_string())
    }

    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.head_object(format!("/{key}")).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

fn is_not_found(err: &S3Error) -> bool {
    matches!(err, S3Error::HttpFailWithBody(404, _))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let key = super::filesystem::storage_key(name);
        self.bucket
            .put_object(format!("/{key}"), data)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete(&self, locator: &str) -> Result<bool, StorageError> {
        let key = self.key_from_locator(locator)?;

        // S3 deletes are idempotent; check first so callers can tell.
        let existed = self.head(&key).await?;
        if existed {
            self.bucket
                .delete_object(format!("/{key}"))
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        Ok(existed)
    }

    async fn exists(&self, locator: &str) -> Result<bool, StorageError> {
        let key = self.key_from_locator(locator)?;
        self.head(&key).await
    }
}
