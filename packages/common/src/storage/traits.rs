use async_trait::async_trait;

use super::error::StorageError;

/// External blob storage addressed by publicly reachable locator URLs.
///
/// `put` chooses the storage key (derived from the upload filename plus a
/// random suffix) and returns the locator; callers persist the locator and
/// hand it back verbatim to `delete`/`exists`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a store-chosen key and return the blob's locator URL.
    async fn put(&self, name: &str, data: &[u8]) -> Result<String, StorageError>;

    /// Delete the blob a previously returned locator points at.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, locator: &str) -> Result<bool, StorageError>;

    /// Check whether a locator still resolves to a stored blob.
    async fn exists(&self, locator: &str) -> Result<bool, StorageError>;
}
