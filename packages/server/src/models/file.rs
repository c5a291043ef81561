use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::file;
use crate::error::AppError;

/// Hard ceiling on stored files per deployment.
pub const MAX_FILES: u64 = 5;

/// Content types accepted by the upload endpoint.
pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Response DTO for a single file record.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// Record ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Public blob locator URL.
    pub file_url: String,
    pub title: String,
    #[schema(example = "quarterly-report")]
    pub slug: String,
    pub description: String,
    /// 1-based display rank.
    #[schema(example = 1)]
    pub order: i32,
    /// Original upload filename.
    pub file_name: String,
    /// Blob size in bytes.
    #[schema(example = 142857)]
    pub file_size: i64,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            id: model.id.to_string(),
            file_url: model.file_url,
            title: model.title,
            slug: model.slug,
            description: model.description,
            order: model.order,
            file_name: model.file_name,
            file_size: model.file_size,
            mime_type: model.mime_type,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFilesRequest {
    /// Full desired display order. The record at index `i` receives rank
    /// `i + 1`; the list must be a permutation of all current record IDs.
    pub file_ids: Vec<Uuid>,
}

/// Success acknowledgment for delete and reorder.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    pub success: bool,
}

/// Validate a title and return its trimmed form.
pub fn validate_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(title)
}

/// Validate an ordered ID list for reorder (non-empty, no duplicates).
pub fn validate_reorder_ids(ids: &[Uuid]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::Validation("fileIds must not be empty".into()));
    }
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!(
                "Duplicate file ID {id} in reorder list"
            )));
        }
    }
    Ok(())
}
