use std::collections::HashSet;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::file;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::file::*;
use crate::state::AppState;
use crate::utils::slug::slugify;

/// Body limit layer for the upload route: the 10 MiB file cap plus
/// multipart framing overhead.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(12 * 1024 * 1024)
}

/// The `file` multipart field, buffered.
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: axum::body::Bytes,
}

#[utoipa::path(
    post,
    path = "/files/upload",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a document",
    description = "Uploads a file with a required `title` and optional `description`. \
        The file goes to the blob store, the metadata row to the database. \
        Rejected when the 5-file limit is reached or a file with the same \
        title-derived slug already exists.",
    request_body(content_type = "multipart/form-data", description = "file, title, description?"),
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Validation or conflict error (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<UploadedFile> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                upload = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read title: {e}"))
                })?);
            }
            Some("description") => {
                description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read description: {e}"))
                })?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("No file provided".into()))?;
    let file_name = upload
        .file_name
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

    // The client-declared content type wins; guess from the filename when
    // it is absent.
    let mime_type = upload
        .content_type
        .or_else(|| {
            mime_guess::from_path(&file_name)
                .first()
                .map(|m| m.to_string())
        })
        .ok_or_else(|| AppError::Validation("File type not allowed".into()))?;
    if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AppError::Validation("File type not allowed".into()));
    }

    let max_size = state.config.storage.max_file_size;
    if upload.data.len() as u64 > max_size {
        return Err(AppError::Validation(
            "File size too large (max 10MB)".into(),
        ));
    }

    // Not atomic with the insert below; two concurrent uploads can both
    // pass at count 4. Accepted at this scale.
    let count = file::Entity::find().count(&state.db).await?;
    if count >= MAX_FILES {
        return Err(AppError::Validation(
            "Maximum file limit reached (5 files)".into(),
        ));
    }

    let title = validate_title(title.as_deref().unwrap_or(""))?.to_string();

    let slug = slugify(&title);
    let existing = file::Entity::find()
        .filter(file::Column::Slug.eq(&slug))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "A file with this title already exists".into(),
        ));
    }

    let file_url = state.blob_store.put(&file_name, &upload.data).await?;

    // An insert failure from here on orphans the blob just written; the
    // error path logs it and the record stays absent.
    let order = next_order(&state.db).await?;
    let now = chrono::Utc::now();
    let new_file = file::ActiveModel {
        id: Set(Uuid::now_v7()),
        file_url: Set(file_url),
        title: Set(title),
        slug: Set(slug),
        description: Set(description.unwrap_or_default()),
        file_name: Set(file_name),
        file_size: Set(i64::try_from(upload.data.len()).unwrap_or(i64::MAX)),
        mime_type: Set(mime_type),
        order: Set(order),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let model = new_file.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List all documents",
    description = "Returns every file record sorted ascending by display rank.",
    responses(
        (status = 200, description = "File list", body = Vec<FileResponse>),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let rows = file::Entity::find()
        .order_by_asc(file::Column::Order)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a document",
    description = "Removes the blob first, then the metadata row. A failed \
        blob delete aborts the operation and keeps the row.",
    params(("id" = String, Path, description = "File record ID (UUID)")),
    responses(
        (status = 200, description = "File deleted", body = StatusResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let id =
        Uuid::parse_str(&id).map_err(|_| AppError::Validation("Invalid file ID format".into()))?;

    let model = file::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    // Blob before row: an error here keeps the row, so the record never
    // points at a deleted blob. An already-gone blob is fine.
    state.blob_store.delete(&model.file_url).await?;

    file::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(StatusResponse { success: true }))
}

#[utoipa::path(
    put,
    path = "/files/reorder",
    tag = "Files",
    operation_id = "reorderFiles",
    summary = "Reorder all documents",
    description = "Replaces the display order. `fileIds` must be a permutation \
        of exactly the current record IDs; ranks are assigned by array index \
        starting at 1. Applied in a single transaction; a failure leaves all \
        ranks unchanged.",
    request_body = ReorderFilesRequest,
    responses(
        (status = 200, description = "Files reordered", body = StatusResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown file ID (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn reorder_files(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ReorderFilesRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    validate_reorder_ids(&payload.file_ids)?;

    let txn = state.db.begin().await?;

    let existing: Vec<Uuid> = file::Entity::find()
        .select_only()
        .column(file::Column::Id)
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?;

    let existing_set: HashSet<Uuid> = existing.into_iter().collect();
    let payload_set: HashSet<Uuid> = payload.file_ids.iter().copied().collect();

    if let Some(unknown) = payload_set.difference(&existing_set).next() {
        return Err(AppError::NotFound(format!("File not found: {unknown}")));
    }
    if payload_set != existing_set {
        return Err(AppError::Validation(
            "fileIds must contain exactly the current set of files".into(),
        ));
    }

    let now = chrono::Utc::now();
    for (i, &file_id) in payload.file_ids.iter().enumerate() {
        let rank = i32::try_from(i + 1)
            .map_err(|_| AppError::Validation("Too many files to reorder".into()))?;
        file::Entity::update_many()
            .filter(file::Column::Id.eq(file_id))
            .col_expr(file::Column::Order, Expr::value(rank))
            .col_expr(file::Column::UpdatedAt, Expr::value(now))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(Json(StatusResponse { success: true }))
}

/// Compute the rank for a newly uploaded file: max rank + 1, or 1 when the
/// store is empty.
async fn next_order<C: ConnectionTrait>(db: &C) -> Result<i32, AppError> {
    let max_order: Option<i32> = file::Entity::find()
        .select_only()
        .column_as(file::Column::Order.max(), "max_order")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();

    max_order
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("Order overflow".into()))
}
