use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Blob store locator; immutable after creation.
    pub file_url: String,

    pub title: String,

    /// URL-safe identifier derived from the title at creation; never
    /// recomputed.
    #[sea_orm(unique)]
    pub slug: String,

    pub description: String,

    /// Original upload filename.
    pub file_name: String,

    /// Blob size in bytes.
    pub file_size: i64,

    /// MIME content type.
    pub mime_type: String,

    /// 1-based display rank, unique across rows at rest. No database unique
    /// constraint: the reorder transaction passes through intermediate
    /// states where ranks collide.
    #[sea_orm(column_name = "display_order")]
    pub order: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
