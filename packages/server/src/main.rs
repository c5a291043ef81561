use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let db = server::database::init_db(&config.database.url).await?;
    let blob_store = init_blob_store(&config).await?;

    let state = AppState {
        db,
        blob_store,
        config: config.clone(),
    };
    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_blob_store(config: &AppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let storage = &config.storage;
    match storage.backend.as_str() {
        "filesystem" => {
            let base_url = format!("{}/blobs", config.server.public_url.trim_end_matches('/'));
            let store = FilesystemBlobStore::new(
                storage.root_dir.clone(),
                &base_url,
                storage.max_file_size,
            )
            .await?;
            Ok(Arc::new(store))
        }
        "s3" => {
            let s3 = storage.s3.as_ref().ok_or_else(|| {
                anyhow::anyhow!("storage.s3 must be set when storage.backend = \"s3\"")
            })?;
            let store = S3BlobStore::new(
                &s3.bucket,
                &s3.region,
                s3.endpoint.as_deref(),
                &s3.access_key,
                &s3.secret_key,
                &s3.public_base_url,
                storage.max_file_size,
            )?;
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("unknown storage backend: {other}"),
    }
}
