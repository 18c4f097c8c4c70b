use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::BlobError;

pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Durable content store. `put` consumes the body as it arrives and returns a
/// stable url the blob can be fetched from.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: ByteStream) -> Result<String, BlobError>;
}

/// Stores each blob as a flat file at `{dir}/{key}`, served publicly under
/// `{public_base_url}/{key}`.
pub struct FsBlobStore {
    dir: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub async fn new(dir: PathBuf, public_base_url: impl Into<String>) -> Result<Self, BlobError> {
        fs::create_dir_all(&dir).await.map_err(|source| BlobError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        info!("Blob storage directory: {} (served at {})", dir.display(), public_base_url);
        Ok(Self { dir, public_base_url })
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    async fn discard_partial(&self, key: &str) {
        if let Err(e) = fs::remove_file(self.file_path(key)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial blob {}: {}", key, e);
            }
        }
    }
}

/// Keys become file names, so anything that could leave the directory is refused.
fn validate_key(key: &str) -> Result<(), BlobError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, mut body: ByteStream) -> Result<String, BlobError> {
        validate_key(key)?;

        let write_err = |source| BlobError::Write {
            key: key.to_string(),
            source,
        };

        let mut file = fs::File::create(self.file_path(key)).await.map_err(write_err)?;
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let result = match chunk {
                Ok(bytes) => file
                    .write_all(&bytes)
                    .await
                    .map(|()| bytes.len() as u64)
                    .map_err(write_err),
                Err(e) => Err(BlobError::Body(e)),
            };

            match result {
                Ok(n) => written += n,
                Err(e) => {
                    drop(file);
                    self.discard_partial(key).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            self.discard_partial(key).await;
            return Err(write_err(e));
        }

        debug!("Stored blob {} ({} bytes)", key, written);
        Ok(self.url_for(key))
    }
}
