//! Cold-start retrieval of the model archive from object storage.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use flate2::read::GzDecoder;
use log::{debug, info};
use percent_encoding::percent_decode_str;
use tar::Archive;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{Result, ServeError};
use crate::timer::Timer;

/// `scheme://bucket/key` location of a model archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUri {
    bucket: String,
    key: String,
}

impl ModelUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: &str| ServeError::InvalidUri {
            uri: uri.to_owned(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;

        let bucket = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing bucket name"))?;

        // The key is used verbatim, so undo the escaping `Url` applies.
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|e| invalid(&e.to_string()))?;
        let key = path.strip_prefix('/').unwrap_or(&path);
        if key.is_empty() {
            return Err(invalid("missing object key"));
        }

        Ok(ModelUri {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key, without the leading separator.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Remote storage holding model archives.
#[async_trait]
pub trait ObjectStore {
    /// Copy the object `bucket/key` to the local file `dest`.
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;
}

pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn new(client: S3Client) -> Self {
        S3Store { client }
    }

    /// Client configured from the ambient AWS environment (region,
    /// credentials of the function's execution role).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        S3Store::new(S3Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let failed = |reason: String| ServeError::Download {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            reason,
        };

        let mut object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| failed(DisplayErrorContext(&e).to_string()))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0usize;

        while let Some(chunk) = object.body.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Wrote {} bytes to {}", written, dest.display());

        Ok(())
    }
}

/// Unpack every member of the gzip-compressed tar at `archive` into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    Archive::new(GzDecoder::new(file)).unpack(dest)?;

    Ok(())
}

/// Download the archive at `uri` to `archive_path` and extract it into
/// `extract_dir`. Failures are returned as-is: nothing is retried and a
/// partially extracted directory is left in place.
pub async fn fetch_model<S>(
    store: &S,
    uri: &ModelUri,
    archive_path: &Path,
    extract_dir: &Path,
) -> Result<()>
where
    S: ObjectStore + Sync + ?Sized,
{
    let mut t = Timer::new_start(&format!("Fetching model from {}", uri));
    store
        .download(uri.bucket(), uri.key(), archive_path)
        .await?;
    t.stop();

    let mut t = Timer::new_start("Extracting model archive");
    let archive: PathBuf = archive_path.to_path_buf();
    let dest: PathBuf = extract_dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await??;
    t.stop();

    info!("Model archive extracted into {}", extract_dir.display());

    Ok(())
}
