//! Object storage: buckets and the files kept in them.

use async_trait::async_trait;
use bytes::Bytes;
use log::info;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("bucket '{0}' not found")]
    BucketNotFound(String),

    #[error("bucket '{0}' already exists")]
    BucketExists(String),

    #[error("object '{0}' not found")]
    ObjectNotFound(String),

    #[error("invalid object path '{0}'")]
    InvalidPath(String),

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage API answered {status}: {body}")]
    Api { status: u16, body: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError>;

    async fn create_bucket(&self, name: &str, public: bool) -> Result<(), StorageError>;

    /// Writes `bytes` at `path` inside `bucket`, replacing any previous object.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError>;
}

/// Makes sure `name` exists, creating it as a private bucket when missing.
///
/// Safe to call on every start-up. Returns whether the bucket was created.
pub async fn ensure_bucket(store: &dyn ObjectStore, name: &str) -> Result<bool, StorageError> {
    let buckets = store.list_buckets().await?;
    if buckets.iter().any(|b| b.name == name) {
        return Ok(false);
    }
    store.create_bucket(name, false).await?;
    info!("Created private storage bucket '{}'", name);
    Ok(true)
}

/// Client of the managed storage REST API (`/storage/v1`).
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(StorageError::Api {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError> {
        let resp = self.request(reqwest::Method::GET, "bucket").send().await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn create_bucket(&self, name: &str, public: bool) -> Result<(), StorageError> {
        let resp = self
            .request(reqwest::Method::POST, "bucket")
            .json(&json!({ "id": name, "name": name, "public": public }))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let key = object_key(path)?;
        let resp = self
            .request(reqwest::Method::POST, &format!("object/{}/{}", bucket, key))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let key = object_key(path)?;
        let resp = self
            .request(reqwest::Method::GET, &format!("object/{}/{}", bucket, key))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::ObjectNotFound(path.to_string()));
        }
        Ok(ensure_success(resp).await?.bytes().await?)
    }
}

/// Filesystem-backed store: one directory per bucket under `root`.
pub struct LocalObjectStore {
    root: PathBuf,
}

/// Marker file flagging a bucket directory as public.
const PUBLIC_MARKER: &str = ".public";

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        let dir = self.root.join(object_key(bucket)?);
        if tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            Ok(dir)
        } else {
            Err(StorageError::BucketNotFound(bucket.to_string()))
        }
    }
}

/// Rejects absolute paths and `..` so objects never escape their bucket.
fn object_key(path: &str) -> Result<&str, StorageError> {
    let trimmed = path.trim_start_matches('/');
    let clean = !trimmed.is_empty()
        && Path::new(trimmed)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if clean {
        Ok(trimmed)
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut buckets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let public = tokio::fs::metadata(entry.path().join(PUBLIC_MARKER))
                .await
                .is_ok();
            buckets.push(BucketInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                public,
            });
        }
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn create_bucket(&self, name: &str, public: bool) -> Result<(), StorageError> {
        let dir = self.root.join(object_key(name)?);
        if tokio::fs::metadata(&dir).await.is_ok() {
            return Err(StorageError::BucketExists(name.to_string()));
        }
        tokio::fs::create_dir_all(&dir).await?;
        if public {
            tokio::fs::write(dir.join(PUBLIC_MARKER), b"").await?;
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let target = self.bucket_dir(bucket).await?.join(object_key(path)?);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, &bytes).await?;
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let target = self.bucket_dir(bucket).await?.join(object_key(path)?);
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
