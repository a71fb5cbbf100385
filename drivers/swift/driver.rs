//! Swift object store driver
//!
//! Containers are named `container_prefix + object.path()`, objects keep
//! `object.name()`. Every name goes through [`crate::storage::escape`] before
//! it reaches a URL.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use reqwest::Method;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;

use crate::storage::{
    ByteReader, Capability, Object, ObjectLocation, ObjectStore, ObjectStoreError,
    RandomSessionKeys, Result, SessionKeyGenerator, SignedUrl, Stage,
};
use super::client::{Connection, SwiftError};
use super::config::SwiftConfig;

/// Lifetime of signed URLs, in minutes
pub const SIGNED_URL_TTL_MINUTES: i64 = 15;

/// Chunks buffered between the download task and the reader
const FETCH_CHANNEL_CAPACITY: usize = 4;

/// Largest chunk put on the fetch channel. Together with the capacity this
/// bounds buffered bytes at 256 KiB, whatever sizes hyper reads in.
const FETCH_CHUNK_MAX: usize = 64 * 1024;

const CONTENT_TYPE: &str = "application/octet-stream";

pub struct SwiftDriver {
    connection: Arc<Connection>,
    container_prefix: String,
    session_keys: Arc<dyn SessionKeyGenerator>,
}

impl SwiftDriver {
    /// Connect and authenticate. Nothing else is checked up front.
    pub async fn new(config: SwiftConfig) -> Result<Self> {
        let container_prefix = config.container_prefix.clone();
        let connection = Connection::new(config)
            .map_err(|e| ObjectStoreError::Authentication(Box::new(e)))?;
        connection
            .authenticate()
            .await
            .map_err(|e| ObjectStoreError::Authentication(Box::new(e)))?;

        Ok(Self {
            connection: Arc::new(connection),
            container_prefix,
            session_keys: Arc::new(RandomSessionKeys),
        })
    }

    /// Replace the session key generator used for signed URLs.
    pub fn with_session_keys(mut self, session_keys: Arc<dyn SessionKeyGenerator>) -> Self {
        self.session_keys = session_keys;
        self
    }

    fn locate(&self, object: &dyn Object) -> ObjectLocation {
        ObjectLocation::resolve(&self.container_prefix, object)
    }

    async fn create_container(&self, loc: &ObjectLocation) -> Result<()> {
        tracing::debug!("SwiftStore> Creating container {}", loc.container);
        self.connection
            .container_create(loc)
            .await
            .map_err(|e| ObjectStoreError::remote(Stage::CreateContainer, loc.container.clone(), e))
    }

    async fn signing_key(&self) -> Result<String> {
        self.connection
            .temp_url_key()
            .await
            .map_err(|e| ObjectStoreError::remote(Stage::Account, "temp URL key", e))?
            .ok_or(ObjectStoreError::TempUrlKeyMissing)
    }

    async fn signed_url(&self, loc: &ObjectLocation, method: Method) -> Result<SignedUrl> {
        let key = self.signing_key().await?;
        let token = self.session_keys.new_session_key()?;
        let expires = Utc::now() + chrono::Duration::minutes(SIGNED_URL_TTL_MINUTES);

        let url = self.connection
            .object_temp_url(loc, &key, method, expires)
            .await
            .map_err(|e| ObjectStoreError::remote(Stage::Sign, loc.to_string(), e))?;

        Ok(SignedUrl {
            url,
            token: token.into_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for SwiftDriver {
    fn name(&self) -> &str {
        "swift"
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_sign_urls: true,
            streaming_fetch: true,
            auto_create_container: true,
        }
    }

    async fn status(&self) -> String {
        match self.connection.account().await {
            Ok(info) => format!(
                "Swift OK ({} containers, {} objects, {} bytes used)",
                info.containers, info.objects, info.bytes_used
            ),
            Err(e) => format!("Swift KO: {}", e),
        }
    }

    async fn store(&self, object: &dyn Object, mut data: ByteReader) -> Result<String> {
        let loc = self.locate(object);
        self.create_container(&loc).await?;

        tracing::debug!("SwiftStore> Creating object {}", loc);
        let mut writer = self.connection
            .object_create(&loc, CONTENT_TYPE)
            .await
            .map_err(|e| ObjectStoreError::remote(Stage::CreateObject, loc.to_string(), e))?;

        tracing::debug!("SwiftStore> Copy object {}", loc);
        let copied = match tokio::io::copy(&mut data, &mut writer).await {
            Ok(copied) => copied,
            Err(e) => {
                drop(data);
                // A rejected PUT surfaces here as a broken pipe
                return Err(match writer.abandon(e).await {
                    SwiftError::Io(e) => ObjectStoreError::remote(Stage::Copy, loc.to_string(), e),
                    e => ObjectStoreError::remote(Stage::CreateObject, loc.to_string(), e),
                });
            }
        };
        drop(data);

        tracing::debug!("SwiftStore> Closing object {} ({} bytes)", loc, copied);
        writer
            .shutdown()
            .await
            .map_err(|e| ObjectStoreError::remote(Stage::Close, loc.to_string(), e))?;

        Ok(loc.locator())
    }

    async fn fetch(&self, object: &dyn Object) -> Result<ByteReader> {
        let loc = self.locate(object);
        let connection = Arc::clone(&self.connection);
        let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(FETCH_CHANNEL_CAPACITY);

        tracing::debug!("SwiftStore> Fetching {}", loc);
        tokio::spawn(async move {
            let response = match connection.object_get(&loc).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("SwiftStore> Unable to get object {}: {}", loc, e);
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::error!("SwiftStore> Unable to read object {}: {}", loc, e);
                        let _ = tx.send(Err(SwiftError::from(e).into())).await;
                        return;
                    }
                };
                for piece in split_chunk(chunk, FETCH_CHUNK_MAX) {
                    if tx.send(Ok(piece)).await.is_err() {
                        tracing::debug!("SwiftStore> Reader for {} dropped", loc);
                        return;
                    }
                }
            }
        });

        Ok(Box::new(StreamReader::new(ReceiverStream::new(rx))))
    }

    async fn delete(&self, object: &dyn Object) -> Result<()> {
        let loc = self.locate(object);
        tracing::debug!("SwiftStore> Deleting {}", loc);
        self.connection.object_delete(&loc).await.map_err(|e| match e {
            SwiftError::ObjectNotFound => ObjectStoreError::NotFound { locator: loc.locator() },
            e => ObjectStoreError::remote(Stage::Delete, loc.to_string(), e),
        })
    }

    async fn store_url(&self, object: &dyn Object) -> Result<SignedUrl> {
        let loc = self.locate(object);
        self.create_container(&loc).await?;
        tracing::debug!("SwiftStore> Signing PUT URL for {}", loc);
        self.signed_url(&loc, Method::PUT).await
    }

    async fn fetch_url(&self, object: &dyn Object) -> Result<SignedUrl> {
        let loc = self.locate(object);
        tracing::debug!("SwiftStore> Signing GET URL for {}", loc);
        self.signed_url(&loc, Method::GET).await
    }
}

/// Cut `chunk` into pieces of at most `max` bytes, without copying.
fn split_chunk(mut chunk: Bytes, max: usize) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(chunk.len() / max + 1);
    while chunk.len() > max {
        pieces.push(chunk.split_to(max));
    }
    if !chunk.is_empty() {
        pieces.push(chunk);
    }
    pieces
}
