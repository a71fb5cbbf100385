use std::io::{self, ErrorKind};
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::storage::{
    ByteReader, Capability, Object, ObjectLocation, ObjectStore, ObjectStoreError, Result,
};

/// Uploads are written here, then renamed into their container. `+` is
/// always percent-encoded, so no escaped container name can be this.
const STAGING_DIR: &str = "+staging";

pub struct FilesystemDriver {
    root: PathBuf,
    container_prefix: String,
}

impl FilesystemDriver {
    pub fn new(root: PathBuf) -> Self {
        Self { root, container_prefix: String::new() }
    }

    pub fn with_prefix(root: PathBuf, container_prefix: impl Into<String>) -> Self {
        Self { root, container_prefix: container_prefix.into() }
    }

    fn locate(&self, object: &dyn Object) -> ObjectLocation {
        ObjectLocation::resolve(&self.container_prefix, object)
    }

    /// Container directory and object file for a location. Escaped names
    /// never contain separators; `.`/`..` and empty names are refused.
    fn paths(&self, loc: &ObjectLocation) -> Result<(PathBuf, PathBuf)> {
        let container = loc.escaped_container();
        let object = loc.escaped_object();
        for segment in [&container, &object] {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(ObjectStoreError::Io(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid identifier `{}`", segment),
                )));
            }
        }
        let dir = self.root.join(container);
        let file = dir.join(object);
        Ok((dir, file))
    }

    async fn usage(&self) -> io::Result<(u64, u64, u64)> {
        let mut containers = 0;
        let mut objects = 0;
        let mut bytes = 0;
        let mut dirs = fs::read_dir(&self.root).await?;
        while let Some(dir) = dirs.next_entry().await? {
            if !dir.file_type().await?.is_dir() || dir.file_name() == STAGING_DIR {
                continue;
            }
            containers += 1;
            let mut files = fs::read_dir(dir.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let meta = file.metadata().await?;
                if meta.is_file() {
                    objects += 1;
                    bytes += meta.len();
                }
            }
        }
        Ok((containers, objects, bytes))
    }
}

#[async_trait]
impl ObjectStore for FilesystemDriver {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_sign_urls: false,
            streaming_fetch: false,
            auto_create_container: true,
        }
    }

    async fn status(&self) -> String {
        match self.usage().await {
            Ok((containers, objects, bytes)) => format!(
                "Filesystem OK ({} containers, {} objects, {} bytes used)",
                containers, objects, bytes
            ),
            Err(e) => format!("Filesystem KO: {}", e),
        }
    }

    async fn store(&self, object: &dyn Object, mut data: ByteReader) -> Result<String> {
        let loc = self.locate(object);
        let (dir, file_path) = self.paths(&loc)?;
        tracing::debug!("Filesystem> Storing {}", loc);

        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(&staging).await?;
        let tmp_path = staging.join(Uuid::new_v4().to_string());
        let mut file = File::create(&tmp_path).await?;

        let written = async {
            tokio::io::copy(&mut data, &mut file).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        Ok(loc.locator())
    }

    async fn fetch(&self, object: &dyn Object) -> Result<ByteReader> {
        let loc = self.locate(object);
        let (_, file_path) = self.paths(&loc)?;
        tracing::debug!("Filesystem> Fetching {}", loc);

        match File::open(&file_path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ObjectStoreError::NotFound {
                locator: loc.locator(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, object: &dyn Object) -> Result<()> {
        let loc = self.locate(object);
        let (_, file_path) = self.paths(&loc)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => {
                tracing::debug!("Filesystem> removed {}", file_path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ObjectStoreError::NotFound {
                locator: loc.locator(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}
