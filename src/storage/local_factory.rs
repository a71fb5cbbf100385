use async_trait::async_trait;
use serde_json::Value;

use super::{ObjectStore, DriverFactory, ConfigItem, Capability, ObjectStoreError};
use crate::drivers::local::{FilesystemConfig, FilesystemDriver};

pub struct FilesystemDriverFactory;

#[async_trait]
impl DriverFactory for FilesystemDriverFactory {
    fn driver_type(&self) -> &'static str {
        "filesystem"
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_sign_urls: false,
            streaming_fetch: false,
            auto_create_container: true,
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("root", "string")
                .required()
                .help("Directory holding one sub-directory per container"),
            ConfigItem::new("container_prefix", "string")
                .default("")
                .help("Prepended to every object path"),
        ]
    }

    async fn create_driver(&self, config: Value) -> super::Result<Box<dyn ObjectStore>> {
        let config: FilesystemConfig = serde_json::from_value(config)
            .map_err(|e| ObjectStoreError::InvalidConfig(format!("filesystem: {}", e)))?;

        if config.root.trim().is_empty() {
            return Err(ObjectStoreError::InvalidConfig("filesystem: root is empty".into()));
        }

        tokio::fs::create_dir_all(&config.root).await?;
        let canonical_root = tokio::fs::canonicalize(&config.root).await?;

        tracing::info!("Filesystem driver initialized, root: {:?}", canonical_root);

        Ok(Box::new(FilesystemDriver::with_prefix(canonical_root, config.container_prefix)))
    }
}
