//! OpenStack Swift driver / Swift对象存储驱动
//!
//! - Keystone v1/v2/v3 authentication, token refreshed on demand
//! - Streaming PUT through an in-memory pipe, streaming GET through a bounded channel
//! - Temporary URLs signed with the account temp URL key

mod client;
mod config;
mod driver;
mod types;
mod util;
mod writer;

pub use client::{Connection, Session, SwiftError};
pub use config::{EndpointType, SwiftConfig};
pub use driver::{SwiftDriver, SIGNED_URL_TTL_MINUTES};
pub use types::AccountInfo;
pub use util::{temp_url, temp_url_signature};
pub use writer::ObjectWriter;

use async_trait::async_trait;
use serde_json::Value;

use crate::storage::{Capability, ConfigItem, DriverFactory, ObjectStore, ObjectStoreError};

/// Swift驱动工厂
pub struct SwiftDriverFactory;

#[async_trait]
impl DriverFactory for SwiftDriverFactory {
    fn driver_type(&self) -> &'static str {
        "swift"
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_sign_urls: true,
            streaming_fetch: true,
            auto_create_container: true,
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("auth_url", "string")
                .help("Identity endpoint, e.g. https://auth.cloud.example.com/v3")
                .required(),
            ConfigItem::new("username", "string")
                .required(),
            ConfigItem::new("password", "password")
                .help("Password or API key")
                .required(),
            ConfigItem::new("region", "string")
                .help("Catalog region, empty for the first one found"),
            ConfigItem::new("tenant", "string")
                .help("Tenant / project name"),
            ConfigItem::new("container_prefix", "string")
                .help("Prepended to every object path to name its container")
                .default(""),
            ConfigItem::new("domain", "string")
                .help("Keystone v3 user and project domain")
                .default("Default"),
            ConfigItem::new("auth_version", "number")
                .help("1, 2 or 3; 0 detects it from auth_url")
                .default("0"),
            ConfigItem::new("endpoint_type", "select")
                .help("public, internal or admin")
                .default("public"),
            ConfigItem::new("temp_url_key", "password")
                .help("Temp URL secret; read from account metadata when empty"),
            ConfigItem::new("timeout_secs", "number")
                .default("60"),
        ]
    }

    async fn create_driver(&self, config: Value) -> crate::storage::Result<Box<dyn ObjectStore>> {
        let config: SwiftConfig = serde_json::from_value(config)
            .map_err(|e| ObjectStoreError::InvalidConfig(format!("swift: {}", e)))?;
        Ok(Box::new(SwiftDriver::new(config).await?))
    }
}
