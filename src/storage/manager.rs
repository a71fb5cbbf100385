use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{ObjectStore, Capability, ConfigItem, DriverInfo};

pub type DriverBox = Arc<dyn ObjectStore>;

/// Driver factory trait / 驱动工厂 trait
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Driver type name / 驱动类型名称
    fn driver_type(&self) -> &'static str;

    /// Create driver instance. Backends that authenticate do so here.
    /// 创建驱动实例
    async fn create_driver(&self, config: Value) -> super::Result<Box<dyn ObjectStore>>;

    /// Capabilities of drivers built by this factory / 驱动能力
    fn capabilities(&self) -> Capability;

    /// Return driver specific config items / 返回驱动特有配置项
    fn additional_items(&self) -> Vec<ConfigItem>;

    /// Generate complete driver info / 生成完整的驱动信息
    fn driver_info(&self) -> DriverInfo {
        DriverInfo {
            driver_type: self.driver_type().to_string(),
            items: self.additional_items(),
            capabilities: self.capabilities(),
        }
    }
}

/// Storage manager (selects and owns driver instances) / 存储管理器
#[derive(Clone)]
pub struct StorageManager {
    drivers: Arc<RwLock<HashMap<String, DriverBox>>>,
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn DriverFactory>>>>>,
    /// Driver error status (id -> error message) / 驱动错误状态
    driver_errors: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            drivers: Arc::new(RwLock::new(HashMap::new())),
            factories: Arc::new(RwLock::new(HashMap::new())),
            driver_errors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) -> Result<()> {
        let driver_type = factory.driver_type().to_string();
        let factory_box = Arc::new(factory);

        let mut factories = self.factories.write().await;
        factories.insert(driver_type.clone(), factory_box);

        tracing::info!("Driver factory registered: {}", driver_type);
        Ok(())
    }

    /// Create driver instance (record error on failure) / 创建驱动实例
    pub async fn create_driver(&self, id: String, driver_type: &str, config: Value) -> Result<String> {
        let factory = {
            let factories = self.factories.read().await;
            factories.get(driver_type)
                .cloned()
                .ok_or_else(|| anyhow!("Driver type not found: {}", driver_type))?
        };

        match factory.create_driver(config).await {
            Ok(driver) => {
                let driver_box: DriverBox = Arc::from(driver);
                let status = driver_box.status().await;

                let mut drivers = self.drivers.write().await;
                drivers.insert(id.clone(), driver_box);
                drop(drivers);

                let mut errors = self.driver_errors.write().await;
                errors.remove(&id);
                tracing::info!("Driver created: {} ({}) - {}", id, driver_type, status);

                Ok(id)
            }
            Err(e) => {
                let error_msg = e.to_string();
                let mut errors = self.driver_errors.write().await;
                errors.insert(id.clone(), error_msg.clone());

                tracing::error!("Driver creation failed: {} ({}) - {}", id, driver_type, error_msg);
                Err(anyhow::Error::new(e).context(format!("creating {} driver `{}`", driver_type, id)))
            }
        }
    }

    /// Get driver error status / 获取驱动错误状态
    pub async fn get_driver_error(&self, id: &str) -> Option<String> {
        let errors = self.driver_errors.read().await;
        errors.get(id).cloned()
    }

    /// Get driver instance / 获取驱动实例
    pub async fn get_driver(&self, id: &str) -> Option<DriverBox> {
        let drivers = self.drivers.read().await;
        drivers.get(id).cloned()
    }

    /// Status line of a driver, or its creation error / 驱动状态
    pub async fn driver_status(&self, id: &str) -> String {
        if let Some(driver) = self.get_driver(id).await {
            return driver.status().await;
        }
        match self.get_driver_error(id).await {
            Some(err) => format!("{} KO: {}", id, err),
            None => format!("{} KO: driver not loaded", id),
        }
    }

    /// Remove driver instance / 移除驱动实例
    pub async fn remove_driver(&self, id: &str) -> Result<()> {
        let mut drivers = self.drivers.write().await;
        drivers.remove(id)
            .ok_or_else(|| anyhow!("Driver not found: {}", id))?;

        tracing::info!("Driver removed: {}", id);
        Ok(())
    }

    /// List all drivers / 列出所有驱动
    pub async fn list_drivers(&self) -> Vec<String> {
        let drivers = self.drivers.read().await;
        let mut ids: Vec<String> = drivers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// List all available driver types / 列出所有可用的驱动类型
    pub async fn list_driver_types(&self) -> Vec<String> {
        let factories = self.factories.read().await;
        let mut types: Vec<String> = factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Info for every registered factory / 所有驱动工厂信息
    pub async fn driver_infos(&self) -> Vec<DriverInfo> {
        let factories = self.factories.read().await;
        let mut infos: Vec<DriverInfo> = factories.values().map(|f| f.driver_info()).collect();
        infos.sort_by(|a, b| a.driver_type.cmp(&b.driver_type));
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FilesystemDriverFactory;

    #[tokio::test]
    async fn test_unknown_driver_type() {
        let manager = StorageManager::new();
        let err = manager
            .create_driver("main".into(), "ftp", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Driver type not found"));
        assert!(manager.get_driver("main").await.is_none());
    }

    #[tokio::test]
    async fn test_create_filesystem_driver() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::new();
        manager.register_factory(Box::new(FilesystemDriverFactory)).await.unwrap();

        let id = manager
            .create_driver(
                "artifacts".into(),
                "filesystem",
                serde_json::json!({ "root": dir.path().to_string_lossy() }),
            )
            .await
            .unwrap();
        assert_eq!(id, "artifacts");
        assert_eq!(manager.list_drivers().await, vec!["artifacts".to_string()]);
        assert!(manager.driver_status("artifacts").await.starts_with("Filesystem OK"));

        manager.remove_driver("artifacts").await.unwrap();
        assert!(manager.remove_driver("artifacts").await.is_err());
    }

    #[tokio::test]
    async fn test_creation_error_is_recorded() {
        let manager = StorageManager::new();
        manager.register_factory(Box::new(FilesystemDriverFactory)).await.unwrap();

        let result = manager
            .create_driver("broken".into(), "filesystem", serde_json::json!({ "root": 42 }))
            .await;
        assert!(result.is_err());
        assert!(manager.get_driver_error("broken").await.is_some());
        assert!(manager.driver_status("broken").await.starts_with("broken KO:"));
    }

    #[tokio::test]
    async fn test_driver_infos() {
        let manager = StorageManager::new();
        manager.register_factory(Box::new(FilesystemDriverFactory)).await.unwrap();
        let infos = manager.driver_infos().await;
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].driver_type, "filesystem");
        assert!(infos[0].items.iter().any(|i| i.name == "root" && i.required));
        assert_eq!(manager.list_driver_types().await, vec!["filesystem".to_string()]);
    }
}
