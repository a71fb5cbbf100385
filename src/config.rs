//! Application configuration module / 应用配置模块
//!
//! Object store settings loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::drivers::local::FilesystemConfig;
use crate::drivers::swift::SwiftConfig;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Object store configuration / 对象存储配置
    pub object_store: ObjectStoreSettings,
}

/// Which backend to use, plus the settings of each / 存储后端选择
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreSettings {
    /// Driver type: "swift" or "filesystem" / 驱动类型
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift: Option<SwiftConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemConfig>,
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            kind: "filesystem".to_string(),
            swift: None,
            filesystem: Some(FilesystemConfig {
                root: "data/objects".to_string(),
                container_prefix: String::new(),
            }),
        }
    }
}

impl ObjectStoreSettings {
    /// Driver config for the selected kind, as handed to the driver factory
    /// / 当前驱动的配置
    pub fn driver_config(&self) -> Result<serde_json::Value> {
        let value = match self.kind.as_str() {
            "swift" => self.swift.as_ref()
                .map(serde_json::to_value)
                .ok_or_else(|| anyhow!("object_store.swift section missing"))?,
            "filesystem" => self.filesystem.as_ref()
                .map(serde_json::to_value)
                .ok_or_else(|| anyhow!("object_store.filesystem section missing"))?,
            other => return Err(anyhow!("Unknown object store kind: {}", other)),
        };
        Ok(value?)
    }
}

/// Default config file path / 默认配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(path, &config)?;
        tracing::info!("Created default configuration at {:?}", path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .context("Failed to serialize config")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {:?}", path))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config(path: &Path) -> Result<Arc<RwLock<AppConfig>>> {
    let config = load_config(path)?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG.set(config_arc.clone())
        .map_err(|_| anyhow!("Config already initialized"))?;

    Ok(config_arc)
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG.get_or_init(|| {
        let config = load_config(&default_config_path()).unwrap_or_default();
        Arc::new(RwLock::new(config))
    }).clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}
