//! Filesystem storage driver / 本地文件系统驱动
//!
//! One directory per container under `root`, one file per object.

mod driver;

pub use driver::FilesystemDriver;

use serde::{Deserialize, Serialize};

/// Filesystem driver configuration / 本地驱动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Root directory / 根目录
    pub root: String,
    /// Prepended to every object path to form the container directory
    #[serde(default)]
    pub container_prefix: String,
}
