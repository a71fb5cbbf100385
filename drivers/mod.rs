// Driver package / 驱动包
pub mod local;
pub mod swift;

use crate::storage::StorageManager;

/// Register all drivers to StorageManager / 注册所有驱动
pub async fn register_all(manager: &StorageManager) -> anyhow::Result<()> {
    // Register Swift driver / 注册Swift对象存储驱动
    manager.register_factory(Box::new(swift::SwiftDriverFactory)).await?;
    // Register filesystem driver (factory lives in the storage module) / 注册本地驱动
    manager.register_factory(Box::new(crate::storage::FilesystemDriverFactory)).await?;

    Ok(())
}
