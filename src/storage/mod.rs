use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

pub mod error;
pub mod object;
pub mod session;
pub mod manager;
pub mod local_factory;

pub use error::{ObjectStoreError, Result, Stage};
pub use object::{escape, Object, ObjectLocation, ObjectRef};
pub use session::{RandomSessionKeys, SessionKey, SessionKeyGenerator};
pub use manager::{StorageManager, DriverFactory, DriverBox};
pub use local_factory::FilesystemDriverFactory;

/// Byte stream handed to and returned by drivers / 驱动读写的字节流
///
/// Dropping the reader closes it.
pub type ByteReader = Box<dyn AsyncRead + Unpin + Send>;

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Complete driver information / 驱动完整信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Driver type key used in configuration / 驱动类型
    pub driver_type: String,
    /// Driver-specific configuration items / 驱动特有配置项
    pub items: Vec<ConfigItem>,
    pub capabilities: Capability,
}

/// Driver capability declaration / 驱动能力声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capability {
    /// Can hand out time-limited signed URLs / 支持签名直链
    pub can_sign_urls: bool,
    /// Fetch streams while the remote read is still in progress / 边下边读
    pub streaming_fetch: bool,
    /// Store creates missing containers on the fly / 自动创建容器
    pub auto_create_container: bool,
}

/// Signed URL plus the correlation token minted with it / 签名URL及会话令牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    /// Opaque token for out-of-band correlation, unrelated to the signature
    pub token: String,
}

/// Object store driver interface / 对象存储驱动接口
///
/// Every operation resolves the object to a container and an object key
/// through [`ObjectLocation`], so all drivers share the same escaping.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// Driver capabilities / 驱动能力
    fn capabilities(&self) -> Capability;

    /// Human readable health line. Never fails, failures are rendered into the string.
    async fn status(&self) -> String;

    /// Store the whole reader under `object` and return its `container/object` locator.
    async fn store(&self, object: &dyn Object, data: ByteReader) -> Result<String>;

    /// Open a reader over the stored object / 打开对象读取器
    async fn fetch(&self, object: &dyn Object) -> Result<ByteReader>;

    /// Delete the stored object / 删除对象
    async fn delete(&self, object: &dyn Object) -> Result<()>;

    /// Signed URL authorising a PUT of the object / 上传签名URL
    async fn store_url(&self, object: &dyn Object) -> Result<SignedUrl> {
        let _ = object;
        Err(ObjectStoreError::Unsupported {
            driver: self.name().to_string(),
            operation: "store_url",
        })
    }

    /// Signed URL authorising a GET of the object / 下载签名URL
    async fn fetch_url(&self, object: &dyn Object) -> Result<SignedUrl> {
        let _ = object;
        Err(ObjectStoreError::Unsupported {
            driver: self.name().to_string(),
            operation: "fetch_url",
        })
    }
}
