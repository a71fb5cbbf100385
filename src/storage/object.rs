//! Object descriptors and identifier escaping / 对象描述与标识符转义

use std::fmt;

/// Anything the engine wants to store: a logical path plus a name.
pub trait Object: Send + Sync {
    /// Logical path, mapped to a container name
    fn path(&self) -> String;
    /// Name, mapped to an object key
    fn name(&self) -> String;
}

/// Plain owned [`Object`] / 简单对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub path: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl Object for ObjectRef {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Escape a container or object identifier for use as a single URL path segment.
///
/// Every byte outside the RFC 3986 unreserved set is percent-encoded, so path
/// separators and reserved characters never split or corrupt the request path.
pub fn escape(identifier: &str) -> String {
    urlencoding::encode(identifier).into_owned()
}

/// Resolved container/object pair for one object / 对象的容器与键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub container: String,
    pub object: String,
}

impl ObjectLocation {
    /// `container = prefix + path`, `object = name`
    pub fn resolve(container_prefix: &str, object: &dyn Object) -> Self {
        Self {
            container: format!("{}{}", container_prefix, object.path()),
            object: object.name(),
        }
    }

    pub fn escaped_container(&self) -> String {
        escape(&self.container)
    }

    pub fn escaped_object(&self) -> String {
        escape(&self.object)
    }

    /// `container/object`, the value handed back by `store`
    pub fn locator(&self) -> String {
        format!("{}/{}", self.container, self.object)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.container, self.object)
    }
}
