use std::fmt;
use std::io;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Remote sub-step a failure happened in / 出错的远程步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateContainer,
    CreateObject,
    Copy,
    Close,
    Delete,
    Account,
    Sign,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::CreateContainer => "create container",
            Stage::CreateObject => "create object",
            Stage::Copy => "copy object buffer",
            Stage::Close => "close object buffer",
            Stage::Delete => "delete object",
            Stage::Account => "query account",
            Stage::Sign => "sign URL for",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("unable to authenticate: {0}")]
    Authentication(#[source] BoxError),
    #[error("unable to {stage} {target}: {source}")]
    Remote {
        stage: Stage,
        target: String,
        #[source]
        source: BoxError,
    },
    #[error("object `{locator}` not found")]
    NotFound { locator: String },
    #[error("no temp URL key available for this account")]
    TempUrlKeyMissing,
    #[error("unable to generate session key: {0}")]
    SessionKey(String),
    #[error("{driver} driver does not support {operation}")]
    Unsupported {
        driver: String,
        operation: &'static str,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ObjectStoreError {
    pub fn remote(stage: Stage, target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Remote {
            stage,
            target: target.into(),
            source: source.into(),
        }
    }

    /// The failing stage, if this is a remote operation error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Remote { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ObjectStoreError>;
