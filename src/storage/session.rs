//! Session keys returned next to signed URLs / 签名URL附带的会话令牌

use std::fmt;

use rand::Rng;

use super::error::Result;

const SESSION_KEY_LEN: usize = 64;

/// Opaque correlation token / 会话令牌
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints session keys. Not consulted by any backend for authorisation.
pub trait SessionKeyGenerator: Send + Sync {
    fn new_session_key(&self) -> Result<SessionKey>;
}

/// Random alphanumeric keys / 随机令牌
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSessionKeys;

impl SessionKeyGenerator for RandomSessionKeys {
    fn new_session_key(&self) -> Result<SessionKey> {
        let token: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(SESSION_KEY_LEN)
            .map(char::from)
            .collect();
        Ok(SessionKey(token))
    }
}
