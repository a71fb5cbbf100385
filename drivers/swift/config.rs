//! Swift driver configuration

use serde::{Deserialize, Serialize};

/// Which catalog endpoint to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    #[default]
    Public,
    Internal,
    Admin,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Public => "public",
            EndpointType::Internal => "internal",
            EndpointType::Admin => "admin",
        }
    }
}

/// Swift configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwiftConfig {
    /// Identity endpoint, e.g. https://auth.example.com/v3
    pub auth_url: String,
    pub username: String,
    /// Password or API key
    #[serde(default)]
    pub password: String,
    /// Region to pick from the service catalog, empty means any
    #[serde(default)]
    pub region: String,
    /// Tenant / project name
    #[serde(default)]
    pub tenant: String,
    /// Prepended to every object path to form the container name
    #[serde(default)]
    pub container_prefix: String,
    /// Keystone v3 user and project domain
    #[serde(default = "default_domain")]
    pub domain: String,
    /// 1, 2 or 3; 0 detects it from `auth_url`
    #[serde(default)]
    pub auth_version: u8,
    #[serde(default)]
    pub endpoint_type: EndpointType,
    /// Secret for temporary URLs; read from account metadata when empty
    #[serde(default)]
    pub temp_url_key: String,
    /// Timeout for non-streaming requests
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_domain() -> String {
    "Default".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl SwiftConfig {
    pub fn new(
        auth_url: &str,
        username: &str,
        password: &str,
        region: &str,
        tenant: &str,
        container_prefix: &str,
    ) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            region: region.to_string(),
            tenant: tenant.to_string(),
            container_prefix: container_prefix.to_string(),
            domain: default_domain(),
            auth_version: 0,
            endpoint_type: EndpointType::default(),
            temp_url_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }

    /// Explicit `auth_version`, or guessed from the identity URL path.
    pub fn resolved_auth_version(&self) -> u8 {
        if self.auth_version != 0 {
            return self.auth_version;
        }
        let url = self.auth_url.trim_end_matches('/');
        if url.contains("/v3") {
            3
        } else if url.contains("/v2") {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_auth_version() {
        let mut cfg = SwiftConfig::new("https://auth.example.com/v3", "u", "p", "", "", "");
        assert_eq!(cfg.resolved_auth_version(), 3);
        cfg.auth_url = "https://auth.example.com/v2.0/".into();
        assert_eq!(cfg.resolved_auth_version(), 2);
        cfg.auth_url = "https://auth.example.com/auth/v1.0".into();
        assert_eq!(cfg.resolved_auth_version(), 1);
        cfg.auth_version = 3;
        assert_eq!(cfg.resolved_auth_version(), 3);
    }

    #[test]
    fn test_defaults_from_json() {
        let cfg: SwiftConfig = serde_json::from_value(serde_json::json!({
            "auth_url": "https://auth.example.com/v3",
            "username": "cds",
            "endpoint_type": "internal"
        }))
        .unwrap();
        assert_eq!(cfg.domain, "Default");
        assert_eq!(cfg.endpoint_type, EndpointType::Internal);
        assert_eq!(cfg.timeout_secs, 60);
        assert!(cfg.temp_url_key.is_empty());
    }
}
