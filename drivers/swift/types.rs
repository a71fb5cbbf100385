//! Swift / Keystone wire types

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::config::EndpointType;

const OBJECT_STORE_SERVICE: &str = "object-store";

/// Account level usage, from `HEAD /v1/<account>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub containers: u64,
    pub objects: u64,
    pub bytes_used: u64,
    pub temp_url_key: Option<String>,
}

// Keystone v2

#[derive(Debug, Deserialize)]
pub struct V2AuthResponse {
    pub access: V2Access,
}

#[derive(Debug, Deserialize)]
pub struct V2Access {
    pub token: V2Token,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<V2Service>,
}

#[derive(Debug, Deserialize)]
pub struct V2Token {
    pub id: String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct V2Service {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<V2Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct V2Endpoint {
    #[serde(default)]
    pub region: String,
    #[serde(rename = "publicURL", default)]
    pub public_url: String,
    #[serde(rename = "internalURL", default)]
    pub internal_url: String,
    #[serde(rename = "adminURL", default)]
    pub admin_url: String,
}

impl V2Access {
    pub fn storage_url(&self, region: &str, interface: EndpointType) -> Option<String> {
        self.service_catalog
            .iter()
            .filter(|s| s.service_type == OBJECT_STORE_SERVICE)
            .flat_map(|s| s.endpoints.iter())
            .filter(|e| region.is_empty() || e.region == region)
            .map(|e| match interface {
                EndpointType::Public => &e.public_url,
                EndpointType::Internal => &e.internal_url,
                EndpointType::Admin => &e.admin_url,
            })
            .find(|url| !url.is_empty())
            .cloned()
    }
}

// Keystone v3

#[derive(Debug, Deserialize)]
pub struct V3AuthResponse {
    pub token: V3Token,
}

#[derive(Debug, Deserialize)]
pub struct V3Token {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catalog: Vec<V3Service>,
}

#[derive(Debug, Deserialize)]
pub struct V3Service {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<V3Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct V3Endpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    pub url: String,
}

impl V3Token {
    pub fn storage_url(&self, region: &str, interface: EndpointType) -> Option<String> {
        self.catalog
            .iter()
            .filter(|s| s.service_type == OBJECT_STORE_SERVICE)
            .flat_map(|s| s.endpoints.iter())
            .filter(|e| e.interface == interface.as_str())
            .find(|e| {
                region.is_empty()
                    || e.region.as_deref() == Some(region)
                    || e.region_id.as_deref() == Some(region)
            })
            .map(|e| e.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v2_catalog_selection() {
        let body = serde_json::json!({
            "access": {
                "token": { "id": "tok", "expires": "2026-10-19T12:00:00Z" },
                "serviceCatalog": [
                    { "type": "compute", "endpoints": [
                        { "region": "GRA", "publicURL": "https://compute" }
                    ]},
                    { "type": "object-store", "endpoints": [
                        { "region": "BHS", "publicURL": "https://bhs/v1/AUTH_x", "internalURL": "http://bhs-int/v1/AUTH_x" },
                        { "region": "GRA", "publicURL": "https://gra/v1/AUTH_x" }
                    ]}
                ]
            }
        });
        let resp: V2AuthResponse = serde_json::from_value(body).unwrap();
        let access = resp.access;
        assert_eq!(access.token.id, "tok");
        assert!(access.token.expires.is_some());
        assert_eq!(
            access.storage_url("GRA", EndpointType::Public).as_deref(),
            Some("https://gra/v1/AUTH_x")
        );
        assert_eq!(
            access.storage_url("", EndpointType::Internal).as_deref(),
            Some("http://bhs-int/v1/AUTH_x")
        );
        assert_eq!(access.storage_url("GRA", EndpointType::Internal), None);
        assert_eq!(access.storage_url("SBG", EndpointType::Public), None);
    }

    #[test]
    fn test_v3_catalog_selection() {
        let body = serde_json::json!({
            "token": {
                "expires_at": "2026-10-19T12:00:00.000000Z",
                "catalog": [
                    { "type": "object-store", "endpoints": [
                        { "interface": "admin", "region": "RegionOne", "url": "http://admin/v1/AUTH_p" },
                        { "interface": "public", "region_id": "RegionOne", "url": "https://public/v1/AUTH_p" },
                        { "interface": "public", "region": "RegionTwo", "url": "https://two/v1/AUTH_p" }
                    ]}
                ]
            }
        });
        let resp: V3AuthResponse = serde_json::from_value(body).unwrap();
        assert!(resp.token.expires_at.is_some());
        assert_eq!(
            resp.token.storage_url("RegionOne", EndpointType::Public).as_deref(),
            Some("https://public/v1/AUTH_p")
        );
        assert_eq!(
            resp.token.storage_url("RegionTwo", EndpointType::Public).as_deref(),
            Some("https://two/v1/AUTH_p")
        );
        assert_eq!(
            resp.token.storage_url("", EndpointType::Admin).as_deref(),
            Some("http://admin/v1/AUTH_p")
        );
        assert_eq!(resp.token.storage_url("RegionTwo", EndpointType::Internal), None);
    }
}
