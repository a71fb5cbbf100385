//! Thin Swift client
//!
//! Authentication (TempAuth v1, Keystone v2 and v3), account HEAD, container
//! PUT, object PUT/GET/DELETE and temporary URLs. The session token is
//! refreshed internally and never exposed.

use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::json;
use thiserror::Error;
use tokio::io::DuplexStream;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;

use crate::storage::ObjectLocation;
use super::config::SwiftConfig;
use super::types::{AccountInfo, V2AuthResponse, V3AuthResponse};
use super::util;
use super::writer::{ObjectWriter, UPLOAD_PIPE_CAPACITY};

const AUTH_TOKEN: &str = "X-Auth-Token";
const SUBJECT_TOKEN: &str = "X-Subject-Token";
const STORAGE_URL: &str = "X-Storage-Url";
const CONTAINER_COUNT: &str = "X-Account-Container-Count";
const OBJECT_COUNT: &str = "X-Account-Object-Count";
const BYTES_USED: &str = "X-Account-Bytes-Used";
const TEMP_URL_KEY: &str = "X-Account-Meta-Temp-URL-Key";

/// Sessions this close to expiry are renewed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum SwiftError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },
    #[error("credentials rejected by {0}")]
    AuthRejected(String),
    #[error("invalid auth response: {0}")]
    AuthResponse(String),
    #[error("no object-store endpoint for region `{region}` ({interface})")]
    NoEndpoint { region: String, interface: &'static str },
    #[error("container not found")]
    ContainerNotFound,
    #[error("object not found")]
    ObjectNotFound,
    #[error("invalid storage URL: {0}")]
    StorageUrl(#[from] url::ParseError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<SwiftError> for io::Error {
    fn from(err: SwiftError) -> Self {
        match err {
            SwiftError::Io(e) => e,
            e @ (SwiftError::ObjectNotFound | SwiftError::ContainerNotFound) => {
                io::Error::new(io::ErrorKind::NotFound, e)
            }
            e => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}

/// Authenticated session / 认证会话
#[derive(Debug, Clone)]
pub struct Session {
    pub storage_url: String,
    pub token: String,
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    fn is_fresh(&self) -> bool {
        match self.expires {
            Some(expires) => expires - Utc::now() > chrono::Duration::seconds(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }
}

/// Connection to one Swift account
pub struct Connection {
    config: SwiftConfig,
    client: Client,
    upload_client: Client,
    session: RwLock<Option<Session>>,
}

impl Connection {
    pub fn new(config: SwiftConfig) -> Result<Self, SwiftError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()?;

        // Streaming transfers have no overall timeout
        let upload_client = Client::builder()
            .connect_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            config,
            client,
            upload_client,
            session: RwLock::new(None),
        })
    }

    /// Run the authentication handshake and store the new session.
    pub async fn authenticate(&self) -> Result<Session, SwiftError> {
        let version = self.config.resolved_auth_version();
        tracing::debug!("Swift> authenticating against {} (v{})", self.config.auth_url, version);

        let session = match version {
            3 => self.authenticate_v3().await?,
            2 => self.authenticate_v2().await?,
            _ => self.authenticate_v1().await?,
        };

        tracing::debug!("Swift> authenticated, storage URL {}", session.storage_url);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn authenticate_v1(&self) -> Result<Session, SwiftError> {
        let response = self.client
            .get(&self.config.auth_url)
            .header("X-Auth-User", &self.config.username)
            .header("X-Auth-Key", &self.config.password)
            .send()
            .await?;
        let response = check_auth_status(response, Method::GET, &self.config.auth_url)?;

        let headers = response.headers();
        let storage_url = header_str(headers, STORAGE_URL)
            .ok_or_else(|| SwiftError::AuthResponse(format!("missing {}", STORAGE_URL)))?;
        let token = header_str(headers, AUTH_TOKEN)
            .ok_or_else(|| SwiftError::AuthResponse(format!("missing {}", AUTH_TOKEN)))?;

        Ok(Session {
            storage_url: storage_url.to_string(),
            token: token.to_string(),
            expires: None,
        })
    }

    async fn authenticate_v2(&self) -> Result<Session, SwiftError> {
        let url = format!("{}/tokens", self.config.auth_url.trim_end_matches('/'));
        let mut auth = json!({
            "passwordCredentials": {
                "username": self.config.username,
                "password": self.config.password,
            }
        });
        if !self.config.tenant.is_empty() {
            auth["tenantName"] = json!(self.config.tenant);
        }

        let response = self.client
            .post(&url)
            .json(&json!({ "auth": auth }))
            .send()
            .await?;
        let response = check_auth_status(response, Method::POST, &url)?;

        let body: V2AuthResponse = response
            .json()
            .await
            .map_err(|e| SwiftError::AuthResponse(e.to_string()))?;
        let storage_url = body
            .access
            .storage_url(&self.config.region, self.config.endpoint_type)
            .ok_or_else(|| self.no_endpoint())?;

        Ok(Session {
            storage_url,
            token: body.access.token.id,
            expires: body.access.token.expires,
        })
    }

    async fn authenticate_v3(&self) -> Result<Session, SwiftError> {
        let url = format!("{}/auth/tokens", self.config.auth_url.trim_end_matches('/'));
        let mut auth = json!({
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": self.config.username,
                        "domain": { "name": self.config.domain },
                        "password": self.config.password,
                    }
                }
            }
        });
        if !self.config.tenant.is_empty() {
            auth["scope"] = json!({
                "project": {
                    "name": self.config.tenant,
                    "domain": { "name": self.config.domain },
                }
            });
        }

        let response = self.client
            .post(&url)
            .json(&json!({ "auth": auth }))
            .send()
            .await?;
        let response = check_auth_status(response, Method::POST, &url)?;

        let token = header_str(response.headers(), SUBJECT_TOKEN)
            .ok_or_else(|| SwiftError::AuthResponse(format!("missing {}", SUBJECT_TOKEN)))?
            .to_string();
        let body: V3AuthResponse = response
            .json()
            .await
            .map_err(|e| SwiftError::AuthResponse(e.to_string()))?;
        let storage_url = body
            .token
            .storage_url(&self.config.region, self.config.endpoint_type)
            .ok_or_else(|| self.no_endpoint())?;

        Ok(Session {
            storage_url,
            token,
            expires: body.token.expires_at,
        })
    }

    fn no_endpoint(&self) -> SwiftError {
        SwiftError::NoEndpoint {
            region: self.config.region.clone(),
            interface: self.config.endpoint_type.as_str(),
        }
    }

    /// Current session, re-authenticating when missing or about to expire.
    async fn session(&self) -> Result<Session, SwiftError> {
        if let Some(session) = self.session.read().await.as_ref() {
            if session.is_fresh() {
                return Ok(session.clone());
            }
        }
        self.authenticate().await
    }

    /// Send a bodiless request below the storage URL. A 401 triggers one
    /// re-authentication and one resend with the new token.
    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<(String, Response), SwiftError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut session = self.session().await?;
        let mut reauthenticated = false;
        loop {
            let url = join_url(&session.storage_url, path);
            let request = self.client
                .request(method.clone(), &url)
                .header(AUTH_TOKEN, &session.token);
            let response = build(request).send().await?;

            if response.status() == StatusCode::UNAUTHORIZED && !reauthenticated {
                tracing::debug!("Swift> token rejected on {} {}, re-authenticating", method, url);
                session = self.authenticate().await?;
                reauthenticated = true;
                continue;
            }
            return Ok((url, response));
        }
    }

    /// Account usage and metadata
    pub async fn account(&self) -> Result<AccountInfo, SwiftError> {
        let (url, response) = self.send(Method::HEAD, "", |r| r).await?;
        let response = check_status(response, Method::HEAD, url)?;

        let headers = response.headers();
        Ok(AccountInfo {
            containers: header_u64(headers, CONTAINER_COUNT),
            objects: header_u64(headers, OBJECT_COUNT),
            bytes_used: header_u64(headers, BYTES_USED),
            temp_url_key: header_str(headers, TEMP_URL_KEY).map(str::to_string),
        })
    }

    /// Create the container if it does not exist yet (idempotent).
    pub async fn container_create(&self, loc: &ObjectLocation) -> Result<(), SwiftError> {
        let (url, response) = self.send(Method::PUT, &loc.escaped_container(), |r| {
            r.header(reqwest::header::CONTENT_LENGTH, 0)
        }).await?;
        check_status(response, Method::PUT, url)?;
        Ok(())
    }

    /// Start a streaming PUT and return the writer feeding it.
    pub async fn object_create(
        &self,
        loc: &ObjectLocation,
        content_type: &str,
    ) -> Result<ObjectWriter, SwiftError> {
        let session = self.session().await?;
        let url = join_url(
            &session.storage_url,
            &format!("{}/{}", loc.escaped_container(), loc.escaped_object()),
        );

        let request = self.upload_client
            .put(&url)
            .header(AUTH_TOKEN, &session.token)
            .header(CONTENT_TYPE, content_type)
            .build()?;

        let (write_end, read_end) = tokio::io::duplex(UPLOAD_PIPE_CAPACITY);
        let upload = tokio::spawn(upload_body(self.upload_client.clone(), request, url, read_end));

        Ok(ObjectWriter::new(write_end, upload))
    }

    /// GET the object. The body is left unread for the caller to stream.
    pub async fn object_get(&self, loc: &ObjectLocation) -> Result<Response, SwiftError> {
        let path = format!("{}/{}", loc.escaped_container(), loc.escaped_object());
        let (url, response) = self.send(Method::GET, &path, |r| r).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SwiftError::ObjectNotFound);
        }
        check_status(response, Method::GET, url)
    }

    pub async fn object_delete(&self, loc: &ObjectLocation) -> Result<(), SwiftError> {
        let path = format!("{}/{}", loc.escaped_container(), loc.escaped_object());
        let (url, response) = self.send(Method::DELETE, &path, |r| r).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SwiftError::ObjectNotFound);
        }
        check_status(response, Method::DELETE, url)?;
        Ok(())
    }

    /// Secret used to sign temporary URLs: configured key first, account metadata otherwise.
    pub async fn temp_url_key(&self) -> Result<Option<String>, SwiftError> {
        if !self.config.temp_url_key.is_empty() {
            return Ok(Some(self.config.temp_url_key.clone()));
        }
        Ok(self.account().await?.temp_url_key)
    }

    /// Signed temporary URL for `method` on the object, valid until `expires`.
    pub async fn object_temp_url(
        &self,
        loc: &ObjectLocation,
        key: &str,
        method: Method,
        expires: DateTime<Utc>,
    ) -> Result<String, SwiftError> {
        let session = self.session().await?;
        let url = util::temp_url(&session.storage_url, loc, key, method.as_str(), expires.timestamp())?;
        Ok(url)
    }
}

/// Stream the pipe's read end as the body of a prepared PUT.
async fn upload_body(
    client: Client,
    mut request: reqwest::Request,
    url: String,
    body: DuplexStream,
) -> Result<(), SwiftError> {
    *request.body_mut() = Some(Body::wrap_stream(ReaderStream::new(body)));

    let response = client.execute(request).await?;
    match response.status() {
        StatusCode::NOT_FOUND => Err(SwiftError::ContainerNotFound),
        _ => check_status(response, Method::PUT, url).map(|_| ()),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

fn check_status(response: Response, method: Method, url: String) -> Result<Response, SwiftError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(SwiftError::Status {
            method,
            url,
            status: response.status(),
        })
    }
}

fn check_auth_status(response: Response, method: Method, url: &str) -> Result<Response, SwiftError> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SwiftError::AuthRejected(url.to_string())),
        status if status.is_success() => Ok(response),
        status => Err(SwiftError::Status {
            method,
            url: url.to_string(),
            status,
        }),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    header_str(headers, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
