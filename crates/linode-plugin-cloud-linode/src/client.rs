//! Linode API v4 client
//!
//! Thin typed wrapper over the REST endpoints the plugin uses. Every method
//! issues one request (one per page for listings) and never retries.

use crate::error::{LinodeError, Result};
use linode_plugin_cloud::{CreateInstanceRequest, InstanceId, RemoteInstance};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LINODE_API_BASE: &str = "https://api.linode.com/v4";

/// Client identification sent with every request
pub const USER_AGENT: &str = concat!("linode-plugin/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 500;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct LinodeConfig {
    pub token: String,
    pub base_url: String,
}

impl LinodeConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: LINODE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Linode API client
pub struct LinodeClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl LinodeClient {
    pub fn new(config: LinodeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            token: config.token,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrors>(&body)
            .ok()
            .and_then(|e| e.summary())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        Err(LinodeError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.execute(self.client.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        tracing::debug!("POST {}", path);
        let response = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// POST without a meaningful response body
    async fn post_action(&self, path: &str) -> Result<()> {
        tracing::debug!("POST {}", path);
        self.execute(self.client.post(self.url(path)).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let resp: Page<T> = self
                .get(&format!("{}?page={}&page_size={}", path, page, PAGE_SIZE))
                .await?;
            items.extend(resp.data);
            if resp.page >= resp.pages {
                break;
            }
            page = resp.page + 1;
        }
        Ok(items)
    }

    /// List all linodes on the account
    pub async fn list_instances(&self) -> Result<Vec<RemoteInstance>> {
        self.get_all("linode/instances").await
    }

    pub async fn get_instance(&self, id: InstanceId) -> Result<RemoteInstance> {
        self.get(&format!("linode/instances/{}", id)).await
    }

    pub async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<RemoteInstance> {
        self.post("linode/instances", request).await
    }

    pub async fn boot(&self, id: InstanceId) -> Result<()> {
        self.post_action(&format!("linode/instances/{}/boot", id))
            .await
    }

    pub async fn shutdown(&self, id: InstanceId) -> Result<()> {
        self.post_action(&format!("linode/instances/{}/shutdown", id))
            .await
    }

    pub async fn delete_instance(&self, id: InstanceId) -> Result<()> {
        let path = format!("linode/instances/{}", id);
        tracing::debug!("DELETE {}", path);
        self.execute(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    pub async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        self.get_all("images").await
    }

    pub async fn list_regions(&self) -> Result<Vec<RegionInfo>> {
        self.get_all("regions").await
    }

    pub async fn list_types(&self) -> Result<Vec<TypeInfo>> {
        self.get_all("linode/types").await
    }

    /// Register a public key on the account profile
    pub async fn create_ssh_key(&self, label: &str, ssh_key: &str) -> Result<SshKeyInfo> {
        let body = CreateSshKeyRequest {
            label: label.to_string(),
            ssh_key: ssh_key.to_string(),
        };
        self.post("profile/sshkeys", &body).await
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    page: u32,
    pages: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    reason: String,
    #[serde(default)]
    field: Option<String>,
}

impl ApiErrors {
    fn summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| match &e.field {
                    Some(field) => format!("{}: {}", field, e.reason),
                    None => e.reason.clone(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionInfo {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub status: String,
}

impl RegionInfo {
    /// Whether new linodes can be placed here
    pub fn accepts_linodes(&self) -> bool {
        self.status == "ok" && self.capabilities.iter().any(|c| c == "Linodes")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeInfo {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub disk: u64,
}

#[derive(Debug, Serialize)]
struct CreateSshKeyRequest {
    label: String,
    ssh_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshKeyInfo {
    pub id: u64,
    pub label: String,
    pub ssh_key: String,
}
