use pni_http::{HttpClient, HttpOptions};
use serde_json::Value;
use tracing::debug;

use crate::{ExistingVm, Fields, NetBoxError, NewPlatform, Page, Platform};

const VIRTUAL_MACHINES: &str = "virtualization/virtual-machines/";
const PLATFORMS: &str = "dcim/platforms/";

/// Lookups ask for one more than they need, so duplicates can be detected.
const LOOKUP_LIMIT: &str = "2";

#[derive(Debug, Clone)]
pub struct NetBoxConfig {
    pub base_url: String,
    pub token: String,
    pub verify_tls: bool,
}

#[derive(Debug, Clone)]
pub struct NetBoxClient {
    http: HttpClient,
}

impl NetBoxClient {
    pub fn new(config: NetBoxConfig) -> Result<Self, NetBoxError> {
        let NetBoxConfig {
            base_url,
            token,
            verify_tls,
        } = config;

        let http = HttpClient::new(HttpOptions {
            base_url: format!("{}/api", base_url.trim_end_matches('/')),
            authorization: format!("Token {token}"),
            verify_tls,
        })?;

        Ok(NetBoxClient { http })
    }

    /// Virtual machines with exactly this name, at most two.
    pub async fn find_vms_by_name(&self, name: &str) -> Result<Vec<ExistingVm>, NetBoxError> {
        let page: Page<Value> = self
            .http
            .get(VIRTUAL_MACHINES, &[("name", name), ("limit", LOOKUP_LIMIT)])
            .await?;
        debug!(vm = %name, found = page.results.len(), "looked up vm");
        page.results
            .into_iter()
            .map(ExistingVm::from_value)
            .collect()
    }

    pub async fn create_vm(&self, payload: &Fields) -> Result<Value, NetBoxError> {
        Ok(self.http.post(VIRTUAL_MACHINES, payload).await?)
    }

    pub async fn update_vm(&self, id: u64, patch: &Fields) -> Result<Value, NetBoxError> {
        Ok(self
            .http
            .patch(&format!("{VIRTUAL_MACHINES}{id}/"), patch)
            .await?)
    }

    /// Platforms with exactly this slug, at most two.
    pub async fn find_platforms_by_slug(&self, slug: &str) -> Result<Vec<Platform>, NetBoxError> {
        let page: Page<Platform> = self
            .http
            .get(PLATFORMS, &[("slug", slug), ("limit", LOOKUP_LIMIT)])
            .await?;
        Ok(page.results)
    }

    pub async fn create_platform(&self, platform: &NewPlatform) -> Result<Platform, NetBoxError> {
        Ok(self.http.post(PLATFORMS, platform).await?)
    }
}
