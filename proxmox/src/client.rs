use pni_http::{HttpClient, HttpOptions};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{
    CanonicalVm, ProxmoxError,
    vm::{NodeListItem, VmConfig, VmListItem},
};

const API_PREFIX: &str = "api2/json";

#[derive(Debug, Clone)]
pub struct ProxmoxConfig {
    pub base_url: String,
    pub token_id: String,
    pub token_secret: String,
    pub verify_tls: bool,
    /// Fetch each VM's detailed configuration (cores, sockets, disks, OS type).
    pub fetch_config: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Clone)]
pub struct ProxmoxClient {
    http: HttpClient,
    fetch_config: bool,
}

impl ProxmoxClient {
    pub fn new(config: ProxmoxConfig) -> Result<Self, ProxmoxError> {
        let ProxmoxConfig {
            base_url,
            token_id,
            token_secret,
            verify_tls,
            fetch_config,
        } = config;

        let base_url = format!("{}/{API_PREFIX}", base_url.trim_end_matches('/'));
        let http = HttpClient::new(HttpOptions {
            base_url,
            authorization: format!("PVEAPIToken={token_id}={token_secret}"),
            verify_tls,
        })?;

        Ok(ProxmoxClient { http, fetch_config })
    }

    async fn get<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, ProxmoxError> {
        let envelope: Envelope<T> = self.http.get(path, &[]).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn list_nodes(&self) -> Result<Vec<String>, ProxmoxError> {
        let nodes: Vec<NodeListItem> = self.get("nodes").await?;
        Ok(nodes.into_iter().map(|n| n.node).collect())
    }

    pub async fn list_vms(&self, node: &str) -> Result<Vec<VmListItem>, ProxmoxError> {
        self.get(&format!("nodes/{node}/qemu")).await
    }

    pub async fn get_vm_config(&self, node: &str, vmid: u64) -> Result<VmConfig, ProxmoxError> {
        self.get(&format!("nodes/{node}/qemu/{vmid}/config")).await
    }

    /// Every VM on every node, one request at a time.
    pub async fn list_all_vms(&self) -> Result<Vec<CanonicalVm>, ProxmoxError> {
        let nodes = self.list_nodes().await?;
        debug!(count = nodes.len(), "listed nodes");

        let mut vms = Vec::new();
        for node in &nodes {
            let items = self.list_vms(node).await?;
            debug!(%node, count = items.len(), "listed vms");

            for item in items {
                let config = if self.fetch_config {
                    Some(self.get_vm_config(node, item.vmid).await?)
                } else {
                    None
                };
                let vm = CanonicalVm::from_parts(node, &item, config.as_ref());
                debug!(vm = ?vm, "normalized vm");
                vms.push(vm);
            }
        }

        info!(nodes = nodes.len(), vms = vms.len(), "inventory loaded");
        Ok(vms)
    }
}
