use async_trait::async_trait;
use pni_netbox::{ExistingVm, Fields, NetBoxClient, NewPlatform, Platform};
use pni_proxmox::{CanonicalVm, ProxmoxClient};

use crate::ImportError;

/// Where virtual machines are read from.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn list_all_vms(&self) -> Result<Vec<CanonicalVm>, ImportError>;
}

/// Where virtual machines are written to.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn find_vms_by_name(&self, name: &str) -> Result<Vec<ExistingVm>, ImportError>;

    async fn create_vm(&self, payload: &Fields) -> Result<(), ImportError>;

    async fn update_vm(&self, id: u64, patch: &Fields) -> Result<(), ImportError>;

    async fn find_platforms_by_slug(&self, slug: &str) -> Result<Vec<Platform>, ImportError>;

    async fn create_platform(&self, platform: &NewPlatform) -> Result<Platform, ImportError>;
}

#[async_trait]
impl Inventory for ProxmoxClient {
    async fn list_all_vms(&self) -> Result<Vec<CanonicalVm>, ImportError> {
        Ok(ProxmoxClient::list_all_vms(self).await?)
    }
}

#[async_trait]
impl Registry for NetBoxClient {
    async fn find_vms_by_name(&self, name: &str) -> Result<Vec<ExistingVm>, ImportError> {
        Ok(NetBoxClient::find_vms_by_name(self, name).await?)
    }

    async fn create_vm(&self, payload: &Fields) -> Result<(), ImportError> {
        NetBoxClient::create_vm(self, payload).await?;
        Ok(())
    }

    async fn update_vm(&self, id: u64, patch: &Fields) -> Result<(), ImportError> {
        NetBoxClient::update_vm(self, id, patch).await?;
        Ok(())
    }

    async fn find_platforms_by_slug(&self, slug: &str) -> Result<Vec<Platform>, ImportError> {
        Ok(NetBoxClient::find_platforms_by_slug(self, slug).await?)
    }

    async fn create_platform(&self, platform: &NewPlatform) -> Result<Platform, ImportError> {
        Ok(NetBoxClient::create_platform(self, platform).await?)
    }
}
