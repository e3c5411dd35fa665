use pni_proxmox::CanonicalVm;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::Fields;

pub const DEFAULT_STATUS: &str = "active";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingConfigError {
    #[error("default {field} id must be a non-negative integer, got '{value}'")]
    InvalidId { field: &'static str, value: String },
}

/// Hypervisor OS type code to registry platform slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTable(BTreeMap<String, String>);

impl PlatformTable {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        PlatformTable(entries.into_iter().collect())
    }

    pub fn slug(&self, os_family_code: &str) -> Option<&str> {
        self.0.get(os_family_code).map(String::as_str)
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        const ENTRIES: &[(&str, &str)] = &[
            ("l24", "linux"),
            ("l26", "linux"),
            ("solaris", "solaris"),
            ("w2k", "windows"),
            ("w2k3", "windows"),
            ("w2k8", "windows"),
            ("win7", "windows"),
            ("win8", "windows"),
            ("win10", "windows"),
            ("win11", "windows"),
            ("wvista", "windows"),
            ("wxp", "windows"),
        ];
        PlatformTable::new(
            ENTRIES
                .iter()
                .map(|(code, slug)| (code.to_string(), slug.to_string())),
        )
    }
}

/// Defaults applied to every payload, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    pub default_status: String,
    pub default_cluster_id: Option<u64>,
    pub default_tenant_id: Option<u64>,
    pub platforms: PlatformTable,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            default_status: DEFAULT_STATUS.to_owned(),
            default_cluster_id: None,
            default_tenant_id: None,
            platforms: PlatformTable::default(),
        }
    }
}

impl MappingConfig {
    /// Build from raw settings; empty ids count as unset.
    pub fn from_raw(
        default_status: &str,
        default_cluster_id: Option<&str>,
        default_tenant_id: Option<&str>,
    ) -> Result<Self, MappingConfigError> {
        Ok(MappingConfig {
            default_status: default_status.to_owned(),
            default_cluster_id: parse_id("cluster", default_cluster_id)?,
            default_tenant_id: parse_id("tenant", default_tenant_id)?,
            platforms: PlatformTable::default(),
        })
    }

    /// Platform slug for the VM's OS family, if the table knows it.
    pub fn platform_slug(&self, vm: &CanonicalVm) -> Option<&str> {
        vm.os_family_code
            .as_deref()
            .and_then(|code| self.platforms.slug(code))
    }

    /// Map a VM onto the registry schema. `platform` is the already
    /// resolved platform id; this function performs no lookups.
    pub fn build_target_payload(&self, vm: &CanonicalVm, platform: Option<u64>) -> VmPayload {
        VmPayload {
            name: vm.name.clone(),
            status: self.default_status.clone(),
            vcpus: vm.vcpu_count,
            memory: vm.memory_mb,
            disk: vm.disk_gb,
            platform,
            cluster: self.default_cluster_id,
            tenant: self.default_tenant_id,
        }
    }
}

fn parse_id(field: &'static str, raw: Option<&str>) -> Result<Option<u64>, MappingConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| MappingConfigError::InvalidId {
                field,
                value: value.to_owned(),
            }),
    }
}

/// Desired registry state for one VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmPayload {
    pub name: String,
    pub status: String,
    pub vcpus: Option<u64>,
    pub memory: Option<u64>,
    pub disk: Option<u64>,
    pub platform: Option<u64>,
    pub cluster: Option<u64>,
    pub tenant: Option<u64>,
}

impl VmPayload {
    /// Absent fields are omitted, never sent as null.
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_owned(), Value::from(self.name.as_str()));
        fields.insert("status".to_owned(), Value::from(self.status.as_str()));

        let optional = [
            ("vcpus", self.vcpus),
            ("memory", self.memory),
            ("disk", self.disk),
            ("platform", self.platform),
            ("cluster", self.cluster),
            ("tenant", self.tenant),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.insert(key.to_owned(), Value::from(value));
            }
        }
        fields
    }
}

/// Trimmed, lowercased slug, or `None` when empty.
pub fn normalize_slug(slug: &str) -> Option<String> {
    let slug = slug.trim().to_lowercase();
    (!slug.is_empty()).then_some(slug)
}

pub fn platform_display_name(slug: &str) -> String {
    slug.replace('-', " ")
}
