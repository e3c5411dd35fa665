use serde::{Deserialize, Deserializer, de};
use serde_json::{Map, Value};

use crate::parse;

/// One entry of `GET /nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeListItem {
    pub node: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of `GET /nodes/{node}/qemu`.
///
/// Only `vmid` is required. The remaining fields stay untyped so that a
/// surprising value on one VM degrades to an absent field.
#[derive(Debug, Clone, Deserialize)]
pub struct VmListItem {
    #[serde(deserialize_with = "deserialize_vmid")]
    pub vmid: u64,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub maxmem: Option<Value>,
    #[serde(default)]
    pub maxcpu: Option<Value>,
    #[serde(default)]
    pub tags: Option<Value>,
}

/// `GET /nodes/{node}/qemu/{vmid}/config`.
pub type VmConfig = Map<String, Value>;

fn deserialize_vmid<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("invalid vmid: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid vmid: {s:?}"))),
        other => Err(de::Error::custom(format!("invalid vmid: {other}"))),
    }
}

/// A virtual machine normalized from its summary and (optionally) its
/// detailed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalVm {
    pub id: u64,
    pub name: String,
    pub host_node: String,
    pub power_status: Option<String>,
    pub memory_mb: Option<u64>,
    pub cpu_cores: Option<u64>,
    pub cpu_sockets: Option<u64>,
    pub vcpu_count: Option<u64>,
    pub disk_gb: Option<u64>,
    pub os_family_code: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CanonicalVm {
    /// Without a detailed configuration, `vcpu_count` falls back to the
    /// summary's `maxcpu` and disk/OS stay absent.
    pub fn from_parts(node: &str, item: &VmListItem, config: Option<&VmConfig>) -> Self {
        let id = item.vmid;
        let name = parse::string(item.name.as_ref()).unwrap_or_else(|| format!("vm-{id}"));

        let (cpu_cores, cpu_sockets, vcpu_count, disk_gb, os_family_code) = match config {
            Some(config) => {
                let cores = parse::count(config.get("cores"));
                let sockets = parse::count(config.get("sockets"));
                (
                    cores,
                    sockets,
                    parse::vcpu_count(cores, sockets),
                    parse::disk_gb(config),
                    parse::string(config.get("ostype")),
                )
            }
            None => (None, None, parse::count(item.maxcpu.as_ref()), None, None),
        };

        CanonicalVm {
            id,
            name,
            host_node: node.to_owned(),
            power_status: parse::string(item.status.as_ref()),
            memory_mb: parse::memory_mb(item.maxmem.as_ref()),
            cpu_cores,
            cpu_sockets,
            vcpu_count,
            disk_gb,
            os_family_code,
            tags: parse::tags(item.tags.as_ref()),
        }
    }
}
