mod config;

pub use crate::config::{Config, ConfigError};

use clap::{ArgAction, Parser, ValueEnum};
use std::convert::Infallible;
use pni_import::{ImportError, ImportSummary, run_import};
use pni_netbox::{DEFAULT_STATUS, NetBoxClient, NetBoxError};
use pni_proxmox::{ProxmoxClient, ProxmoxError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "proxmox-netbox-import",
    about = "Import Proxmox VMs into NetBox",
    version
)]
pub struct Cli {
    /// Report intended changes without writing virtual machines.
    #[arg(long, env = "DRY_RUN", action = ArgAction::SetTrue, value_parser = parse_flag)]
    pub dry_run: bool,

    /// Update NetBox VMs that already exist (default: true).
    #[arg(
        long,
        env = "UPDATE_EXISTING",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = parse_flag,
        overrides_with = "no_update_existing"
    )]
    pub update_existing: bool,

    /// Never modify NetBox VMs that already exist.
    #[arg(long, overrides_with = "update_existing")]
    pub no_update_existing: bool,

    /// Create missing platforms even during a dry run.
    #[arg(long, env = "DRY_RUN_CREATE_PLATFORMS", action = ArgAction::SetTrue, value_parser = parse_flag)]
    pub dry_run_create_platforms: bool,

    /// Fail when a name or slug matches more than one NetBox record.
    #[arg(long, env = "STRICT_DUPLICATES", action = ArgAction::SetTrue, value_parser = parse_flag)]
    pub strict_duplicates: bool,

    /// Proxmox API url, e.g. https://pve.example.com:8006
    #[arg(long, env = "PVE_BASE_URL", value_name = "URL")]
    pub pve_base_url: Option<String>,

    /// Proxmox API token id, e.g. root@pam!netbox
    #[arg(long, env = "PVE_TOKEN_ID")]
    pub pve_token_id: Option<String>,

    #[arg(long, env = "PVE_TOKEN_SECRET", hide_env_values = true)]
    pub pve_token_secret: Option<String>,

    #[arg(long, env = "PVE_VERIFY_SSL", action = ArgAction::Set, default_value = "true", value_parser = parse_flag)]
    pub pve_verify_ssl: bool,

    /// Fetch each VM's configuration for cores, sockets, disks and OS type.
    #[arg(long, env = "PVE_FETCH_CONFIG", action = ArgAction::Set, default_value = "true", value_parser = parse_flag)]
    pub pve_fetch_config: bool,

    /// NetBox url, e.g. https://netbox.example.com
    #[arg(long, env = "NETBOX_BASE_URL", value_name = "URL")]
    pub netbox_base_url: Option<String>,

    #[arg(long, env = "NETBOX_TOKEN", hide_env_values = true)]
    pub netbox_token: Option<String>,

    #[arg(long, env = "NETBOX_VERIFY_SSL", action = ArgAction::Set, default_value = "true", value_parser = parse_flag)]
    pub netbox_verify_ssl: bool,

    #[arg(long, env = "NETBOX_VM_DEFAULT_STATUS", default_value = DEFAULT_STATUS)]
    pub default_status: String,

    #[arg(long, env = "NETBOX_VM_DEFAULT_CLUSTER_ID", value_name = "ID")]
    pub default_cluster_id: Option<String>,

    #[arg(long, env = "NETBOX_VM_DEFAULT_TENANT_ID", value_name = "ID")]
    pub default_tenant_id: Option<String>,

    /// Log level (e.g., trace, debug, info, warn, error). Default: info.
    #[arg(long = "log", value_name = "LEVEL", default_value = "info")]
    pub log: String,

    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Anything outside the recognised truthy spellings reads as false.
fn parse_flag(value: &str) -> Result<bool, Infallible> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    pub fn update_existing(&self) -> bool {
        self.update_existing && !self.no_update_existing
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Proxmox(#[from] ProxmoxError),

    #[error(transparent)]
    NetBox(#[from] NetBoxError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

pub async fn run(cli: Cli) -> Result<ImportSummary, AppError> {
    let Config {
        proxmox,
        netbox,
        mapping,
        options,
    } = Config::from_cli(&cli)?;
    debug!(?mapping, ?options, "resolved config");

    info!(url = %proxmox.base_url, "using proxmox");
    let proxmox = ProxmoxClient::new(proxmox)?;
    info!(url = %netbox.base_url, "using netbox");
    let netbox = NetBoxClient::new(netbox)?;

    let summary = run_import(&proxmox, &netbox, &mapping, options).await?;
    Ok(summary)
}
