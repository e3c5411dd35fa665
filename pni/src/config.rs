use displaydoc::Display;
use pni_import::{DuplicatePolicy, ImportOptions, PlatformCreation};
use pni_netbox::{MappingConfig, MappingConfigError, NetBoxConfig};
use pni_proxmox::ProxmoxConfig;
use thiserror::Error;

use crate::Cli;

#[derive(Debug, Error, Display, PartialEq, Eq)]
pub enum ConfigError {
    /// missing required setting --{flag} (or env {env})
    Missing {
        flag: &'static str,
        env: &'static str,
    },
    /// invalid mapping defaults: {0}
    Mapping(#[from] MappingConfigError),
}

/// Everything a run needs, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub proxmox: ProxmoxConfig,
    pub netbox: NetBoxConfig,
    pub mapping: MappingConfig,
    pub options: ImportOptions,
}

fn required(value: Option<&str>, flag: &'static str, env: &'static str) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .ok_or(ConfigError::Missing { flag, env })
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let proxmox = ProxmoxConfig {
            base_url: required(cli.pve_base_url.as_deref(), "pve-base-url", "PVE_BASE_URL")?,
            token_id: required(cli.pve_token_id.as_deref(), "pve-token-id", "PVE_TOKEN_ID")?,
            token_secret: required(cli.pve_token_secret.as_deref(), "pve-token-secret", "PVE_TOKEN_SECRET")?,
            verify_tls: cli.pve_verify_ssl,
            fetch_config: cli.pve_fetch_config,
        };

        let netbox = NetBoxConfig {
            base_url: required(cli.netbox_base_url.as_deref(), "netbox-base-url", "NETBOX_BASE_URL")?,
            token: required(cli.netbox_token.as_deref(), "netbox-token", "NETBOX_TOKEN")?,
            verify_tls: cli.netbox_verify_ssl,
        };

        let mapping = MappingConfig::from_raw(
            &cli.default_status,
            cli.default_cluster_id.as_deref(),
            cli.default_tenant_id.as_deref(),
        )?;

        let options = ImportOptions {
            dry_run: cli.dry_run,
            update_existing: cli.update_existing(),
            platform_creation: if cli.dry_run_create_platforms {
                PlatformCreation::Always
            } else {
                PlatformCreation::SkipInDryRun
            },
            duplicates: if cli.strict_duplicates {
                DuplicatePolicy::Error
            } else {
                DuplicatePolicy::FirstMatch
            },
        };

        Ok(Config {
            proxmox,
            netbox,
            mapping,
            options,
        })
    }
}
