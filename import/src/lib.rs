mod platform;
mod source;
mod summary;

pub use crate::platform::{PlatformCreation, PlatformResolver};
pub use crate::source::{Inventory, Registry};
pub use crate::summary::{Action, ImportSummary, SkipReason};

use pni_netbox::{ExistingVm, MappingConfig, NetBoxError, diff};
use pni_proxmox::{CanonicalVm, ProxmoxError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Proxmox(#[from] ProxmoxError),

    #[error(transparent)]
    NetBox(#[from] NetBoxError),

    #[error("found {count} {kind} records matching '{key}'")]
    Duplicate {
        kind: &'static str,
        key: String,
        count: usize,
    },
}

/// What to do when a lookup by name or slug matches more than one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Use the first match and log a warning.
    #[default]
    FirstMatch,
    /// Fail the run.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub update_existing: bool,
    pub platform_creation: PlatformCreation,
    pub duplicates: DuplicatePolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            dry_run: false,
            update_existing: true,
            platform_creation: PlatformCreation::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

pub(crate) fn pick_one<T>(
    kind: &'static str,
    key: &str,
    matches: Vec<T>,
    policy: DuplicatePolicy,
) -> Result<Option<T>, ImportError> {
    let count = matches.len();
    if count > 1 {
        match policy {
            DuplicatePolicy::Error => {
                return Err(ImportError::Duplicate {
                    kind,
                    key: key.to_owned(),
                    count,
                });
            }
            DuplicatePolicy::FirstMatch => {
                warn!(kind, key, "multiple matches, using the first");
            }
        }
    }
    Ok(matches.into_iter().next())
}

/// Reconcile every VM in `inventory` into `registry`, one at a time.
///
/// Any read or write failure aborts the run; writes already issued for
/// earlier VMs stay in place.
pub async fn run_import<I, R>(
    inventory: &I,
    registry: &R,
    mapping: &MappingConfig,
    options: ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    I: Inventory + ?Sized,
    R: Registry + ?Sized,
{
    info!(
        dry_run = options.dry_run,
        update_existing = options.update_existing,
        "starting import"
    );

    let vms = inventory.list_all_vms().await?;
    let mut platforms =
        PlatformResolver::new(options.platform_creation, options.dry_run, options.duplicates);
    let mut summary = ImportSummary::default();

    for vm in &vms {
        summary.scanned += 1;
        let action = reconcile(vm, registry, mapping, &mut platforms, options).await?;
        summary.record(&action);
    }

    info!(
        scanned = summary.scanned,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "import completed"
    );
    Ok(summary)
}

async fn reconcile<R>(
    vm: &CanonicalVm,
    registry: &R,
    mapping: &MappingConfig,
    platforms: &mut PlatformResolver,
    options: ImportOptions,
) -> Result<Action, ImportError>
where
    R: Registry + ?Sized,
{
    let platform = match mapping.platform_slug(vm) {
        Some(slug) => platforms.resolve_or_create(registry, slug).await?,
        None => None,
    };
    let desired = mapping.build_target_payload(vm, platform).fields();
    debug!(vm = %vm.name, payload = ?desired, "built payload");

    let found = registry.find_vms_by_name(&vm.name).await?;
    let existing: Option<ExistingVm> =
        pick_one("virtual machine", &vm.name, found, options.duplicates)?;

    let dry_run = options.dry_run;
    let action = match existing {
        None => {
            info!(vm = %vm.name, dry_run, "create");
            if !dry_run {
                registry.create_vm(&desired).await?;
            }
            Action::Create
        }
        Some(_) if !options.update_existing => {
            info!(vm = %vm.name, "skip, updates disabled");
            Action::Skip(SkipReason::UpdatesDisabled)
        }
        Some(existing) => {
            let patch = diff(&existing.fields, &desired);
            if patch.is_empty() {
                info!(vm = %vm.name, "skip, up to date");
                Action::Skip(SkipReason::UpToDate)
            } else {
                let fields: Vec<String> = patch.keys().cloned().collect();
                info!(vm = %vm.name, dry_run, ?fields, "update");
                if !dry_run {
                    registry.update_vm(existing.id, &patch).await?;
                }
                Action::Update { fields }
            }
        }
    };
    Ok(action)
}
