use pni_netbox::{NewPlatform, normalize_slug, platform_display_name};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::{DuplicatePolicy, ImportError, Registry, pick_one};

/// Whether a dry run may create missing platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformCreation {
    /// Missing platforms are created even in a dry run.
    Always,
    /// In a dry run a missing platform resolves to nothing.
    #[default]
    SkipInDryRun,
}

/// Resolves platform slugs to registry ids, creating missing platforms.
///
/// Each slug is looked up at most once per run.
#[derive(Debug)]
pub struct PlatformResolver {
    create: bool,
    duplicates: DuplicatePolicy,
    cache: HashMap<String, Option<u64>>,
}

impl PlatformResolver {
    pub fn new(creation: PlatformCreation, dry_run: bool, duplicates: DuplicatePolicy) -> Self {
        PlatformResolver {
            create: !dry_run || creation == PlatformCreation::Always,
            duplicates,
            cache: HashMap::new(),
        }
    }

    pub async fn resolve_or_create<R>(
        &mut self,
        registry: &R,
        slug: &str,
    ) -> Result<Option<u64>, ImportError>
    where
        R: Registry + ?Sized,
    {
        let Some(slug) = normalize_slug(slug) else {
            return Ok(None);
        };
        if let Some(id) = self.cache.get(&slug) {
            return Ok(*id);
        }

        let found = registry.find_platforms_by_slug(&slug).await?;
        let id = match pick_one("platform", &slug, found, self.duplicates)? {
            Some(platform) => Some(platform.id),
            None if self.create => {
                let platform = NewPlatform {
                    name: platform_display_name(&slug),
                    slug: slug.clone(),
                };
                let created = registry.create_platform(&platform).await?;
                info!(platform = %slug, id = created.id, "created platform");
                Some(created.id)
            }
            None => {
                warn!(platform = %slug, "platform missing, would create");
                None
            }
        };

        self.cache.insert(slug, id);
        Ok(id)
    }
}
