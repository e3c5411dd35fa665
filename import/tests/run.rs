use async_trait::async_trait;
use pni_import::{
    DuplicatePolicy, ImportError, ImportOptions, ImportSummary, Inventory, PlatformCreation,
    Registry, run_import,
};
use pni_netbox::{ExistingVm, Fields, MappingConfig, NetBoxError, NewPlatform, Platform};
use pni_proxmox::CanonicalVm;
use serde_json::{Value, json};
use std::sync::Mutex;

struct FakeInventory(Vec<CanonicalVm>);

#[async_trait]
impl Inventory for FakeInventory {
    async fn list_all_vms(&self) -> Result<Vec<CanonicalVm>, ImportError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct State {
    next_id: u64,
    vms: Vec<Fields>,
    platforms: Vec<Platform>,
    creates: Vec<Fields>,
    updates: Vec<(u64, Fields)>,
    platform_creates: Vec<NewPlatform>,
    platform_lookups: usize,
}

#[derive(Default)]
struct FakeRegistry {
    state: Mutex<State>,
    fail_create: Option<String>,
}

impl FakeRegistry {
    fn with_platform(self, id: u64, slug: &str) -> Self {
        self.state.lock().unwrap().platforms.push(Platform {
            id,
            name: slug.to_owned(),
            slug: slug.to_owned(),
        });
        self
    }

    fn with_vm(self, record: Value) -> Self {
        let Value::Object(fields) = record else {
            panic!("expected object");
        };
        self.state.lock().unwrap().vms.push(fields);
        self
    }

    fn creates(&self) -> Vec<Fields> {
        self.state.lock().unwrap().creates.clone()
    }

    fn updates(&self) -> Vec<(u64, Fields)> {
        self.state.lock().unwrap().updates.clone()
    }

    fn platform_creates(&self) -> Vec<NewPlatform> {
        self.state.lock().unwrap().platform_creates.clone()
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn find_vms_by_name(&self, name: &str) -> Result<Vec<ExistingVm>, ImportError> {
        let state = self.state.lock().unwrap();
        state
            .vms
            .iter()
            .filter(|vm| vm.get("name") == Some(&json!(name)))
            .take(2)
            .map(|vm| ExistingVm::from_value(Value::Object(vm.clone())).map_err(ImportError::from))
            .collect()
    }

    async fn create_vm(&self, payload: &Fields) -> Result<(), ImportError> {
        if self.fail_create.as_deref() == payload.get("name").and_then(Value::as_str) {
            return Err(NetBoxError::InvalidRecord(Value::Null).into());
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut record = payload.clone();
        record.insert("id".to_owned(), json!(1000 + state.next_id));
        state.vms.push(record);
        state.creates.push(payload.clone());
        Ok(())
    }

    async fn update_vm(&self, id: u64, patch: &Fields) -> Result<(), ImportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(vm) = state.vms.iter_mut().find(|vm| vm["id"] == json!(id)) {
            for (key, value) in patch {
                vm.insert(key.clone(), value.clone());
            }
        }
        state.updates.push((id, patch.clone()));
        Ok(())
    }

    async fn find_platforms_by_slug(&self, slug: &str) -> Result<Vec<Platform>, ImportError> {
        let mut state = self.state.lock().unwrap();
        state.platform_lookups += 1;
        Ok(state
            .platforms
            .iter()
            .filter(|p| p.slug == slug)
            .take(2)
            .cloned()
            .collect())
    }

    async fn create_platform(&self, platform: &NewPlatform) -> Result<Platform, ImportError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = Platform {
            id: state.next_id,
            name: platform.name.clone(),
            slug: platform.slug.clone(),
        };
        state.platforms.push(created.clone());
        state.platform_creates.push(platform.clone());
        Ok(created)
    }
}

fn web_1() -> CanonicalVm {
    CanonicalVm {
        id: 101,
        name: "web-1".to_owned(),
        host_node: "pve1".to_owned(),
        power_status: Some("running".to_owned()),
        memory_mb: Some(4096),
        cpu_cores: Some(2),
        cpu_sockets: Some(1),
        vcpu_count: Some(2),
        disk_gb: None,
        os_family_code: Some("l26".to_owned()),
        tags: None,
    }
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn options() -> ImportOptions {
    ImportOptions::default()
}

#[tokio::test]
async fn creates_missing_vm() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default().with_platform(3, "linux");

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            scanned: 1,
            created: 1,
            updated: 0,
            skipped: 0,
        }
    );
    assert_eq!(
        registry.creates(),
        vec![fields(json!({
            "name": "web-1",
            "status": "active",
            "vcpus": 2,
            "memory": 4096,
            "platform": 3,
        }))]
    );
    assert!(registry.updates().is_empty());
}

#[tokio::test]
async fn creates_missing_platform() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default();

    run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(
        registry.platform_creates(),
        vec![NewPlatform {
            name: "linux".to_owned(),
            slug: "linux".to_owned(),
        }]
    );
    assert_eq!(registry.creates()[0]["platform"], json!(1));
}

#[tokio::test]
async fn dry_run_counts_without_writing() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default();
    let options = ImportOptions {
        dry_run: true,
        ..options()
    };

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options)
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert!(registry.creates().is_empty());
    assert!(registry.platform_creates().is_empty());
}

#[tokio::test]
async fn dry_run_may_create_platforms_when_allowed() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default();
    let options = ImportOptions {
        dry_run: true,
        platform_creation: PlatformCreation::Always,
        ..options()
    };

    run_import(&inventory, &registry, &MappingConfig::default(), options)
        .await
        .unwrap();

    assert_eq!(registry.platform_creates().len(), 1);
    assert!(registry.creates().is_empty());
}

#[tokio::test]
async fn dry_run_counts_updates_without_writing() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default()
        .with_platform(3, "linux")
        .with_vm(json!({"id": 5, "name": "web-1", "status": "active", "memory": 1024}));
    let options = ImportOptions {
        dry_run: true,
        ..options()
    };

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options)
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert!(registry.updates().is_empty());
}

#[tokio::test]
async fn updates_only_changed_fields() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default().with_platform(3, "linux").with_vm(json!({
        "id": 5,
        "name": "web-1",
        "status": {"value": "active", "label": "Active"},
        "vcpus": 2.0,
        "memory": 1024,
        "platform": {"id": 3, "name": "linux"},
        "comments": "managed elsewhere",
    }));

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(registry.updates(), vec![(5, fields(json!({"memory": 4096})))]);
}

#[tokio::test]
async fn existing_vm_skipped_when_updates_disabled() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default()
        .with_platform(3, "linux")
        .with_vm(json!({"id": 5, "name": "web-1", "memory": 1}));
    let options = ImportOptions {
        update_existing: false,
        ..options()
    };

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options)
        .await
        .unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            scanned: 1,
            created: 0,
            updated: 0,
            skipped: 1,
        }
    );
    assert!(registry.updates().is_empty());
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let mut db = web_1();
    db.id = 102;
    db.name = "db-1".to_owned();
    db.os_family_code = Some("win11".to_owned());
    db.disk_gb = Some(64);
    let mut bare = web_1();
    bare.id = 103;
    bare.name = "vm-103".to_owned();
    bare.os_family_code = None;
    bare.memory_mb = None;

    let inventory = FakeInventory(vec![web_1(), db, bare]);
    let registry = FakeRegistry::default().with_platform(3, "linux");
    let mapping = MappingConfig::from_raw("active", Some("1"), Some("2")).unwrap();

    let first = run_import(&inventory, &registry, &mapping, options())
        .await
        .unwrap();
    assert_eq!(first.created, 3);

    let second = run_import(&inventory, &registry, &mapping, options())
        .await
        .unwrap();
    assert_eq!(
        second,
        ImportSummary {
            scanned: 3,
            created: 0,
            updated: 0,
            skipped: 3,
        }
    );
    assert!(registry.updates().is_empty());
}

#[tokio::test]
async fn platform_resolved_once_per_run() {
    let mut other = web_1();
    other.id = 102;
    other.name = "web-2".to_owned();

    let inventory = FakeInventory(vec![web_1(), other]);
    let registry = FakeRegistry::default().with_platform(3, "linux");

    run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(registry.state.lock().unwrap().platform_lookups, 1);
}

#[tokio::test]
async fn duplicate_names_use_first_match_by_default() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default()
        .with_platform(3, "linux")
        .with_vm(json!({"id": 5, "name": "web-1", "memory": 1}))
        .with_vm(json!({"id": 6, "name": "web-1", "memory": 2}));

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(registry.updates()[0].0, 5);
}

#[tokio::test]
async fn duplicate_names_fail_when_strict() {
    let inventory = FakeInventory(vec![web_1()]);
    let registry = FakeRegistry::default()
        .with_platform(3, "linux")
        .with_vm(json!({"id": 5, "name": "web-1"}))
        .with_vm(json!({"id": 6, "name": "web-1"}));
    let options = ImportOptions {
        duplicates: DuplicatePolicy::Error,
        ..options()
    };

    let err = run_import(&inventory, &registry, &MappingConfig::default(), options)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Duplicate {
            kind: "virtual machine",
            count: 2,
            ..
        }
    ));
    assert!(registry.updates().is_empty());
}

#[tokio::test]
async fn write_failure_aborts_but_keeps_earlier_writes() {
    let mut second = web_1();
    second.id = 102;
    second.name = "web-2".to_owned();
    let mut third = web_1();
    third.id = 103;
    third.name = "web-3".to_owned();

    let inventory = FakeInventory(vec![web_1(), second, third]);
    let registry = FakeRegistry {
        fail_create: Some("web-2".to_owned()),
        ..FakeRegistry::default()
    }
    .with_platform(3, "linux");

    let err = run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::NetBox(_)));
    let creates = registry.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0]["name"], json!("web-1"));
}

#[tokio::test]
async fn empty_inventory() {
    let inventory = FakeInventory(vec![]);
    let registry = FakeRegistry::default();

    let summary = run_import(&inventory, &registry, &MappingConfig::default(), options())
        .await
        .unwrap();

    assert_eq!(summary, ImportSummary::default());
}
