//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so downstream
//! crates can enable them through the `test-utils` feature.

use crate::config::ResourceConfig;
use crate::error::ResourceError;
use crate::event::{ResourceEvent, ResourceListener};
use crate::id::ResourceKey;
use crate::kind::ResourceKind;
use crate::loader::{LoadContext, ResourceConstructor};
use crate::locator::FileLocator;
use crate::registry::ResourceManager;
use crate::resource::{Resource, ResourceInfo};
use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ===========================================================================
// StubResource
// ===========================================================================

pub const STUB_KIND: &str = "stub";

/// A resource whose file lists the ids it depends on, one per line.
///
/// Each listed id is loaded through the [`LoadContext`] while the stub
/// parses, so stubs can build arbitrary dependency graphs on disk. Hook
/// calls are recorded for inspection.
#[derive(Debug, Default)]
pub struct StubResource {
    info: Option<ResourceInfo>,
    dependencies: BTreeMap<ResourceKey, String>,
    updated: Vec<ResourceKey>,
    removed: Vec<ResourceKey>,
    load_count: usize,
}

impl StubResource {
    pub fn constructor() -> ResourceConstructor {
        Box::new(|| Box::new(StubResource::default()) as Box<dyn Resource>)
    }

    pub fn info(&self) -> Option<&ResourceInfo> {
        self.info.as_ref()
    }

    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn updated(&self) -> &[ResourceKey] {
        &self.updated
    }

    pub fn removed(&self) -> &[ResourceKey] {
        &self.removed
    }

    pub fn dependency_ids(&self) -> Vec<&str> {
        self.dependencies.values().map(String::as_str).collect()
    }

    pub fn add_dependency(&mut self, id: &str, key: ResourceKey) {
        self.dependencies.insert(key, id.to_string());
    }

    pub fn remove_dependency(&mut self, key: ResourceKey) {
        self.dependencies.remove(&key);
    }
}

impl Resource for StubResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Custom(STUB_KIND.to_string())
    }

    fn init(&mut self, info: &ResourceInfo) {
        self.info = Some(info.clone());
    }

    fn load_from_file(
        &mut self,
        ctx: &mut LoadContext<'_>,
        locator: &FileLocator,
    ) -> Result<(), ResourceError> {
        let content =
            std::fs::read_to_string(locator.path()).map_err(|e| ResourceError::Load {
                id: locator.file_name().to_string(),
                detail: e.to_string(),
            })?;
        self.load_count += 1;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(key) = ctx.load(line) {
                self.dependencies.insert(key, line.to_string());
            }
        }
        Ok(())
    }

    fn save_to_file(&self, locator: &FileLocator) -> Result<(), ResourceError> {
        let content = self.dependency_ids().join("\n");
        std::fs::write(locator.path(), content).map_err(|e| ResourceError::Save {
            id: locator.file_name().to_string(),
            detail: e.to_string(),
        })
    }

    fn dependencies(&self) -> BTreeSet<ResourceKey> {
        self.dependencies.keys().copied().collect()
    }

    fn on_dependency_updated(&mut self, dependency: ResourceKey) {
        self.updated.push(dependency);
    }

    fn on_dependency_removed(&mut self, dependency: ResourceKey) {
        self.removed.push(dependency);
        self.dependencies.remove(&dependency);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// EventRecorder
// ===========================================================================

/// Collects every event delivered to the listeners it hands out.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<ResourceEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> ResourceListener {
        let events = self.events.clone();
        Box::new(move |event: &ResourceEvent| events.borrow_mut().push(*event))
    }

    pub fn events(&self) -> Vec<ResourceEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

// ===========================================================================
// Temp directories
// ===========================================================================

/// A fresh, empty directory under the system temp dir, unique per test and
/// process.
pub fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vellum_test_{suffix}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("failed to create test dir");
    dir
}

pub fn cleanup(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}

/// Write `contents` to `relative` under `dir`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

// ===========================================================================
// Managers
// ===========================================================================

/// A manager rooted at `dir` with the stub factory registered and every file
/// under `dir` registered.
pub fn stub_manager(dir: &Path) -> ResourceManager {
    let mut manager = ResourceManager::new(ResourceConfig::with_root(dir));
    manager.register_factory(
        ResourceKind::Custom(STUB_KIND.to_string()),
        StubResource::constructor(),
    );
    manager
        .parse_directory(dir)
        .expect("failed to scan test dir");
    manager
}
