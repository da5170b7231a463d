//! Type resolution, factory dispatch and the load path.
//!
//! A record's kind is resolved in three steps: the explicit hint, then the
//! builtin extension table, then the custom factories in registration order
//! (matched by extension). The resolved kind picks a constructor, the fresh
//! resource is bound to its record with [`Resource::init`], parses itself
//! through [`Resource::load_from_file`], and is finally attached to the
//! record and captured into the dependency graph.
//!
//! The first load of a resource never notifies: nothing can depend on it yet.

use crate::config::ResourceConfig;
use crate::error::ResourceError;
use crate::id::ResourceKey;
use crate::kind::ResourceKind;
use crate::locator::FileLocator;
use crate::registry::ResourceManager;
use crate::resource::{Resource, ResourceInfo};
use log::{debug, error, warn};
use std::collections::HashMap;

/// Builds an empty resource of one kind.
pub type ResourceConstructor = Box<dyn Fn() -> Box<dyn Resource>>;

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Constructors per resource kind.
///
/// Builtin kinds map one constructor each. Custom kinds keep their
/// registration order, which decides ties when several custom names match
/// the same file.
#[derive(Default)]
pub struct ResourceFactories {
    builtin: HashMap<ResourceKind, ResourceConstructor>,
    custom: Vec<(String, ResourceConstructor)>,
    custom_index: HashMap<String, usize>,
}

impl std::fmt::Debug for ResourceFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let builtin: Vec<&ResourceKind> = self.builtin.keys().collect();
        let custom: Vec<&str> = self.custom_names().collect();
        f.debug_struct("ResourceFactories")
            .field("builtin", &builtin)
            .field("custom", &custom)
            .finish()
    }
}

impl ResourceFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `kind`. The first registration for a kind
    /// wins; later ones are logged and ignored.
    pub fn register(&mut self, kind: ResourceKind, constructor: ResourceConstructor) -> bool {
        match kind {
            ResourceKind::Custom(name) => {
                if self.custom_index.contains_key(&name) {
                    warn!("custom resource factory '{name}' is already registered, keeping the first");
                    return false;
                }
                self.custom_index.insert(name.clone(), self.custom.len());
                self.custom.push((name, constructor));
                true
            }
            builtin => {
                if self.builtin.contains_key(&builtin) {
                    warn!("a {builtin} factory is already registered, keeping the first");
                    return false;
                }
                self.builtin.insert(builtin, constructor);
                true
            }
        }
    }

    pub fn contains(&self, kind: &ResourceKind) -> bool {
        match kind {
            ResourceKind::Custom(name) => self.custom_index.contains_key(name),
            builtin => self.builtin.contains_key(builtin),
        }
    }

    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.iter().map(|(name, _)| name.as_str())
    }

    /// The kind a locator maps to without a hint: builtin extension table
    /// first, then custom factory names in registration order.
    pub fn infer_kind(&self, locator: &FileLocator) -> Option<ResourceKind> {
        ResourceKind::from_locator(locator).or_else(|| {
            self.custom
                .iter()
                .find(|(name, _)| locator.has_extension(name))
                .map(|(name, _)| ResourceKind::Custom(name.clone()))
        })
    }

    pub fn resolve_kind(
        &self,
        locator: &FileLocator,
        hint: Option<ResourceKind>,
    ) -> Option<ResourceKind> {
        hint.or_else(|| self.infer_kind(locator))
    }

    pub fn instantiate(&self, kind: &ResourceKind) -> Option<Box<dyn Resource>> {
        let constructor = match kind {
            ResourceKind::Custom(name) => {
                let index = *self.custom_index.get(name)?;
                &self.custom.get(index)?.1
            }
            builtin => self.builtin.get(builtin)?,
        };
        Some(constructor())
    }
}

// ---------------------------------------------------------------------------
// LoadContext
// ---------------------------------------------------------------------------

/// Manager access handed to a resource while it parses itself.
///
/// The resource being loaded is detached from its record for the duration of
/// the call, so nested loads may freely reach back into the manager. Asking
/// for a record that is itself still loading returns its key without
/// starting a second load.
pub struct LoadContext<'a> {
    manager: &'a mut ResourceManager,
    key: ResourceKey,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(manager: &'a mut ResourceManager, key: ResourceKey) -> Self {
        Self { manager, key }
    }

    /// The record being loaded.
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn config(&self) -> &ResourceConfig {
        self.manager.config()
    }

    pub fn manager(&self) -> &ResourceManager {
        self.manager
    }

    pub fn key_of(&self, id: &str) -> Option<ResourceKey> {
        self.manager.key_of(id)
    }

    pub fn resource_id(&self, key: ResourceKey) -> Option<&str> {
        self.manager.id_of(key)
    }

    pub fn locator(&self, key: ResourceKey) -> Option<&FileLocator> {
        self.manager.record(key).map(|record| record.locator())
    }

    /// The resolved kind, or the kind the record would resolve to.
    pub fn kind_of(&self, key: ResourceKey) -> Option<ResourceKind> {
        let record = self.manager.record(key)?;
        record
            .kind()
            .cloned()
            .or_else(|| self.manager.factories().infer_kind(record.locator()))
    }

    pub fn is_loading(&self, key: ResourceKey) -> bool {
        self.manager
            .record(key)
            .is_some_and(|record| record.is_loading())
    }

    /// A loaded payload. `None` while the record is still loading.
    pub fn get(&self, key: ResourceKey) -> Option<&dyn Resource> {
        self.manager.resource(key)
    }

    /// Load `id` if needed. Returns its key once it is loaded or while it is
    /// loading further up the call stack.
    pub fn load(&mut self, id: &str) -> Option<ResourceKey> {
        self.manager.load(id, None).ok()
    }
}

// ---------------------------------------------------------------------------
// Load path
// ---------------------------------------------------------------------------

impl ResourceManager {
    /// Load `id`, resolving its type from `hint` or its file extension.
    ///
    /// Loading an already loaded resource returns its key without parsing
    /// again. A failed load leaves the record registered and unloaded.
    pub fn load(&mut self, id: &str, hint: Option<ResourceKind>) -> Result<ResourceKey, ResourceError> {
        let Some(key) = self.key_of(id) else {
            warn!("unknown resource: {id}");
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        self.load_key(key, hint)?;
        Ok(key)
    }

    pub(crate) fn load_key(
        &mut self,
        key: ResourceKey,
        hint: Option<ResourceKind>,
    ) -> Result<(), ResourceError> {
        let Some(record) = self.records.get_mut(key) else {
            return Err(ResourceError::UnknownId(format!("{key:?}")));
        };
        if record.payload.is_some() || record.loading {
            return Ok(());
        }
        let id = record.id.clone();
        let locator = record.locator.clone();

        let kind = self.factories.resolve_kind(&locator, hint);
        let Some(mut resource) = kind.as_ref().and_then(|kind| self.factories.instantiate(kind))
        else {
            error!("could not resolve a resource type for '{id}' ({locator})");
            return Err(ResourceError::UnresolvedType { id });
        };

        record.loading = true;
        resource.init(&ResourceInfo {
            key,
            id: id.clone(),
            locator: locator.clone(),
        });
        let result = {
            let mut ctx = LoadContext::new(self, key);
            resource.load_from_file(&mut ctx, &locator)
        };

        let Some(record) = self.records.get_mut(key) else {
            return Err(ResourceError::UnknownId(id));
        };
        record.loading = false;
        if let Err(e) = result {
            error!("{e}");
            return Err(e);
        }
        record.kind = Some(resource.kind());
        record.payload = Some(resource);
        debug!("loaded '{id}'");

        self.track(key);
        Ok(())
    }

    /// Link a freshly attached payload into the dependency graph.
    pub(crate) fn track(&mut self, key: ResourceKey) {
        if !self.config.track_dependencies {
            return;
        }
        if let Err(e) = self.graph.register_tracking(key) {
            warn!("{e}");
        }
        let changed = self.graph.capture_dependencies(key, &self.records);
        if !changed.is_empty() {
            debug!("captured dependencies of {} resources", changed.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubResource;

    fn stub() -> ResourceConstructor {
        StubResource::constructor()
    }

    #[test]
    fn first_custom_registration_wins() {
        let mut factories = ResourceFactories::new();
        assert!(factories.register(ResourceKind::Custom("stub".into()), stub()));
        assert!(!factories.register(ResourceKind::Custom("stub".into()), stub()));
        assert_eq!(factories.custom_names().collect::<Vec<_>>(), vec!["stub"]);
    }

    #[test]
    fn builtin_table_wins_over_custom_names() {
        let mut factories = ResourceFactories::new();
        factories.register(ResourceKind::Custom("png".into()), stub());
        let kind = factories.infer_kind(&FileLocator::new("hero.png"));
        assert_eq!(kind, Some(ResourceKind::Texture));
    }

    #[test]
    fn custom_names_match_in_registration_order() {
        let mut factories = ResourceFactories::new();
        factories.register(ResourceKind::Custom("unit".into()), stub());
        factories.register(ResourceKind::Custom("boss.unit".into()), stub());
        let kind = factories.infer_kind(&FileLocator::new("orc.boss.unit"));
        assert_eq!(kind, Some(ResourceKind::Custom("unit".into())));
    }

    #[test]
    fn hint_takes_precedence() {
        let factories = ResourceFactories::new();
        let kind = factories.resolve_kind(&FileLocator::new("hero.png"), Some(ResourceKind::Font));
        assert_eq!(kind, Some(ResourceKind::Font));
    }

    #[test]
    fn instantiate_requires_a_factory() {
        let mut factories = ResourceFactories::new();
        assert!(factories.instantiate(&ResourceKind::Texture).is_none());
        factories.register(ResourceKind::Custom("stub".into()), stub());
        let resource = factories
            .instantiate(&ResourceKind::Custom("stub".into()))
            .unwrap();
        assert_eq!(resource.kind(), ResourceKind::Custom("stub".into()));
    }
}
