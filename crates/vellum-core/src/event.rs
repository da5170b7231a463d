//! Resource change notifications.
//!
//! Listeners are registered per resource under a [`ListenerHandle`] and are
//! invoked synchronously while the dependency graph fans a change out:
//!
//! - **Own events**: `ResourceUpdated` / `ResourceRemoved`, delivered to the
//!   listeners of the resource that changed, after every referencer has been
//!   told.
//! - **Dependency events**: `DependencyUpdated` / `DependencyRemoved`,
//!   delivered to the listeners of each direct referencer, carrying the key
//!   of the dependency that changed.

use crate::id::{ListenerHandle, ResourceKey};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEventKind {
    ResourceUpdated,
    ResourceRemoved,
    DependencyUpdated,
    DependencyRemoved,
}

impl ResourceEventKind {
    pub fn is_dependency_event(self) -> bool {
        matches!(
            self,
            ResourceEventKind::DependencyUpdated | ResourceEventKind::DependencyRemoved
        )
    }
}

/// A notification delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEvent {
    /// The resource whose listeners are being invoked.
    pub resource: ResourceKey,
    pub kind: ResourceEventKind,
    /// For dependency events, the dependency that changed.
    pub dependency: Option<ResourceKey>,
}

impl ResourceEvent {
    pub fn own(resource: ResourceKey, kind: ResourceEventKind) -> Self {
        Self {
            resource,
            kind,
            dependency: None,
        }
    }

    pub fn of_dependency(
        resource: ResourceKey,
        kind: ResourceEventKind,
        dependency: ResourceKey,
    ) -> Self {
        Self {
            resource,
            kind,
            dependency: Some(dependency),
        }
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Callback invoked for every event on the resource it is registered to.
pub type ResourceListener = Box<dyn FnMut(&ResourceEvent)>;

pub(crate) struct ListenerEntry {
    pub handle: ListenerHandle,
    pub callback: ResourceListener,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
