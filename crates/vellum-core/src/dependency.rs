//! Dependency and referencer bookkeeping between loaded resources.
//!
//! Every tracked resource owns a [`DependencyRecord`] holding the set of
//! resources it reads from, the inverse set of resources that read from it,
//! and the listeners registered against it. After every mutation the two
//! edge sets mirror each other:
//!
//! `R ∈ S.referencers ⟺ S ∈ R.dependencies`
//!
//! The graph never owns resources. It asks a [`DependencyHost`] for declared
//! dependency sets and forwards dependency hooks to it, which lets the
//! manager's record arena and a plain map in tests drive the same code.
//!
//! # Notification order
//!
//! [`DependencyGraph::notify_updated`] and [`DependencyGraph::notify_removed`]
//! work on a snapshot of the referencer set and run in two phases: first
//! every referencer's hook, then every referencer's listeners, and last the
//! listeners of the resource that changed. Notifications are not transitive;
//! a referencer of a referencer hears about the change only once its own
//! dependency is notified.

use crate::error::DependencyError;
use crate::event::{ListenerEntry, ResourceEvent, ResourceEventKind, ResourceListener};
use crate::id::{ListenerHandle, ResourceKey};
use slotmap::SecondaryMap;
use std::collections::{BTreeSet, VecDeque};

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// The side of the graph that owns resources.
pub trait DependencyHost {
    /// The dependency set `key` currently declares, or `None` if it has no
    /// loaded payload.
    fn declared_dependencies(&self, key: ResourceKey) -> Option<BTreeSet<ResourceKey>>;

    fn on_dependency_updated(&mut self, referencer: ResourceKey, dependency: ResourceKey);

    fn on_dependency_removed(&mut self, referencer: ResourceKey, dependency: ResourceKey);
}

// ---------------------------------------------------------------------------
// DependencyRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DependencyRecord {
    dependencies: BTreeSet<ResourceKey>,
    referencers: BTreeSet<ResourceKey>,
    listeners: Vec<ListenerEntry>,
}

impl DependencyRecord {
    pub fn dependencies(&self) -> &BTreeSet<ResourceKey> {
        &self.dependencies
    }

    pub fn referencers(&self) -> &BTreeSet<ResourceKey> {
        &self.referencers
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listener_handles(&self) -> impl Iterator<Item = ListenerHandle> + '_ {
        self.listeners.iter().map(|entry| entry.handle)
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DependencyGraph {
    records: SecondaryMap<ResourceKey, DependencyRecord>,
    /// Declared dependencies that were not tracked yet when captured, keyed
    /// by the dependency. Linked when the dependency is captured itself.
    waiting: SecondaryMap<ResourceKey, BTreeSet<ResourceKey>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Tracking --

    /// Create an empty record for `key`.
    pub fn register_tracking(&mut self, key: ResourceKey) -> Result<(), DependencyError> {
        if self.records.contains_key(key) {
            return Err(DependencyError::AlreadyTracked(key));
        }
        self.records.insert(key, DependencyRecord::default());
        Ok(())
    }

    /// Sever every edge touching `key` and drop its record and listeners.
    pub fn unregister_tracking(&mut self, key: ResourceKey) -> Result<(), DependencyError> {
        let record = self
            .records
            .remove(key)
            .ok_or(DependencyError::Untracked(key))?;

        for dependency in &record.dependencies {
            if let Some(dep_record) = self.records.get_mut(*dependency) {
                dep_record.referencers.remove(&key);
            }
        }
        for referencer in &record.referencers {
            if let Some(ref_record) = self.records.get_mut(*referencer) {
                ref_record.dependencies.remove(&key);
            }
        }
        self.forget(key);
        Ok(())
    }

    /// Drop every pending link that involves `key`.
    pub fn forget(&mut self, key: ResourceKey) {
        self.waiting.remove(key);
        for (_, referencers) in self.waiting.iter_mut() {
            referencers.remove(&key);
        }
        self.waiting.retain(|_, referencers| !referencers.is_empty());
    }

    /// Re-read the declared dependencies of `key` and update both edge sets.
    ///
    /// When a resource's set changes, its referencers are re-evaluated too.
    /// The walk visits each resource at most once, so it terminates on cyclic
    /// graphs. Referencers that declared `key` before it was tracked are
    /// linked here. Returns the resources whose dependency set changed, in
    /// visit order.
    pub fn capture_dependencies(
        &mut self,
        key: ResourceKey,
        host: &impl DependencyHost,
    ) -> Vec<ResourceKey> {
        let mut changed = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([key]);
        if let Some(pending) = self.waiting.remove(key) {
            queue.extend(pending);
        }

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) || !self.records.contains_key(current) {
                continue;
            }
            let Some(declared) = host.declared_dependencies(current) else {
                continue;
            };

            for (_, referencers) in self.waiting.iter_mut() {
                referencers.remove(&current);
            }
            let mut next = BTreeSet::new();
            for dependency in declared {
                if dependency == current {
                    continue;
                }
                if self.records.contains_key(dependency) {
                    next.insert(dependency);
                } else if let Some(entry) = self.waiting.entry(dependency) {
                    entry.or_default().insert(current);
                }
            }
            self.waiting.retain(|_, referencers| !referencers.is_empty());

            let Some(record) = self.records.get_mut(current) else {
                continue;
            };
            if record.dependencies == next {
                continue;
            }
            let previous = std::mem::replace(&mut record.dependencies, next);
            let referencers: Vec<ResourceKey> = record.referencers.iter().copied().collect();
            let current_deps = record.dependencies.clone();

            for removed in previous.difference(&current_deps) {
                if let Some(dep_record) = self.records.get_mut(*removed) {
                    dep_record.referencers.remove(&current);
                }
            }
            for added in current_deps.difference(&previous) {
                if let Some(dep_record) = self.records.get_mut(*added) {
                    dep_record.referencers.insert(current);
                }
            }

            changed.push(current);
            queue.extend(referencers.into_iter().filter(|r| !visited.contains(r)));
        }
        changed
    }

    // -- Notifications --

    /// Tell referencers, then their listeners, then `key`'s own listeners
    /// that `key` changed.
    pub fn notify_updated(&mut self, key: ResourceKey, host: &mut impl DependencyHost) {
        let Some(record) = self.records.get(key) else {
            return;
        };
        let referencers: Vec<ResourceKey> = record.referencers.iter().copied().collect();

        for &referencer in &referencers {
            host.on_dependency_updated(referencer, key);
        }
        for &referencer in &referencers {
            self.fire(
                referencer,
                ResourceEvent::of_dependency(referencer, ResourceEventKind::DependencyUpdated, key),
            );
        }
        self.fire(key, ResourceEvent::own(key, ResourceEventKind::ResourceUpdated));
    }

    /// Same shape as [`notify_updated`](Self::notify_updated) with removal
    /// events. Must run before [`unregister_tracking`](Self::unregister_tracking)
    /// so observers still see the edges.
    ///
    /// Referencers still waiting for `key` to become tracked hear about the
    /// removal too, even when `key` itself was never tracked.
    pub fn notify_removed(&mut self, key: ResourceKey, host: &mut impl DependencyHost) {
        let mut referencers: Vec<ResourceKey> = self
            .records
            .get(key)
            .map(|record| record.referencers.iter().copied().collect())
            .unwrap_or_default();
        if let Some(waiting) = self.waiting.get(key) {
            let pending: Vec<ResourceKey> = waiting
                .iter()
                .copied()
                .filter(|r| !referencers.contains(r))
                .collect();
            referencers.extend(pending);
        }
        if referencers.is_empty() && !self.records.contains_key(key) {
            return;
        }

        for &referencer in &referencers {
            host.on_dependency_removed(referencer, key);
        }
        for &referencer in &referencers {
            self.fire(
                referencer,
                ResourceEvent::of_dependency(referencer, ResourceEventKind::DependencyRemoved, key),
            );
        }
        self.fire(key, ResourceEvent::own(key, ResourceEventKind::ResourceRemoved));
    }

    fn fire(&mut self, key: ResourceKey, event: ResourceEvent) {
        if let Some(record) = self.records.get_mut(key) {
            for entry in record.listeners.iter_mut() {
                (entry.callback)(&event);
            }
        }
    }

    // -- Listeners --

    pub fn register_listener(
        &mut self,
        key: ResourceKey,
        handle: ListenerHandle,
        callback: ResourceListener,
    ) -> Result<(), DependencyError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or(DependencyError::Untracked(key))?;
        record.listeners.push(ListenerEntry { handle, callback });
        Ok(())
    }

    /// Remove every listener on `key` registered under `handle`. Returns how
    /// many were removed.
    pub fn unregister_listener(&mut self, key: ResourceKey, handle: ListenerHandle) -> usize {
        let Some(record) = self.records.get_mut(key) else {
            return 0;
        };
        let before = record.listeners.len();
        record.listeners.retain(|entry| entry.handle != handle);
        before - record.listeners.len()
    }

    /// Remove every listener registered under `handle`, on every resource.
    pub fn unregister_all_listeners(&mut self, handle: ListenerHandle) -> usize {
        let mut removed = 0;
        for (_, record) in self.records.iter_mut() {
            let before = record.listeners.len();
            record.listeners.retain(|entry| entry.handle != handle);
            removed += before - record.listeners.len();
        }
        removed
    }

    // -- Introspection --

    pub fn is_tracked(&self, key: ResourceKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn record(&self, key: ResourceKey) -> Option<&DependencyRecord> {
        self.records.get(key)
    }

    pub fn dependencies(&self, key: ResourceKey) -> Option<&BTreeSet<ResourceKey>> {
        self.records.get(key).map(|record| &record.dependencies)
    }

    pub fn referencers(&self, key: ResourceKey) -> Option<&BTreeSet<ResourceKey>> {
        self.records.get(key).map(|record| &record.referencers)
    }

    pub fn listener_count(&self, key: ResourceKey) -> usize {
        self.records
            .get(key)
            .map_or(0, |record| record.listeners.len())
    }

    /// Referencers waiting for `dependency` to become tracked.
    pub fn waiting_on(&self, dependency: ResourceKey) -> Option<&BTreeSet<ResourceKey>> {
        self.waiting.get(dependency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKey, &DependencyRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the edge symmetry invariant and that no edge points at an
    /// untracked resource.
    pub fn is_consistent(&self) -> bool {
        self.records.iter().all(|(key, record)| {
            record.dependencies.iter().all(|dep| {
                self.records
                    .get(*dep)
                    .is_some_and(|other| other.referencers.contains(&key))
            }) && record.referencers.iter().all(|referencer| {
                self.records
                    .get(*referencer)
                    .is_some_and(|other| other.dependencies.contains(&key))
            })
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
