//! Parent chain resolution for datasheets.
//!
//! A datasheet's root object is populated base first: the parent document
//! (and its parent, recursively) is parsed onto the object before the
//! document's own members. Parents are read straight from their files; they
//! do not have to be loaded as resources.
//!
//! The chain walk keeps an [`AncestorStack`]. Meeting a datasheet that is
//! already on the stack is a cycle: it is logged and recorded, the chain
//! stops growing, and the documents already on the stack are still parsed.

use crate::document::DatasheetDocument;
use crate::object::DatasheetObject;
use crate::reader::DataReader;
use crate::types::DatasheetTypes;
use log::{debug, error, warn};
use std::collections::BTreeSet;
use vellum_core::{LoadContext, ResourceError, ResourceKey};

/// The datasheets currently being walked for one load, root first.
#[derive(Debug, Clone, Default)]
pub struct AncestorStack {
    entries: Vec<(ResourceKey, String)>,
    cycles: Vec<Vec<String>>,
}

impl AncestorStack {
    /// A stack holding the datasheet being loaded.
    pub fn new(key: ResourceKey, id: &str) -> Self {
        Self {
            entries: vec![(key, id.to_string())],
            cycles: Vec::new(),
        }
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == key)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// The id of the document being parsed.
    pub fn current(&self) -> &str {
        self.entries.last().map_or("", |(_, id)| id.as_str())
    }

    /// Every cycle met so far, each as the full path that closed it.
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn into_cycles(self) -> Vec<Vec<String>> {
        self.cycles
    }

    fn push(&mut self, key: ResourceKey, id: &str) {
        self.entries.push((key, id.to_string()));
    }

    fn pop(&mut self) {
        self.entries.pop();
    }

    fn record_cycle(&mut self, closing_id: &str) -> Vec<String> {
        let mut path: Vec<String> = self.entries.iter().map(|(_, id)| id.clone()).collect();
        path.push(closing_id.to_string());
        self.cycles.push(path.clone());
        path
    }
}

/// Parse `document` and its ancestors onto `object`, base first.
///
/// Every ancestor met, including one that closes a cycle, is added to
/// `dependencies`. Returns the key of the document's direct parent.
pub fn resolve_chain(
    ctx: &mut LoadContext<'_>,
    types: &DatasheetTypes,
    type_name: &str,
    document: &DatasheetDocument,
    ancestors: &mut AncestorStack,
    object: &mut dyn DatasheetObject,
    dependencies: &mut BTreeSet<ResourceKey>,
) -> Option<ResourceKey> {
    let parent = match document.parent() {
        Some(parent_id) => {
            resolve_parent(ctx, types, type_name, parent_id, ancestors, object, dependencies)
        }
        None => None,
    };

    let mut reader = DataReader::new(ctx, types, document.root(), dependencies);
    object.parse_members(&mut reader);
    parent
}

fn resolve_parent(
    ctx: &mut LoadContext<'_>,
    types: &DatasheetTypes,
    type_name: &str,
    parent_id: &str,
    ancestors: &mut AncestorStack,
    object: &mut dyn DatasheetObject,
    dependencies: &mut BTreeSet<ResourceKey>,
) -> Option<ResourceKey> {
    let Some(key) = ctx.key_of(parent_id) else {
        warn!("{}: unknown parent datasheet '{parent_id}'", ancestors.current());
        return None;
    };
    dependencies.insert(key);

    let Some(locator) = ctx.locator(key).cloned() else {
        return Some(key);
    };
    if !locator.has_extension(type_name) {
        warn!(
            "{}: parent '{parent_id}' is not a '{type_name}' datasheet",
            ancestors.current()
        );
    }

    if ancestors.contains(key) {
        let path = ancestors.record_cycle(parent_id);
        error!("{}", ResourceError::CycleDetected { path });
        return Some(key);
    }

    match DatasheetDocument::load_file(&locator.path()) {
        Ok(parent_document) => {
            debug!("{}: inheriting from '{parent_id}'", ancestors.current());
            ancestors.push(key, parent_id);
            resolve_chain(
                ctx,
                types,
                type_name,
                &parent_document,
                ancestors,
                object,
                dependencies,
            );
            ancestors.pop();
        }
        Err(e) => warn!(
            "{}: cannot read parent '{parent_id}': {e}",
            ancestors.current()
        ),
    }
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<ResourceKey> {
        let mut arena = SlotMap::<ResourceKey, ()>::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn stack_tracks_the_walk() {
        let keys = keys(3);
        let mut stack = AncestorStack::new(keys[0], "A.unit");
        stack.push(keys[1], "B.unit");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current(), "B.unit");
        assert!(stack.contains(keys[0]));
        assert!(!stack.contains(keys[2]));

        stack.pop();
        assert_eq!(stack.current(), "A.unit");
    }

    #[test]
    fn cycles_record_the_full_path() {
        let keys = keys(3);
        let mut stack = AncestorStack::new(keys[0], "A.unit");
        stack.push(keys[1], "B.unit");
        stack.push(keys[2], "C.unit");

        let path = stack.record_cycle("A.unit");
        assert_eq!(path, vec!["A.unit", "B.unit", "C.unit", "A.unit"]);
        assert_eq!(stack.cycles().len(), 1);
        assert_eq!(
            ResourceError::CycleDetected { path }.to_string(),
            "datasheet ancestors create an infinite loop: A.unit -> B.unit -> C.unit -> A.unit"
        );
    }
}
