//! Property-based tests for the dependency graph.
//!
//! Random sequences of tracking, declaration and capture operations must
//! keep the dependency and referencer sets mirrored at every step.

use proptest::prelude::*;
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use vellum_core::dependency::{DependencyGraph, DependencyHost};
use vellum_core::id::ResourceKey;

const POOL: usize = 6;

// ===========================================================================
// Host
// ===========================================================================

#[derive(Default)]
struct MapHost {
    declared: HashMap<ResourceKey, BTreeSet<ResourceKey>>,
}

impl DependencyHost for MapHost {
    fn declared_dependencies(&self, key: ResourceKey) -> Option<BTreeSet<ResourceKey>> {
        self.declared.get(&key).cloned()
    }

    fn on_dependency_updated(&mut self, _referencer: ResourceKey, _dependency: ResourceKey) {}

    fn on_dependency_removed(&mut self, referencer: ResourceKey, dependency: ResourceKey) {
        if let Some(set) = self.declared.get_mut(&referencer) {
            set.remove(&dependency);
        }
    }
}

type Snapshot = BTreeMap<ResourceKey, (BTreeSet<ResourceKey>, BTreeSet<ResourceKey>)>;

fn snapshot(graph: &DependencyGraph) -> Snapshot {
    graph
        .iter()
        .map(|(key, record)| {
            (
                key,
                (record.dependencies().clone(), record.referencers().clone()),
            )
        })
        .collect()
}

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum GraphOp {
    Track(usize),
    Untrack(usize),
    Declare(usize, Vec<usize>),
    Capture(usize),
    RemoveWithNotify(usize),
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<GraphOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..POOL).prop_map(GraphOp::Track),
            (0..POOL).prop_map(GraphOp::Untrack),
            (0..POOL, proptest::collection::vec(0..POOL, 0..4))
                .prop_map(|(a, deps)| GraphOp::Declare(a, deps)),
            (0..POOL).prop_map(GraphOp::Capture),
            (0..POOL).prop_map(GraphOp::RemoveWithNotify),
        ],
        1..=max_ops,
    )
}

fn apply(
    graph: &mut DependencyGraph,
    host: &mut MapHost,
    keys: &[ResourceKey],
    op: &GraphOp,
) {
    match op {
        GraphOp::Track(i) => {
            if graph.register_tracking(keys[*i]).is_ok() {
                host.declared.entry(keys[*i]).or_default();
                graph.capture_dependencies(keys[*i], &*host);
            }
        }
        GraphOp::Untrack(i) => {
            let _ = graph.unregister_tracking(keys[*i]);
        }
        GraphOp::Declare(i, deps) => {
            host.declared
                .insert(keys[*i], deps.iter().map(|d| keys[*d]).collect());
        }
        GraphOp::Capture(i) => {
            graph.capture_dependencies(keys[*i], &*host);
        }
        GraphOp::RemoveWithNotify(i) => {
            graph.notify_removed(keys[*i], host);
            let _ = graph.unregister_tracking(keys[*i]);
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every mutation keeps `R ∈ S.referencers ⟺ S ∈ R.dependencies`.
    #[test]
    fn symmetry_holds_after_every_operation(ops in arb_ops(40)) {
        let mut arena = SlotMap::<ResourceKey, ()>::with_key();
        let keys: Vec<ResourceKey> = (0..POOL).map(|_| arena.insert(())).collect();
        let mut graph = DependencyGraph::new();
        let mut host = MapHost::default();

        for op in &ops {
            apply(&mut graph, &mut host, &keys, op);
            prop_assert!(graph.is_consistent(), "inconsistent after {:?}", op);
        }
    }

    /// Tracked edges never point at untracked resources or at themselves.
    #[test]
    fn edges_only_join_tracked_resources(ops in arb_ops(40)) {
        let mut arena = SlotMap::<ResourceKey, ()>::with_key();
        let keys: Vec<ResourceKey> = (0..POOL).map(|_| arena.insert(())).collect();
        let mut graph = DependencyGraph::new();
        let mut host = MapHost::default();

        for op in &ops {
            apply(&mut graph, &mut host, &keys, op);
        }
        for (key, record) in graph.iter() {
            prop_assert!(!record.dependencies().contains(&key));
            for dep in record.dependencies() {
                prop_assert!(graph.is_tracked(*dep));
            }
        }
    }

    /// Tracking and untracking a fresh resource restores the graph.
    #[test]
    fn register_unregister_round_trip(
        ops in arb_ops(30),
        fresh_deps in proptest::collection::vec(0..POOL, 0..4),
    ) {
        let mut arena = SlotMap::<ResourceKey, ()>::with_key();
        let keys: Vec<ResourceKey> = (0..POOL).map(|_| arena.insert(())).collect();
        let fresh = arena.insert(());
        let mut graph = DependencyGraph::new();
        let mut host = MapHost::default();
        for op in &ops {
            apply(&mut graph, &mut host, &keys, op);
        }
        let before = snapshot(&graph);

        graph.register_tracking(fresh).unwrap();
        host.declared.insert(fresh, fresh_deps.iter().map(|d| keys[*d]).collect());
        graph.capture_dependencies(fresh, &host);
        prop_assert!(graph.is_consistent());
        graph.unregister_tracking(fresh).unwrap();

        prop_assert_eq!(snapshot(&graph), before);
        prop_assert!(graph.is_consistent());
    }
}
