//! Manager-level graph properties over random stub dependency graphs.
//!
//! Each case writes stub files whose contents name other stubs (cycles and
//! self references included), loads them in a random order, then removes a
//! random subset. The graph must stay symmetric throughout.

use proptest::prelude::*;
use vellum_core::test_utils::{cleanup, make_test_dir, stub_manager, write_file};

const POOL: usize = 5;

fn stub_id(index: usize) -> String {
    format!("S{index}.stub")
}

fn arb_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    proptest::collection::vec(proptest::collection::vec(0..POOL, 0..4), POOL)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn loads_and_removals_keep_edges_symmetric(
        graph in arb_graph(),
        load_order in proptest::collection::vec(0..POOL, 1..8),
        removals in proptest::collection::vec(0..POOL, 0..4),
    ) {
        let dir = make_test_dir("it_graph_props");
        for (index, deps) in graph.iter().enumerate() {
            let content: Vec<String> = deps.iter().map(|d| stub_id(*d)).collect();
            write_file(&dir, &stub_id(index), &content.join("\n"));
        }
        let mut manager = stub_manager(&dir);

        for index in &load_order {
            prop_assert!(manager.load(&stub_id(*index), None).is_ok());
            prop_assert!(manager.dependency_graph().is_consistent());
        }

        // Every loaded stub loaded everything it names.
        for index in &load_order {
            for dep in &graph[*index] {
                prop_assert!(manager.is_loaded(&stub_id(*dep)));
            }
        }

        for index in &removals {
            let _ = manager.remove_resource(&stub_id(*index), true);
            prop_assert!(manager.dependency_graph().is_consistent());
            for (_, record) in manager.dependency_graph().iter() {
                for dep in record.dependencies() {
                    prop_assert!(manager.record(*dep).is_some());
                }
            }
        }

        cleanup(&dir);
    }
}
