use exemap_core::model::intervals_overlap;
use exemap_core::store::ProjectStore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddSection { start: u64, len: u64 },
    UpdateSection { pick: usize, start: u64, len: u64 },
    DeleteSection { pick: usize },
    AddRange { module: usize, pick: usize, offset: u64, len: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..0x100, 1u64..0x20).prop_map(|(start, len)| Op::AddSection { start, len }),
        (0usize..8, 0u64..0x100, 1u64..0x20)
            .prop_map(|(pick, start, len)| Op::UpdateSection { pick, start, len }),
        (0usize..8).prop_map(|pick| Op::DeleteSection { pick }),
        (0usize..3, 0usize..8, 0u64..0x10, 1u64..0x10)
            .prop_map(|(module, pick, offset, len)| Op::AddRange { module, pick, offset, len }),
    ]
}

fn apply(store: &mut ProjectStore, modules: &[u32], op: &Op) {
    let ids: Vec<u32> = store.project().sections.keys().copied().collect();
    // Rejections are expected; only the resulting state matters.
    match *op {
        Op::AddSection { start, len } => {
            let _ = store.add_section(&format!("s{start:x}"), start, start + len, false);
        }
        Op::UpdateSection { pick, start, len } => {
            if let Some(&id) = ids.get(pick % ids.len().max(1)) {
                let _ = store.update_section(id, &format!("u{start:x}"), start, start + len);
            }
        }
        Op::DeleteSection { pick } => {
            if let Some(&id) = ids.get(pick % ids.len().max(1)) {
                let _ = store.delete_section(id);
            }
        }
        Op::AddRange { module, pick, offset, len } => {
            if let Some(&id) = ids.get(pick % ids.len().max(1)) {
                let start = store.section(id).map(|s| s.start).unwrap_or(0) + offset;
                let _ = store.set_module_range(modules[module], id, start, start + len, false);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn sections_never_overlap(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut store = ProjectStore::new();
        let modules: Vec<u32> =
            ["A", "B", "C"].iter().map(|n| store.add_module(n).unwrap()).collect();
        for op in &ops {
            apply(&mut store, &modules, op);
        }

        let sections: Vec<_> = store.project().sections.values().collect();
        for (i, a) in sections.iter().enumerate() {
            prop_assert!(a.start < a.end);
            for b in &sections[i + 1..] {
                prop_assert!(!intervals_overlap(a.start, a.end, b.start, b.end));
            }
        }
        for module in store.project().modules.values() {
            for range in &module.ranges {
                let section = store.section(range.section_id);
                prop_assert!(section.is_ok());
                let section = section.unwrap();
                prop_assert!(section.start <= range.start && range.end <= section.end);
            }
        }
    }

    #[test]
    fn json_round_trip_is_lossless(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut store = ProjectStore::new();
        let modules: Vec<u32> =
            ["A", "B", "C"].iter().map(|n| store.add_module(n).unwrap()).collect();
        for op in &ops {
            apply(&mut store, &modules, op);
        }

        let restored = ProjectStore::from_json(&store.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.project(), store.project());
    }

    #[test]
    fn coverage_segments_tile_the_executable_range(
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let mut store = ProjectStore::new();
        let modules: Vec<u32> =
            ["A", "B", "C"].iter().map(|n| store.add_module(n).unwrap()).collect();
        store.set_executable_range(0, 0x120).unwrap();
        for op in &ops {
            apply(&mut store, &modules, op);
        }

        let segments = store.coverage_map();
        prop_assert_eq!(segments.first().map(|s| s.start), Some(0));
        prop_assert_eq!(segments.last().map(|s| s.end), Some(0x120));
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }
}
