//! Property tests: the tree agrees with an in-memory ordered map under
//! random insert/update workloads.

use std::collections::BTreeMap;

use blocktree::{BPlusTree, Error};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tempfile::tempdir;

fn key_desc_pairs() -> impl Strategy<Value = Vec<(u64, String)>> {
    proptest::collection::vec((1u64..5_000, "[a-z]{0,20}"), 1..400)
}

/// Drive `pairs` into a fresh tree, mirroring successful inserts into a
/// model map. Duplicate keys must be rejected and leave the model state.
fn build(
    tree: &mut BPlusTree,
    pairs: &[(u64, String)],
) -> Result<BTreeMap<u64, String>, TestCaseError> {
    let mut model = BTreeMap::new();
    for (key, desc) in pairs {
        match tree.insert(*key, desc) {
            Ok(()) => {
                prop_assert!(!model.contains_key(key));
                model.insert(*key, desc.clone());
            }
            Err(Error::DuplicateKey(k)) => {
                prop_assert_eq!(k, *key);
                prop_assert!(model.contains_key(key));
            }
            Err(e) => return Err(TestCaseError::fail(format!("insert failed: {e}"))),
        }
    }
    Ok(model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_lookup_matches_model(pairs in key_desc_pairs()) {
        let dir = tempdir().unwrap();
        let mut tree = BPlusTree::open_with_pool(dir.path().join("t.db"), 32).unwrap();

        let model = build(&mut tree, &pairs)?;

        for (key, desc) in &model {
            let record = tree.lookup(*key).unwrap();
            prop_assert_eq!(record.key, *key);
            prop_assert_eq!(&record.desc, desc);
        }

        // Keys that were never inserted miss.
        for key in (1..5_000u64).step_by(379) {
            if !model.contains_key(&key) {
                prop_assert!(matches!(tree.lookup(key), Err(Error::KeyNotFound(_))));
            }
        }
    }

    #[test]
    fn prop_scan_is_the_sorted_key_set(pairs in key_desc_pairs()) {
        let dir = tempdir().unwrap();
        let mut tree = BPlusTree::open_with_pool(dir.path().join("t.db"), 32).unwrap();

        let model = build(&mut tree, &pairs)?;

        let keys = tree.scan().unwrap();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(keys, model.keys().copied().collect::<Vec<_>>());
    }

    #[test]
    fn prop_update_wins_over_insert(pairs in key_desc_pairs(), suffix in "[a-z]{1,8}") {
        let dir = tempdir().unwrap();
        let mut tree = BPlusTree::open_with_pool(dir.path().join("t.db"), 32).unwrap();

        let mut model = build(&mut tree, &pairs)?;

        // Rewrite every third key; the last write must win.
        let rewrites: Vec<u64> = model.keys().copied().step_by(3).collect();
        for key in rewrites {
            let desc = format!("updated {suffix}");
            tree.update(key, &desc).unwrap();
            model.insert(key, desc);
        }

        for (key, desc) in &model {
            prop_assert_eq!(&tree.lookup(*key).unwrap().desc, desc);
        }
    }

    #[test]
    fn prop_reinsert_is_a_rejected_duplicate(pairs in key_desc_pairs()) {
        let dir = tempdir().unwrap();
        let mut tree = BPlusTree::open_with_pool(dir.path().join("t.db"), 32).unwrap();

        let model = build(&mut tree, &pairs)?;
        let before = tree.scan().unwrap();

        for key in model.keys() {
            prop_assert!(matches!(
                tree.insert(*key, "shadow"),
                Err(Error::DuplicateKey(_))
            ));
        }

        // Nothing moved and no description changed.
        prop_assert_eq!(tree.scan().unwrap(), before);
        for (key, desc) in &model {
            prop_assert_eq!(&tree.lookup(*key).unwrap().desc, desc);
        }
    }

    #[test]
    fn prop_survives_close_and_restore(pairs in key_desc_pairs()) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        let (model, snapshot) = {
            let mut tree = BPlusTree::open_with_pool(&path, 32).unwrap();
            let model = build(&mut tree, &pairs)?;
            (model, tree.close().unwrap())
        };

        let mut tree = BPlusTree::restore(&path, snapshot).unwrap();
        for (key, desc) in &model {
            prop_assert_eq!(&tree.lookup(*key).unwrap().desc, desc);
        }
        prop_assert_eq!(
            tree.scan().unwrap(),
            model.keys().copied().collect::<Vec<_>>()
        );
    }
}
