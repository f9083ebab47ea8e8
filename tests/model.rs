use std::collections::BTreeMap;

use proptest::prelude::*;

use vart::keys::fixed_key::FixedKey;
use vart::{KeyHash, VartTree};

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u16),
    Remove(u16),
    Get(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u16>(), any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        any::<u16>().prop_map(Op::Remove),
        any::<u16>().prop_map(Op::Get),
    ]
}

proptest! {
    #[test]
    fn tree_matches_btreemap_model(ops in proptest::collection::vec(op_strategy(), 0..600)) {
        let mut tree: VartTree<FixedKey, u16> = VartTree::new();
        let mut model: BTreeMap<u16, u16> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(tree.insert(k, v), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(tree.remove(k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(tree.get(k), model.get(&k));
                }
            }
            prop_assert_eq!(tree.len(), model.len());
        }

        let got: Vec<(u16, u16)> = tree
            .iter()
            .map(|(k, v)| (k.bits(0, 16) as u16, *v))
            .collect();
        let expect: Vec<(u16, u16)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expect);
    }

    #[test]
    fn lower_bound_matches_model(
        keys in proptest::collection::btree_set(any::<u32>(), 0..300),
        probes in proptest::collection::vec(any::<u32>(), 0..50),
    ) {
        let mut tree: VartTree<FixedKey, u32> = VartTree::new();
        for k in &keys {
            tree.insert(*k, *k);
        }
        for p in probes {
            let expect = keys.range(p..).next().copied();
            let key: FixedKey = p.into();
            let got = tree.lower_bound(&key).next().map(|(_, v)| *v);
            prop_assert_eq!(got, expect);
        }
    }
}
