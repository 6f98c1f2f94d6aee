// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Tree: ordered-map behaviour for every balancing kind, comparator context,
// destroy callbacks, and invariant checks after random workloads.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use libsysprim::{Tree, TreeKind};
use proptest::prelude::*;

const KINDS: [TreeKind; 3] = [TreeKind::Bst, TreeKind::RedBlack, TreeKind::Avl];

fn collect<K: Clone, V: Clone>(t: &mut Tree<K, V>) -> Vec<(K, V)> {
    let mut out = Vec::new();
    t.foreach(|k, v| {
        out.push((k.clone(), v.clone()));
        ControlFlow::Continue(())
    });
    out
}

#[test]
fn empty_tree() {
    for kind in KINDS {
        let mut t: Tree<u32, u32> = Tree::new(kind);
        assert_eq!(t.kind(), kind);
        assert!(t.is_empty());
        assert_eq!(t.lookup(&1), None);
        assert!(!t.remove(&1));
        assert!(collect(&mut t).is_empty());
        t.check_invariants().unwrap();
    }
}

#[test]
fn insert_lookup_remove() {
    for kind in KINDS {
        let mut t = Tree::new(kind);
        for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
            t.insert(k, k * 10);
        }
        assert_eq!(t.nnodes(), 9);
        assert_eq!(t.lookup(&4), Some(&40));
        assert!(t.contains_key(&9));

        // Root-ish node with two children.
        assert!(t.remove(&5));
        assert_eq!(t.lookup(&5), None);
        assert_eq!(t.nnodes(), 8);
        t.check_invariants().unwrap();

        let keys: Vec<_> = collect(&mut t).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 6, 7, 8, 9]);
    }
}

#[test]
fn upsert_keeps_count() {
    for kind in KINDS {
        let mut t = Tree::new(kind);
        t.insert("a".to_string(), 1);
        t.insert("b".to_string(), 2);
        t.insert("a".to_string(), 3);
        assert_eq!(t.nnodes(), 2);
        assert_eq!(t.lookup(&"a".to_string()), Some(&3));
    }
}

#[test]
fn comparator_receives_context() {
    // Context selects descending order.
    let mut t = Tree::with_context(TreeKind::Avl, true, |a: &i32, b: &i32, desc: &bool| {
        if *desc {
            b.cmp(a)
        } else {
            a.cmp(b)
        }
    });
    for k in 0..10 {
        t.insert(k, ());
    }
    let keys: Vec<_> = collect(&mut t).into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, (0..10).rev().collect::<Vec<_>>());
    t.check_invariants().unwrap();
}

#[test]
fn comparator_closure_with_captured_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c2 = Arc::clone(&calls);
    let mut t = Tree::with_comparator(TreeKind::RedBlack, move |a: &u8, b: &u8| {
        c2.fetch_add(1, AtomicOrdering::Relaxed);
        a.cmp(b)
    });
    for k in 0..50u8 {
        t.insert(k, k);
    }
    assert!(calls.load(AtomicOrdering::Relaxed) > 0);
    assert_eq!(t.lookup(&42), Some(&42));
}

#[test]
fn case_insensitive_keys_collapse() {
    let mut t = Tree::with_comparator(TreeKind::RedBlack, |a: &String, b: &String| {
        a.to_lowercase().cmp(&b.to_lowercase())
    });
    t.insert("Key".to_string(), 1);
    t.insert("KEY".to_string(), 2);
    assert_eq!(t.nnodes(), 1);
    assert_eq!(collect(&mut t), vec![("KEY".to_string(), 2)]);
}

#[test]
fn destroy_callbacks_see_every_released_entry() {
    for kind in KINDS {
        let keys = Arc::new(AtomicUsize::new(0));
        let values = Arc::new(AtomicUsize::new(0));
        {
            let mut t = Tree::new(kind);
            let (k2, v2) = (Arc::clone(&keys), Arc::clone(&values));
            t.set_key_destroy(move |_: u32| {
                k2.fetch_add(1, AtomicOrdering::SeqCst);
            });
            t.set_value_destroy(move |_: String| {
                v2.fetch_add(1, AtomicOrdering::SeqCst);
            });
            for k in 0..10 {
                t.insert(k, format!("v{k}"));
            }
            t.insert(3, "again".into()); // 1 key + 1 value
            t.remove(&4); // 1 + 1
            assert_eq!(keys.load(AtomicOrdering::SeqCst), 2);
            assert_eq!(values.load(AtomicOrdering::SeqCst), 2);
            t.clear(); // 9 + 9
            assert!(t.is_empty());
            t.insert(100, "last".into());
        } // drop: 1 + 1
        assert_eq!(keys.load(AtomicOrdering::SeqCst), 12);
        assert_eq!(values.load(AtomicOrdering::SeqCst), 12);
    }
}

#[test]
fn foreach_stops_early_and_tree_stays_intact() {
    for kind in KINDS {
        let mut t = Tree::new(kind);
        for k in 0..100 {
            t.insert(k, k);
        }
        let mut visited = 0;
        t.foreach(|_, _| {
            visited += 1;
            if visited == 10 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(visited, 10);
        t.check_invariants().unwrap();
        assert_eq!(collect(&mut t).len(), 100);
        for k in 0..100 {
            assert_eq!(t.lookup(&k), Some(&k));
        }
    }
}

#[test]
fn balanced_kinds_stay_shallow_on_sorted_input() {
    for kind in [TreeKind::RedBlack, TreeKind::Avl] {
        let mut t = Tree::with_comparator(kind, |a: &u32, b: &u32| a.cmp(b));
        for k in 0..4096 {
            t.insert(k, ());
        }
        t.check_invariants().unwrap();
        for k in (0..4096).filter(|k| k % 2 == 0) {
            assert!(t.remove(&k));
        }
        t.check_invariants().unwrap();
        assert_eq!(t.nnodes(), 2048);
    }
}

#[test]
fn checks_deep_unbalanced_tree_on_small_stack() {
    // Sorted input turns the plain BST into a 10k-deep list.
    let h = std::thread::Builder::new()
        .stack_size(64 * 1024)
        .spawn(|| {
            let mut t = Tree::new(TreeKind::Bst);
            for k in 0..10_000u32 {
                t.insert(k, ());
            }
            t.check_invariants()
        })
        .unwrap();
    h.join().unwrap().unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (0u16..200, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => (0u16..200).prop_map(Op::Remove),
        ],
        0..400,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn behaves_like_btreemap(ops in ops()) {
        for kind in KINDS {
            let mut t = Tree::new(kind);
            let mut model = BTreeMap::new();
            for op in &ops {
                match *op {
                    Op::Insert(k, v) => {
                        t.insert(k, v);
                        model.insert(k, v);
                    }
                    Op::Remove(k) => {
                        prop_assert_eq!(t.remove(&k), model.remove(&k).is_some());
                    }
                }
                if let Err(e) = t.check_invariants() {
                    return Err(TestCaseError::fail(format!("{kind:?}: {e}")));
                }
            }
            prop_assert_eq!(t.nnodes(), model.len());
            let seen = collect(&mut t);
            let expected: Vec<_> = model.into_iter().collect();
            prop_assert_eq!(seen, expected);
        }
    }

    #[test]
    fn foreach_is_strictly_ascending(keys in proptest::collection::vec(any::<i64>(), 0..200)) {
        let mut t = Tree::with_comparator(TreeKind::RedBlack, |a: &i64, b: &i64| -> Ordering { a.cmp(b) });
        for k in keys {
            t.insert(k, ());
        }
        let seen: Vec<_> = collect(&mut t).into_iter().map(|(k, _)| k).collect();
        prop_assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
