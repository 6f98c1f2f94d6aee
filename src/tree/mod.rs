// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Ordered maps with a pluggable comparator and three balancing policies.
// Nodes are arena-indexed (see `arena`); the balancers only rewire indices.

mod arena;
mod avl;
mod bst;
mod rb;

use std::cmp::Ordering;
use std::fmt;
use std::ops::ControlFlow;

use arena::{Arena, NodeId};

/// Balancing policy, fixed for the lifetime of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    /// Unbalanced binary search tree.
    Bst,
    /// Red-black tree.
    RedBlack,
    /// AVL tree.
    Avl,
}

pub(crate) trait Balancer {
    /// Rank given to a freshly attached leaf.
    const INITIAL_RANK: i32;
    /// Restore invariants after `id` was attached as a leaf.
    fn after_insert<K, V>(arena: &mut Arena<K, V>, id: NodeId);
    /// Detach `id`, which has at most one child, restoring invariants.
    /// The node stays allocated.
    fn unlink<K, V>(arena: &mut Arena<K, V>, id: NodeId);
    /// Verify the policy's own invariant over the whole tree.
    fn check<K, V>(arena: &Arena<K, V>) -> Result<(), String>;
}

enum Comparator<K> {
    Natural(fn(&K, &K) -> Ordering),
    Custom(Box<dyn Fn(&K, &K) -> Ordering + Send>),
}

impl<K> Comparator<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        match self {
            Comparator::Natural(f) => f(a, b),
            Comparator::Custom(f) => f(a, b),
        }
    }
}

type Destroy<T> = Box<dyn FnMut(T) + Send>;

/// An ordered map.
///
/// Not internally synchronized: wrap it in a lock to share between threads.
pub struct Tree<K, V> {
    kind: TreeKind,
    arena: Arena<K, V>,
    cmp: Comparator<K>,
    key_destroy: Option<Destroy<K>>,
    value_destroy: Option<Destroy<V>>,
}

impl<K: Ord, V> Tree<K, V> {
    /// Tree ordered by `K`'s `Ord` implementation.
    pub fn new(kind: TreeKind) -> Self {
        Self::build(kind, Comparator::Natural(K::cmp))
    }
}

impl<K, V> Tree<K, V> {
    pub fn with_comparator<F>(kind: TreeKind, cmp: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + 'static,
    {
        Self::build(kind, Comparator::Custom(Box::new(cmp)))
    }

    /// Comparator that receives `ctx` on every call.
    pub fn with_context<C, F>(kind: TreeKind, ctx: C, cmp: F) -> Self
    where
        C: Send + 'static,
        F: Fn(&K, &K, &C) -> Ordering + Send + 'static,
    {
        Self::with_comparator(kind, move |a, b| cmp(a, b, &ctx))
    }

    /// Called with every key the tree gives up: replaced on upsert, removed,
    /// cleared or dropped with the tree.
    pub fn set_key_destroy(&mut self, f: impl FnMut(K) + Send + 'static) {
        self.key_destroy = Some(Box::new(f));
    }

    /// Value counterpart of [`set_key_destroy`](Tree::set_key_destroy).
    pub fn set_value_destroy(&mut self, f: impl FnMut(V) + Send + 'static) {
        self.value_destroy = Some(Box::new(f));
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    /// Number of entries.
    pub fn nnodes(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    /// Insert `key`, replacing the entry if an equal key is present.
    /// The replaced key and value go to the destroy callbacks.
    pub fn insert(&mut self, key: K, value: V) {
        let mut parent = None;
        let mut as_left = false;
        let mut cur = self.arena.root();
        while let Some(id) = cur {
            match self.cmp.compare(&key, &self.arena.node(id).key) {
                Ordering::Less => {
                    parent = Some(id);
                    as_left = true;
                    cur = self.arena.left(id);
                }
                Ordering::Greater => {
                    parent = Some(id);
                    as_left = false;
                    cur = self.arena.right(id);
                }
                Ordering::Equal => {
                    let node = self.arena.node_mut(id);
                    let old_key = std::mem::replace(&mut node.key, key);
                    let old_value = std::mem::replace(&mut node.value, value);
                    self.destroy(old_key, old_value);
                    return;
                }
            }
        }

        let rank = match self.kind {
            TreeKind::Bst => bst::Unbalanced::INITIAL_RANK,
            TreeKind::RedBlack => rb::RedBlack::INITIAL_RANK,
            TreeKind::Avl => avl::Avl::INITIAL_RANK,
        };
        let id = self.arena.attach(parent, as_left, key, value, rank);
        match self.kind {
            TreeKind::Bst => bst::Unbalanced::after_insert(&mut self.arena, id),
            TreeKind::RedBlack => rb::RedBlack::after_insert(&mut self.arena, id),
            TreeKind::Avl => avl::Avl::after_insert(&mut self.arena, id),
        }
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(mut id) = self.find(key) else {
            return false;
        };
        if let Some(l) = self.arena.left(id).filter(|_| self.arena.right(id).is_some()) {
            let pred = self.arena.rightmost(l);
            self.arena.swap_payload(id, pred);
            id = pred;
        }
        match self.kind {
            TreeKind::Bst => bst::Unbalanced::unlink(&mut self.arena, id),
            TreeKind::RedBlack => rb::RedBlack::unlink(&mut self.arena, id),
            TreeKind::Avl => avl::Avl::unlink(&mut self.arena, id),
        }
        let node = self.arena.release(id);
        self.destroy(node.key, node.value);
        true
    }

    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.find(key).map(|id| &self.arena.node(id).value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Visit entries in ascending order until `visit` breaks.
    ///
    /// Uses threaded (Morris) traversal: right links of in-order predecessors
    /// are borrowed as return paths and restored before this returns, also
    /// after an early break.
    pub fn foreach<F>(&mut self, mut visit: F)
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        let mut stopped = false;
        let mut emit = |arena: &Arena<K, V>, id: NodeId| {
            if !stopped {
                let n = arena.node(id);
                stopped = visit(&n.key, &n.value).is_break();
            }
        };

        let mut cur = self.arena.root();
        while let Some(c) = cur {
            let Some(l) = self.arena.left(c) else {
                emit(&self.arena, c);
                cur = self.arena.right(c);
                continue;
            };
            let mut pred = l;
            while let Some(r) = self.arena.right(pred).filter(|&r| r != c) {
                pred = r;
            }
            if self.arena.right(pred).is_none() {
                self.arena.set_right_thread(pred, Some(c));
                cur = Some(l);
            } else {
                self.arena.set_right_thread(pred, None);
                emit(&self.arena, c);
                cur = self.arena.right(c);
            }
        }
    }

    /// Drop every entry, handing keys and values to the destroy callbacks.
    pub fn clear(&mut self) {
        let nodes: Vec<_> = self.arena.drain().collect();
        for node in nodes {
            self.destroy(node.key, node.value);
        }
    }

    /// Check ordering, parent links, the entry count and the balancing
    /// invariant of this tree's kind.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut count = 0;
        if let Some(r) = self.arena.root() {
            if self.arena.parent(r).is_some() {
                return Err("root has a parent".into());
            }
            // Explicit stack: an unbalanced tree can be as deep as it is long.
            let mut stack: Vec<(NodeId, Option<&K>, Option<&K>)> = vec![(r, None, None)];
            while let Some((id, lo, hi)) = stack.pop() {
                count += 1;
                if count > self.arena.len() {
                    return Err("child links form a cycle".into());
                }
                let key = &self.arena.node(id).key;
                if lo.is_some_and(|lo| self.cmp.compare(lo, key) != Ordering::Less)
                    || hi.is_some_and(|hi| self.cmp.compare(key, hi) != Ordering::Less)
                {
                    return Err(format!("node {id} is out of order"));
                }
                for (child, lo, hi) in [
                    (self.arena.left(id), lo, Some(key)),
                    (self.arena.right(id), Some(key), hi),
                ] {
                    if let Some(c) = child {
                        if self.arena.parent(c) != Some(id) {
                            return Err(format!("node {c} has a stale parent link"));
                        }
                        stack.push((c, lo, hi));
                    }
                }
            }
        }
        if count != self.arena.len() {
            return Err(format!(
                "{count} reachable nodes but {} allocated",
                self.arena.len()
            ));
        }
        match self.kind {
            TreeKind::Bst => bst::Unbalanced::check(&self.arena),
            TreeKind::RedBlack => rb::RedBlack::check(&self.arena),
            TreeKind::Avl => avl::Avl::check(&self.arena),
        }
    }

    fn build(kind: TreeKind, cmp: Comparator<K>) -> Self {
        Self {
            kind,
            arena: Arena::new(),
            cmp,
            key_destroy: None,
            value_destroy: None,
        }
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.arena.root();
        while let Some(id) = cur {
            cur = match self.cmp.compare(key, &self.arena.node(id).key) {
                Ordering::Less => self.arena.left(id),
                Ordering::Greater => self.arena.right(id),
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    fn destroy(&mut self, key: K, value: V) {
        if let Some(f) = self.key_destroy.as_mut() {
            f(key);
        }
        if let Some(f) = self.value_destroy.as_mut() {
            f(value);
        }
    }
}

impl<K, V> Drop for Tree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> fmt::Debug for Tree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("kind", &self.kind)
            .field("nnodes", &self.nnodes())
            .finish()
    }
}
