// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Node storage for the trees. Nodes live in a `slab::Slab` and refer to each
// other by index; `parent` is a back-reference, never an owner.

use slab::Slab;

pub(crate) type NodeId = usize;

pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,
    /// Colour for red-black trees, height for AVL trees, unused otherwise.
    pub rank: i32,
}

pub(crate) struct Arena<K, V> {
    nodes: Slab<Node<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id]
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].right
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn rank(&self, id: Option<NodeId>) -> Option<i32> {
        id.map(|id| self.nodes[id].rank)
    }

    pub fn set_rank(&mut self, id: NodeId, rank: i32) {
        self.nodes[id].rank = rank;
    }

    /// Link a new leaf under `parent` (or as the root).
    pub fn attach(
        &mut self,
        parent: Option<NodeId>,
        as_left: bool,
        key: K,
        value: V,
        rank: i32,
    ) -> NodeId {
        let id = self.nodes.insert(Node {
            key,
            value,
            left: None,
            right: None,
            parent,
            rank,
        });
        match parent {
            None => self.root = Some(id),
            Some(p) if as_left => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
        }
        id
    }

    /// Free a node already unlinked from the structure.
    pub fn release(&mut self, id: NodeId) -> Node<K, V> {
        self.nodes.remove(id)
    }

    /// Make `new` take `old`'s place under `old`'s parent.
    fn replace_child(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.parent(old);
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    /// Unlink a node with at most one child, moving the child up.
    /// Returns the node's former parent.
    pub fn splice(&mut self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        debug_assert!(node.left.is_none() || node.right.is_none());
        let child = node.left.or(node.right);
        let parent = node.parent;
        self.replace_child(id, child);
        let node = &mut self.nodes[id];
        node.parent = None;
        node.left = None;
        node.right = None;
        parent
    }

    /// Exchange the key/value payloads of two nodes; links are untouched.
    pub fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        if let Some((x, y)) = self.nodes.get2_mut(a, b) {
            std::mem::swap(&mut x.key, &mut y.key);
            std::mem::swap(&mut x.value, &mut y.value);
        }
    }

    pub fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.right(id) {
            id = r;
        }
        id
    }

    //   x              y
    //  / \            / \
    // a   y    =>    x   c
    //    / \        / \
    //   b   c      a   b
    pub fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.right(x) else { return };
        let b = self.left(y);
        self.nodes[x].right = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(x);
        }
        self.replace_child(x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    pub fn rotate_right(&mut self, x: NodeId) {
        let Some(y) = self.left(x) else { return };
        let b = self.right(y);
        self.nodes[x].left = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(x);
        }
        self.replace_child(x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// Raw right-link write used by threaded traversal; parent links are
    /// left alone.
    pub fn set_right_thread(&mut self, id: NodeId, target: Option<NodeId>) {
        self.nodes[id].right = target;
    }

    /// Node ids in post-order (children before parents), walked with an
    /// explicit stack so degenerate trees do not exhaust the call stack.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.left(id));
            stack.extend(self.right(id));
        }
        out.reverse();
        out
    }

    /// Remove every node without touching links, in slab order.
    pub fn drain(&mut self) -> impl Iterator<Item = Node<K, V>> + '_ {
        self.root = None;
        self.nodes.drain()
    }
}
