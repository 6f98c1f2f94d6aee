// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// AVL balancing. `rank` is the subtree height; a leaf has height 1.

use std::collections::HashMap;

use log::trace;

use super::arena::{Arena, NodeId};
use super::Balancer;

pub(crate) struct Avl;

fn height<K, V>(arena: &Arena<K, V>, id: Option<NodeId>) -> i32 {
    arena.rank(id).unwrap_or(0)
}

fn balance<K, V>(arena: &Arena<K, V>, id: NodeId) -> i32 {
    height(arena, arena.left(id)) - height(arena, arena.right(id))
}

fn fix_height<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
    let h = 1 + height(arena, arena.left(id)).max(height(arena, arena.right(id)));
    arena.set_rank(id, h);
}

/// Rotate and refresh the heights of the two nodes that moved.
fn rotate_left<K, V>(arena: &mut Arena<K, V>, x: NodeId) -> NodeId {
    let y = arena.right(x);
    arena.rotate_left(x);
    fix_height(arena, x);
    if let Some(y) = y {
        fix_height(arena, y);
    }
    y.unwrap_or(x)
}

fn rotate_right<K, V>(arena: &mut Arena<K, V>, x: NodeId) -> NodeId {
    let y = arena.left(x);
    arena.rotate_right(x);
    fix_height(arena, x);
    if let Some(y) = y {
        fix_height(arena, y);
    }
    y.unwrap_or(x)
}

/// Walk from `start` to the root restoring heights and balance.
fn rebalance_from<K, V>(arena: &mut Arena<K, V>, start: Option<NodeId>) {
    let mut cur = start;
    while let Some(n) = cur {
        fix_height(arena, n);
        let bf = balance(arena, n);
        let top = if bf > 1 {
            if let Some(l) = arena.left(n).filter(|&l| balance(arena, l) < 0) {
                trace!("avl: left-right at {n}");
                rotate_left(arena, l);
            }
            trace!("avl: rotate right at {n}");
            rotate_right(arena, n)
        } else if bf < -1 {
            if let Some(r) = arena.right(n).filter(|&r| balance(arena, r) > 0) {
                trace!("avl: right-left at {n}");
                rotate_right(arena, r);
            }
            trace!("avl: rotate left at {n}");
            rotate_left(arena, n)
        } else {
            n
        };
        cur = arena.parent(top);
    }
}

impl Balancer for Avl {
    const INITIAL_RANK: i32 = 1;

    fn after_insert<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
        let parent = arena.parent(id);
        rebalance_from(arena, parent);
    }

    fn unlink<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
        let parent = arena.splice(id);
        rebalance_from(arena, parent);
    }

    fn check<K, V>(arena: &Arena<K, V>) -> Result<(), String> {
        checked_height(arena).map(|_| ())
    }
}

fn checked_height<K, V>(arena: &Arena<K, V>) -> Result<i32, String> {
    let mut heights: HashMap<NodeId, i32> = HashMap::with_capacity(arena.len());
    let of = |heights: &HashMap<NodeId, i32>, id: Option<NodeId>| {
        id.map_or(0, |c| heights[&c])
    };
    for n in arena.postorder() {
        let lh = of(&heights, arena.left(n));
        let rh = of(&heights, arena.right(n));
        if (lh - rh).abs() > 1 {
            return Err(format!("node {n} unbalanced: {lh} vs {rh}"));
        }
        let h = 1 + lh.max(rh);
        if arena.node(n).rank != h {
            return Err(format!("node {n} stores height {} but is {h}", arena.node(n).rank));
        }
        heights.insert(n, h);
    }
    Ok(of(&heights, arena.root()))
}
