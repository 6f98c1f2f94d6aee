// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Red-black balancing (CLRS insert and delete fixups).
// Absent children count as black.

use std::collections::HashMap;

use log::trace;

use super::arena::{Arena, NodeId};
use super::Balancer;

const RED: i32 = 0;
const BLACK: i32 = 1;

pub(crate) struct RedBlack;

fn is_red<K, V>(arena: &Arena<K, V>, id: Option<NodeId>) -> bool {
    arena.rank(id) == Some(RED)
}

fn is_black<K, V>(arena: &Arena<K, V>, id: Option<NodeId>) -> bool {
    !is_red(arena, id)
}

impl Balancer for RedBlack {
    const INITIAL_RANK: i32 = RED;

    fn after_insert<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
        let mut z = id;
        while let Some(p) = arena.parent(z).filter(|&p| is_red(arena, Some(p))) {
            // A red node is never the root, so the grandparent exists.
            let Some(g) = arena.parent(p) else { break };
            let p_is_left = arena.left(g) == Some(p);
            let uncle = if p_is_left { arena.right(g) } else { arena.left(g) };

            if let Some(u) = uncle.filter(|&u| is_red(arena, Some(u))) {
                trace!("rb insert: recolour at {g}");
                arena.set_rank(p, BLACK);
                arena.set_rank(u, BLACK);
                arena.set_rank(g, RED);
                z = g;
                continue;
            }

            let mut p = p;
            if p_is_left {
                if arena.right(p) == Some(z) {
                    trace!("rb insert: left-right at {g}");
                    arena.rotate_left(p);
                    z = p;
                    p = arena.parent(z).unwrap_or(p);
                }
                trace!("rb insert: rotate right at {g}");
                arena.set_rank(p, BLACK);
                arena.set_rank(g, RED);
                arena.rotate_right(g);
            } else {
                if arena.left(p) == Some(z) {
                    trace!("rb insert: right-left at {g}");
                    arena.rotate_right(p);
                    z = p;
                    p = arena.parent(z).unwrap_or(p);
                }
                trace!("rb insert: rotate left at {g}");
                arena.set_rank(p, BLACK);
                arena.set_rank(g, RED);
                arena.rotate_left(g);
            }
        }
        if let Some(r) = arena.root() {
            arena.set_rank(r, BLACK);
        }
    }

    fn unlink<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
        let child = arena.left(id).or(arena.right(id));
        if is_red(arena, Some(id)) {
            // A red node with at most one child is a leaf.
            arena.splice(id);
            return;
        }
        if let Some(c) = child {
            // Black node with a single child: the child is a red leaf.
            arena.splice(id);
            arena.set_rank(c, BLACK);
            return;
        }
        // Black leaf: fix the deficit while the node still holds its place.
        delete_fixup(arena, id);
        arena.splice(id);
    }

    fn check<K, V>(arena: &Arena<K, V>) -> Result<(), String> {
        if is_red(arena, arena.root()) {
            return Err("red root".into());
        }
        black_height(arena).map(|_| ())
    }
}

fn delete_fixup<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
    let mut x = id;
    while Some(x) != arena.root() && is_black(arena, Some(x)) {
        let Some(p) = arena.parent(x) else { break };
        if arena.left(p) == Some(x) {
            let Some(mut w) = arena.right(p) else { break };
            if is_red(arena, Some(w)) {
                trace!("rb delete: red sibling at {p}");
                arena.set_rank(w, BLACK);
                arena.set_rank(p, RED);
                arena.rotate_left(p);
                let Some(nw) = arena.right(p) else { break };
                w = nw;
            }
            if is_black(arena, arena.left(w)) && is_black(arena, arena.right(w)) {
                arena.set_rank(w, RED);
                x = p;
            } else {
                if is_black(arena, arena.right(w)) {
                    if let Some(wl) = arena.left(w) {
                        arena.set_rank(wl, BLACK);
                    }
                    arena.set_rank(w, RED);
                    arena.rotate_right(w);
                    let Some(nw) = arena.right(p) else { break };
                    w = nw;
                }
                trace!("rb delete: rotate left at {p}");
                let pc = arena.node(p).rank;
                arena.set_rank(w, pc);
                arena.set_rank(p, BLACK);
                if let Some(wr) = arena.right(w) {
                    arena.set_rank(wr, BLACK);
                }
                arena.rotate_left(p);
                break;
            }
        } else {
            let Some(mut w) = arena.left(p) else { break };
            if is_red(arena, Some(w)) {
                trace!("rb delete: red sibling at {p}");
                arena.set_rank(w, BLACK);
                arena.set_rank(p, RED);
                arena.rotate_right(p);
                let Some(nw) = arena.left(p) else { break };
                w = nw;
            }
            if is_black(arena, arena.left(w)) && is_black(arena, arena.right(w)) {
                arena.set_rank(w, RED);
                x = p;
            } else {
                if is_black(arena, arena.left(w)) {
                    if let Some(wr) = arena.right(w) {
                        arena.set_rank(wr, BLACK);
                    }
                    arena.set_rank(w, RED);
                    arena.rotate_left(w);
                    let Some(nw) = arena.left(p) else { break };
                    w = nw;
                }
                trace!("rb delete: rotate right at {p}");
                let pc = arena.node(p).rank;
                arena.set_rank(w, pc);
                arena.set_rank(p, BLACK);
                if let Some(wl) = arena.left(w) {
                    arena.set_rank(wl, BLACK);
                }
                arena.rotate_right(p);
                break;
            }
        }
    }
    arena.set_rank(x, BLACK);
    if let Some(r) = arena.root() {
        arena.set_rank(r, BLACK);
    }
}

fn black_height<K, V>(arena: &Arena<K, V>) -> Result<usize, String> {
    // Black height of every subtree, filled bottom-up.
    let mut heights: HashMap<NodeId, usize> = HashMap::with_capacity(arena.len());
    let of = |heights: &HashMap<NodeId, usize>, id: Option<NodeId>| {
        id.map_or(1, |c| heights[&c])
    };
    for n in arena.postorder() {
        let (l, r) = (arena.left(n), arena.right(n));
        if is_red(arena, Some(n)) && (is_red(arena, l) || is_red(arena, r)) {
            return Err(format!("red node {n} has a red child"));
        }
        let (lh, rh) = (of(&heights, l), of(&heights, r));
        if lh != rh {
            return Err(format!("black height differs under node {n}: {lh} vs {rh}"));
        }
        heights.insert(n, lh + usize::from(is_black(arena, Some(n))));
    }
    Ok(of(&heights, arena.root()))
}
