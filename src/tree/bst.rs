// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

use super::arena::{Arena, NodeId};
use super::Balancer;

/// Plain binary search tree: no rebalancing at all.
pub(crate) struct Unbalanced;

impl Balancer for Unbalanced {
    const INITIAL_RANK: i32 = 0;

    fn after_insert<K, V>(_arena: &mut Arena<K, V>, _id: NodeId) {}

    fn unlink<K, V>(arena: &mut Arena<K, V>, id: NodeId) {
        arena.splice(id);
    }

    fn check<K, V>(_arena: &Arena<K, V>) -> Result<(), String> {
        Ok(())
    }
}
