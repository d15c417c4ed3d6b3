//! Reordering for a relation the current order violates.
//!
//! Called with `greater` positioned after `lesser`. First the upward closure
//! of `greater` is marked; reaching `lesser` on the way means `lesser` already
//! ranks above `greater`, so the relation would close a cycle. Otherwise every
//! marked node found after `lesser` is spliced, in encounter order, into a
//! contiguous block directly before it. Marked nodes already before `lesser`
//! satisfy the relation and stay where they are.

use crate::graph::{NodeId, RelationGraph};

impl RelationGraph {
    /// Marks `greater` and all of its ancestors.
    ///
    /// Returns `false`, with every flag it set cleared again, if `lesser` is
    /// among those ancestors.
    pub(crate) fn mark_ancestors(&mut self, greater: NodeId, lesser: NodeId) -> bool {
        let mut visited: Vec<NodeId> = Vec::new();
        let mut stack = vec![greater];

        while let Some(id) = stack.pop() {
            if id == lesser {
                for v in visited {
                    self.nodes[v.index()].marked = false;
                }
                return false;
            }

            let node = &mut self.nodes[id.index()];
            if node.marked {
                continue;
            }
            node.marked = true;
            visited.push(id);
            stack.extend(node.superior_list().values().copied());
        }

        tracing::trace!(marked = visited.len(), "ancestor scan complete");
        true
    }

    /// Moves every marked node after `pivot` to directly before it and clears
    /// all flags. Returns the number of nodes moved.
    pub(crate) fn transfer(&mut self, pivot: NodeId) -> usize {
        let pivot_slot = self.nodes[pivot.index()].slot();
        let mut past_pivot = false;
        let mut moved = 0;

        let mut cursor = self.order.front();
        while let Some(slot) = cursor {
            // grab the successor before a possible splice
            cursor = self.order.next(slot);

            if slot == pivot_slot {
                past_pivot = true;
                continue;
            }

            let node = &mut self.nodes[self.order[slot].index()];
            if past_pivot && node.marked {
                self.order.move_before(pivot_slot, slot);
                moved += 1;
            }
            node.marked = false;
        }

        moved
    }
}
