use std::fmt;

use ordermap::OrderMap;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::identity::Identity;
use crate::sequence::{Handle, Sequence};

/// Index of a node in its [`RelationGraph`]. Never reused: nodes are only added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One distinct key in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    identity: Identity,
    key: String,
    /// Direct relations ranking above this node.
    superiors: Sequence<NodeId>,
    /// Direct relations ranking below this node.
    inferiors: Sequence<NodeId>,
    /// Entry of this node in the graph's order.
    slot: Handle,
    /// Scratch state of the transfer pass; clear between calls.
    pub(crate) marked: bool,
}

impl Node {
    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn superiors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.superiors.values().copied()
    }

    pub fn inferiors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inferiors.values().copied()
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub(crate) fn superior_list(&self) -> &Sequence<NodeId> {
        &self.superiors
    }

    pub(crate) fn slot(&self) -> Handle {
        self.slot
    }
}

enum Placement {
    Back,
    Before(NodeId),
    After(NodeId),
}

/// Keys kept in a total order consistent with every relation applied so far.
///
/// Each call to [`apply_relation`](Self::apply_relation) either records the
/// relation as is, repositions the greater key's ancestors just before the
/// lesser key, or rejects the relation because it would close a cycle.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    pub(crate) nodes: Vec<Node>,
    /// Exact key -> node, in creation order.
    index: OrderMap<String, NodeId>,
    pub(crate) order: Sequence<NodeId>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Record `greater > lesser`, reordering as needed.
    ///
    /// Unknown keys are created. On [`OrderError::RelationalConflict`] the
    /// graph is left exactly as it was.
    pub fn apply_relation(&mut self, greater: &str, lesser: &str) -> Result<(), OrderError> {
        if greater == lesser {
            tracing::warn!(key = greater, "conflict: a key cannot rank above itself");
            return Err(conflict(greater, lesser));
        }

        match (self.find_key(greater), self.find_key(lesser)) {
            (Some((g, gi)), Some((l, li))) if gi < li => {
                tracing::debug!(greater, lesser, "order already satisfies relation");
                self.link(g, l)?;
            }
            (Some((g, gi)), Some((l, li))) if gi > li => {
                tracing::debug!(greater, lesser, gi, li, "relation requires reordering");
                if !self.mark_ancestors(g, l) {
                    tracing::warn!(greater, lesser, "conflict found, relation rejected");
                    return Err(conflict(greater, lesser));
                }
                let moved = self.transfer(l);
                tracing::debug!(moved, "transferred ancestors before {lesser:?}");
                self.link(g, l)?;
            }
            (Some((_, gi)), Some((_, li))) => {
                unreachable!("distinct keys {greater:?} and {lesser:?} share position {gi}/{li}")
            }
            (None, None) => {
                let g = self.create(greater, Placement::Back)?;
                let l = self.create(lesser, Placement::Back)?;
                self.link(g, l)?;
            }
            (Some((g, _)), None) => {
                let l = self.create(lesser, Placement::After(g))?;
                self.link(g, l)?;
            }
            (None, Some((l, _))) => {
                let g = self.create(greater, Placement::Before(l))?;
                self.link(g, l)?;
            }
        }

        debug_assert!(self.nodes.iter().all(|n| !n.marked));
        Ok(())
    }

    /// Keys in maintained order, front to back.
    pub fn sorted_keys(&self) -> Vec<String> {
        self.iter().map(|n| n.key.clone()).collect()
    }

    /// Nodes in maintained order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.values().map(move |&id| &self.nodes[id.0])
    }

    /// Keys in the order they were first seen.
    pub fn keys_by_creation(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.keys().map(String::as_str)
    }

    /// First node in order carrying `identity`, with its 0-based position.
    pub fn find(&self, identity: Identity) -> Option<(NodeId, usize)> {
        self.order
            .values()
            .enumerate()
            .find(|(_, id)| self.nodes[id.0].identity == identity)
            .map(|(i, &id)| (id, i))
    }

    /// Node for exactly `key`, with its 0-based position.
    pub fn find_key(&self, key: &str) -> Option<(NodeId, usize)> {
        let &id = self.index.get(key)?;
        let position = self.order.position(self.nodes[id.0].slot)?;
        Some((id, position))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let keys = |seq: &Sequence<NodeId>| -> Vec<String> {
            seq.values().map(|&id| self.nodes[id.0].key.clone()).collect()
        };
        GraphSnapshot {
            order: self.sorted_keys(),
            nodes: self
                .iter()
                .map(|n| NodeSnapshot {
                    key: n.key.clone(),
                    identity: n.identity,
                    superiors: keys(&n.superiors),
                    inferiors: keys(&n.inferiors),
                })
                .collect(),
        }
    }

    /// Relation edges as a petgraph, greater -> lesser, nodes in maintained order.
    pub fn to_digraph(&self) -> DiGraph<String, ()> {
        let mut g = DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        let mut indices: Vec<NodeIndex> = vec![NodeIndex::end(); self.nodes.len()];
        for &id in self.order.values() {
            indices[id.0] = g.add_node(self.nodes[id.0].key.clone());
        }
        for &id in self.order.values() {
            for &lower in self.nodes[id.0].inferiors.values() {
                g.add_edge(indices[id.0], indices[lower.0], ());
            }
        }
        g
    }

    /// Verify mirrored edges, clear transfer flags, and that the order
    /// respects every recorded relation.
    pub fn check_consistency(&self) -> Result<(), OrderError> {
        if self.order.len() != self.nodes.len() {
            return Err(OrderError::Inconsistent(format!(
                "{} nodes but {} in order",
                self.nodes.len(),
                self.order.len()
            )));
        }

        let mut positions = vec![usize::MAX; self.nodes.len()];
        for (i, &id) in self.order.values().enumerate() {
            positions[id.0] = i;
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.marked {
                return Err(OrderError::Inconsistent(format!("{:?} left marked", node.key)));
            }
            for lower in node.inferiors() {
                let lower_node = &self.nodes[lower.0];
                if !lower_node.superiors().any(|s| s.0 == i) {
                    return Err(OrderError::Inconsistent(format!(
                        "{:?} > {:?} is not mirrored",
                        node.key, lower_node.key
                    )));
                }
                if positions[i] >= positions[lower.0] {
                    return Err(OrderError::Inconsistent(format!(
                        "{:?} > {:?} but ordered after it",
                        node.key, lower_node.key
                    )));
                }
            }
        }
        Ok(())
    }

    fn create(&mut self, key: &str, placement: Placement) -> Result<NodeId, OrderError> {
        self.nodes.try_reserve(1)?;

        let id = NodeId(self.nodes.len());
        let slot = match placement {
            Placement::Back => self.order.push_back(id)?,
            Placement::Before(anchor) => self.order.insert_before(self.nodes[anchor.0].slot, id)?,
            Placement::After(anchor) => self.order.insert_after(self.nodes[anchor.0].slot, id)?,
        };
        self.nodes.push(Node {
            identity: Identity::of(key),
            key: key.to_owned(),
            superiors: Sequence::new(),
            inferiors: Sequence::new(),
            slot,
            marked: false,
        });
        self.index.insert(key.to_owned(), id);
        Ok(id)
    }

    /// Records the mirrored edge. Both slots are reserved first, so a failed
    /// allocation leaves neither half behind.
    fn link(&mut self, greater: NodeId, lesser: NodeId) -> Result<(), OrderError> {
        self.nodes[greater.0].inferiors.try_reserve(1)?;
        self.nodes[lesser.0].superiors.try_reserve(1)?;
        self.nodes[greater.0].inferiors.push_back(lesser)?;
        self.nodes[lesser.0].superiors.push_back(greater)?;
        Ok(())
    }
}

fn conflict(greater: &str, lesser: &str) -> OrderError {
    OrderError::RelationalConflict { greater: greater.to_owned(), lesser: lesser.to_owned() }
}

impl fmt::Display for RelationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Length {}", self.len())?;
        for node in self.iter() {
            let marker = if node.marked { " (*)" } else { "" };
            writeln!(f, "[{}]: {}{}", node.identity, node.key, marker)?;
            write!(f, "  higher: [")?;
            for id in node.superiors() {
                write!(f, "{}, ", self.nodes[id.0].identity)?;
            }
            writeln!(f, "]")?;
            write!(f, "  lower: [")?;
            for id in node.inferiors() {
                write!(f, "{}, ", self.nodes[id.0].identity)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Serializable copy of a graph: the order plus every adjacency list by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub order: Vec<String>,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub key: String,
    pub identity: Identity,
    pub superiors: Vec<String>,
    pub inferiors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(relations: &[(&str, &str)]) -> RelationGraph {
        let mut g = RelationGraph::new();
        for (greater, lesser) in relations {
            g.apply_relation(greater, lesser).unwrap();
        }
        g
    }

    #[test]
    fn new_keys_are_appended_in_relation_order() {
        let g = graph(&[("a", "b"), ("c", "d")]);
        assert_eq!(g.sorted_keys(), vec!["a", "b", "c", "d"]);
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn new_greater_goes_directly_before_lesser() {
        let g = graph(&[("a", "b"), ("c", "d"), ("x", "d")]);
        assert_eq!(g.sorted_keys(), vec!["a", "b", "c", "x", "d"]);
    }

    #[test]
    fn new_lesser_goes_directly_after_greater() {
        let g = graph(&[("a", "b"), ("c", "d"), ("a", "x")]);
        assert_eq!(g.sorted_keys(), vec!["a", "x", "b", "c", "d"]);
    }

    #[test]
    fn edges_are_mirrored() {
        let g = graph(&[("a", "b"), ("a", "c"), ("c", "b")]);
        let (a, _) = g.find_key("a").unwrap();
        let (b, _) = g.find_key("b").unwrap();
        let (c, _) = g.find_key("c").unwrap();
        assert_eq!(g.node(a).inferiors().collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(g.node(b).superiors().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(g.node(c).superiors().collect::<Vec<_>>(), vec![a]);
        g.check_consistency().unwrap();
    }

    #[test]
    fn self_relation_is_a_conflict() {
        let mut g = graph(&[("a", "b")]);
        let before = g.snapshot();
        let err = g.apply_relation("a", "a").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(g.snapshot(), before);

        let mut empty = RelationGraph::new();
        assert!(empty.apply_relation("z", "z").is_err());
        assert!(empty.is_empty());
    }

    #[test]
    fn duplicate_relations_accumulate() {
        let g = graph(&[("a", "b"), ("a", "b")]);
        let (a, _) = g.find_key("a").unwrap();
        assert_eq!(g.node(a).inferiors().count(), 2);
        assert_eq!(g.to_digraph().edge_count(), 2);
        assert_eq!(g.sorted_keys(), vec!["a", "b"]);
    }

    #[test]
    fn colliding_keys_stay_distinct() {
        assert_eq!(Identity::of("Aa"), Identity::of("B@"));
        let g = graph(&[("Aa", "B@")]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.sorted_keys(), vec!["Aa", "B@"]);
        // identity lookup yields the first carrier in order
        let (id, index) = g.find(Identity::of("B@")).unwrap();
        assert_eq!(g.node(id).key(), "Aa");
        assert_eq!(index, 0);
        assert_eq!(g.find_key("B@").map(|(_, i)| i), Some(1));
    }

    #[test]
    fn transfer_preserves_relative_order_of_moved_block() {
        // x > y and p > q chains, then hook the second chain above b
        let mut g = graph(&[("a", "b"), ("p", "q"), ("q", "r"), ("x", "r")]);
        assert_eq!(g.sorted_keys(), vec!["a", "b", "p", "q", "x", "r"]);
        g.apply_relation("r", "b").unwrap();
        assert_eq!(g.sorted_keys(), vec!["a", "p", "q", "x", "r", "b"]);
        g.check_consistency().unwrap();
    }

    #[test]
    fn unrelated_nodes_between_pivot_and_greater_stay_put() {
        let mut g = graph(&[("a", "b"), ("c", "d"), ("e", "f")]);
        g.apply_relation("e", "b").unwrap();
        assert_eq!(g.sorted_keys(), vec!["a", "e", "b", "c", "d", "f"]);
        g.check_consistency().unwrap();
    }

    #[test]
    fn keys_by_creation_ignores_reordering() {
        let g = graph(&[("a", "b"), ("c", "d"), ("d", "a")]);
        assert_eq!(g.keys_by_creation().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn display_lists_relations_by_identity() {
        let g = graph(&[("a", "b")]);
        let a = Identity::of("a");
        let b = Identity::of("b");
        let expected = format!(
            "Length 2\n[{a}]: a\n  higher: []\n  lower: [{b}, ]\n[{b}]: b\n  higher: [{a}, ]\n  lower: []\n"
        );
        assert_eq!(g.to_string(), expected);
    }
}
