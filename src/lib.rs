//! # RankOrder
//!
//! A total order over string keys, kept consistent with a growing set of
//! "A ranks above B" relations.
//!
//! Every new relation is either already satisfied by the order, satisfied by
//! moving the greater key's ancestors as one order-preserving block to just
//! before the lesser key, or rejected because it would close a cycle. A
//! rejected relation leaves the graph untouched.
//!
//! ```
//! use rank_order::RelationGraph;
//!
//! let mut g = RelationGraph::new();
//! g.apply_relation("a", "b").unwrap();
//! g.apply_relation("c", "d").unwrap();
//! g.apply_relation("d", "a").unwrap();
//! assert_eq!(g.sorted_keys(), ["c", "d", "a", "b"]);
//!
//! assert!(g.apply_relation("b", "c").is_err());
//! assert_eq!(g.sorted_keys(), ["c", "d", "a", "b"]);
//! ```
mod error;
mod graph;
mod identity;
mod maintain;
mod relation;
mod sequence;

pub use error::{OrderError, ParseError};
pub use graph::{GraphSnapshot, Node, NodeId, NodeSnapshot, RelationGraph};
pub use identity::Identity;
pub use relation::{read_relations, Relation};
pub use sequence::{Handle, Iter, Sequence};
