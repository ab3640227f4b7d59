//! # transitivity
//!
//! Transitive, reflexive relations that stay queryable while they grow.
//!
//! Edges are added one at a time with [`TransitiveRelation::relate`] and
//! reachability is answered by [`TransitiveRelation::are_related`] without
//! ever recomputing the closure. Each element's closure is a compressed set of
//! ranges over an order-maintenance list, so a query costs a binary search
//! over a handful of ranges rather than a graph walk.
//!
//! ```
//! use transitivity::TransitiveRelation;
//!
//! let mut subtypes = TransitiveRelation::new();
//! subtypes.relate("i32", "Integer")?;
//! subtypes.relate("Integer", "Number")?;
//! assert!(subtypes.are_related(&"i32", &"Number"));
//! assert!(!subtypes.are_related(&"Number", &"i32"));
//! # Ok::<(), transitivity::Error>(())
//! ```
mod bi_relation;
mod error;
mod interval_set;
mod loader;
mod navigator;
mod order_list;
mod persist;
mod relation;

pub use bi_relation::{InverseRelation, InverseRelationMut, TransitiveBiRelation};
pub use error::{Error, Result};
pub use interval_set::IntervalSet;
pub use loader::{merge, merge_acyclic};
pub use navigator::{
    closure, closure_of_many, difference, intersection, inverse, topological_order, union,
    Difference, FnNavigator, Intersection, Inverse, MapNavigator, Navigator, Union,
};
pub use order_list::{OrderList, Position};
pub use persist::{EdgeEntry, EdgeList};
pub use relation::{DirectNavigator, Placement, RelationConfig, TransitiveRelation};

/// A binary relation that can be extended one pair at a time.
pub trait Relation<T> {
    fn relate(&mut self, subject: T, object: T) -> Result<()>;

    fn are_related(&self, subject: &T, object: &T) -> bool;
}
