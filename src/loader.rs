//! Batch loading of a relation from a navigator.
//!
//! Both loaders end with the same closure as relating every pair of the
//! navigator in domain order; they only pick an edge order that lets new
//! brackets nest, which keeps interval sets small.
use std::fmt::Debug;
use std::hash::Hash;

use ordermap::OrderMap;
use petgraph::visit::{depth_first_search, DfsEvent};
use tracing::debug;

use crate::error::Result;
use crate::navigator::{graph_of, topological_order, Navigator};
use crate::Relation;

/// Relates every pair of `navigator`, which may contain cycles. The edges of a
/// depth-first forest go in first, the rest after.
pub fn merge<T, R, N>(relation: &mut R, navigator: &N) -> Result<()>
where
    T: Hash + Eq + Clone,
    R: Relation<T> + ?Sized,
    N: Navigator<T> + ?Sized,
{
    let (g, keys) = graph_of(navigator);
    let mut tree_edges = Vec::new();
    depth_first_search(&g, g.node_indices(), |event| {
        if let DfsEvent::TreeEdge(u, v) = event {
            tree_edges.push((u, v));
        }
    });
    debug!(tree_edges = tree_edges.len(), elements = keys.len(), "merging navigator");

    for (u, v) in tree_edges {
        relation.relate(keys[u.index()].clone(), keys[v.index()].clone())?;
    }
    for subject in navigator.domain() {
        for object in navigator.related(&subject) {
            relation.relate(subject.clone(), object)?;
        }
    }
    Ok(())
}

/// Relates every pair of an acyclic `navigator`. Each subject is first related
/// to the object starting the longest path, then to the rest. Fails with
/// [`crate::Error::Cycle`] before touching `relation` if a cycle exists.
pub fn merge_acyclic<T, R, N>(relation: &mut R, navigator: &N) -> Result<()>
where
    T: Hash + Eq + Clone + Debug,
    R: Relation<T> + ?Sized,
    N: Navigator<T> + ?Sized,
{
    let order = topological_order(navigator)?;
    let mut path_lengths: OrderMap<T, usize> = OrderMap::with_capacity(order.len());

    // objects before their subjects
    for subject in order.into_iter().rev() {
        let related = navigator.related(&subject);
        let longest = related
            .iter()
            .map(|object| (object, path_lengths.get(object).copied().unwrap_or(0)))
            .fold(None, |best: Option<(&T, usize)>, (object, length)| match best {
                Some((_, best_length)) if best_length >= length => best,
                _ => Some((object, length)),
            });

        let length = longest.map_or(0, |(_, length)| length + 1);
        if let Some((first, _)) = longest {
            relation.relate(subject.clone(), first.clone())?;
            for object in &related {
                relation.relate(subject.clone(), object.clone())?;
            }
        }
        path_lengths.insert(subject, length);
    }
    Ok(())
}
