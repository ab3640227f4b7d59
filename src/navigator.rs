//! Read-only views over direct relationships and the walks built on them.
use std::fmt::Debug;
use std::hash::Hash;

use ordermap::{OrderMap, OrderSet};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{Error, Result};

/// Direct relationships of some relation: what each subject points at.
pub trait Navigator<T> {
    /// Values directly related from `subject`; empty when it has none.
    fn related(&self, subject: &T) -> OrderSet<T>;

    /// Every subject with at least one related value.
    fn domain(&self) -> OrderSet<T>;
}

impl<T, N: Navigator<T> + ?Sized> Navigator<T> for &N {
    fn related(&self, subject: &T) -> OrderSet<T> {
        (**self).related(subject)
    }

    fn domain(&self) -> OrderSet<T> {
        (**self).domain()
    }
}

/// Navigator backed by a set-multimap. The domain is the key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapNavigator<T: Hash + Eq> {
    map: OrderMap<T, OrderSet<T>>,
}

impl<T: Hash + Eq> Default for MapNavigator<T> {
    fn default() -> Self {
        Self { map: OrderMap::new() }
    }
}

impl<T: Hash + Eq> MapNavigator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `subject -> object`. Returns `false` if the pair was already present.
    pub fn insert(&mut self, subject: T, object: T) -> bool {
        self.map.entry(subject).or_default().insert(object)
    }

    pub fn contains(&self, subject: &T, object: &T) -> bool {
        self.map.get(subject).is_some_and(|objects| objects.contains(object))
    }

    pub fn len(&self) -> usize {
        self.map.values().map(OrderSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.map
            .iter()
            .flat_map(|(subject, objects)| objects.iter().map(move |object| (subject, object)))
    }
}

impl<T: Hash + Eq> From<OrderMap<T, OrderSet<T>>> for MapNavigator<T> {
    fn from(map: OrderMap<T, OrderSet<T>>) -> Self {
        Self { map }
    }
}

impl<T: Hash + Eq> FromIterator<(T, T)> for MapNavigator<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let mut navigator = Self::new();
        for (subject, object) in iter {
            navigator.insert(subject, object);
        }
        navigator
    }
}

impl<T: Hash + Eq + Clone> Navigator<T> for MapNavigator<T> {
    fn related(&self, subject: &T) -> OrderSet<T> {
        self.map.get(subject).cloned().unwrap_or_default()
    }

    fn domain(&self) -> OrderSet<T> {
        self.map.keys().cloned().collect()
    }
}

/// Navigator over an explicit domain and a function producing related values.
/// The function must return an empty set outside the domain.
pub struct FnNavigator<T, F> {
    domain: OrderSet<T>,
    related: F,
}

impl<T, F> FnNavigator<T, F>
where
    F: Fn(&T) -> OrderSet<T>,
{
    pub fn new(domain: OrderSet<T>, related: F) -> Self {
        Self { domain, related }
    }
}

impl<T, F> Navigator<T> for FnNavigator<T, F>
where
    T: Clone,
    F: Fn(&T) -> OrderSet<T>,
{
    fn related(&self, subject: &T) -> OrderSet<T> {
        (self.related)(subject)
    }

    fn domain(&self) -> OrderSet<T> {
        self.domain.clone()
    }
}

/// Relationships found in either navigator.
pub struct Union<A, B>(A, B);

/// Relationships found in both navigators.
pub struct Intersection<A, B>(A, B);

/// Relationships of the first navigator missing from the second.
pub struct Difference<A, B>(A, B);

/// Every relationship reversed.
pub struct Inverse<N>(N);

pub fn union<A, B>(a: A, b: B) -> Union<A, B> {
    Union(a, b)
}

pub fn intersection<A, B>(a: A, b: B) -> Intersection<A, B> {
    Intersection(a, b)
}

pub fn difference<A, B>(a: A, b: B) -> Difference<A, B> {
    Difference(a, b)
}

pub fn inverse<N>(navigator: N) -> Inverse<N> {
    Inverse(navigator)
}

impl<T, A, B> Navigator<T> for Union<A, B>
where
    T: Hash + Eq,
    A: Navigator<T>,
    B: Navigator<T>,
{
    fn related(&self, subject: &T) -> OrderSet<T> {
        let mut related = self.0.related(subject);
        related.extend(self.1.related(subject));
        related
    }

    fn domain(&self) -> OrderSet<T> {
        let mut domain = self.0.domain();
        domain.extend(self.1.domain());
        domain
    }
}

impl<T, A, B> Navigator<T> for Intersection<A, B>
where
    T: Hash + Eq,
    A: Navigator<T>,
    B: Navigator<T>,
{
    fn related(&self, subject: &T) -> OrderSet<T> {
        let other = self.1.related(subject);
        let mut related = self.0.related(subject);
        related.retain(|object| other.contains(object));
        related
    }

    fn domain(&self) -> OrderSet<T> {
        let other = self.1.domain();
        let mut domain = self.0.domain();
        domain.retain(|subject| other.contains(subject) && !self.related(subject).is_empty());
        domain
    }
}

impl<T, A, B> Navigator<T> for Difference<A, B>
where
    T: Hash + Eq,
    A: Navigator<T>,
    B: Navigator<T>,
{
    fn related(&self, subject: &T) -> OrderSet<T> {
        let negative = self.1.related(subject);
        let mut related = self.0.related(subject);
        related.retain(|object| !negative.contains(object));
        related
    }

    fn domain(&self) -> OrderSet<T> {
        let mut domain = self.0.domain();
        domain.retain(|subject| !self.related(subject).is_empty());
        domain
    }
}

impl<T, N> Navigator<T> for Inverse<N>
where
    T: Hash + Eq + Clone,
    N: Navigator<T>,
{
    fn related(&self, object: &T) -> OrderSet<T> {
        self.0
            .domain()
            .into_iter()
            .filter(|subject| self.0.related(subject).contains(object))
            .collect()
    }

    fn domain(&self) -> OrderSet<T> {
        self.0
            .domain()
            .iter()
            .flat_map(|subject| self.0.related(subject))
            .collect()
    }
}

/// Everything reachable from `start`, `start` included.
pub fn closure<T, N>(navigator: &N, start: T) -> OrderSet<T>
where
    T: Hash + Eq + Clone,
    N: Navigator<T> + ?Sized,
{
    closure_of_many(navigator, [start])
}

/// Union of the closures of `starts`, walked once with shared bookkeeping.
pub fn closure_of_many<T, N, I>(navigator: &N, starts: I) -> OrderSet<T>
where
    T: Hash + Eq + Clone,
    N: Navigator<T> + ?Sized,
    I: IntoIterator<Item = T>,
{
    let mut closure = OrderSet::new();
    let mut to_explore: Vec<T> = starts.into_iter().collect();
    to_explore.reverse();
    while let Some(next) = to_explore.pop() {
        if closure.contains(&next) {
            continue;
        }
        to_explore.extend(navigator.related(&next).into_iter().rev());
        closure.insert(next);
    }
    closure
}

/// Orders every value mentioned by `navigator` so that subjects come before the
/// values they relate to. Fails if the relationships form a cycle.
pub fn topological_order<T, N>(navigator: &N) -> Result<Vec<T>>
where
    T: Hash + Eq + Clone + Debug,
    N: Navigator<T> + ?Sized,
{
    let (g, keys) = graph_of(navigator);
    match toposort(&g, None) {
        Ok(order) => Ok(order.into_iter().map(|ix| keys[ix.index()].clone()).collect()),
        Err(cycle) => Err(Error::Cycle {
            element: format!("{:?}", keys[cycle.node_id().index()]),
        }),
    }
}

/// Builds a petgraph over the navigator. Node `i` stands for `keys[i]`; keys are
/// numbered in order of first appearance while walking the domain.
pub(crate) fn graph_of<T, N>(navigator: &N) -> (DiGraph<(), ()>, OrderSet<T>)
where
    T: Hash + Eq + Clone,
    N: Navigator<T> + ?Sized,
{
    let mut keys = OrderSet::new();
    let mut edges = Vec::new();
    for subject in navigator.domain() {
        let related = navigator.related(&subject);
        let (u, _) = keys.insert_full(subject);
        for object in related {
            let (v, _) = keys.insert_full(object);
            edges.push((u, v));
        }
    }

    let mut g: DiGraph<(), ()> = DiGraph::with_capacity(keys.len(), edges.len());
    for _ in 0..keys.len() {
        g.add_node(());
    }
    for (u, v) in edges {
        g.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }
    (g, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sorted<T: Ord>(set: OrderSet<T>) -> Vec<T> {
        let mut v: Vec<T> = set.into_iter().collect();
        v.sort();
        v
    }

    fn nav(edges: &[(u32, u32)]) -> MapNavigator<u32> {
        edges.iter().copied().collect()
    }

    #[test]
    fn map_navigator_deduplicates() {
        let mut n = MapNavigator::new();
        assert!(n.insert(1, 2));
        assert!(!n.insert(1, 2));
        assert!(n.insert(1, 3));
        assert_eq!(n.len(), 2);
        assert!(n.contains(&1, &3));
        assert!(!n.contains(&3, &1));
        assert_eq!(sorted(n.related(&1)), vec![2, 3]);
        assert!(n.related(&9).is_empty());
        assert_eq!(n.iter().collect::<Vec<_>>(), vec![(&1, &2), (&1, &3)]);
    }

    #[test]
    fn fn_navigator_uses_the_function() {
        let domain: OrderSet<u32> = (1..5).collect();
        let n = FnNavigator::new(domain, |&x: &u32| {
            if (1..5).contains(&x) {
                [x * 2].into_iter().collect()
            } else {
                OrderSet::new()
            }
        });
        assert_eq!(sorted(n.related(&3)), vec![6]);
        assert!(n.related(&8).is_empty());
        assert_eq!(sorted(closure(&n, 1)), vec![1, 2, 4, 8]);
    }

    #[test]
    fn set_algebra() {
        let a = nav(&[(1, 2), (1, 3), (2, 3)]);
        let b = nav(&[(1, 3), (3, 4)]);

        let u = union(&a, &b);
        assert_eq!(sorted(u.related(&1)), vec![2, 3]);
        assert_eq!(sorted(u.domain()), vec![1, 2, 3]);

        let i = intersection(&a, &b);
        assert_eq!(sorted(i.related(&1)), vec![3]);
        assert!(i.related(&2).is_empty());
        assert_eq!(sorted(i.domain()), vec![1]);

        let d = difference(&a, &b);
        assert_eq!(sorted(d.related(&1)), vec![2]);
        assert_eq!(sorted(d.domain()), vec![1, 2]);

        let d = difference(&b, &a);
        assert_eq!(sorted(d.domain()), vec![3]);
    }

    #[test]
    fn inverse_reverses_edges() {
        let a = nav(&[(1, 2), (1, 3), (2, 3)]);
        let inv = inverse(&a);
        assert_eq!(sorted(inv.related(&3)), vec![1, 2]);
        assert_eq!(sorted(inv.related(&2)), vec![1]);
        assert!(inv.related(&1).is_empty());
        assert_eq!(sorted(inv.domain()), vec![2, 3]);
    }

    #[test]
    fn closures_include_their_seeds() {
        let a = nav(&[(1, 2), (2, 3), (3, 1), (4, 5)]);
        assert_eq!(sorted(closure(&a, 2)), vec![1, 2, 3]);
        assert_eq!(sorted(closure(&a, 9)), vec![9]);
        assert_eq!(sorted(closure_of_many(&a, [4, 3])), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn topological_order_respects_edges() {
        let edges = [(1, 2), (1, 3), (3, 4), (2, 4), (5, 1)];
        let order = topological_order(&nav(&edges)).unwrap();
        assert_eq!(order.len(), 5);
        let at = |x: u32| order.iter().position(|&y| y == x).unwrap();
        for (s, o) in edges {
            assert!(at(s) < at(o), "{s} must come before {o} in {order:?}");
        }
    }

    #[test]
    fn topological_order_rejects_cycles() {
        let err = topological_order(&nav(&[(1, 2), (2, 3), (3, 2)])).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
    }
}
