use std::hash::Hash;

use crate::error::Result;
use crate::navigator::MapNavigator;
use crate::relation::{DirectNavigator, RelationConfig, TransitiveRelation};
use crate::Relation;

/// A [`TransitiveRelation`] that also remembers its direct edges reversed, so
/// both directions can be navigated.
#[derive(Debug, Clone)]
pub struct TransitiveBiRelation<T: Hash + Eq> {
    relation: TransitiveRelation<T>,
    inverse_edges: MapNavigator<T>,
}

impl<T: Hash + Eq + Clone> Default for TransitiveBiRelation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> TransitiveBiRelation<T> {
    pub fn new() -> Self {
        Self::with_config(RelationConfig::default())
    }

    pub fn with_config(config: RelationConfig) -> Self {
        Self {
            relation: TransitiveRelation::with_config(config),
            inverse_edges: MapNavigator::new(),
        }
    }

    pub fn relate(&mut self, subject: T, object: T) -> Result<()> {
        if subject == object {
            return Ok(());
        }
        self.relation.relate(subject.clone(), object.clone())?;
        self.inverse_edges.insert(object, subject);
        Ok(())
    }

    pub fn are_related(&self, subject: &T, object: &T) -> bool {
        self.relation.are_related(subject, object)
    }

    pub fn direct(&self) -> DirectNavigator<'_, T> {
        self.relation.direct()
    }

    /// The forward relation on its own.
    pub fn as_relation(&self) -> &TransitiveRelation<T> {
        &self.relation
    }

    /// Read-only view with every pair reversed.
    pub fn inverse(&self) -> InverseRelation<'_, T> {
        InverseRelation { forward: self }
    }

    /// View with every pair reversed; relating `a -> b` through it records `b -> a`.
    pub fn inverse_mut(&mut self) -> InverseRelationMut<'_, T> {
        InverseRelationMut { forward: self }
    }
}

impl<T: Hash + Eq + Clone> Relation<T> for TransitiveBiRelation<T> {
    fn relate(&mut self, subject: T, object: T) -> Result<()> {
        TransitiveBiRelation::relate(self, subject, object)
    }

    fn are_related(&self, subject: &T, object: &T) -> bool {
        TransitiveBiRelation::are_related(self, subject, object)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InverseRelation<'a, T: Hash + Eq> {
    forward: &'a TransitiveBiRelation<T>,
}

impl<'a, T: Hash + Eq + Clone> InverseRelation<'a, T> {
    pub fn are_related(&self, subject: &T, object: &T) -> bool {
        self.forward.are_related(object, subject)
    }

    /// Direct edges reversed.
    pub fn direct(&self) -> &'a MapNavigator<T> {
        &self.forward.inverse_edges
    }

    pub fn inverse(&self) -> &'a TransitiveBiRelation<T> {
        self.forward
    }
}

#[derive(Debug)]
pub struct InverseRelationMut<'a, T: Hash + Eq> {
    forward: &'a mut TransitiveBiRelation<T>,
}

impl<T: Hash + Eq + Clone> Relation<T> for InverseRelationMut<'_, T> {
    fn relate(&mut self, subject: T, object: T) -> Result<()> {
        self.forward.relate(object, subject)
    }

    fn are_related(&self, subject: &T, object: &T) -> bool {
        self.forward.are_related(object, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::Navigator;
    use crate::merge;
    use pretty_assertions::assert_eq;

    #[test]
    fn inverse_mirrors_the_forward_relation() {
        let mut r = TransitiveBiRelation::new();
        r.relate("cat", "mammal").unwrap();
        r.relate("mammal", "animal").unwrap();
        r.relate("dog", "mammal").unwrap();

        let inv = r.inverse();
        assert!(inv.are_related(&"animal", &"cat"));
        assert!(!inv.are_related(&"cat", &"animal"));

        let mut below: Vec<_> = inv.direct().related(&"mammal").into_iter().collect();
        below.sort();
        assert_eq!(below, vec!["cat", "dog"]);
        assert_eq!(inv.direct().related(&"animal").len(), 1);
        assert!(inv.inverse().are_related(&"cat", &"animal"));
        assert!(r.direct().related(&"cat").contains(&"mammal"));
    }

    #[test]
    fn relating_through_the_inverse_reverses_the_pair() {
        let mut r = TransitiveBiRelation::new();
        r.inverse_mut().relate(1, 2).unwrap();
        assert!(r.are_related(&2, &1));
        assert!(!r.are_related(&1, &2));
        assert!(r.inverse().direct().contains(&1, &2));
    }

    #[test]
    fn self_pairs_leave_no_inverse_edge() {
        let mut r = TransitiveBiRelation::new();
        r.relate(3, 3).unwrap();
        assert!(r.inverse().direct().is_empty());
        assert!(r.as_relation().is_empty());
    }

    #[test]
    fn loaders_accept_the_inverse_view() {
        let edges: crate::navigator::MapNavigator<u8> = [(1, 2), (2, 3)].into_iter().collect();
        let mut r = TransitiveBiRelation::new();
        merge(&mut r.inverse_mut(), &edges).unwrap();
        assert!(r.are_related(&3, &1));
        assert!(r.inverse().are_related(&1, &3));
    }
}
