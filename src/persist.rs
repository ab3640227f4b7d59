//! Persisted form of a relation: its direct edges only. Loading replays
//! `relate` for every edge in the stored order.
use std::hash::Hash;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::relation::{RelationConfig, TransitiveRelation};

/// One subject and everything it is directly related to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEntry<T> {
    pub subject: T,
    pub related: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeList<T>(pub Vec<EdgeEntry<T>>);

impl<T> EdgeList<T> {
    /// Every stored pair, in replay order.
    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.0
            .iter()
            .flat_map(|entry| entry.related.iter().map(move |object| (&entry.subject, object)))
    }
}

impl<T: Eq + Hash> TransitiveRelation<T> {
    fn borrowed_edge_list(&self) -> EdgeList<&T> {
        EdgeList(
            self.elements()
                .filter_map(|subject| {
                    let related: Vec<&T> = self.directly_related_with(subject).into_iter().collect();
                    (!related.is_empty()).then_some(EdgeEntry { subject, related })
                })
                .collect(),
        )
    }

    pub fn to_edge_list(&self) -> EdgeList<T>
    where
        T: Clone,
    {
        let EdgeList(entries) = self.borrowed_edge_list();
        EdgeList(
            entries
                .into_iter()
                .map(|entry| EdgeEntry {
                    subject: entry.subject.clone(),
                    related: entry.related.into_iter().cloned().collect(),
                })
                .collect(),
        )
    }

    pub fn from_edge_list(edges: EdgeList<T>) -> Result<Self>
    where
        T: Clone,
    {
        Self::from_edge_list_with_config(edges, RelationConfig::default())
    }

    pub fn from_edge_list_with_config(edges: EdgeList<T>, config: RelationConfig) -> Result<Self>
    where
        T: Clone,
    {
        let mut relation = Self::with_config(config);
        for EdgeEntry { subject, related } in edges.0 {
            for object in related {
                relation.relate(subject.clone(), object)?;
            }
        }
        Ok(relation)
    }

    pub fn to_json(&self) -> Result<String>
    where
        T: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json<'de>(json: &'de str) -> Result<Self>
    where
        T: Clone + Deserialize<'de>,
    {
        let edges: EdgeList<T> = serde_json::from_str(json)?;
        Self::from_edge_list(edges)
    }
}

impl<T: Eq + Hash + Serialize> Serialize for TransitiveRelation<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.borrowed_edge_list().serialize(serializer)
    }
}

impl<'de, T: Eq + Hash + Clone + Deserialize<'de>> Deserialize<'de> for TransitiveRelation<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let edges = EdgeList::<T>::deserialize(deserializer)?;
        Self::from_edge_list(edges).map_err(D::Error::custom)
    }
}
