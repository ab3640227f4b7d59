//! Incrementally maintained transitive, reflexive relation.
//!
//! Every element owns a `[pre, post]` bracket of positions in one shared
//! [`OrderList`] and an [`IntervalSet`] holding the `pre` position of every
//! element that reaches it. `a` reaches `b` iff `b`'s set contains `a.pre`, so
//! a query is one binary search over `b`'s ranges. Relating two elements merges
//! the subject's set forward along direct edges until it hits elements that
//! already hold it.
use std::hash::Hash;

use ordermap::OrderSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::interval_set::IntervalSet;
use crate::navigator::Navigator;
use crate::order_list::{OrderList, Position};
use crate::Relation;

/// Where brackets of newly seen elements go in the shared list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Wrap a fresh object around a subject that has no outgoing edges yet and
    /// nest a fresh subject inside its object. Chains and trees built top-down or
    /// bottom-up then compress to few ranges.
    #[default]
    Nested,
    /// Always append at the tail.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationConfig {
    pub placement: Placement,
    /// Upper bound on list positions; every element takes two.
    pub max_positions: usize,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            max_positions: OrderList::<()>::MAX_LEN,
        }
    }
}

/// Payload of a list position: which element's bracket it opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Open(usize),
    Close(usize),
}

#[derive(Debug, Clone)]
struct Record {
    pre: Position,
    post: Position,
    /// Always holds `[pre, post]` plus the `pre` of every element reaching this one.
    reach: IntervalSet,
}

#[derive(Debug, Clone)]
pub struct TransitiveRelation<T> {
    list: OrderList<Bracket>,
    /// Stable order of first appearance: the index of a value is its record id.
    elements: OrderSet<T>,
    records: Vec<Record>,
    /// Direct successors per record id, deduplicated, in insertion order.
    direct: Vec<OrderSet<usize>>,
    config: RelationConfig,
}

impl<T: Eq + Hash> Default for TransitiveRelation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> TransitiveRelation<T> {
    pub fn new() -> Self {
        Self::with_config(RelationConfig::default())
    }

    pub fn with_config(config: RelationConfig) -> Self {
        Self {
            list: OrderList::with_max_len(config.max_positions),
            elements: OrderSet::new(),
            records: Vec::new(),
            direct: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &RelationConfig {
        &self.config
    }

    /// Number of distinct elements mentioned so far.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in order of first appearance.
    pub fn elements(&self) -> impl Iterator<Item = &T> + '_ {
        self.elements.iter()
    }

    /// Records `subject -> object`. Relating a value to itself is a no-op, as is
    /// repeating an edge. The closure is fully updated before this returns, and
    /// a failed call leaves the relation as it was.
    pub fn relate(&mut self, subject: T, object: T) -> Result<()> {
        if subject == object {
            return Ok(());
        }
        let subject_id = self.elements.get_index_of(&subject);
        let known_object = self.elements.get_index_of(&object);
        let new_values = usize::from(subject_id.is_none()) + usize::from(known_object.is_none());
        self.reserve_brackets(new_values)?;

        let object_id = match known_object {
            Some(id) => id,
            None => self.insert_object(object, subject_id)?,
        };
        let subject_id = match subject_id {
            Some(id) => id,
            None => self.insert_subject(subject, object_id)?,
        };

        self.propagate(subject_id, object_id);
        self.direct[subject_id].insert(object_id);
        Ok(())
    }

    /// `true` if the values are equal, or if both are known and `subject` transitively reaches `object`.
    pub fn are_related(&self, subject: &T, object: &T) -> bool {
        if subject == object {
            return true;
        }
        match (self.elements.get_index_of(subject), self.elements.get_index_of(object)) {
            (Some(s), Some(o)) => self.reaches(s, o),
            _ => false,
        }
    }

    pub fn are_directly_related(&self, subject: &T, object: &T) -> bool {
        if subject == object {
            return true;
        }
        match (self.elements.get_index_of(subject), self.elements.get_index_of(object)) {
            (Some(s), Some(o)) => self.direct[s].contains(&o),
            _ => false,
        }
    }

    /// Values `subject` was directly related to, in the order the edges were added.
    pub fn directly_related_with(&self, subject: &T) -> OrderSet<&T> {
        match self.elements.get_index_of(subject) {
            Some(id) => self.direct[id].iter().map(|&o| self.value(o)).collect(),
            None => OrderSet::new(),
        }
    }

    /// Read-only view of the direct edges.
    pub fn direct(&self) -> DirectNavigator<'_, T> {
        DirectNavigator { relation: self }
    }

    /// Number of disjoint ranges `value`'s closure is stored as.
    pub fn interval_count(&self, value: &T) -> Option<usize> {
        self.elements
            .get_index_of(value)
            .map(|id| self.records[id].reach.size() / 2)
    }

    fn value(&self, id: usize) -> &T {
        &self.elements[id]
    }

    fn reaches(&self, subject: usize, object: usize) -> bool {
        self.records[object]
            .reach
            .contains(&self.list, self.records[subject].pre)
    }

    fn insert_object(&mut self, value: T, subject: Option<usize>) -> Result<usize> {
        let id = self.records.len();
        let (pre, post) = match subject {
            Some(s) if self.config.placement == Placement::Nested && self.direct[s].is_empty() => {
                // nothing encloses `s` yet, so the new bracket can wrap it
                let Record { pre: s_pre, post: s_post, .. } = self.records[s];
                let before = self.list.previous(s_pre)?;
                let pre = self.list.add_after(before, Bracket::Open(id))?;
                let post = self.list.add_after(s_post, Bracket::Close(id))?;
                (pre, post)
            }
            _ => self.append_bracket(id)?,
        };
        self.push_record(value, pre, post)
    }

    fn insert_subject(&mut self, value: T, object: usize) -> Result<usize> {
        let id = self.records.len();
        let (pre, post) = match self.config.placement {
            Placement::Nested => {
                let anchor = self.list.previous(self.records[object].post)?;
                let pre = self.list.add_after(anchor, Bracket::Open(id))?;
                let post = self.list.add_after(pre, Bracket::Close(id))?;
                (pre, post)
            }
            Placement::Append => self.append_bracket(id)?,
        };
        self.push_record(value, pre, post)
    }

    fn append_bracket(&mut self, id: usize) -> Result<(Position, Position)> {
        let tail = self.list.previous(self.list.base())?;
        let pre = self.list.add_after(tail, Bracket::Open(id))?;
        let post = self.list.add_after(pre, Bracket::Close(id))?;
        Ok((pre, post))
    }

    /// Fails unless `brackets` more elements fit, two positions each.
    fn reserve_brackets(&self, brackets: usize) -> Result<()> {
        if self.list.len() + 2 * brackets > self.list.max_len() {
            return Err(Error::CapacityExceeded { limit: self.list.max_len() });
        }
        Ok(())
    }

    fn push_record(&mut self, value: T, pre: Position, post: Position) -> Result<usize> {
        let mut reach = IntervalSet::new();
        reach.add_interval(&self.list, pre, post)?;
        self.records.push(Record { pre, post, reach });
        self.direct.push(OrderSet::new());
        let (id, _) = self.elements.insert_full(value);
        Ok(id)
    }

    /// Merges `subject`'s closure into `object` and everything downstream of it.
    /// Elements already covering it are skipped along with their successors,
    /// which also ends the walk on cycles. Holding `subject.pre` is not enough
    /// to skip: an object wrapped around `subject` holds it from the start.
    fn propagate(&mut self, subject: usize, object: usize) {
        let reach = self.records[subject].reach.clone();
        let mut frontier = vec![object];
        let mut updated = 0usize;
        while let Some(id) = frontier.pop() {
            let record = &mut self.records[id];
            if record.reach.covers(&self.list, &reach) {
                continue;
            }
            record.reach.add_intervals(&self.list, &reach);
            updated += 1;
            trace!(element = id, ranges = record.reach.size() / 2, "merged closure");
            frontier.extend(self.direct[id].iter().copied());
        }
        debug!(subject, object, updated, "propagated new relationship");
    }
}

impl<T: Eq + Hash> Relation<T> for TransitiveRelation<T> {
    fn relate(&mut self, subject: T, object: T) -> Result<()> {
        TransitiveRelation::relate(self, subject, object)
    }

    fn are_related(&self, subject: &T, object: &T) -> bool {
        TransitiveRelation::are_related(self, subject, object)
    }
}

/// Navigator over the direct edges of a [`TransitiveRelation`].
#[derive(Debug, Clone, Copy)]
pub struct DirectNavigator<'a, T> {
    relation: &'a TransitiveRelation<T>,
}

impl<T: Eq + Hash + Clone> Navigator<T> for DirectNavigator<'_, T> {
    fn related(&self, subject: &T) -> OrderSet<T> {
        self.relation
            .directly_related_with(subject)
            .into_iter()
            .cloned()
            .collect()
    }

    fn domain(&self) -> OrderSet<T> {
        self.relation
            .direct
            .iter()
            .enumerate()
            .filter(|(_, objects)| !objects.is_empty())
            .map(|(id, _)| self.relation.value(id).clone())
            .collect()
    }
}
