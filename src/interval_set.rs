//! Sets of list positions stored as sorted, disjoint closed ranges.
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::order_list::{OrderList, Position};

/// A set of positions of one [`OrderList`], kept as `[pre, post, pre, post, ...]`
/// in list order. Every method takes the list the positions belong to, since
/// only the list can compare them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    bounds: Vec<Position>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored boundaries, twice the number of ranges.
    pub fn size(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Stored ranges in list order.
    pub fn ranges(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.bounds.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Adds the closed range `[pre, post]`, coalescing it with every stored
    /// range it overlaps or shares a boundary with.
    pub fn add_interval<T>(&mut self, list: &OrderList<T>, pre: Position, post: Position) -> Result<()> {
        if !list.precedes(pre, post) {
            return Err(Error::InvalidInterval);
        }
        self.merge(list, pre, post);
        Ok(())
    }

    pub fn add_intervals<T>(&mut self, list: &OrderList<T>, other: &IntervalSet) {
        for (pre, post) in other.ranges() {
            self.merge(list, pre, post);
        }
    }

    /// `true` iff `position` is a stored boundary or lies strictly inside a stored range.
    pub fn contains<T>(&self, list: &OrderList<T>, position: Position) -> bool {
        match self.search(list, position) {
            Ok(_) => true,
            Err(i) => i % 2 == 1,
        }
    }

    /// `true` iff every range of `other` lies within a single range of `self`.
    pub fn covers<T>(&self, list: &OrderList<T>, other: &IntervalSet) -> bool {
        other.ranges().all(|(pre, post)| {
            let low = match self.search(list, pre) {
                Ok(i) if i % 2 == 0 => i,
                Err(i) if i % 2 == 1 => i - 1,
                _ => return false,
            };
            list.compare(post, self.bounds[low + 1]) != Ordering::Greater
        })
    }

    fn search<T>(&self, list: &OrderList<T>, position: Position) -> std::result::Result<usize, usize> {
        self.bounds.binary_search_by(|probe| list.compare(*probe, position))
    }

    fn merge<T>(&mut self, list: &OrderList<T>, mut pre: Position, mut post: Position) {
        // an odd index means the boundary falls inside (or on the post of) a stored range
        let start = match self.search(list, pre) {
            Ok(i) | Err(i) if i % 2 == 1 => {
                pre = self.bounds[i - 1];
                i - 1
            }
            Ok(i) | Err(i) => i,
        };
        let end = match self.search(list, post) {
            Ok(i) if i % 2 == 0 => {
                // touches the pre of the next range
                post = self.bounds[i + 1];
                i + 2
            }
            Ok(i) | Err(i) if i % 2 == 1 => {
                post = self.bounds[i];
                i + 1
            }
            Ok(i) | Err(i) => i,
        };

        if end == start + 2 {
            // replaces exactly one range
            self.bounds[start] = pre;
            self.bounds[start + 1] = post;
            return;
        }

        let new_len = self.bounds.len() + 2 - (end - start);
        let capacity = new_len.next_power_of_two();
        if self.bounds.capacity() < new_len {
            self.bounds.reserve_exact(capacity - self.bounds.len());
        }
        self.bounds.splice(start..end, [pre, post]);
        if self.bounds.capacity() > capacity {
            self.bounds.shrink_to(capacity);
        }
    }
}
