//! Order-maintenance list.
//!
//! Positions carry signed 64-bit tags so that any two of them compare in O(1).
//! Insertion takes the midpoint of the neighbouring tags; when the neighbours
//! are adjacent integers, the smallest enclosing tag window that is sparse
//! enough gets evenly relabeled first (Bender et al., "Two Simplified
//! Algorithms for Maintaining Order in a List", 2002). Relabeling rewrites tags
//! but never the relative order of existing positions.
use std::cmp::Ordering;
use std::iter::FusedIterator;

use tracing::debug;

use crate::error::{Error, Result};

/// Slot index of the sentinel.
const BASE: u32 = 0;
/// Usable tag bits; the rest is headroom for the sign and the sentinel.
const TAG_BITS: u32 = 62;

/// Handle to a slot of an [`OrderList`]. Only meaningful for the list that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    tag: i64,
    prev: u32,
    next: u32,
    /// Bumped on delete so stale handles stop validating once the slot is reused.
    generation: u32,
    live: bool,
    /// `None` only for the sentinel and for free slots.
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub struct OrderList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    max_len: usize,
}

impl<T> Default for OrderList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderList<T> {
    /// Every slot index fits a `u32`; one of them is the sentinel.
    pub const MAX_LEN: usize = u32::MAX as usize - 1;

    pub fn new() -> Self {
        Self::with_max_len(Self::MAX_LEN)
    }

    /// Creates a list that refuses to grow past `max_len` positions (clamped to [`Self::MAX_LEN`]).
    pub fn with_max_len(max_len: usize) -> Self {
        let base = Slot {
            tag: i64::MIN,
            prev: BASE,
            next: BASE,
            generation: 0,
            live: true,
            value: None,
        };
        Self {
            slots: vec![base],
            free: Vec::new(),
            len: 0,
            max_len: max_len.min(Self::MAX_LEN),
        }
    }

    /// The sentinel. It precedes every other position and can never be deleted.
    pub fn base(&self) -> Position {
        Position { slot: BASE, generation: 0 }
    }

    /// Number of positions, not counting the sentinel.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_valid(&self, position: Position) -> bool {
        self.slots
            .get(position.slot as usize)
            .is_some_and(|s| s.live && s.generation == position.generation)
    }

    /// `true` iff `p` comes strictly before `q`. Deleted positions compare by their last tag.
    pub fn precedes(&self, p: Position, q: Position) -> bool {
        self.tag(p) < self.tag(q)
    }

    pub(crate) fn compare(&self, p: Position, q: Position) -> Ordering {
        if p == q {
            Ordering::Equal
        } else {
            self.tag(p).cmp(&self.tag(q))
        }
    }

    pub fn next(&self, position: Position) -> Result<Position> {
        let slot = self.checked(position)?;
        Ok(self.position_at(self.slots[slot].next))
    }

    pub fn previous(&self, position: Position) -> Result<Position> {
        let slot = self.checked(position)?;
        Ok(self.position_at(self.slots[slot].prev))
    }

    pub fn get(&self, position: Position) -> Result<&T> {
        let slot = self.checked(position)?;
        self.slots[slot].value.as_ref().ok_or(Error::SentinelAccess)
    }

    /// Replaces the value at `position`, returning the previous one.
    pub fn set(&mut self, position: Position, value: T) -> Result<T> {
        let slot = self.checked(position)?;
        if slot == BASE as usize {
            return Err(Error::SentinelAccess);
        }
        self.slots[slot].value.replace(value).ok_or(Error::SentinelAccess)
    }

    /// Inserts `value` immediately after `position`.
    pub fn add_after(&mut self, position: Position, value: T) -> Result<Position> {
        let at = self.checked(position)? as u32;
        if self.len >= self.max_len {
            return Err(Error::CapacityExceeded { limit: self.max_len });
        }

        let tag = if self.len == 0 {
            0
        } else {
            // Wrapping catches the tail sitting at i64::MAX: its successor is the base at i64::MIN.
            if self.tag_at(at).wrapping_add(1) == self.tag_at(self.slots[at as usize].next) {
                self.relabel(at);
            }
            let low = self.tag_at(at);
            let next = self.slots[at as usize].next;
            if next == BASE {
                if low == i64::MAX - 1 {
                    i64::MAX
                } else {
                    midpoint(low, i64::MAX)
                }
            } else {
                midpoint(low, self.tag_at(next))
            }
        };

        let next = self.slots[at as usize].next;
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.tag = tag;
                slot.prev = at;
                slot.next = next;
                slot.live = true;
                slot.value = Some(value);
                index
            }
            None => {
                self.slots.push(Slot {
                    tag,
                    prev: at,
                    next,
                    generation: 0,
                    live: true,
                    value: Some(value),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.slots[at as usize].next = index;
        self.slots[next as usize].prev = index;
        self.len += 1;
        Ok(self.position_at(index))
    }

    /// Unlinks `position`. Returns `false` if it was already deleted or is the base.
    pub fn delete(&mut self, position: Position) -> bool {
        if position.slot == BASE || !self.is_valid(position) {
            return false;
        }
        let index = position.slot as usize;
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        self.slots[prev as usize].next = next;
        self.slots[next as usize].prev = prev;

        let slot = &mut self.slots[index];
        slot.live = false;
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(position.slot);
        self.len -= 1;
        true
    }

    /// Values in list order. Each call starts from the front again.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { list: self, cursor: BASE }
    }

    /// Positions in list order, excluding the base.
    pub fn positions(&self) -> Positions<'_, T> {
        Positions { list: self, cursor: BASE }
    }

    fn checked(&self, position: Position) -> Result<usize> {
        if self.is_valid(position) {
            Ok(position.slot as usize)
        } else {
            Err(Error::InvalidNode)
        }
    }

    fn position_at(&self, slot: u32) -> Position {
        Position {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    fn tag(&self, position: Position) -> i64 {
        self.slots.get(position.slot as usize).map_or(i64::MIN, |s| s.tag)
    }

    fn tag_at(&self, slot: u32) -> i64 {
        self.slots[slot as usize].tag
    }

    /// Finds the smallest enclosing tag window around `at` that is sparse enough and
    /// spreads its positions evenly across it. Afterwards `at` and its successor are
    /// at least two tags apart.
    fn relabel(&mut self, at: u32) {
        let tag = self.tag_at(at);
        let density = ((1u64 << TAG_BITS) as f64 / self.len as f64).powf(1.0 / f64::from(TAG_BITS));

        let mut count: usize = 1;
        let (mut left, mut right) = (at, at);
        let (mut low, mut high) = (tag, tag);
        let mut level = 0;
        let mut threshold = 1.0;
        let mut range: i64 = 1;
        loop {
            let bit = 1i64 << level;
            level += 1;
            threshold /= density;
            range <<= 1;

            if tag & bit != 0 {
                low ^= bit;
                while self.tag_at(left) > low {
                    left = self.slots[left as usize].prev;
                    count += 1;
                }
            } else {
                high ^= bit;
                // stop at the tail rather than wrapping onto the base
                while self.tag_at(right) < high
                    && self.tag_at(self.slots[right as usize].next) > self.tag_at(right)
                {
                    right = self.slots[right as usize].next;
                    count += 1;
                }
            }

            if (count as f64) < range as f64 * threshold || level >= TAG_BITS {
                break;
            }
        }

        // the base keeps i64::MIN
        if left == BASE && low != i64::MIN {
            left = self.slots[BASE as usize].next;
            count -= 1;
        }

        let step = range / count as i64;
        debug!(level, count, range, step, "relabeling order list window");

        let mut cursor = left;
        if step > 1 {
            for i in 0..count as i64 {
                self.slots[cursor as usize].tag = low + i * step;
                cursor = self.slots[cursor as usize].next;
            }
        } else {
            // keep `at` and its successor apart by the leftover slack
            let slack = range - count as i64;
            let mut offset = 0;
            for _ in 0..count {
                self.slots[cursor as usize].tag = low + offset;
                offset += 1;
                if cursor == at {
                    offset += slack;
                }
                cursor = self.slots[cursor as usize].next;
            }
        }
    }
}

/// Overflow-free mean of two tags.
fn midpoint(x: i64, y: i64) -> i64 {
    (x & y) + (x ^ y) / 2
}

pub struct Iter<'a, T> {
    list: &'a OrderList<T>,
    cursor: u32,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            let next = self.list.slots[self.cursor as usize].next;
            if next == BASE {
                return None;
            }
            self.cursor = next;
            if let Some(value) = self.list.slots[next as usize].value.as_ref() {
                return Some(value);
            }
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a OrderList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub struct Positions<'a, T> {
    list: &'a OrderList<T>,
    cursor: u32,
}

impl<T> Iterator for Positions<'_, T> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        let next = self.list.slots[self.cursor as usize].next;
        if next == BASE {
            return None;
        }
        self.cursor = next;
        Some(self.list.position_at(next))
    }
}

impl<T> FusedIterator for Positions<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOTAL: usize = 20_480;

    fn assert_ascending<T>(list: &OrderList<T>) {
        let mut last = i64::MIN;
        for position in list.positions() {
            let tag = list.tag(position);
            assert!(last < tag, "tags out of order: {last} then {tag}");
            last = tag;
        }
        assert_eq!(list.tag(list.base()), i64::MIN);
    }

    fn fill(choose: impl Fn(&mut StdRng, &[Position]) -> Position) {
        let mut rng = StdRng::seed_from_u64(0);
        let mut list = OrderList::new();
        let mut positions = vec![list.base()];
        for i in 0..TOTAL {
            let at = choose(&mut rng, &positions);
            positions.push(list.add_after(at, i).unwrap());
        }
        assert_eq!(list.len(), TOTAL);
        assert_ascending(&list);
        for position in list.positions() {
            let prev = list.previous(position).unwrap();
            assert!(list.precedes(prev, position));
        }
    }

    #[test]
    fn insert_always_after_base() {
        fill(|_, positions| positions[0]);
    }

    #[test]
    fn insert_always_at_tail() {
        fill(|_, positions| positions[positions.len() - 1]);
    }

    #[test]
    fn insert_at_random_positions() {
        fill(|rng, positions| positions[rng.gen_range(0..positions.len())]);
    }

    #[test]
    fn random_inserts_keep_values_in_list_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut list = OrderList::new();
        let mut model: Vec<usize> = Vec::new();
        let mut positions = vec![list.base()];
        for i in 0..2_000 {
            let k = rng.gen_range(0..positions.len());
            positions.insert(k + 1, list.add_after(positions[k], i).unwrap());
            model.insert(k, i);
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), model);
    }

    #[test]
    fn relabels_around_adjacent_tags() {
        let mut list = OrderList::new();
        let b = list.base();
        let n0 = list.add_after(b, 0).unwrap();
        let n1 = list.add_after(n0, 1).unwrap();
        let n2 = list.add_after(n1, 2).unwrap();
        let n3 = list.add_after(n2, 3).unwrap();

        list.slots[n0.slot as usize].tag = -1;
        list.slots[n1.slot as usize].tag = 0;
        list.slots[n2.slot as usize].tag = 1;
        list.slots[n3.slot as usize].tag = 3;

        let n4 = list.add_after(n1, 4).unwrap();
        assert_ascending(&list);
        for (p, q) in [(b, n0), (n0, n1), (n1, n4), (n4, n2), (n2, n3)] {
            assert!(list.precedes(p, q));
            assert!(!list.precedes(q, p));
        }
    }

    #[test]
    fn relabels_when_tail_holds_max_tag() {
        let mut list = OrderList::new();
        let a = list.add_after(list.base(), 'a').unwrap();
        let z = list.add_after(a, 'z').unwrap();
        list.slots[z.slot as usize].tag = i64::MAX;

        let after = list.add_after(z, '!').unwrap();
        assert_ascending(&list);
        assert!(list.precedes(z, after));
        assert_eq!(list.iter().collect::<String>(), "az!");
    }

    #[test]
    fn navigation_and_len() {
        let mut list = OrderList::new();
        assert_eq!(list.len(), 0);

        let n1 = list.add_after(list.base(), 1).unwrap();
        let n2 = list.add_after(n1, 10).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.next(list.base()).unwrap(), n1);
        assert_eq!(list.next(n1).unwrap(), n2);
        assert_eq!(list.previous(list.base()).unwrap(), n2);
        assert_eq!(list.previous(n2).unwrap(), n1);

        assert!(list.delete(n1));
        assert_eq!(list.next(list.base()).unwrap(), n2);
        assert_eq!(list.previous(list.base()).unwrap(), n2);
        assert_eq!(list.next(n2).unwrap(), list.base());
        assert_eq!(list.previous(n2).unwrap(), list.base());
        assert_eq!(list.len(), 1);

        assert!(list.delete(n2));
        assert!(list.is_empty());
        assert_eq!(list.next(list.base()).unwrap(), list.base());
    }

    #[test]
    fn delete_invalidates_once() {
        let mut list = OrderList::new();
        let node = list.add_after(list.base(), ()).unwrap();
        assert!(list.is_valid(node));
        assert!(list.delete(node));
        assert!(!list.is_valid(node));
        assert!(!list.delete(node));
    }

    #[test]
    fn cannot_delete_base() {
        let mut list: OrderList<u8> = OrderList::new();
        assert!(!list.delete(list.base()));
        list.add_after(list.base(), 1).unwrap();
        assert!(!list.delete(list.base()));
        assert!(list.is_valid(list.base()));
    }

    #[test]
    fn stale_handle_stays_invalid_after_slot_reuse() {
        let mut list = OrderList::new();
        let old = list.add_after(list.base(), "old").unwrap();
        list.delete(old);
        let new = list.add_after(list.base(), "new").unwrap();
        assert_eq!(old.slot, new.slot);
        assert!(!list.is_valid(old));
        assert!(matches!(list.get(old), Err(Error::InvalidNode)));
        assert_eq!(*list.get(new).unwrap(), "new");
    }

    #[test]
    fn operations_on_deleted_position_fail() {
        let mut list = OrderList::new();
        let node = list.add_after(list.base(), 1).unwrap();
        list.delete(node);
        assert!(matches!(list.add_after(node, 2), Err(Error::InvalidNode)));
        assert!(matches!(list.set(node, 2), Err(Error::InvalidNode)));
        assert!(matches!(list.next(node), Err(Error::InvalidNode)));
        assert!(matches!(list.previous(node), Err(Error::InvalidNode)));
    }

    #[test]
    fn get_and_set_values() {
        let mut list = OrderList::new();
        let node = list.add_after(list.base(), "first").unwrap();
        assert_eq!(list.set(node, "second").unwrap(), "first");
        assert_eq!(*list.get(node).unwrap(), "second");
        assert!(matches!(list.get(list.base()), Err(Error::SentinelAccess)));
        assert!(matches!(list.set(list.base(), "x"), Err(Error::SentinelAccess)));
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let mut list = OrderList::with_max_len(2);
        let a = list.add_after(list.base(), 'a').unwrap();
        list.add_after(a, 'b').unwrap();
        assert!(matches!(
            list.add_after(a, 'c'),
            Err(Error::CapacityExceeded { limit: 2 })
        ));
        list.delete(a);
        assert!(list.add_after(list.base(), 'c').is_ok());
    }

    #[test]
    fn iteration_is_restartable() {
        let mut list = OrderList::new();
        let mut at = list.base();
        for c in "abc".chars() {
            at = list.add_after(at, c).unwrap();
        }
        assert_eq!(list.iter().collect::<String>(), "abc");
        assert_eq!((&list).into_iter().collect::<String>(), "abc");
        assert_eq!(list.positions().count(), 3);
    }

    #[test]
    fn iteration_skips_slots_without_a_value() {
        let mut list = OrderList::new();
        let a = list.add_after(list.base(), 'a').unwrap();
        let b = list.add_after(a, 'b').unwrap();
        list.add_after(b, 'c').unwrap();
        list.slots[b.slot as usize].value = None;
        assert_eq!(list.iter().collect::<String>(), "ac");
        assert_eq!(list.positions().count(), 3);
    }
}
