// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recency ordering for LRU eviction.
//!
//! The list is a doubly-linked list laid out in a slab: links are slot indices rather
//! than references, so unlinking from the middle and appending at the tail are plain
//! index rewrites. Freed slots are chained into a free list and reused by later pushes.

/// Index of a slot in the recency slab.
///
/// An index stays valid from [`RecencyList::push_back`] until the key is removed; after
/// that the slot may be handed to a different key.
pub type NodeIndex = usize;

#[derive(Debug)]
struct RecencyNode<K> {
    /// `None` while the slot sits in the free list.
    key: Option<K>,
    prev: Option<NodeIndex>,
    next: Option<NodeIndex>,
}

/// Keys ordered from least to most recently used.
///
/// # Examples
///
/// ```
/// use stratum_memory::RecencyList;
///
/// let mut list = RecencyList::new();
/// let a = list.push_back("a");
/// list.push_back("b");
///
/// list.move_to_back(a);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), ["b", "a"]);
/// assert_eq!(list.pop_front(), Some("b"));
/// ```
#[derive(Debug)]
pub struct RecencyList<K> {
    nodes: Vec<RecencyNode<K>>,

    /// Least recently used.
    head: Option<NodeIndex>,

    /// Most recently used.
    tail: Option<NodeIndex>,

    /// Free list head for recycling slots.
    free_head: Option<NodeIndex>,

    len: usize,
}

impl<K> Default for RecencyList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RecencyList<K> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` keys before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    /// Returns the number of keys in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `key` as the most recently used and returns its slot.
    pub fn push_back(&mut self, key: K) -> NodeIndex {
        let index = self.allocate(key);
        self.link_back(index);
        self.len += 1;
        index
    }

    /// Marks the key in `index` as the most recently used.
    ///
    /// Does nothing if the slot is free.
    pub fn move_to_back(&mut self, index: NodeIndex) {
        if !self.is_occupied(index) || self.tail == Some(index) {
            return;
        }
        self.unlink(index);
        self.link_back(index);
    }

    /// Removes the key in `index` and frees the slot.
    ///
    /// Returns `None` if the slot is already free.
    pub fn remove(&mut self, index: NodeIndex) -> Option<K> {
        if !self.is_occupied(index) {
            return None;
        }
        self.unlink(index);

        let node = &mut self.nodes[index];
        let key = node.key.take();
        node.next = self.free_head;
        self.free_head = Some(index);
        self.len -= 1;
        key
    }

    /// Returns the least recently used key.
    #[must_use]
    pub fn front(&self) -> Option<&K> {
        self.head.and_then(|index| self.get(index))
    }

    /// Returns the most recently used key.
    #[must_use]
    pub fn back(&self) -> Option<&K> {
        self.tail.and_then(|index| self.get(index))
    }

    /// Removes and returns the least recently used key.
    pub fn pop_front(&mut self) -> Option<K> {
        let index = self.head?;
        self.remove(index)
    }

    /// Returns the key stored in `index`, if the slot is occupied.
    #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&K> {
        self.nodes.get(index).and_then(|node| node.key.as_ref())
    }

    /// Iterates keys from least to most recently used.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Removes every key and releases all slots.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        self.free_head = None;
        self.len = 0;
    }

    fn is_occupied(&self, index: NodeIndex) -> bool {
        self.get(index).is_some()
    }

    fn allocate(&mut self, key: K) -> NodeIndex {
        match self.free_head {
            Some(index) => {
                let node = &mut self.nodes[index];
                self.free_head = node.next;
                node.key = Some(key);
                node.prev = None;
                node.next = None;
                index
            }
            None => {
                self.nodes.push(RecencyNode {
                    key: Some(key),
                    prev: None,
                    next: None,
                });
                self.nodes.len() - 1
            }
        }
    }

    fn link_back(&mut self, index: NodeIndex) {
        self.nodes[index].prev = self.tail;
        self.nodes[index].next = None;
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    fn unlink(&mut self, index: NodeIndex) {
        let prev = self.nodes[index].prev.take();
        let next = self.nodes[index].next.take();
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }
}

/// Iterator over a [`RecencyList`], least recently used first.
#[derive(Debug)]
pub struct Iter<'a, K> {
    list: &'a RecencyList<K>,
    next: Option<NodeIndex>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let node = &self.list.nodes[index];
        self.next = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        node.key.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a RecencyList<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &RecencyList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn push_back_orders_oldest_first() {
        let mut list = RecencyList::new();
        list.push_back("a");
        list.push_back("b");
        list.push_back("c");

        assert_eq!(keys(&list), ["a", "b", "c"]);
        assert_eq!(list.front(), Some(&"a"));
        assert_eq!(list.back(), Some(&"c"));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn move_to_back_reorders() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        list.push_back("c");

        list.move_to_back(a);
        assert_eq!(keys(&list), ["b", "c", "a"]);

        // Already at the tail.
        list.move_to_back(a);
        assert_eq!(keys(&list), ["b", "c", "a"]);
    }

    #[test]
    fn remove_from_middle_relinks_neighbours() {
        let mut list = RecencyList::new();
        list.push_back("a");
        let b = list.push_back("b");
        list.push_back("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(keys(&list), ["a", "c"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_only_element_empties_list() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");

        assert_eq!(list.remove(a), Some("a"));
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        list.remove(a);

        let c = list.push_back("c");
        assert_eq!(c, a);
        assert_eq!(keys(&list), ["b", "c"]);
    }

    #[test]
    fn stale_index_is_ignored() {
        let mut list = RecencyList::new();
        let a = list.push_back("a");
        list.push_back("b");
        list.remove(a);

        assert_eq!(list.remove(a), None);
        list.move_to_back(a);
        assert_eq!(keys(&list), ["b"]);
        assert_eq!(list.remove(42), None);
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut list = RecencyList::new();
        for key in ["a", "b", "c"] {
            list.push_back(key);
        }

        assert_eq!(list.pop_front(), Some("a"));
        assert_eq!(list.pop_front(), Some("b"));
        assert_eq!(list.pop_front(), Some("c"));
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut list = RecencyList::new();
        list.push_back("a");
        list.push_back("b");
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.iter().len(), 0);
        assert_eq!(list.push_back("c"), 0);
    }
}
