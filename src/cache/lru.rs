//! LRU List Module
//!
//! Recency ordering for cache eviction, stored as an arena-backed
//! doubly-linked list.
//!
//! Nodes live in a `Vec` and link to each other by slot index rather than by
//! pointer. Removed slots are threaded onto a free list and reused, so every
//! operation is O(1) and no `unsafe` is needed.

/// Null link.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<T> {
    item: T,
    prev: usize,
    next: usize,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: usize },
}

// == LRU List ==
/// Doubly-linked recency list.
///
/// - Front (head) = most recently used
/// - Back (tail) = least recently used, the eviction candidate
#[derive(Debug)]
pub struct LruList<T> {
    slots: Vec<Slot<T>>,
    head: usize,
    tail: usize,
    free: usize,
    len: usize,
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LruList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts `item` as most recently used and returns its slot index.
    pub fn push_front(&mut self, item: T) -> usize {
        let node = Node {
            item,
            prev: NIL,
            next: NIL,
        };
        let idx = if self.free != NIL {
            let idx = self.free;
            if let Slot::Vacant { next_free } = self.slots[idx] {
                self.free = next_free;
            }
            self.slots[idx] = Slot::Occupied(node);
            idx
        } else {
            self.slots.push(Slot::Occupied(node));
            self.slots.len() - 1
        };
        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Remove ==
    /// Unlinks the node at `idx` and returns its item.
    ///
    /// Returns None if the slot is vacant or out of range.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.is_occupied(idx) {
            return None;
        }
        self.unlink(idx);
        let slot = std::mem::replace(
            &mut self.slots[idx],
            Slot::Vacant {
                next_free: self.free,
            },
        );
        self.free = idx;
        self.len -= 1;
        match slot {
            Slot::Occupied(node) => Some(node.item),
            Slot::Vacant { .. } => None,
        }
    }

    // == Touch ==
    /// Marks the node at `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if !self.is_occupied(idx) || self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Accessors ==
    /// Index of the most recently used node.
    pub fn front(&self) -> Option<usize> {
        (self.head != NIL).then_some(self.head)
    }

    /// Index of the least recently used node.
    pub fn back(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    /// Index of the node one step more recent than `idx`.
    pub fn prev(&self, idx: usize) -> Option<usize> {
        self.node(idx).map(|n| n.prev).filter(|&p| p != NIL)
    }

    /// Index of the node one step less recent than `idx`.
    pub fn next(&self, idx: usize) -> Option<usize> {
        self.node(idx).map(|n| n.next).filter(|&n| n != NIL)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.node(idx).map(|n| &n.item)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        match self.slots.get_mut(idx) {
            Some(Slot::Occupied(node)) => Some(&mut node.item),
            _ => None,
        }
    }

    /// Number of arena slots, occupied or not. Valid indices are below this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every node and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
        self.len = 0;
    }

    /// Iterates items from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Internal Linking ==
    fn node(&self, idx: usize) -> Option<&Node<T>> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        match &mut self.slots[idx] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked slot {idx} is vacant"),
        }
    }

    fn is_occupied(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Slot::Occupied(_)))
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.node_mut(old_head).prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev, node.next)
        };
        if prev != NIL {
            self.node_mut(prev).next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.node_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }
        let node = self.node_mut(idx);
        node.prev = NIL;
        node.next = NIL;
    }
}

// == Iterator ==
/// Most-to-least recently used iterator over list items.
pub struct Iter<'a, T> {
    list: &'a LruList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor;
        let node = self.list.node(idx)?;
        self.cursor = node.next;
        Some((idx, &node.item))
    }
}
