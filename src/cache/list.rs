//! Slot List Module
//!
//! Arena-backed doubly-linked list used for the four ARC lists.

// == Slot Index ==
/// Index of a node inside a [`SlotList`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIdx(u32);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotIdx>,
    next: Option<SlotIdx>,
}

// == Slot List ==
/// Doubly-linked list whose nodes live in a slot arena and link by index.
///
/// - Front = least recently used
/// - Back = most recently used
///
/// Vacated slots are recycled through a free list. The arena grows on demand
/// and never shrinks.
#[derive(Debug)]
pub struct SlotList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<u32>,
    head: Option<SlotIdx>,
    tail: Option<SlotIdx>,
    len: usize,
}

impl<T> SlotList<T> {
    // == Constructor ==
    /// Creates an empty list without allocating.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Push Back ==
    /// Appends a value at the MRU end and returns its slot.
    pub fn push_back(&mut self, value: T) -> SlotIdx {
        let idx = self.alloc(Node {
            value,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(old_tail) => {
                if let Some(node) = self.node_mut(old_tail) {
                    node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
        idx
    }

    // == Pop Front ==
    /// Removes and returns the LRU value.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    // == Remove ==
    /// Unlinks the node at `idx` and returns its value.
    ///
    /// Returns None if the slot is vacant.
    pub fn remove(&mut self, idx: SlotIdx) -> Option<T> {
        let node = self.slots.get_mut(idx.0 as usize)?.take()?;
        self.unlink(node.prev, node.next);
        self.free.push(idx.0);
        self.len -= 1;
        Some(node.value)
    }

    // == Move To Back ==
    /// Moves the node at `idx` to the MRU end.
    pub fn move_to_back(&mut self, idx: SlotIdx) {
        if self.tail == Some(idx) {
            return;
        }
        let Some((prev, next)) = self.node(idx).map(|n| (n.prev, n.next)) else {
            return;
        };

        self.unlink(prev, next);

        let old_tail = self.tail;
        if let Some(tail) = old_tail {
            if let Some(node) = self.node_mut(tail) {
                node.next = Some(idx);
            }
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        }
        if self.head.is_none() {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
    }

    // == Accessors ==
    pub fn get(&self, idx: SlotIdx) -> Option<&T> {
        self.node(idx).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, idx: SlotIdx) -> Option<&mut T> {
        self.node_mut(idx).map(|n| &mut n.value)
    }

    /// Iterates from LRU to MRU.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    // -- Internal helpers --

    fn alloc(&mut self, node: Node<T>) -> SlotIdx {
        if let Some(free) = self.free.pop() {
            self.slots[free as usize] = Some(node);
            SlotIdx(free)
        } else {
            self.slots.push(Some(node));
            SlotIdx((self.slots.len() - 1) as u32)
        }
    }

    /// Joins `prev` and `next` around a node that is leaving its position.
    fn unlink(&mut self, prev: Option<SlotIdx>, next: Option<SlotIdx>) {
        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn node(&self, idx: SlotIdx) -> Option<&Node<T>> {
        self.slots.get(idx.0 as usize)?.as_ref()
    }

    fn node_mut(&mut self, idx: SlotIdx) -> Option<&mut Node<T>> {
        self.slots.get_mut(idx.0 as usize)?.as_mut()
    }
}

impl<T> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a [`SlotList`] from LRU to MRU.
pub struct Iter<'a, T> {
    list: &'a SlotList<T>,
    current: Option<SlotIdx>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.current?)?;
        self.current = node.next;
        Some(&node.value)
    }
}
