//! Insertion-ordered doubly-linked list
//!
//! The store itself acts as the sentinel head: `first`/`last` are the
//! head's forward and backward links, and a `None` link on a node points
//! back at the head, closing the ring.

use super::arena::{Arena, NodeId};
use super::{IndexStore, Released};
use crate::models::{StoreKind, Value};
use crate::Result;

#[derive(Debug)]
struct SequenceNode {
    value: Value,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
pub struct SequenceStore {
    nodes: Arena<SequenceNode>,
    first: Option<NodeId>,
    last: Option<NodeId>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            nodes: Arena::new(StoreKind::Sequence, limit),
            first: None,
            last: None,
        }
    }

    /// Link a new node at the tail
    pub fn append(&mut self, value: Value) -> Result<()> {
        let id = self.nodes.alloc(SequenceNode {
            value,
            prev: self.last,
            next: None,
        })?;

        match self.last {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) -> Value {
        let (prev, next) = {
            let node = &self.nodes[id];
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.last = prev,
        }

        // unlink is only reached with ids taken from live links
        match self.nodes.free(id) {
            Some(node) => node.value,
            None => unreachable!("sequence link to freed node"),
        }
    }

    pub fn pop_front(&mut self) -> Option<Value> {
        self.first.map(|id| self.unlink(id))
    }

    pub fn pop_back(&mut self) -> Option<Value> {
        self.last.map(|id| self.unlink(id))
    }

    /// Remove the first node holding `value`
    pub fn remove_first(&mut self, value: Value) -> bool {
        let mut cursor = self.first;
        while let Some(id) = cursor {
            if self.nodes[id].value == value {
                self.unlink(id);
                return true;
            }
            cursor = self.nodes[id].next;
        }
        false
    }

    pub fn front(&self) -> Option<Value> {
        self.first.map(|id| self.nodes[id].value)
    }

    pub fn back(&self) -> Option<Value> {
        self.last.map(|id| self.nodes[id].value)
    }

    /// Walk head to tail
    pub fn iter(&self) -> SequenceIter<'_> {
        SequenceIter {
            store: self,
            front: self.first,
            back: self.last,
            remaining: self.nodes.len(),
        }
    }
}

impl Default for SequenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for SequenceStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Sequence
    }

    fn insert(&mut self, value: Value) -> Result<()> {
        self.append(value)
    }

    fn enumerate(&self) -> Vec<Value> {
        self.iter().collect()
    }

    fn destroy_all(&mut self) -> Released {
        let mut released = 0;
        while self.pop_front().is_some() {
            released += 1;
        }
        self.nodes.clear();
        Released::new(released)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

pub struct SequenceIter<'a> {
    store: &'a SequenceStore,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl Iterator for SequenceIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let node = &self.store.nodes[id];
        self.front = node.next;
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for SequenceIter<'_> {
    fn next_back(&mut self) -> Option<Value> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let node = &self.store.nodes[id];
        self.back = node.prev;
        self.remaining -= 1;
        Some(node.value)
    }
}

impl ExactSizeIterator for SequenceIter<'_> {}
