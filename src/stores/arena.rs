//! Slab arena backing the node-based stores
//!
//! Nodes are addressed by [`NodeId`] handles instead of pointers. Freed slots
//! go on a free list and are reused by the next allocation. Growth goes
//! through `try_reserve`, so allocator failure and an exhausted node limit
//! both surface as `OutOfMemory` without touching the arena.

use std::ops::{Index, IndexMut};

use crate::error::{QuintetError, Result};
use crate::models::StoreKind;

/// Handle to a node inside an [`Arena`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant,
}

#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    limit: Option<usize>,
    owner: StoreKind,
}

impl<T> Arena<T> {
    pub fn new(owner: StoreKind, limit: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            limit,
            owner,
        }
    }

    fn out_of_memory(&self) -> QuintetError {
        QuintetError::OutOfMemory { store: self.owner }
    }

    /// Place `value` in a free slot, growing the slab if needed
    pub fn alloc(&mut self, value: T) -> Result<NodeId> {
        if self.limit.is_some_and(|limit| self.len >= limit) {
            return Err(self.out_of_memory());
        }

        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Slot::Occupied(value);
            self.len += 1;
            return Ok(NodeId(index));
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| self.out_of_memory())?;
        // Reserve room to recycle this slot later so free() never allocates
        self.free
            .try_reserve(self.slots.len() + 1 - self.free.len())
            .map_err(|_| self.out_of_memory())?;
        self.slots
            .try_reserve(1)
            .map_err(|_| self.out_of_memory())?;
        self.slots.push(Slot::Occupied(value));
        self.len += 1;
        Ok(NodeId(index))
    }

    /// Release a node and hand back its contents
    pub fn free(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.as_usize())?;
        match std::mem::replace(slot, Slot::Vacant) {
            Slot::Occupied(value) => {
                self.free.push(id.0);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant => None,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Drop every node and reset handle numbering. Returns how many were live.
    pub fn clear(&mut self) -> usize {
        let live = self.len;
        self.slots.clear();
        self.free.clear();
        self.len = 0;
        live
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("{} arena: dangling node id {:?}", self.owner, id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        let owner = self.owner;
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("{} arena: dangling node id {:?}", owner, id),
        }
    }
}
