//! 64-way radix tree
//!
//! Each level consumes 6 key bits. The tree is only as tall as the largest
//! key needs: inserting a bigger key pushes a new root on top, and removals
//! prune emptied branches and collapse a root whose only child is slot 0.

use super::{enumerate_with, teardown_with, SparseMap, SparseOptions};
use crate::config::DuplicateKeyPolicy;
use crate::error::QuintetError;
use crate::models::{sparse_key, SparseKey, StoreKind, Value};
use crate::stores::{IndexStore, Released};
use crate::Result;

const RADIX_BITS: u32 = 6;
const FANOUT: usize = 1 << RADIX_BITS;
const SLOT_MASK: u64 = (FANOUT as u64) - 1;

enum RadixSlot {
    Empty,
    Branch(Box<RadixNode>),
    Leaf(Box<Value>),
}

struct RadixNode {
    slots: [RadixSlot; FANOUT],
    count: usize,
}

impl RadixNode {
    fn new() -> Box<Self> {
        Box::new(Self {
            slots: std::array::from_fn(|_| RadixSlot::Empty),
            count: 0,
        })
    }
}

fn slot_index(key: SparseKey, level: u32) -> usize {
    ((key >> (level * RADIX_BITS)) & SLOT_MASK) as usize
}

/// Largest key a tree of `height` levels can hold
fn max_key(height: u32) -> SparseKey {
    let bits = height * RADIX_BITS;
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn height_for(key: SparseKey) -> u32 {
    let mut height = 1;
    while key > max_key(height) {
        height += 1;
    }
    height
}

fn remove_in(node: &mut RadixNode, key: SparseKey, level: u32) -> Option<Box<Value>> {
    let index = slot_index(key, level);
    if level == 0 {
        return match std::mem::replace(&mut node.slots[index], RadixSlot::Empty) {
            RadixSlot::Leaf(payload) => {
                node.count -= 1;
                Some(payload)
            }
            other => {
                node.slots[index] = other;
                None
            }
        };
    }

    let (removed, emptied) = match &mut node.slots[index] {
        RadixSlot::Branch(child) => {
            let removed = remove_in(child, key, level - 1);
            (removed, child.count == 0)
        }
        _ => return None,
    };
    if emptied {
        node.slots[index] = RadixSlot::Empty;
        node.count -= 1;
    }
    removed
}

fn collect(node: &RadixNode, prefix: SparseKey, level: u32, out: &mut Vec<(SparseKey, Value)>) {
    for (index, slot) in node.slots.iter().enumerate() {
        let key = prefix | ((index as u64) << (level * RADIX_BITS));
        match slot {
            RadixSlot::Empty => {}
            RadixSlot::Leaf(payload) => out.push((key, **payload)),
            RadixSlot::Branch(child) => collect(child, key, level - 1, out),
        }
    }
}

pub struct RadixStore {
    root: Option<Box<RadixNode>>,
    height: u32,
    len: usize,
    options: SparseOptions,
}

impl RadixStore {
    pub fn new(options: SparseOptions) -> Self {
        Self {
            root: None,
            height: 0,
            len: 0,
            options,
        }
    }

    /// Levels between the root and the payloads
    pub fn height(&self) -> u32 {
        self.height
    }

    fn leaf_mut(&mut self, key: SparseKey) -> Option<&mut Box<Value>> {
        if key > max_key(self.height) {
            return None;
        }
        let mut node = self.root.as_deref_mut()?;
        for level in (1..self.height).rev() {
            node = match &mut node.slots[slot_index(key, level)] {
                RadixSlot::Branch(child) => &mut **child,
                _ => return None,
            };
        }
        match &mut node.slots[slot_index(key, 0)] {
            RadixSlot::Leaf(payload) => Some(payload),
            _ => None,
        }
    }

    fn grow_to(&mut self, height: u32) {
        match self.root.take() {
            None => {
                self.root = Some(RadixNode::new());
                self.height = height;
            }
            Some(mut root) => {
                while self.height < height {
                    let mut parent = RadixNode::new();
                    parent.slots[0] = RadixSlot::Branch(root);
                    parent.count = 1;
                    root = parent;
                    self.height += 1;
                }
                self.root = Some(root);
            }
        }
    }

    fn shrink(&mut self) {
        if self.root.as_ref().is_some_and(|root| root.count == 0) {
            self.root = None;
            self.height = 0;
            return;
        }
        while self.height > 1 {
            let Some(root) = self.root.as_mut() else {
                break;
            };
            if root.count != 1 || !matches!(root.slots[0], RadixSlot::Branch(_)) {
                break;
            }
            if let RadixSlot::Branch(child) = std::mem::replace(&mut root.slots[0], RadixSlot::Empty) {
                self.root = Some(child);
                self.height -= 1;
            }
        }
    }
}

impl SparseMap for RadixStore {
    fn options(&self) -> &SparseOptions {
        &self.options
    }

    fn insert_entry(&mut self, key: SparseKey, payload: Value) -> Result<()> {
        let policy = self.options.duplicate_policy;
        if let Some(existing) = self.leaf_mut(key) {
            return match policy {
                DuplicateKeyPolicy::Overwrite => {
                    *existing = Box::new(payload);
                    Ok(())
                }
                DuplicateKeyPolicy::Reject => {
                    Err(QuintetError::KeyAlreadyPresent(key))
                }
            };
        }

        if self.options.limit.is_some_and(|limit| self.len >= limit) {
            return Err(QuintetError::OutOfMemory {
                store: StoreKind::Radix,
            });
        }

        let needed = height_for(key);
        if self.root.is_none() || needed > self.height {
            self.grow_to(needed.max(self.height));
        }

        let height = self.height;
        let Some(mut node) = self.root.as_deref_mut() else {
            return Err(QuintetError::OutOfMemory {
                store: StoreKind::Radix,
            });
        };
        for level in (1..height).rev() {
            let index = slot_index(key, level);
            if matches!(node.slots[index], RadixSlot::Empty) {
                node.slots[index] = RadixSlot::Branch(RadixNode::new());
                node.count += 1;
            }
            node = match &mut node.slots[index] {
                RadixSlot::Branch(child) => &mut **child,
                _ => unreachable!("interior radix slot holds a payload"),
            };
        }

        let index = slot_index(key, 0);
        node.slots[index] = RadixSlot::Leaf(Box::new(payload));
        node.count += 1;
        self.len += 1;
        Ok(())
    }

    fn lookup(&self, key: SparseKey) -> Option<&Value> {
        if key > max_key(self.height) {
            return None;
        }
        let mut node = self.root.as_deref()?;
        for level in (1..self.height).rev() {
            node = match &node.slots[slot_index(key, level)] {
                RadixSlot::Branch(child) => &**child,
                _ => return None,
            };
        }
        match &node.slots[slot_index(key, 0)] {
            RadixSlot::Leaf(payload) => Some(&**payload),
            _ => None,
        }
    }

    fn remove_and_return(&mut self, key: SparseKey) -> Option<Value> {
        if key > max_key(self.height) {
            return None;
        }
        let height = self.height;
        let root = self.root.as_deref_mut()?;
        let removed = remove_in(root, key, height - 1)?;
        self.len -= 1;
        self.shrink();
        Some(*removed)
    }

    fn entries(&self) -> Vec<(SparseKey, Value)> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = self.root.as_deref() {
            collect(root, 0, self.height - 1, &mut out);
        }
        out
    }

    fn clear(&mut self) -> usize {
        let count = self.len;
        self.root = None;
        self.height = 0;
        self.len = 0;
        count
    }

    fn entry_count(&self) -> usize {
        self.len
    }
}

impl IndexStore for RadixStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Radix
    }

    fn insert(&mut self, value: Value) -> Result<()> {
        self.insert_entry(sparse_key(value), value)
    }

    fn enumerate(&self) -> Vec<Value> {
        enumerate_with(self)
    }

    fn destroy_all(&mut self) -> Released {
        teardown_with(self, StoreKind::Radix)
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl std::fmt::Debug for RadixStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadixStore")
            .field("height", &self.height)
            .field("len", &self.len)
            .field("options", &self.options)
            .finish()
    }
}
