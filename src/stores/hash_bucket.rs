//! Fixed-size hash table with chained buckets
//!
//! `bucket = value.rem_euclid(bucket_count)`, so negative values land in
//! `[0, bucket_count)` too. With a power-of-two bucket count this is the same
//! bucket an unsigned reinterpretation of the value would pick. Chains are
//! appended at the tail, so a bucket lists its values in insertion order.
//! The table never resizes.

use super::arena::{Arena, NodeId};
use super::{IndexStore, Released};
use crate::error::QuintetError;
use crate::models::{StoreKind, Value};
use crate::Result;

#[derive(Debug)]
struct BucketNode {
    value: Value,
    next: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

#[derive(Debug)]
pub struct HashBucketStore {
    nodes: Arena<BucketNode>,
    buckets: Vec<Bucket>,
}

impl HashBucketStore {
    pub fn new(bucket_count: usize) -> Result<Self> {
        Self::with_limit(bucket_count, None)
    }

    pub fn with_limit(bucket_count: usize, limit: Option<usize>) -> Result<Self> {
        if bucket_count == 0 {
            return Err(QuintetError::InvalidConfig(
                "hash store needs at least one bucket".to_string(),
            ));
        }
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(bucket_count)
            .map_err(|_| QuintetError::OutOfMemory {
                store: StoreKind::HashBucket,
            })?;
        buckets.resize(bucket_count, Bucket::default());

        Ok(Self {
            nodes: Arena::new(StoreKind::HashBucket, limit),
            buckets,
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket a value hashes to
    pub fn bucket_of(&self, value: Value) -> usize {
        (value as i64).rem_euclid(self.buckets.len() as i64) as usize
    }

    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, |b| b.len)
    }

    /// Values chained in one bucket, in chain order
    pub fn bucket_values(&self, index: usize) -> Vec<Value> {
        let mut values = Vec::new();
        let mut cursor = self.buckets.get(index).and_then(|b| b.head);
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            values.push(node.value);
            cursor = node.next;
        }
        values
    }

    pub fn contains(&self, value: Value) -> bool {
        let mut cursor = self.buckets[self.bucket_of(value)].head;
        while let Some(id) = cursor {
            if self.nodes[id].value == value {
                return true;
            }
            cursor = self.nodes[id].next;
        }
        false
    }

    /// Unlink the first chained node holding `value`
    pub fn remove(&mut self, value: Value) -> bool {
        let index = self.bucket_of(value);
        let mut prev: Option<NodeId> = None;
        let mut cursor = self.buckets[index].head;

        while let Some(id) = cursor {
            let next = self.nodes[id].next;
            if self.nodes[id].value == value {
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.buckets[index].head = next,
                }
                if self.buckets[index].tail == Some(id) {
                    self.buckets[index].tail = prev;
                }
                self.buckets[index].len -= 1;
                self.nodes.free(id);
                return true;
            }
            prev = Some(id);
            cursor = next;
        }
        false
    }
}

impl IndexStore for HashBucketStore {
    fn kind(&self) -> StoreKind {
        StoreKind::HashBucket
    }

    fn insert(&mut self, value: Value) -> Result<()> {
        let id = self.nodes.alloc(BucketNode { value, next: None })?;
        let index = self.bucket_of(value);
        let bucket = &mut self.buckets[index];

        match bucket.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => bucket.head = Some(id),
        }
        bucket.tail = Some(id);
        bucket.len += 1;
        Ok(())
    }

    /// Bucket-major, chain-order-minor
    fn enumerate(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.nodes.len());
        for bucket in &self.buckets {
            let mut cursor = bucket.head;
            while let Some(id) = cursor {
                let node = &self.nodes[id];
                values.push(node.value);
                cursor = node.next;
            }
        }
        values
    }

    fn destroy_all(&mut self) -> Released {
        let mut released = 0;
        for index in 0..self.buckets.len() {
            let mut cursor = self.buckets[index].head.take();
            while let Some(id) = cursor {
                cursor = self.nodes.free(id).and_then(|node| node.next);
                released += 1;
            }
            self.buckets[index] = Bucket::default();
        }
        self.nodes.clear();
        Released::new(released)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
