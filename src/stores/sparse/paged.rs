//! Flat page directory
//!
//! Keys split into a page number (`key >> 6`) and a slot within a 64-slot
//! page. The directory is a vector of pages sorted by page number and
//! searched with binary search. A page is released as soon as its last
//! slot is cleared.

use super::{enumerate_with, teardown_with, SparseMap, SparseOptions};
use crate::config::DuplicateKeyPolicy;
use crate::error::QuintetError;
use crate::models::{sparse_key, SparseKey, StoreKind, Value};
use crate::stores::{IndexStore, Released};
use crate::Result;

const PAGE_SHIFT: u32 = 6;
const PAGE_SLOTS: usize = 1 << PAGE_SHIFT;

struct Page {
    slots: [Option<Box<Value>>; PAGE_SLOTS],
    occupied: usize,
}

impl Page {
    fn new() -> Box<Self> {
        Box::new(Self {
            slots: std::array::from_fn(|_| None),
            occupied: 0,
        })
    }
}

fn split(key: SparseKey) -> (u64, usize) {
    (key >> PAGE_SHIFT, (key as usize) & (PAGE_SLOTS - 1))
}

pub struct PagedStore {
    pages: Vec<(u64, Box<Page>)>,
    len: usize,
    options: SparseOptions,
}

impl PagedStore {
    pub fn new(options: SparseOptions) -> Self {
        Self {
            pages: Vec::new(),
            len: 0,
            options,
        }
    }

    /// Pages currently allocated
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn find_page(&self, page_no: u64) -> std::result::Result<usize, usize> {
        self.pages.binary_search_by_key(&page_no, |(no, _)| *no)
    }

    fn out_of_memory() -> QuintetError {
        QuintetError::OutOfMemory {
            store: StoreKind::Paged,
        }
    }
}

impl SparseMap for PagedStore {
    fn options(&self) -> &SparseOptions {
        &self.options
    }

    fn insert_entry(&mut self, key: SparseKey, payload: Value) -> Result<()> {
        let (page_no, slot) = split(key);
        let position = self.find_page(page_no);

        if let Ok(pos) = position {
            let page = &mut self.pages[pos].1;
            if let Some(existing) = page.slots[slot].as_mut() {
                return match self.options.duplicate_policy {
                    DuplicateKeyPolicy::Overwrite => {
                        *existing = Box::new(payload);
                        Ok(())
                    }
                    DuplicateKeyPolicy::Reject => Err(QuintetError::KeyAlreadyPresent(key)),
                };
            }
        }

        if self.options.limit.is_some_and(|limit| self.len >= limit) {
            return Err(Self::out_of_memory());
        }

        let pos = match position {
            Ok(pos) => pos,
            Err(pos) => {
                self.pages
                    .try_reserve(1)
                    .map_err(|_| Self::out_of_memory())?;
                self.pages.insert(pos, (page_no, Page::new()));
                pos
            }
        };

        let page = &mut self.pages[pos].1;
        page.slots[slot] = Some(Box::new(payload));
        page.occupied += 1;
        self.len += 1;
        Ok(())
    }

    fn lookup(&self, key: SparseKey) -> Option<&Value> {
        let (page_no, slot) = split(key);
        let pos = self.find_page(page_no).ok()?;
        self.pages[pos].1.slots[slot].as_deref()
    }

    fn remove_and_return(&mut self, key: SparseKey) -> Option<Value> {
        let (page_no, slot) = split(key);
        let pos = self.find_page(page_no).ok()?;

        let page = &mut self.pages[pos].1;
        let payload = page.slots[slot].take()?;
        page.occupied -= 1;
        if page.occupied == 0 {
            self.pages.remove(pos);
        }
        self.len -= 1;
        Some(*payload)
    }

    fn entries(&self) -> Vec<(SparseKey, Value)> {
        let mut out = Vec::with_capacity(self.len);
        for (page_no, page) in &self.pages {
            for (slot, payload) in page.slots.iter().enumerate() {
                if let Some(payload) = payload {
                    out.push(((*page_no << PAGE_SHIFT) | slot as u64, **payload));
                }
            }
        }
        out
    }

    fn clear(&mut self) -> usize {
        let count = self.len;
        self.pages.clear();
        self.len = 0;
        count
    }

    fn entry_count(&self) -> usize {
        self.len
    }
}

impl IndexStore for PagedStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Paged
    }

    fn insert(&mut self, value: Value) -> Result<()> {
        self.insert_entry(sparse_key(value), value)
    }

    fn enumerate(&self) -> Vec<Value> {
        enumerate_with(self)
    }

    fn destroy_all(&mut self) -> Released {
        teardown_with(self, StoreKind::Paged)
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl std::fmt::Debug for PagedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedStore")
            .field("pages", &self.pages.len())
            .field("len", &self.len)
            .field("options", &self.options)
            .finish()
    }
}
