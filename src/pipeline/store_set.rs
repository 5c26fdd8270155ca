use crate::config::StoreSettings;
use crate::models::StoreKind;
use crate::stores::{
    HashBucketStore, IndexStore, PagedStore, RadixStore, SequenceStore, SparseOptions, TreeStore,
};
use crate::Result;

/// The five stores of one context, in fan-out order
#[derive(Debug)]
pub struct StoreSet {
    pub sequence: SequenceStore,
    pub hash: HashBucketStore,
    pub tree: TreeStore,
    pub radix: RadixStore,
    pub paged: PagedStore,
    settings: StoreSettings,
}

impl StoreSet {
    pub fn new(settings: StoreSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            sequence: SequenceStore::with_limit(settings.node_limit(StoreKind::Sequence)),
            hash: HashBucketStore::with_limit(
                settings.bucket_count,
                settings.node_limit(StoreKind::HashBucket),
            )?,
            tree: TreeStore::with_limit(settings.node_limit(StoreKind::Tree))
                .with_teardown(settings.tree_teardown),
            radix: RadixStore::new(SparseOptions::from_settings(&settings, StoreKind::Radix)),
            paged: PagedStore::new(SparseOptions::from_settings(&settings, StoreKind::Paged)),
            settings,
        })
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Stores in fan-out order
    pub fn stores(&self) -> [&dyn IndexStore; 5] {
        [
            &self.sequence,
            &self.hash,
            &self.tree,
            &self.radix,
            &self.paged,
        ]
    }

    pub fn stores_mut(&mut self) -> [&mut dyn IndexStore; 5] {
        [
            &mut self.sequence,
            &mut self.hash,
            &mut self.tree,
            &mut self.radix,
            &mut self.paged,
        ]
    }

    pub fn get(&self, kind: StoreKind) -> &dyn IndexStore {
        match kind {
            StoreKind::Sequence => &self.sequence,
            StoreKind::HashBucket => &self.hash,
            StoreKind::Tree => &self.tree,
            StoreKind::Radix => &self.radix,
            StoreKind::Paged => &self.paged,
        }
    }

    /// Entries held across all stores
    pub fn total_len(&self) -> usize {
        self.stores().iter().map(|store| store.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stores().iter().all(|store| store.is_empty())
    }
}
