//! In-memory storage backend.
//!
//! Each store keeps its committed table behind an `Arc`. Readers clone the
//! `Arc` and keep a frozen view; a writer copies the table, mutates the copy,
//! and swaps it in on commit. Writers are serialized by a mutex held for the
//! lifetime of the transaction.
//!
//! Tables are built from `im` persistent maps, so the writer's copy shares
//! structure with the committed table and costs O(1) to take. A write touches
//! O(log n) nodes.

use super::{Backend, ReadTxn, Storage, WriteTxn};
use crate::error::Result;
use crate::record::{Fields, Record};
use crate::schema::{Email, Mailbox};
use crate::{ModSeq, RecordId, Watermark};
use parking_lot::{Mutex, MutexGuard, RwLock};
use im::{OrdMap, OrdSet};
use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Table<T> {
    watermark: Watermark,
    records: im::HashMap<RecordId, Record<T>>,
    /// `updated_mod_seq` -> id; modseqs are never shared between records
    by_mod_seq: OrdMap<ModSeq, RecordId>,
    indexes: HashMap<&'static str, OrdMap<String, OrdSet<RecordId>>>,
    live: usize,
}

impl<T: Fields> Table<T> {
    fn new() -> Self {
        Self {
            watermark: Watermark::new(T::TYPE_NAME),
            records: im::HashMap::new(),
            by_mod_seq: OrdMap::new(),
            indexes: T::INDEXES.iter().map(|name| (*name, OrdMap::new())).collect(),
            live: 0,
        }
    }

    fn unlink(&mut self, old: &Record<T>) {
        self.by_mod_seq.remove(&old.updated_mod_seq);
        if old.is_active() {
            self.live -= 1;
        }
        for name in T::INDEXES {
            let Some(key) = old.fields.index_key(name) else {
                continue;
            };
            if let Some(index) = self.indexes.get_mut(name) {
                if let Some(ids) = index.get_mut(key) {
                    ids.remove(&old.id);
                    if ids.is_empty() {
                        index.remove(key);
                    }
                }
            }
        }
    }

    fn link(&mut self, record: &Record<T>) {
        self.by_mod_seq
            .insert(record.updated_mod_seq, record.id.clone());
        if record.is_active() {
            self.live += 1;
        }
        for name in T::INDEXES {
            if let Some(key) = record.fields.index_key(name) {
                self.indexes
                    .entry(*name)
                    .or_default()
                    .entry(key.to_string())
                    .or_insert_with(OrdSet::new)
                    .insert(record.id.clone());
            }
        }
    }

    fn put(&mut self, record: Record<T>) {
        if let Some(old) = self.records.remove(&record.id) {
            self.unlink(&old);
        }
        self.link(&record);
        self.records.insert(record.id.clone(), record);
    }
}

impl<T: Fields> ReadTxn<T> for Table<T> {
    fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    fn get(&self, id: &str) -> Option<&Record<T>> {
        self.records.get(id)
    }

    fn count(&self) -> usize {
        self.live
    }

    fn scan(&self) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
        Box::new(self.records.values())
    }

    fn changed_after(&self, mod_seq: ModSeq) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
        Box::new(
            self.by_mod_seq
                .range((Bound::Excluded(mod_seq), Bound::Unbounded))
                .filter_map(|(_, id)| self.records.get(id)),
        )
    }

    fn index(&self, name: &str, key: &str) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
        match self.indexes.get(name).and_then(|index| index.get(key)) {
            Some(ids) => Box::new(ids.iter().filter_map(|id| self.records.get(id))),
            None => Box::new(std::iter::empty()),
        }
    }

    fn index_keys(&self, name: &str) -> Box<dyn Iterator<Item = &str> + '_> {
        match self.indexes.get(name) {
            Some(index) => Box::new(index.keys().map(String::as_str)),
            None => Box::new(std::iter::empty()),
        }
    }
}

macro_rules! delegate_read_txn {
    ($ty:ty, $table:ident) => {
        impl<T: Fields> ReadTxn<T> for $ty {
            fn watermark(&self) -> &Watermark {
                self.$table.watermark()
            }

            fn get(&self, id: &str) -> Option<&Record<T>> {
                ReadTxn::get(&*self.$table, id)
            }

            fn count(&self) -> usize {
                self.$table.count()
            }

            fn scan(&self) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
                self.$table.scan()
            }

            fn changed_after(
                &self,
                mod_seq: ModSeq,
            ) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
                self.$table.changed_after(mod_seq)
            }

            fn index(&self, name: &str, key: &str) -> Box<dyn Iterator<Item = &Record<T>> + '_> {
                self.$table.index(name, key)
            }

            fn index_keys(&self, name: &str) -> Box<dyn Iterator<Item = &str> + '_> {
                self.$table.index_keys(name)
            }
        }
    };
}

/// A transactional in-memory store for one record type.
#[derive(Debug)]
pub struct MemoryStore<T> {
    committed: RwLock<Arc<Table<T>>>,
    writer: Mutex<()>,
}

impl<T: Fields> MemoryStore<T> {
    /// Provision an empty store with a fresh watermark.
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(Arc::new(Table::new())),
            writer: Mutex::new(()),
        }
    }
}

impl<T: Fields> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Fields> Storage<T> for MemoryStore<T> {
    type Snapshot<'a>
        = MemorySnapshot<T>
    where
        Self: 'a;
    type Txn<'a>
        = MemoryTxn<'a, T>
    where
        Self: 'a;

    fn snapshot(&self) -> Result<MemorySnapshot<T>> {
        Ok(MemorySnapshot {
            table: Arc::clone(&self.committed.read()),
        })
    }

    fn transaction(&self) -> Result<MemoryTxn<'_, T>> {
        let guard = self.writer.lock();
        let table = Box::new(Table::clone(&self.committed.read()));
        Ok(MemoryTxn {
            store: self,
            _guard: guard,
            table,
        })
    }
}

/// A frozen view of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySnapshot<T> {
    table: Arc<Table<T>>,
}

delegate_read_txn!(MemorySnapshot<T>, table);

/// A pending write against a [`MemoryStore`].
///
/// Reads inside the transaction see its own uncommitted writes.
pub struct MemoryTxn<'a, T> {
    store: &'a MemoryStore<T>,
    _guard: MutexGuard<'a, ()>,
    table: Box<Table<T>>,
}

delegate_read_txn!(MemoryTxn<'_, T>, table);

impl<T: Fields> WriteTxn<T> for MemoryTxn<'_, T> {
    fn put(&mut self, record: Record<T>) {
        self.table.put(record);
    }

    fn set_watermark(&mut self, watermark: Watermark) {
        self.table.watermark = watermark;
    }

    fn commit(self) -> Result<()> {
        let MemoryTxn { store, table, .. } = self;
        *store.committed.write() = Arc::new(*table);
        Ok(())
    }
}

/// In-memory stores for every record type of an account.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    emails: MemoryStore<Email>,
    mailboxes: MemoryStore<Mailbox>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    type Emails = MemoryStore<Email>;
    type Mailboxes = MemoryStore<Mailbox>;

    fn emails(&self) -> &Self::Emails {
        &self.emails
    }

    fn mailboxes(&self) -> &Self::Mailboxes {
        &self.mailboxes
    }
}
