//! Storage collaborator interface.
//!
//! The engine never touches records directly; it reads through a
//! [`ReadTxn`] snapshot and writes through a [`WriteTxn`]. One [`Storage`]
//! holds one record type together with that type's [`Watermark`].
//!
//! Implementations must guarantee:
//! - a `ReadTxn` observes one consistent state for its whole lifetime, even
//!   while writers commit;
//! - write transactions on the same store are serialized;
//! - `commit` publishes every `put` and the watermark together, and dropping
//!   a `WriteTxn` without committing discards all of it.

mod memory;

pub use memory::{MemoryBackend, MemorySnapshot, MemoryStore, MemoryTxn};

use crate::error::Result;
use crate::record::{Fields, Record};
use crate::schema::{Email, Mailbox};
use crate::{ModSeq, Watermark};

/// Read access to one record type.
pub trait ReadTxn<T: Fields> {
    /// The type's watermark as of the start of this transaction.
    fn watermark(&self) -> &Watermark;

    /// Primary-key lookup, tombstones included.
    fn get(&self, id: &str) -> Option<&Record<T>>;

    /// Number of live (non-tombstoned) records.
    fn count(&self) -> usize;

    /// All records, tombstones included, in no particular order.
    fn scan(&self) -> Box<dyn Iterator<Item = &Record<T>> + '_>;

    /// Records with `updated_mod_seq > mod_seq`, ascending by `updated_mod_seq`.
    fn changed_after(&self, mod_seq: ModSeq) -> Box<dyn Iterator<Item = &Record<T>> + '_>;

    /// Records whose key in the named secondary index equals `key`.
    fn index(&self, name: &str, key: &str) -> Box<dyn Iterator<Item = &Record<T>> + '_>;

    /// Distinct keys present in the named secondary index, ascending.
    fn index_keys(&self, name: &str) -> Box<dyn Iterator<Item = &str> + '_>;
}

/// Read-write access to one record type.
pub trait WriteTxn<T: Fields>: ReadTxn<T> {
    /// Insert or replace a record.
    fn put(&mut self, record: Record<T>);

    fn set_watermark(&mut self, watermark: Watermark);

    /// Atomically publish everything written in this transaction.
    fn commit(self) -> Result<()>;
}

/// A transactional store for one record type.
pub trait Storage<T: Fields>: Send + Sync {
    type Snapshot<'a>: ReadTxn<T>
    where
        Self: 'a;
    type Txn<'a>: WriteTxn<T>
    where
        Self: 'a;

    /// Begin a read-only transaction.
    fn snapshot(&self) -> Result<Self::Snapshot<'_>>;

    /// Begin a write transaction, waiting for any other writer to finish.
    fn transaction(&self) -> Result<Self::Txn<'_>>;
}

/// The set of stores backing one account.
pub trait Backend: Send + Sync {
    type Emails: Storage<Email>;
    type Mailboxes: Storage<Mailbox>;

    fn emails(&self) -> &Self::Emails;
    fn mailboxes(&self) -> &Self::Mailboxes;
}
