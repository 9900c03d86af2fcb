//! The account: one explicitly owned engine instance.
//!
//! An [`Account`] owns the stores for every record type and the limits that
//! apply to requests against them. Hosts construct one and pass it by
//! reference to whatever serves requests; the engine keeps no global state.

use crate::config::Limits;
use crate::storage::{Backend, MemoryBackend};
use crate::AccountId;

/// An account and the stores backing it.
#[derive(Debug)]
pub struct Account<B = MemoryBackend> {
    id: AccountId,
    backend: B,
    limits: Limits,
}

impl Account<MemoryBackend> {
    /// An account backed by fresh in-memory stores.
    pub fn in_memory(id: impl Into<AccountId>) -> Self {
        Self::new(id, MemoryBackend::new(), Limits::default())
    }
}

impl<B: Backend> Account<B> {
    pub fn new(id: impl Into<AccountId>, backend: B, limits: Limits) -> Self {
        Self {
            id: id.into(),
            backend,
            limits,
        }
    }

    /// Replace the request limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}
