//! # Delta Engine
//!
//! A modseq-based change log and state sync engine.
//!
//! Every record type keeps a per-type counter, the *modseq*. Each write draws
//! a fresh modseq, so the history of a type is a strictly ordered log. Clients
//! hold an opaque *state token* (the decimal modseq they last saw) and ask for
//! everything that changed since, page by page, or fetch records by id with a
//! property projection.
//!
//! ## Design Principles
//!
//! - **No global state**: an [`Account`] is constructed and owned by its host
//! - **Storage as a collaborator**: the engine talks to [`Storage`] traits;
//!   [`MemoryStore`] is the in-memory reference implementation
//! - **Typed records**: each type is a struct of optional fields with its own
//!   merge rules
//! - **Sequential batches**: a request's calls run one after another, and a
//!   failing call never affects its siblings
//!
//! ## Core Concepts
//!
//! ### Records and watermarks
//!
//! A [`Record`] carries `created_mod_seq`, `updated_mod_seq` and a tombstone
//! flag. Deleting a record keeps it as a tombstone so later diffs can report
//! it. A [`Watermark`] bounds the history of a type: changes can be computed
//! from any state between `lowest_mod_seq` and `highest_mod_seq`.
//!
//! ### Operations
//!
//! - [`add_records`] - merge partial records, one modseq per record
//! - [`destroy_records`] - tombstone records
//! - [`changes`] - created/updated/destroyed ids since a state, paginated
//! - [`get`] - fetch by id through a [`FetchStrategy`]
//! - [`Account::process`] - run a batch of method calls
//!
//! ## Quick Start
//!
//! ```rust
//! use delta_engine::{Account, Invocation, Request};
//! use serde_json::json;
//!
//! let account = Account::in_memory("acc-1");
//!
//! let response = account.process(Request::new(vec![
//!     Invocation::new(
//!         "Email/set",
//!         json!({"create": {"k1": {"id": "1", "subject": "hello"}}}),
//!         "c1",
//!     ),
//!     Invocation::new("Email/changes", json!({"sinceState": "0"}), "c2"),
//!     Invocation::new(
//!         "Email/get",
//!         json!({"ids": ["1"], "properties": ["subject"]}),
//!         "c3",
//!     ),
//! ]));
//!
//! let changes = &response.method_responses[1];
//! assert_eq!(changes.name(), "Email/changes");
//! assert_eq!(changes.arguments()["created"], json!(["1"]));
//!
//! let get = &response.method_responses[2];
//! assert_eq!(get.arguments()["list"], json!([{"id": "1", "subject": "hello"}]));
//! ```

pub mod account;
pub mod changes;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mutation;
pub mod query;
pub mod record;
pub mod schema;
pub mod storage;
pub mod watermark;

// Re-export main types at crate root
pub use account::Account;
pub use changes::{changes, Change, ChangesRequest, ChangesResponse};
pub use config::Limits;
pub use dispatch::{Invocation, Method, Request, Response};
pub use error::{
    Error, ErrorType, MethodError, RequestError, RequestErrorType, Result, SetError, SetErrorType,
};
pub use mutation::{add_records, destroy_records, set_records, Commit, SetRequest, SetResponse};
pub use query::{get, ById, FetchStrategy, GetRequest, GetResponse, GroupBy};
pub use record::{Fields, Record, RecordInput};
pub use schema::{Email, Mailbox};
pub use storage::{Backend, MemoryBackend, MemoryStore, ReadTxn, Storage, WriteTxn};
pub use watermark::{State, Watermark};

/// Type aliases for clarity
pub type RecordId = String;
pub type AccountId = String;
pub type ModSeq = u64;
