//! Change engine: the diff between a client's state token and now.
//!
//! Records are visited in ascending `updated_mod_seq` order starting strictly
//! after the client's modseq. Each record appears at most once per scan, at
//! the position of its latest write, so a page boundary placed on a visited
//! modseq resumes without gaps or duplicates.

use crate::config::Limits;
use crate::error::Result;
use crate::record::{Fields, Record};
use crate::storage::{ReadTxn, Storage};
use crate::{AccountId, Error, ModSeq, RecordId, State};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Arguments of a `Type/changes` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesRequest {
    pub account_id: Option<AccountId>,
    pub since_state: String,
    /// Any JSON number; values that are not an integer in range fall back.
    pub max_changes: Option<Number>,
}

impl ChangesRequest {
    pub fn new(since_state: impl Into<String>) -> Self {
        Self {
            account_id: None,
            since_state: since_state.into(),
            max_changes: None,
        }
    }

    pub fn with_max_changes(mut self, max_changes: i64) -> Self {
        self.max_changes = Some(Number::from(max_changes));
        self
    }
}

/// Result of a `Type/changes` call. Ids only, no payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesResponse {
    pub account_id: AccountId,
    pub old_state: String,
    pub new_state: String,
    pub has_more_changes: bool,
    pub created: Vec<RecordId>,
    pub updated: Vec<RecordId>,
    pub destroyed: Vec<RecordId>,
}

/// How a record that changed after a given modseq looks to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Destroyed,
}

/// Classify a record relative to the client's modseq.
///
/// Returns `None` for a record created and destroyed since `since`: the
/// client never saw it, so it is neither created nor destroyed.
pub fn classify<T: Fields>(record: &Record<T>, since: ModSeq) -> Option<Change> {
    let created_since = record.created_mod_seq > since;
    match (record.deleted, created_since) {
        (true, true) => None,
        (true, false) => Some(Change::Destroyed),
        (false, true) => Some(Change::Created),
        (false, false) => Some(Change::Updated),
    }
}

/// Compute the changes since `request.since_state`.
pub fn changes<T: Fields, S: Storage<T>>(
    store: &S,
    account_id: &str,
    request: &ChangesRequest,
    limits: &Limits,
) -> Result<ChangesResponse> {
    let since: State = request.since_state.parse()?;
    let page_size = limits.page_size(request.max_changes.as_ref());

    let snapshot = store.snapshot()?;
    let watermark = snapshot.watermark();
    let highest = watermark.highest_mod_seq;
    if since.0 < watermark.lowest_mod_seq || since.0 > highest {
        return Err(Error::CannotCalculateChanges {
            since: since.0,
            lowest: watermark.lowest_mod_seq,
            highest,
        });
    }

    let mut response = ChangesResponse {
        account_id: account_id.to_string(),
        old_state: since.to_string(),
        new_state: since.to_string(),
        has_more_changes: false,
        created: Vec::new(),
        updated: Vec::new(),
        destroyed: Vec::new(),
    };
    if since.0 == highest {
        return Ok(response);
    }

    let mut records = snapshot.changed_after(since.0);
    let mut last_visited = since.0;
    for record in records.by_ref().take(page_size) {
        last_visited = record.updated_mod_seq;
        match classify(record, since.0) {
            Some(Change::Created) => response.created.push(record.id.clone()),
            Some(Change::Updated) => response.updated.push(record.id.clone()),
            Some(Change::Destroyed) => response.destroyed.push(record.id.clone()),
            None => {}
        }
    }

    if records.next().is_some() {
        response.has_more_changes = true;
        response.new_state = State(last_visited).to_string();
    } else {
        response.new_state = State(highest).to_string();
    }

    tracing::debug!(
        type_name = T::TYPE_NAME,
        since = since.0,
        new_state = %response.new_state,
        has_more = response.has_more_changes,
        "changes calculated"
    );
    Ok(response)
}
