//! Mutation engine: merges writes into a record type and assigns modseqs.
//!
//! Every written record draws its own modseq from the type's watermark
//! (`highest_mod_seq + 1`, `+ 2`, ...) in input order. All record writes and
//! the advanced watermark are committed in one storage transaction.

use crate::config::Limits;
use crate::error::{Result, SetError};
use crate::record::{Fields, Record, RecordInput};
use crate::storage::{ReadTxn, Storage, WriteTxn};
use crate::{AccountId, Error, ModSeq, RecordId, State, Watermark};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// States before and after a committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub old_state: State,
    pub new_state: State,
}

/// Outcome of [`destroy_records`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destroyed {
    pub commit: Commit,
    pub destroyed: Vec<RecordId>,
    pub not_found: Vec<RecordId>,
}

fn next_mod_seq(watermark: &mut Watermark) -> ModSeq {
    watermark.highest_mod_seq += 1;
    watermark.highest_mod_seq
}

/// Merge `patch` into the record `id`, creating it if absent.
fn upsert<T: Fields, W: WriteTxn<T>>(txn: &mut W, id: RecordId, patch: T, mod_seq: ModSeq) {
    let record = match txn.get(&id) {
        Some(existing) => {
            let mut record = existing.clone();
            record.apply_patch(patch, mod_seq);
            record
        }
        None => Record::new(id, patch, mod_seq),
    };
    txn.put(record);
}

/// Tombstone the live record `id`. Returns false if there is none.
fn tombstone<T: Fields, W: WriteTxn<T>>(
    txn: &mut W,
    id: &str,
    watermark: &mut Watermark,
) -> bool {
    let Some(existing) = txn.get(id).filter(|r| r.is_active()) else {
        return false;
    };
    let mut record = existing.clone();
    record.mark_deleted(next_mod_seq(watermark));
    txn.put(record);
    true
}

/// Publish the watermark and commit, unless nothing was assigned.
fn finish<T: Fields, W: WriteTxn<T>>(
    mut txn: W,
    old_state: State,
    watermark: Watermark,
) -> Result<Commit> {
    let new_state = watermark.state();
    if new_state != old_state {
        txn.set_watermark(watermark);
        txn.commit()?;
        tracing::info!(
            type_name = T::TYPE_NAME,
            old_state = %old_state,
            new_state = %new_state,
            "mutation committed"
        );
    }
    Ok(Commit {
        old_state,
        new_state,
    })
}

/// Merge a batch of partial records into the store.
///
/// Fails with [`Error::IdRequired`] before touching storage if any input has
/// no id. An empty batch assigns no modseq.
pub fn add_records<T: Fields, S: Storage<T>>(
    store: &S,
    records: Vec<RecordInput<T>>,
) -> Result<Commit> {
    let mut batch = Vec::with_capacity(records.len());
    for (position, input) in records.into_iter().enumerate() {
        match input.id {
            Some(id) if !id.is_empty() => batch.push((id, input.fields)),
            _ => return Err(Error::IdRequired(position)),
        }
    }

    let mut txn = store.transaction()?;
    let mut watermark = txn.watermark().clone();
    let old_state = watermark.state();
    for (id, fields) in batch {
        let mod_seq = next_mod_seq(&mut watermark);
        upsert(&mut txn, id, fields, mod_seq);
    }
    finish::<T, _>(txn, old_state, watermark)
}

/// Tombstone records so their removal shows up in later change sets.
///
/// Unknown ids and existing tombstones are reported as not found and draw no
/// modseq.
pub fn destroy_records<T: Fields, S: Storage<T>>(
    store: &S,
    ids: &[RecordId],
) -> Result<Destroyed> {
    let mut txn = store.transaction()?;
    let mut watermark = txn.watermark().clone();
    let old_state = watermark.state();

    let mut destroyed = Vec::new();
    let mut not_found = Vec::new();
    for id in ids {
        if tombstone::<T, _>(&mut txn, id, &mut watermark) {
            destroyed.push(id.clone());
        } else {
            not_found.push(id.clone());
        }
    }

    let commit = finish::<T, _>(txn, old_state, watermark)?;
    Ok(Destroyed {
        commit,
        destroyed,
        not_found,
    })
}

/// Arguments of a `Type/set` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRequest {
    pub account_id: Option<AccountId>,
    pub if_in_state: Option<String>,
    pub create: Option<BTreeMap<String, Map<String, Value>>>,
    pub update: Option<BTreeMap<RecordId, Map<String, Value>>>,
    pub destroy: Option<Vec<RecordId>>,
}

impl SetRequest {
    fn len(&self) -> usize {
        self.create.as_ref().map_or(0, BTreeMap::len)
            + self.update.as_ref().map_or(0, BTreeMap::len)
            + self.destroy.as_ref().map_or(0, Vec::len)
    }
}

/// Server-assigned properties of a created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRecord {
    pub id: RecordId,
}

/// Result of a `Type/set` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResponse {
    pub account_id: AccountId,
    pub old_state: String,
    pub new_state: String,
    pub created: Option<BTreeMap<String, CreatedRecord>>,
    pub updated: Option<BTreeMap<RecordId, Option<Value>>>,
    pub destroyed: Option<Vec<RecordId>>,
    pub not_created: Option<BTreeMap<String, SetError>>,
    pub not_updated: Option<BTreeMap<RecordId, SetError>>,
    pub not_destroyed: Option<BTreeMap<RecordId, SetError>>,
}

/// Split a client object into its `id` and typed fields.
fn parse_object<T: Fields>(
    object: Map<String, Value>,
) -> std::result::Result<(Option<RecordId>, T), SetError> {
    let input: RecordInput<T> = serde_json::from_value(Value::Object(object))
        .map_err(|err| SetError::invalid_properties(err.to_string()))?;
    Ok((input.id, input.fields))
}

/// Apply creates, updates, and destroys in one transaction.
///
/// Item-level failures are reported in the `not*` maps and do not stop the
/// other items. A stale `if_in_state` fails the whole call.
pub fn set_records<T: Fields, S: Storage<T>>(
    store: &S,
    account_id: &str,
    request: SetRequest,
    limits: &Limits,
) -> Result<SetResponse> {
    let requested = request.len();
    if requested > limits.max_objects_in_set {
        return Err(Error::RequestTooLarge {
            requested,
            max: limits.max_objects_in_set,
        });
    }

    let mut txn = store.transaction()?;
    let mut watermark = txn.watermark().clone();
    let old_state = watermark.state();

    if let Some(expected) = request.if_in_state {
        if expected != old_state.to_string() {
            return Err(Error::StateMismatch {
                expected,
                actual: old_state.to_string(),
            });
        }
    }

    let mut created = BTreeMap::new();
    let mut not_created = BTreeMap::new();
    for (creation_id, object) in request.create.unwrap_or_default() {
        let (id, fields) = match parse_object::<T>(object) {
            Ok(parsed) => parsed,
            Err(err) => {
                not_created.insert(creation_id, err);
                continue;
            }
        };
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        if txn.get(&id).is_some_and(Record::is_active) {
            not_created.insert(creation_id, SetError::already_exists(&id));
            continue;
        }
        // A tombstone under this id is replaced, not merged into.
        let mod_seq = next_mod_seq(&mut watermark);
        txn.put(Record::new(id.clone(), fields, mod_seq));
        created.insert(creation_id, CreatedRecord { id });
    }

    let mut updated = BTreeMap::new();
    let mut not_updated = BTreeMap::new();
    for (id, patch) in request.update.unwrap_or_default() {
        if !txn.get(&id).is_some_and(Record::is_active) {
            not_updated.insert(id, SetError::not_found());
            continue;
        }
        match parse_object::<T>(patch) {
            Ok((Some(other), _)) if other != id => {
                not_updated.insert(id, SetError::invalid_properties("id is immutable"));
            }
            Ok((_, fields)) => {
                let mod_seq = next_mod_seq(&mut watermark);
                upsert(&mut txn, id.clone(), fields, mod_seq);
                updated.insert(id, None);
            }
            Err(err) => {
                not_updated.insert(id, err);
            }
        }
    }

    let mut destroyed = Vec::new();
    let mut not_destroyed = BTreeMap::new();
    for id in request.destroy.unwrap_or_default() {
        if tombstone::<T, _>(&mut txn, &id, &mut watermark) {
            destroyed.push(id);
        } else {
            not_destroyed.insert(id, SetError::not_found());
        }
    }

    let commit = finish::<T, _>(txn, old_state, watermark)?;
    Ok(SetResponse {
        account_id: account_id.to_string(),
        old_state: commit.old_state.to_string(),
        new_state: commit.new_state.to_string(),
        created: (!created.is_empty()).then_some(created),
        updated: (!updated.is_empty()).then_some(updated),
        destroyed: (!destroyed.is_empty()).then_some(destroyed),
        not_created: (!not_created.is_empty()).then_some(not_created),
        not_updated: (!not_updated.is_empty()).then_some(not_updated),
        not_destroyed: (!not_destroyed.is_empty()).then_some(not_destroyed),
    })
}
