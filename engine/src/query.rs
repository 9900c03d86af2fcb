//! Query engine: fetch records by id with optional property projection.
//!
//! How an id turns into an object is decided by a [`FetchStrategy`]. The
//! default, [`ById`], is a primary-key lookup. [`GroupBy`] synthesizes an
//! aggregate object from every record sharing a secondary-index key, which
//! is how threads are served from emails.

use crate::config::Limits;
use crate::error::Result;
use crate::record::{project, Fields, Record};
use crate::schema::{Email, THREAD_ID_INDEX};
use crate::storage::{ReadTxn, Storage};
use crate::{AccountId, Error, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Resolves ids to record-like objects within one read snapshot.
pub trait FetchStrategy<T: Fields> {
    /// Number of objects a whole-collection fetch would return.
    fn count(&self, txn: &dyn ReadTxn<T>) -> usize;

    /// Ids of every object a whole-collection fetch would return.
    fn all_ids(&self, txn: &dyn ReadTxn<T>) -> Vec<RecordId>;

    /// One entry per id, in order; `None` marks an id that does not resolve.
    fn fetch(
        &self,
        txn: &dyn ReadTxn<T>,
        ids: &[RecordId],
        properties: Option<&[String]>,
    ) -> Result<Vec<Option<Map<String, Value>>>>;
}

/// Direct primary-key lookup. Tombstones resolve to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ById;

impl<T: Fields> FetchStrategy<T> for ById {
    fn count(&self, txn: &dyn ReadTxn<T>) -> usize {
        txn.count()
    }

    fn all_ids(&self, txn: &dyn ReadTxn<T>) -> Vec<RecordId> {
        let mut ids: Vec<_> = txn
            .scan()
            .filter(|r| r.is_active())
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn fetch(
        &self,
        txn: &dyn ReadTxn<T>,
        ids: &[RecordId],
        properties: Option<&[String]>,
    ) -> Result<Vec<Option<Map<String, Value>>>> {
        ids.iter()
            .map(|id| match txn.get(id).filter(|r| r.is_active()) {
                Some(record) => record.project(properties).map(Some),
                None => Ok(None),
            })
            .collect()
    }
}

/// Groups child records by a secondary-index key.
///
/// Fetching id `k` collects the live records whose `index` key is `k`, sorts
/// them by `order_key`, and yields `{id: k, <children_key>: [child ids]}`.
/// A key with no live children does not resolve.
#[derive(Clone)]
pub struct GroupBy<T> {
    index: &'static str,
    children_key: &'static str,
    order_key: fn(&Record<T>) -> u64,
}

impl<T: Fields> GroupBy<T> {
    pub fn new(
        index: &'static str,
        children_key: &'static str,
        order_key: fn(&Record<T>) -> u64,
    ) -> Self {
        Self {
            index,
            children_key,
            order_key,
        }
    }

    fn children<'a>(&self, txn: &'a dyn ReadTxn<T>, key: &str) -> Vec<&'a Record<T>> {
        let mut children: Vec<_> = txn.index(self.index, key).filter(|r| r.is_active()).collect();
        children.sort_by(|a, b| {
            (self.order_key)(a)
                .cmp(&(self.order_key)(b))
                .then_with(|| a.id.cmp(&b.id))
        });
        children
    }
}

impl GroupBy<Email> {
    /// Threads: emails grouped by `threadId`, oldest first.
    pub fn threads() -> Self {
        Self::new(THREAD_ID_INDEX, "emailIds", |email| {
            email.fields.received_at.unwrap_or(0)
        })
    }
}

impl<T: Fields> FetchStrategy<T> for GroupBy<T> {
    fn count(&self, txn: &dyn ReadTxn<T>) -> usize {
        self.all_ids(txn).len()
    }

    fn all_ids(&self, txn: &dyn ReadTxn<T>) -> Vec<RecordId> {
        txn.index_keys(self.index)
            .filter(|key| txn.index(self.index, key).any(|r| r.is_active()))
            .map(str::to_string)
            .collect()
    }

    fn fetch(
        &self,
        txn: &dyn ReadTxn<T>,
        ids: &[RecordId],
        properties: Option<&[String]>,
    ) -> Result<Vec<Option<Map<String, Value>>>> {
        Ok(ids
            .iter()
            .map(|id| {
                let children = self.children(txn, id);
                if children.is_empty() {
                    return None;
                }
                let child_ids = children
                    .iter()
                    .map(|r| Value::String(r.id.clone()))
                    .collect();
                let mut object = Map::new();
                object.insert("id".to_string(), Value::String(id.clone()));
                object.insert(self.children_key.to_string(), Value::Array(child_ids));
                Some(project(object, properties))
            })
            .collect())
    }
}

/// Arguments of a `Type/get` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
    pub account_id: Option<AccountId>,
    pub ids: Option<Vec<RecordId>>,
    pub properties: Option<Vec<String>>,
}

/// Result of a `Type/get` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    pub account_id: AccountId,
    pub state: String,
    pub list: Vec<Map<String, Value>>,
    pub not_found: Vec<RecordId>,
}

/// Fetch objects through `strategy`.
///
/// An explicit id list longer than `max_objects_in_get` is rejected before
/// storage is touched. Without ids the whole collection is fetched, after
/// checking its size against the same cap.
pub fn get<T: Fields, S: Storage<T>>(
    store: &S,
    account_id: &str,
    request: &GetRequest,
    strategy: &dyn FetchStrategy<T>,
    limits: &Limits,
) -> Result<GetResponse> {
    let max = limits.max_objects_in_get;
    if let Some(ids) = &request.ids {
        if ids.len() > max {
            return Err(Error::RequestTooLarge {
                requested: ids.len(),
                max,
            });
        }
    }

    let snapshot = store.snapshot()?;
    let ids = match &request.ids {
        Some(ids) => Cow::Borrowed(ids),
        None => {
            let requested = strategy.count(&snapshot);
            if requested > max {
                return Err(Error::RequestTooLarge { requested, max });
            }
            Cow::Owned(strategy.all_ids(&snapshot))
        }
    };

    let results = strategy.fetch(&snapshot, &ids, request.properties.as_deref())?;
    let mut list = Vec::new();
    let mut not_found = Vec::new();
    for (id, result) in ids.iter().zip(results) {
        match result {
            Some(object) => list.push(object),
            None => not_found.push(id.clone()),
        }
    }

    tracing::debug!(
        type_name = T::TYPE_NAME,
        found = list.len(),
        not_found = not_found.len(),
        "get resolved"
    );
    Ok(GetResponse {
        account_id: account_id.to_string(),
        state: snapshot.watermark().state().to_string(),
        list,
        not_found,
    })
}
