//! Record type definitions.
//!
//! Each record type is a struct of named optional fields implementing
//! [`Fields`]. Unknown properties are rejected on input, so a client can
//! only write what the type declares.

use crate::record::Fields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the Email index that groups messages into threads.
pub const THREAD_ID_INDEX: &str = "threadId";

fn merge_field<V>(current: &mut Option<V>, patch: Option<V>) {
    if patch.is_some() {
        *current = patch;
    }
}

/// A mail message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Email {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox_ids: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Milliseconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<u64>,
}

impl Fields for Email {
    const TYPE_NAME: &'static str = "Email";
    const INDEXES: &'static [&'static str] = &[THREAD_ID_INDEX];

    fn merge(&mut self, patch: Self) {
        merge_field(&mut self.thread_id, patch.thread_id);
        merge_field(&mut self.mailbox_ids, patch.mailbox_ids);
        merge_field(&mut self.keywords, patch.keywords);
        merge_field(&mut self.from, patch.from);
        merge_field(&mut self.subject, patch.subject);
        merge_field(&mut self.preview, patch.preview);
        merge_field(&mut self.body, patch.body);
        merge_field(&mut self.received_at, patch.received_at);
    }

    fn index_key(&self, index: &str) -> Option<&str> {
        match index {
            THREAD_ID_INDEX => self.thread_id.as_deref(),
            _ => None,
        }
    }
}

/// A folder or label messages can belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Mailbox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Fields for Mailbox {
    const TYPE_NAME: &'static str = "Mailbox";

    fn merge(&mut self, patch: Self) {
        merge_field(&mut self.name, patch.name);
        merge_field(&mut self.parent_id, patch.parent_id);
        merge_field(&mut self.role, patch.role);
        merge_field(&mut self.sort_order, patch.sort_order);
    }
}
