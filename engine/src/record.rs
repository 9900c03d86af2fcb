//! Record types for storing data.

use crate::{ModSeq, RecordId};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The typed field set of one record type.
///
/// Every field is optional. `merge` applies a partial update field by field:
/// a field present in `patch` overwrites the stored one, an absent field
/// leaves it untouched.
pub trait Fields:
    Clone + Default + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Type name used in method names and watermarks (`Email`, `Mailbox`, ...).
    const TYPE_NAME: &'static str;

    /// Secondary indexes the storage must maintain for this type.
    const INDEXES: &'static [&'static str] = &[];

    /// Merge a partial update into these fields.
    fn merge(&mut self, patch: Self);

    /// Key of this record in the named secondary index, if any.
    fn index_key(&self, _index: &str) -> Option<&str> {
        None
    }
}

/// A stored record with its modseq bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    /// Unique identifier within the record type
    pub id: RecordId,
    /// Typed payload
    #[serde(flatten)]
    pub fields: T,
    /// Modseq assigned when the record was first written
    pub created_mod_seq: ModSeq,
    /// Modseq of the most recent write, including deletion
    pub updated_mod_seq: ModSeq,
    /// Soft delete flag (tombstone)
    pub deleted: bool,
}

impl<T: Fields> Record<T> {
    /// Create a record first written at `mod_seq`.
    pub fn new(id: impl Into<RecordId>, fields: T, mod_seq: ModSeq) -> Self {
        Self {
            id: id.into(),
            fields,
            created_mod_seq: mod_seq,
            updated_mod_seq: mod_seq,
            deleted: false,
        }
    }

    /// Check if record is active (not deleted).
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Merge a partial update, reviving the record if it was a tombstone.
    pub fn apply_patch(&mut self, patch: T, mod_seq: ModSeq) {
        self.fields.merge(patch);
        self.updated_mod_seq = mod_seq;
        self.deleted = false;
    }

    /// Mark record as deleted (tombstone).
    pub fn mark_deleted(&mut self, mod_seq: ModSeq) {
        self.deleted = true;
        self.updated_mod_seq = mod_seq;
    }

    /// Client-visible object for this record: `id` plus its non-null fields,
    /// narrowed to `properties` when given.
    pub fn project(&self, properties: Option<&[String]>) -> crate::Result<Map<String, Value>> {
        let mut object = match serde_json::to_value(&self.fields)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(project(object, properties))
    }
}

/// Narrow a record-like object to `id` plus the requested non-null properties.
///
/// With no property list every non-null property is kept.
pub fn project(mut object: Map<String, Value>, properties: Option<&[String]>) -> Map<String, Value> {
    object.retain(|_, value| !value.is_null());
    let Some(properties) = properties else {
        return object;
    };

    let mut projected = Map::new();
    if let Some(id) = object.remove("id") {
        projected.insert("id".to_string(), id);
    }
    for property in properties {
        if let Some(value) = object.remove(property) {
            projected.insert(property.clone(), value);
        }
    }
    projected
}

/// An incoming partial record for [`crate::mutation::add_records`].
///
/// Deserialization takes `id` off the object and parses the rest as `T`, so
/// the field type's own unknown-property checks still apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordInput<T> {
    /// Target record; required, an input without one fails the whole batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> RecordInput<T> {
    pub fn new(id: impl Into<RecordId>, fields: T) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RecordInput<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id),
            Some(_) => return Err(de::Error::custom("id must be a string")),
        };
        let fields = T::deserialize(Value::Object(object)).map_err(de::Error::custom)?;
        Ok(Self { id, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Email;
    use serde_json::json;

    fn email(subject: &str, body: &str) -> Email {
        Email {
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            ..Email::default()
        }
    }

    #[test]
    fn create_record() {
        let record = Record::new("123", email("x", "y"), 7);

        assert_eq!(record.id, "123");
        assert_eq!(record.created_mod_seq, 7);
        assert_eq!(record.updated_mod_seq, 7);
        assert!(record.is_active());
    }

    #[test]
    fn patch_preserves_created_and_revives() {
        let mut record = Record::new("123", email("x", "y"), 1);
        record.mark_deleted(2);
        assert!(!record.is_active());

        let patch = Email {
            subject: Some("z".into()),
            ..Email::default()
        };
        record.apply_patch(patch, 3);

        assert!(record.is_active());
        assert_eq!(record.created_mod_seq, 1);
        assert_eq!(record.updated_mod_seq, 3);
        assert_eq!(record.fields.subject.as_deref(), Some("z"));
        assert_eq!(record.fields.body.as_deref(), Some("y"));
    }

    #[test]
    fn projection_keeps_id_and_requested_fields() {
        let record = Record::new("123", email("x", "y"), 1);
        let projected = record.project(Some(&["subject".to_string()])).unwrap();

        assert_eq!(Value::Object(projected), json!({"id": "123", "subject": "x"}));
    }

    #[test]
    fn projection_omits_absent_fields() {
        let record = Record::new("123", email("x", "y"), 1);
        let properties = vec!["subject".to_string(), "receivedAt".to_string()];
        let projected = record.project(Some(&properties)).unwrap();

        assert!(!projected.contains_key("receivedAt"));
        assert_eq!(projected.len(), 2);
    }

    #[test]
    fn full_projection_drops_nulls() {
        let object = json!({"id": "a", "name": "Inbox", "role": null});
        let Value::Object(map) = object else { unreachable!() };

        assert_eq!(Value::Object(project(map, None)), json!({"id": "a", "name": "Inbox"}));
    }

    #[test]
    fn input_without_id_deserializes() {
        let input: RecordInput<Email> = serde_json::from_value(json!({"subject": "x"})).unwrap();
        assert!(input.id.is_none());
        assert_eq!(input.fields.subject.as_deref(), Some("x"));
    }

    #[test]
    fn input_rejects_undeclared_properties() {
        let colour = json!({"id": "a", "colour": "red"});
        assert!(serde_json::from_value::<RecordInput<Email>>(colour).is_err());

        let numeric_id = serde_json::from_value::<RecordInput<Email>>(json!({"id": 7}));
        assert_eq!(numeric_id.unwrap_err().to_string(), "id must be a string");

        let null_id: RecordInput<Email> = serde_json::from_value(json!({"id": null})).unwrap();
        assert!(null_id.id.is_none());
    }
}
