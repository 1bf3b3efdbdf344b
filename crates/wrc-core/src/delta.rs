//! Field-level difference between a snapshot and the saved record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::{Record, IDENTIFIER_FIELD};
use crate::traits::Snapshot;

/// Metadata key carrying the language code
pub const LANGUAGE_FIELD: &str = "language";

/// Changed product fields plus the required metadata
///
/// A `Delta` is only ever built with at least one changed content field, so
/// holding one means there is something worth sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    fields: BTreeMap<String, String>,
}

impl Delta {
    /// All entries, metadata included
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Look up one entry
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Names of the changed content fields (metadata excluded)
    pub fn changed_fields(&self) -> Vec<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| *k != LANGUAGE_FIELD && *k != IDENTIFIER_FIELD)
            .collect()
    }

    /// Number of entries, metadata included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the delta has no entries
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON payload for the product endpoint
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

/// Compare a snapshot against the current record
///
/// Only the fields present in the snapshot are compared, and the identifier
/// is never treated as content. Returns `None` when nothing changed or the
/// record has no tracked fields.
pub fn compute_delta(snapshot: &Snapshot, record: &Record, language: &str) -> Option<Delta> {
    let current = record.tracked_fields()?;

    let mut fields: BTreeMap<String, String> = snapshot
        .fields
        .iter()
        .filter(|(name, _)| name.as_str() != IDENTIFIER_FIELD)
        .filter_map(|(name, old)| {
            let new = current.get(name).map(String::as_str).unwrap_or_default();
            (new != old).then(|| (name.clone(), new.to_string()))
        })
        .collect();

    if fields.is_empty() {
        return None;
    }

    let sku = current.get(IDENTIFIER_FIELD).cloned().unwrap_or_default();
    fields.insert(LANGUAGE_FIELD.to_string(), language.to_string());
    fields.insert(IDENTIFIER_FIELD.to_string(), sku);

    Some(Delta { fields })
}
