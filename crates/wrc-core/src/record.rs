//! Host records as seen by the connector
//!
//! Records are owned by the host. The connector only reads the copies the host
//! adapter hands to the hook functions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Post type the host uses for catalog products
pub const PRODUCT_POST_TYPE: &str = "product";

/// Field that identifies a product across both sites
pub const IDENTIFIER_FIELD: &str = "sku";

/// Stable host-assigned record id
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Catalog fields carried by product records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFields {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub slug: String,
}

/// A host content item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub post_title: String,
    #[serde(default)]
    pub post_content: String,
    #[serde(default)]
    pub post_excerpt: String,
    #[serde(default)]
    pub post_name: String,
    #[serde(default)]
    pub post_status: String,
    #[serde(default)]
    pub post_type: String,
    #[serde(default)]
    pub post_date: String,
    /// Present for product records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductFields>,
}

impl Record {
    /// Create a plain post record
    pub fn post(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            post_title: title.into(),
            post_type: "post".to_string(),
            ..Default::default()
        }
    }

    /// Create a product record
    pub fn product(id: impl Into<RecordId>, product: ProductFields) -> Self {
        Self {
            id: id.into(),
            post_title: product.name.clone(),
            post_content: product.description.clone(),
            post_excerpt: product.short_description.clone(),
            post_name: product.slug.clone(),
            post_type: PRODUCT_POST_TYPE.to_string(),
            product: Some(product),
            ..Default::default()
        }
    }

    /// Whether the host classifies this record as a product
    pub fn is_product(&self) -> bool {
        self.post_type == PRODUCT_POST_TYPE
    }

    /// The fields the product pipeline tracks, keyed by payload name
    ///
    /// Returns `None` for records that are not products or that arrive
    /// without catalog fields.
    pub fn tracked_fields(&self) -> Option<BTreeMap<String, String>> {
        if !self.is_product() {
            return None;
        }
        let product = self.product.as_ref()?;

        Some(BTreeMap::from([
            (IDENTIFIER_FIELD.to_string(), product.sku.clone()),
            ("post_name".to_string(), product.slug.clone()),
            ("post_title".to_string(), product.name.clone()),
            ("post_content".to_string(), product.description.clone()),
            ("post_excerpt".to_string(), product.short_description.clone()),
        ]))
    }

    /// Full payload for the post pipeline
    pub fn post_payload(&self) -> PostPayload {
        PostPayload {
            id: self.id,
            post_title: self.post_title.clone(),
            post_content: self.post_content.clone(),
            post_excerpt: self.post_excerpt.clone(),
            post_name: self.post_name.clone(),
            post_status: self.post_status.clone(),
            post_type: self.post_type.clone(),
            post_date: self.post_date.clone(),
        }
    }
}

/// Wire shape of `/wrc/v1/receive-post-data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub id: RecordId,
    pub post_title: String,
    pub post_content: String,
    pub post_excerpt: String,
    pub post_name: String,
    pub post_status: String,
    pub post_type: String,
    pub post_date: String,
}

/// Host-provided flags describing why a save happened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveContext {
    /// The host is autosaving a draft
    #[serde(default)]
    pub autosave: bool,
    /// The record being saved is a historical revision
    #[serde(default)]
    pub revision: bool,
}

impl SaveContext {
    /// A regular editor save
    pub fn user_save() -> Self {
        Self::default()
    }

    /// Whether hooks should act on this save at all
    pub fn is_qualifying(&self) -> bool {
        !self.autosave && !self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_fields_for_product() {
        let record = Record::product(
            7,
            ProductFields {
                sku: "A1".to_string(),
                name: "Chair".to_string(),
                slug: "chair".to_string(),
                ..Default::default()
            },
        );

        let fields = record.tracked_fields().unwrap();
        assert_eq!(fields["sku"], "A1");
        assert_eq!(fields["post_title"], "Chair");
        assert_eq!(fields["post_name"], "chair");
        assert_eq!(fields.len(), 5);
    }

    #[test]
    fn test_posts_have_no_tracked_fields() {
        assert!(Record::post(1, "Hello").tracked_fields().is_none());
    }

    #[test]
    fn test_post_payload_shape() {
        let mut record = Record::post(42, "Hello");
        record.post_status = "publish".to_string();

        let json = serde_json::to_value(record.post_payload()).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["post_title"], "Hello");
        assert_eq!(json["post_status"], "publish");
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_save_context_guard() {
        assert!(SaveContext::user_save().is_qualifying());
        assert!(!SaveContext { autosave: true, revision: false }.is_qualifying());
        assert!(!SaveContext { autosave: false, revision: true }.is_qualifying());
    }
}
