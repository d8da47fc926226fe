//! JSON document adapter between stored records and the catalog model.
//!
//! # Responsibility
//! - Decode stored documents written under any known field-name variant.
//! - Accept timestamps as epoch milliseconds or RFC 3339 strings.
//! - Encode catalogs in the canonical camelCase shape.
//!
//! # Invariants
//! - This is the only place that knows about legacy field names.
//! - Decoded documents are validated; invalid state is rejected, not masked.

use crate::model::catalog::{Catalog, Item, Section};
use crate::repo::gateway::{PersistenceError, PersistenceResult};
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct StoredCatalog {
    id: String,
    #[serde(alias = "ownerId", alias = "businessId", alias = "business_id")]
    owner_id: String,
    name: String,
    #[serde(default)]
    sections: Vec<StoredSection>,
    #[serde(alias = "createdAt")]
    created_at: StoredTimestamp,
    #[serde(alias = "updatedAt")]
    updated_at: StoredTimestamp,
}

/// Canonical documents carry epoch milliseconds; older writers stored
/// ISO-8601 text such as `2024-01-01T10:00:00.000Z`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    EpochMs(i64),
    Text(String),
}

impl StoredTimestamp {
    fn into_epoch_ms(self, field: &str) -> PersistenceResult<i64> {
        match self {
            Self::EpochMs(value) => Ok(value),
            Self::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|parsed| parsed.timestamp_millis())
                .map_err(|err| {
                    PersistenceError::InvalidDocument(format!(
                        "{field} `{text}` is not an RFC 3339 timestamp: {err}"
                    ))
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoredSection {
    id: String,
    name: String,
    #[serde(default, alias = "products")]
    items: Vec<StoredItem>,
}

#[derive(Debug, Deserialize)]
struct StoredItem {
    id: String,
    name: String,
    price: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "imageUrl")]
    image_url: Option<String>,
}

impl From<StoredItem> for Item {
    fn from(value: StoredItem) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price: value.price,
            description: value.description,
            image_url: value.image_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

impl From<StoredSection> for Section {
    fn from(value: StoredSection) -> Self {
        Self {
            id: value.id,
            name: value.name,
            items: value.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<StoredCatalog> for Catalog {
    type Error = PersistenceError;

    fn try_from(value: StoredCatalog) -> PersistenceResult<Self> {
        Ok(Self {
            id: value.id,
            owner_id: value.owner_id,
            name: value.name,
            sections: value.sections.into_iter().map(Into::into).collect(),
            created_at: value.created_at.into_epoch_ms("created_at")?,
            updated_at: value.updated_at.into_epoch_ms("updated_at")?,
        })
    }
}

/// Decodes one stored JSON document into a validated catalog.
///
/// # Errors
/// - `Serialization` when the JSON is malformed or misses required fields.
/// - `InvalidDocument` when a timestamp string is not RFC 3339 or the decoded
///   catalog violates invariants.
pub fn decode_catalog(json: &str) -> PersistenceResult<Catalog> {
    let stored: StoredCatalog = serde_json::from_str(json)?;
    let catalog = Catalog::try_from(stored)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Encodes a catalog in canonical shape after validating it.
pub fn encode_catalog(catalog: &Catalog) -> PersistenceResult<String> {
    catalog.validate()?;
    Ok(serde_json::to_string(catalog)?)
}
